pub mod simple_db;
