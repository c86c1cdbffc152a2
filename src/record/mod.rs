pub mod field_type;
pub mod layout;
pub mod record_id;
pub mod record_page;
pub mod schema;
pub mod table_scan;
