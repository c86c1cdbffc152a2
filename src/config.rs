//! Engine-wide configuration constants.
//!
//! Mirrors the constants `SimpleDB.py` bundles at the class level: block
//! size, buffer pool size, and the log file name, plus the lock/buffer wait
//! timeout shared by [`crate::buffer::manager::BufferManager`] and
//! [`crate::tx::concurrency::lock_table::LockTable`].

/// Default page size in bytes for a freshly created database.
pub const DEFAULT_BLOCK_SIZE: usize = 400;

/// Default number of frames in the buffer pool.
pub const DEFAULT_BUFFER_POOL_SIZE: usize = 8;

/// Name of the write-ahead log file within the database directory.
pub const LOG_FILE_NAME: &str = "simpledb.log";

/// How long a thread will wait on the lock table or buffer pool before
/// aborting, in milliseconds.
pub const MAX_WAIT_MILLIS: u128 = 10_000;
