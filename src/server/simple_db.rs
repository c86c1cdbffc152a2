use std::sync::{Arc, Mutex};

use anyhow::Result;
use log::info;

use crate::buffer::manager::BufferManager;
use crate::config::{DEFAULT_BLOCK_SIZE, DEFAULT_BUFFER_POOL_SIZE, LOG_FILE_NAME};
use crate::file::manager::FileManager;
use crate::log::manager::LogManager;
use crate::tx::concurrency::lock_table::LockTable;
use crate::tx::transaction::Transaction;

/// The engine entry point: owns the file, log, buffer, and lock managers
/// shared by every transaction opened against a database directory.
///
/// `new` runs recovery automatically when the directory already existed, so
/// the caller always gets back a database whose on-disk state reflects only
/// committed transactions.
#[derive(Debug, Clone)]
pub struct SimpleDb {
    file_manager: Arc<Mutex<FileManager>>,
    log_manager: Arc<Mutex<LogManager>>,
    buffer_manager: Arc<Mutex<BufferManager>>,
    lock_table: Arc<Mutex<LockTable>>,
}

impl SimpleDb {
    pub fn new(dirname: &str) -> Result<Self> {
        Self::with_config(dirname, DEFAULT_BLOCK_SIZE, DEFAULT_BUFFER_POOL_SIZE)
    }

    pub fn with_config(dirname: &str, block_size: usize, buffer_pool_size: usize) -> Result<Self> {
        let file_manager = Arc::new(Mutex::new(FileManager::new(dirname, block_size)?));
        let is_new = file_manager.lock().unwrap().is_new();

        let log_manager = Arc::new(Mutex::new(LogManager::new(
            Arc::clone(&file_manager),
            LOG_FILE_NAME,
        )?));
        let buffer_manager = Arc::new(Mutex::new(BufferManager::new(
            Arc::clone(&file_manager),
            Arc::clone(&log_manager),
            buffer_pool_size,
        )));
        let lock_table = Arc::new(Mutex::new(LockTable::new()));

        let db = Self {
            file_manager,
            log_manager,
            buffer_manager,
            lock_table,
        };

        if is_new {
            info!("creating new database in {}", dirname);
        } else {
            info!("recovering existing database in {}", dirname);
            let mut tx = db.new_tx()?;
            tx.recover()?;
            tx.commit()?;
        }

        Ok(db)
    }

    pub fn new_tx(&self) -> Result<Transaction> {
        Transaction::new(
            Arc::clone(&self.file_manager),
            Arc::clone(&self.log_manager),
            Arc::clone(&self.buffer_manager),
            Arc::clone(&self.lock_table),
        )
    }

    pub fn file_manager(&self) -> Arc<Mutex<FileManager>> {
        Arc::clone(&self.file_manager)
    }

    pub fn log_manager(&self) -> Arc<Mutex<LogManager>> {
        Arc::clone(&self.log_manager)
    }

    pub fn buffer_manager(&self) -> Arc<Mutex<BufferManager>> {
        Arc::clone(&self.buffer_manager)
    }

    pub fn lock_table(&self) -> Arc<Mutex<LockTable>> {
        Arc::clone(&self.lock_table)
    }
}

#[cfg(test)]
mod tests {
    use super::SimpleDb;
    use tempfile::tempdir;

    #[test]
    fn reopening_a_directory_recovers_instead_of_recreating() {
        let temp_dir = tempdir().unwrap();
        let dir = temp_dir.path().to_str().unwrap();

        {
            let db = SimpleDb::with_config(dir, 400, 8).unwrap();
            let mut tx = db.new_tx().unwrap();
            let block = tx.append("testfile").unwrap();
            tx.pin(&block).unwrap();
            tx.set_int(&block, 0, 42, true).unwrap();
            tx.commit().unwrap();
        }

        let db = SimpleDb::with_config(dir, 400, 8).unwrap();
        let mut tx = db.new_tx().unwrap();
        let block = crate::file::block_id::BlockId::new("testfile", 0);
        tx.pin(&block).unwrap();
        assert_eq!(tx.get_int(&block, 0).unwrap(), 42);
        tx.commit().unwrap();
    }

    /// An uncommitted write survives a steal (eviction flushes the dirty
    /// page to disk) but must still be undone once the engine restarts and
    /// runs recovery against the log.
    #[test]
    fn restart_recovers_an_uncommitted_but_stolen_write() {
        let temp_dir = tempdir().unwrap();
        let dir = temp_dir.path().to_str().unwrap();
        let block = crate::file::block_id::BlockId::new("testfile", 0);

        {
            let db = SimpleDb::with_config(dir, 400, 3).unwrap();

            // Establish the pre-A value of the field.
            let mut setup = db.new_tx().unwrap();
            setup.pin(&block).unwrap();
            setup.set_int(&block, 80, 0, true).unwrap();
            setup.commit().unwrap();

            // Transaction A writes, but never commits.
            let mut a = db.new_tx().unwrap();
            a.pin(&block).unwrap();
            a.set_int(&block, 80, 9999, true).unwrap();
            a.unpin(&block).unwrap();

            // Force a steal: pin enough unrelated blocks that A's dirty
            // frame is evicted (and therefore flushed) before A commits.
            let bm = db.buffer_manager();
            let bm = bm.lock().unwrap();
            for n in 1..=3 {
                bm.pin(&crate::file::block_id::BlockId::new("testfile", n)).unwrap();
            }
            // `a` is dropped here without commit or rollback, simulating a crash.
        }

        // Reopening the directory must run recovery before returning.
        let db = SimpleDb::with_config(dir, 400, 3).unwrap();
        let mut tx = db.new_tx().unwrap();
        tx.pin(&block).unwrap();
        assert_eq!(tx.get_int(&block, 80).unwrap(), 0);
        tx.commit().unwrap();
    }
}
