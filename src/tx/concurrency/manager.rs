use anyhow::{Ok, Result};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use crate::file::block_id::BlockId;

use super::lock_table::LockTable;

#[derive(Debug)]
enum Lock {
    Exclusive,
    Shared,
}

#[derive(Debug)]
pub struct ConcurrencyManager {
    lock_table: Arc<Mutex<LockTable>>,
    locks: HashMap<BlockId, Lock>,
}

/// Each transaction has its own concurrency manager.
/// The concurrency manager keeps track of which locks the transaction currently has, and interacts with the global lock table as needed.
/// The concurrency manager uses locking to guarantee that schedules are serializable.
/// In particular, it requires all transactions to follow the lock protocol, which states:
/// - Before reading a block, acquire a shared lock on it.
/// - Before modifying a block, acquire an exclusive lock on it.
/// - Release all locks after commit or rollback.
impl ConcurrencyManager {
    pub fn new(lock_table: Arc<Mutex<LockTable>>) -> Self {
        Self {
            lock_table: Arc::clone(&lock_table),
            locks: HashMap::new(),
        }
    }

    pub fn slock(&mut self, block: &BlockId) -> Result<()> {
        match self.locks.get(block) {
            Some(Lock::Exclusive) => Ok(()),
            Some(Lock::Shared) => Ok(()),
            _ => {
                self.lock_table.lock().unwrap().slock(block)?;
                self.locks.insert(block.clone(), Lock::Shared);
                Ok(())
            }
        }
    }

    pub fn xlock(&mut self, block: &BlockId) -> Result<()> {
        match self.locks.get(block) {
            Some(Lock::Exclusive) => Ok(()),
            _ => {
                self.slock(block)?;
                self.lock_table.lock().unwrap().xlock(block)?;
                self.locks.insert(block.clone(), Lock::Exclusive);
                Ok(())
            }
        }
    }

    pub fn release(&mut self) -> Result<()> {
        for block in self.locks.keys() {
            self.lock_table.lock().unwrap().unlock(block)?;
        }
        self.locks.clear();
        Ok(())
    }
}
