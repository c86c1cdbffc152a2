use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;

use crate::file::block_id::BlockId;
use crate::query::constant::Constant;
use crate::query::scan::{Scan, UpdateScan};
use crate::tx::transaction::Transaction;

use super::field_type::FieldType;
use super::layout::Layout;
use super::record_id::RecordId;
use super::record_page::RecordPage;

/// Scans the records of a single table, stored one-per-slot across the
/// blocks of `<table_name>.tbl`.
///
/// Implements both [`Scan`] (read-only traversal) and [`UpdateScan`]
/// (insert, delete, and positional field writes) — it is the only scan
/// that talks directly to storage; every other operator wraps one.
pub struct TableScan {
    tx: Rc<RefCell<Transaction>>,
    layout: Rc<Layout>,
    record_page: RecordPage,
    file_name: String,
    current_slot: i32,
}

impl TableScan {
    pub fn new(tx: Rc<RefCell<Transaction>>, table_name: &str, layout: Rc<Layout>) -> Result<Self> {
        let file_name = format!("{}.tbl", table_name);
        let size = tx.borrow_mut().size(&file_name)?;
        let record_page = if size == 0 {
            Self::new_record_page_at_new_block(Rc::clone(&tx), &file_name, Rc::clone(&layout))?
        } else {
            Self::record_page_at_block(Rc::clone(&tx), &file_name, 0, Rc::clone(&layout))?
        };

        Ok(Self {
            tx,
            layout,
            record_page,
            file_name,
            current_slot: -1,
        })
    }

    fn record_page_at_block(
        tx: Rc<RefCell<Transaction>>,
        file_name: &str,
        block_number: i64,
        layout: Rc<Layout>,
    ) -> Result<RecordPage> {
        let block = BlockId::new(file_name, block_number);
        RecordPage::new(tx, block, layout)
    }

    fn new_record_page_at_new_block(
        tx: Rc<RefCell<Transaction>>,
        file_name: &str,
        layout: Rc<Layout>,
    ) -> Result<RecordPage> {
        let block = tx.borrow_mut().append(file_name)?;
        let mut record_page = RecordPage::new(tx, block, layout)?;
        record_page.format()?;
        Ok(record_page)
    }

    fn move_to_block(&mut self, block_number: i64) -> Result<()> {
        self.close()?;
        self.record_page = Self::record_page_at_block(
            Rc::clone(&self.tx),
            &self.file_name,
            block_number,
            Rc::clone(&self.layout),
        )?;
        self.current_slot = -1;
        Ok(())
    }

    fn move_to_new_block(&mut self) -> Result<()> {
        self.close()?;
        self.record_page = Self::new_record_page_at_new_block(
            Rc::clone(&self.tx),
            &self.file_name,
            Rc::clone(&self.layout),
        )?;
        self.current_slot = -1;
        Ok(())
    }

    fn at_last_block(&mut self) -> Result<bool> {
        let size = self.tx.borrow_mut().size(&self.file_name)?;
        Ok(self.record_page.block().block_number() == size as i64 - 1)
    }
}

impl Scan for TableScan {
    fn before_first(&mut self) -> Result<()> {
        self.move_to_block(0)
    }

    fn next(&mut self) -> Result<bool> {
        self.current_slot = self.record_page.next_after(self.current_slot)?;
        while self.current_slot < 0 {
            if self.at_last_block()? {
                return Ok(false);
            }
            let next_block = self.record_page.block().block_number() + 1;
            self.move_to_block(next_block)?;
            self.current_slot = self.record_page.next_after(self.current_slot)?;
        }
        Ok(true)
    }

    fn get_int(&mut self, field_name: &str) -> Result<i32> {
        self.record_page.get_int(self.current_slot, field_name)
    }

    fn get_float(&mut self, field_name: &str) -> Result<f32> {
        self.record_page.get_float(self.current_slot, field_name)
    }

    fn get_string(&mut self, field_name: &str) -> Result<String> {
        self.record_page.get_string(self.current_slot, field_name)
    }

    fn get_value(&mut self, field_name: &str) -> Result<Constant> {
        match self.layout.schema().field_type(field_name) {
            Some(FieldType::Integer) => Ok(Constant::Int(self.get_int(field_name)?)),
            Some(FieldType::Float) => Ok(Constant::Float(self.get_float(field_name)?)),
            _ => Ok(Constant::Str(self.get_string(field_name)?)),
        }
    }

    fn has_field(&self, field_name: &str) -> bool {
        self.layout.schema().has_field(field_name)
    }

    fn close(&mut self) -> Result<()> {
        self.tx.borrow_mut().unpin(self.record_page.block())
    }
}

impl UpdateScan for TableScan {
    fn set_int(&mut self, field_name: &str, value: i32) -> Result<()> {
        self.record_page.set_int(self.current_slot, field_name, value)
    }

    fn set_float(&mut self, field_name: &str, value: f32) -> Result<()> {
        self.record_page.set_float(self.current_slot, field_name, value)
    }

    fn set_string(&mut self, field_name: &str, value: &str) -> Result<()> {
        self.record_page.set_string(self.current_slot, field_name, value)
    }

    fn set_value(&mut self, field_name: &str, value: Constant) -> Result<()> {
        match value {
            Constant::Int(val) => self.set_int(field_name, val),
            Constant::Float(val) => self.set_float(field_name, val),
            Constant::Str(val) => self.set_string(field_name, &val),
        }
    }

    fn insert(&mut self) -> Result<()> {
        self.current_slot = self.record_page.insert_after(self.current_slot)?;
        while self.current_slot < 0 {
            if self.at_last_block()? {
                self.move_to_new_block()?;
            } else {
                let next_block = self.record_page.block().block_number() + 1;
                self.move_to_block(next_block)?;
            }
            self.current_slot = self.record_page.insert_after(self.current_slot)?;
        }
        Ok(())
    }

    fn delete(&mut self) -> Result<()> {
        self.record_page.delete(self.current_slot)
    }

    fn get_record_id(&self) -> Result<RecordId> {
        Ok(RecordId::new(self.record_page.block().block_number(), self.current_slot))
    }

    fn move_to_record_id(&mut self, rid: RecordId) -> Result<()> {
        self.close()?;
        let block = BlockId::new(&self.file_name, rid.block_number());
        self.record_page = RecordPage::new(Rc::clone(&self.tx), block, Rc::clone(&self.layout))?;
        self.current_slot = rid.slot();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::{Arc, Mutex};

    use tempfile::tempdir;

    use crate::buffer::manager::BufferManager;
    use crate::file::manager::FileManager;
    use crate::log::manager::LogManager;
    use crate::query::scan::{Scan, UpdateScan};
    use crate::record::layout::Layout;
    use crate::record::schema::Schema;
    use crate::tx::concurrency::lock_table::LockTable;
    use crate::tx::transaction::Transaction;

    use super::TableScan;

    fn test_tx() -> Rc<RefCell<Transaction>> {
        let temp_dir = tempdir().unwrap();
        let db_dir = temp_dir.path().to_str().unwrap();
        let log_file = temp_dir.path().join("simpledb.log").to_str().unwrap().to_string();

        let file_manager = Arc::new(Mutex::new(FileManager::new(db_dir, 400).unwrap()));
        let log_manager = Arc::new(Mutex::new(
            LogManager::new(Arc::clone(&file_manager), &log_file).unwrap(),
        ));
        let buffer_manager = Arc::new(Mutex::new(BufferManager::new(
            Arc::clone(&file_manager),
            Arc::clone(&log_manager),
            8,
        )));
        let lock_table = Arc::new(Mutex::new(LockTable::new()));

        std::mem::forget(temp_dir);

        Rc::new(RefCell::new(
            Transaction::new(file_manager, log_manager, buffer_manager, lock_table).unwrap(),
        ))
    }

    fn test_layout() -> Rc<Layout> {
        let mut schema = Schema::new();
        schema.add_int_field("id");
        schema.add_string_field("name", 9);
        Rc::new(Layout::new(schema).unwrap())
    }

    #[test]
    fn an_empty_table_produces_zero_records() {
        let tx = test_tx();
        let layout = test_layout();
        let mut ts = TableScan::new(tx, "empty", layout).unwrap();

        ts.before_first().unwrap();
        assert!(!ts.next().unwrap());
    }

    #[test]
    fn one_insert_produces_exactly_one_record() {
        let tx = test_tx();
        let layout = test_layout();
        let mut ts = TableScan::new(tx, "onerecord", layout).unwrap();

        ts.insert().unwrap();
        ts.set_int("id", 42).unwrap();
        ts.set_string("name", "answer").unwrap();

        ts.before_first().unwrap();
        assert!(ts.next().unwrap());
        assert_eq!(ts.get_int("id").unwrap(), 42);
        assert_eq!(ts.get_string("name").unwrap(), "answer");
        assert!(!ts.next().unwrap());
    }

    #[test]
    fn insert_spans_multiple_blocks_and_scan_visits_them_in_order() {
        let tx = test_tx();
        let layout = test_layout();
        let mut ts = TableScan::new(tx, "manyrecords", layout).unwrap();

        let n = 50;
        for i in 0..n {
            ts.insert().unwrap();
            ts.set_int("id", i).unwrap();
            ts.set_string("name", &format!("rec{}", i)).unwrap();
        }

        ts.before_first().unwrap();
        let mut seen = Vec::new();
        while ts.next().unwrap() {
            seen.push(ts.get_int("id").unwrap());
        }
        assert_eq!(seen, (0..n).collect::<Vec<_>>());
    }

    #[test]
    fn delete_then_reinsert_reuses_the_freed_slot() {
        let tx = test_tx();
        let layout = test_layout();
        let mut ts = TableScan::new(tx, "deletetest", layout).unwrap();

        ts.insert().unwrap();
        ts.set_int("id", 1).unwrap();
        let rid = ts.get_record_id().unwrap();

        ts.insert().unwrap();
        ts.set_int("id", 2).unwrap();

        ts.move_to_record_id(rid).unwrap();
        ts.delete().unwrap();

        ts.before_first().unwrap();
        let mut remaining = Vec::new();
        while ts.next().unwrap() {
            remaining.push(ts.get_int("id").unwrap());
        }
        assert_eq!(remaining, vec![2]);
    }
}
