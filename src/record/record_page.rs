use std::cell::RefCell;
use std::rc::Rc;

use anyhow::Result;

use crate::error::DbError;
use crate::file::block_id::BlockId;
use crate::tx::transaction::Transaction;

use super::field_type::FieldType;
use super::layout::Layout;

/// Flag value stored at the head of a slot to mark it unused.
pub const EMPTY: i32 = 0;
/// Flag value stored at the head of a slot to mark it holding a record.
pub const USED: i32 = 1;

/// Reads and writes the records packed into a single block, according to a
/// `Layout`.
///
/// Each slot begins with a 4-byte flag (`EMPTY`/`USED`) followed by the
/// fields in schema order. Construction pins the block; the caller is
/// responsible for unpinning it through the same transaction once done.
pub struct RecordPage {
    tx: Rc<RefCell<Transaction>>,
    block: BlockId,
    layout: Rc<Layout>,
}

impl RecordPage {
    pub fn new(tx: Rc<RefCell<Transaction>>, block: BlockId, layout: Rc<Layout>) -> Result<Self> {
        tx.borrow_mut().pin(&block)?;
        Ok(Self { tx, block, layout })
    }

    pub fn block(&self) -> &BlockId {
        &self.block
    }

    pub fn get_int(&self, slot: i32, field_name: &str) -> Result<i32> {
        let field_position = self.offset(slot) + self.layout.offset(field_name)?;
        self.tx.borrow_mut().get_int(&self.block, field_position)
    }

    pub fn get_float(&self, slot: i32, field_name: &str) -> Result<f32> {
        let field_position = self.offset(slot) + self.layout.offset(field_name)?;
        self.tx.borrow_mut().get_f32(&self.block, field_position)
    }

    pub fn get_string(&self, slot: i32, field_name: &str) -> Result<String> {
        let field_position = self.offset(slot) + self.layout.offset(field_name)?;
        self.tx.borrow_mut().get_string(&self.block, field_position)
    }

    pub fn set_int(&mut self, slot: i32, field_name: &str, value: i32) -> Result<()> {
        let field_position = self.offset(slot) + self.layout.offset(field_name)?;
        self.tx
            .borrow_mut()
            .set_int(&self.block, field_position, value, true)
    }

    pub fn set_float(&mut self, slot: i32, field_name: &str, value: f32) -> Result<()> {
        let field_position = self.offset(slot) + self.layout.offset(field_name)?;
        self.tx
            .borrow_mut()
            .set_f32(&self.block, field_position, value, true)
    }

    pub fn set_string(&mut self, slot: i32, field_name: &str, value: &str) -> Result<()> {
        let field_position = self.offset(slot) + self.layout.offset(field_name)?;
        self.tx
            .borrow_mut()
            .set_string(&self.block, field_position, value, true)
    }

    pub fn delete(&mut self, slot: i32) -> Result<()> {
        self.set_flag(slot, EMPTY)
    }

    /// Marks every slot in the block empty and zeroes every field, without
    /// logging (the block holds no meaningful prior contents).
    pub fn format(&mut self) -> Result<()> {
        let mut slot = 0;
        while self.is_valid_slot(slot) {
            self.set_flag_unlogged(slot, EMPTY)?;
            let schema = self.layout.schema().clone();
            for field_name in schema.fields() {
                let field_position = self.offset(slot) + self.layout.offset(field_name)?;
                match schema.field_type(field_name).ok_or_else(|| DbError::BadField {
                    field: field_name.clone(),
                })? {
                    FieldType::Integer => {
                        self.tx
                            .borrow_mut()
                            .set_int(&self.block, field_position, 0, false)?;
                    }
                    FieldType::Float => {
                        self.tx
                            .borrow_mut()
                            .set_f32(&self.block, field_position, 0.0, false)?;
                    }
                    FieldType::VarChar => {
                        self.tx
                            .borrow_mut()
                            .set_string(&self.block, field_position, "", false)?;
                    }
                }
            }
            slot += 1;
        }
        Ok(())
    }

    pub fn next_after(&self, slot: i32) -> Result<i32> {
        self.search_after(slot, USED)
    }

    pub fn insert_after(&mut self, slot: i32) -> Result<i32> {
        let new_slot = self.search_after(slot, EMPTY)?;
        if new_slot >= 0 {
            self.set_flag(new_slot, USED)?;
        }
        Ok(new_slot)
    }

    fn set_flag(&mut self, slot: i32, flag: i32) -> Result<()> {
        let flag_position = self.offset(slot);
        self.tx
            .borrow_mut()
            .set_int(&self.block, flag_position, flag, true)
    }

    fn set_flag_unlogged(&mut self, slot: i32, flag: i32) -> Result<()> {
        let flag_position = self.offset(slot);
        self.tx
            .borrow_mut()
            .set_int(&self.block, flag_position, flag, false)
    }

    fn search_after(&self, slot: i32, flag: i32) -> Result<i32> {
        let mut slot = slot + 1;
        while self.is_valid_slot(slot) {
            if self.tx.borrow_mut().get_int(&self.block, self.offset(slot))? == flag {
                return Ok(slot);
            }
            slot += 1;
        }
        Ok(-1)
    }

    fn is_valid_slot(&self, slot: i32) -> bool {
        self.offset(slot + 1) <= self.tx.borrow().block_size()
    }

    fn offset(&self, slot: i32) -> usize {
        slot as usize * self.layout.slot_size()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::{Arc, Mutex};

    use tempfile::tempdir;

    use crate::buffer::manager::BufferManager;
    use crate::file::block_id::BlockId;
    use crate::file::manager::FileManager;
    use crate::log::manager::LogManager;
    use crate::record::layout::Layout;
    use crate::record::schema::Schema;
    use crate::tx::concurrency::lock_table::LockTable;
    use crate::tx::transaction::Transaction;

    use super::{RecordPage, EMPTY, USED};

    fn test_layout() -> Layout {
        let mut schema = Schema::new();
        schema.add_int_field("id");
        schema.add_string_field("name", 9);
        Layout::new(schema).unwrap()
    }

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

        // Each test gets its own directory; leaking it here keeps the files
        // around for the transaction's lifetime without threading a guard
        // value through every test.
        std::mem::forget(temp_dir);

        Rc::new(RefCell::new(
            Transaction::new(file_manager, log_manager, buffer_manager, lock_table).unwrap(),
        ))
    }

    #[test]
    fn format_zeroes_every_field_and_marks_every_slot_empty() {
        let tx = test_tx();
        let layout = Rc::new(test_layout());
        let block = BlockId::new("recpagetest.tbl", 0);
        tx.borrow_mut().append("recpagetest.tbl").unwrap();

        let mut rp = RecordPage::new(Rc::clone(&tx), block, layout).unwrap();
        rp.format().unwrap();

        assert_eq!(rp.next_after(-1).unwrap(), -1);
        assert_eq!(rp.get_int(0, "id").unwrap(), 0);
        assert_eq!(rp.get_string(0, "name").unwrap(), "");
    }

    #[test]
    fn insert_after_claims_the_first_empty_slot_and_marks_it_used() {
        let tx = test_tx();
        let layout = Rc::new(test_layout());
        let block = BlockId::new("recpagetest2.tbl", 0);
        tx.borrow_mut().append("recpagetest2.tbl").unwrap();

        let mut rp = RecordPage::new(Rc::clone(&tx), block, layout).unwrap();
        rp.format().unwrap();

        let slot = rp.insert_after(-1).unwrap();
        assert_eq!(slot, 0);
        rp.set_int(slot, "id", 7).unwrap();
        rp.set_string(slot, "name", "seven").unwrap();

        assert_eq!(rp.next_after(-1).unwrap(), 0);
        assert_eq!(rp.get_int(0, "id").unwrap(), 7);

        rp.delete(slot).unwrap();
        assert_eq!(rp.next_after(-1).unwrap(), -1);
        // the freed slot is reusable
        assert_eq!(rp.insert_after(-1).unwrap(), 0);
    }

    #[test]
    fn flag_constants_are_zero_and_one() {
        assert_eq!(EMPTY, 0);
        assert_eq!(USED, 1);
    }
}
