use anyhow::{bail, Result};

use super::constant::Constant;
use super::scan::Scan;

/// Restricts an underlying scan's visible fields to a fixed list.
///
/// Read-only: a projection drops columns an `UpdateScan` would need to
/// address (field lists omitted from the projection can't be written back
/// through it), so `ProjectScan` implements `Scan` only.
pub struct ProjectScan {
    scan: Box<dyn Scan>,
    field_list: Vec<String>,
}

impl ProjectScan {
    pub fn new(scan: Box<dyn Scan>, field_list: Vec<String>) -> Self {
        Self { scan, field_list }
    }

    fn check_field(&self, field_name: &str) -> Result<()> {
        if self.has_field(field_name) {
            Ok(())
        } else {
            bail!("field not found in projection: {}", field_name);
        }
    }
}

impl Scan for ProjectScan {
    fn before_first(&mut self) -> Result<()> {
        self.scan.before_first()
    }

    fn next(&mut self) -> Result<bool> {
        self.scan.next()
    }

    fn get_int(&mut self, field_name: &str) -> Result<i32> {
        self.check_field(field_name)?;
        self.scan.get_int(field_name)
    }

    fn get_float(&mut self, field_name: &str) -> Result<f32> {
        self.check_field(field_name)?;
        self.scan.get_float(field_name)
    }

    fn get_string(&mut self, field_name: &str) -> Result<String> {
        self.check_field(field_name)?;
        self.scan.get_string(field_name)
    }

    fn get_value(&mut self, field_name: &str) -> Result<Constant> {
        self.check_field(field_name)?;
        self.scan.get_value(field_name)
    }

    fn has_field(&self, field_name: &str) -> bool {
        self.field_list.iter().any(|f| f == field_name)
    }

    fn close(&mut self) -> Result<()> {
        self.scan.close()
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
    use crate::query::scan::UpdateScan;
    use crate::record::layout::Layout;
    use crate::record::schema::Schema;
    use crate::record::table_scan::TableScan;
    use crate::tx::concurrency::lock_table::LockTable;
    use crate::tx::transaction::Transaction;

    use super::*;

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

    #[test]
    fn hides_fields_outside_the_projection_list() {
        let tx = test_tx();
        let mut schema = Schema::new();
        schema.add_int_field("a");
        schema.add_string_field("b", 9);
        let layout = Rc::new(Layout::new(schema).unwrap());

        let mut ts = TableScan::new(tx, "projecttest", layout).unwrap();
        ts.insert().unwrap();
        ts.set_int("a", 1).unwrap();
        ts.set_string("b", "hello").unwrap();
        ts.before_first().unwrap();

        let mut proj = ProjectScan::new(Box::new(ts), vec!["b".to_string()]);
        proj.before_first().unwrap();
        assert!(proj.next().unwrap());

        assert!(proj.has_field("b"));
        assert!(!proj.has_field("a"));
        assert_eq!(proj.get_string("b").unwrap(), "hello");
        assert!(proj.get_int("a").is_err());
    }
}
