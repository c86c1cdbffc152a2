use anyhow::Result;

use super::constant::Constant;
use super::scan::Scan;

/// The cross product of two scans: for each row of `s1`, every row of `s2`.
///
/// Read-only, like `ProjectScan` — a product row doesn't identify a single
/// underlying record to update.
pub struct ProductScan {
    s1: Box<dyn Scan>,
    s2: Box<dyn Scan>,
}

impl ProductScan {
    pub fn new(mut s1: Box<dyn Scan>, mut s2: Box<dyn Scan>) -> Result<Self> {
        s1.before_first()?;
        s1.next()?;
        s2.before_first()?;
        Ok(Self { s1, s2 })
    }
}

impl Scan for ProductScan {
    fn before_first(&mut self) -> Result<()> {
        self.s1.before_first()?;
        self.s1.next()?;
        self.s2.before_first()
    }

    fn next(&mut self) -> Result<bool> {
        if self.s2.next()? {
            Ok(true)
        } else {
            self.s2.before_first()?;
            Ok(self.s2.next()? && self.s1.next()?)
        }
    }

    fn get_int(&mut self, field_name: &str) -> Result<i32> {
        if self.s1.has_field(field_name) {
            self.s1.get_int(field_name)
        } else {
            self.s2.get_int(field_name)
        }
    }

    fn get_float(&mut self, field_name: &str) -> Result<f32> {
        if self.s1.has_field(field_name) {
            self.s1.get_float(field_name)
        } else {
            self.s2.get_float(field_name)
        }
    }

    fn get_string(&mut self, field_name: &str) -> Result<String> {
        if self.s1.has_field(field_name) {
            self.s1.get_string(field_name)
        } else {
            self.s2.get_string(field_name)
        }
    }

    fn get_value(&mut self, field_name: &str) -> Result<Constant> {
        if self.s1.has_field(field_name) {
            self.s1.get_value(field_name)
        } else {
            self.s2.get_value(field_name)
        }
    }

    fn has_field(&self, field_name: &str) -> bool {
        self.s1.has_field(field_name) || self.s2.has_field(field_name)
    }

    fn close(&mut self) -> Result<()> {
        self.s1.close()?;
        self.s2.close()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::rc::Rc;
    use std::sync::{Arc, Mutex};

    use tempfile::tempdir;

    use crate::buffer::manager::BufferManager;
    use crate::file::manager::FileManager;
    use crate::log::manager::LogManager;
    use crate::query::expression::Expression;
    use crate::query::predicate::Predicate;
    use crate::query::project_scan::ProjectScan;
    use crate::query::scan::{Scan, UpdateScan};
    use crate::query::select_scan::SelectScan;
    use crate::query::term::Term;
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

    /// T1(A int, B varchar(9)) holds (i, "bbb"+i) for i in [0,5);
    /// T2(C int, D varchar(9)) holds (4-i, "ddd"+(4-i)) for i in [0,5).
    /// `select B, D from T1, T2 where A = C` must yield exactly five tuples,
    /// one per equal A/C pairing.
    #[test]
    fn select_project_product_pairs_matching_rows() {
        let tx = test_tx();

        let mut sch1 = Schema::new();
        sch1.add_int_field("A");
        sch1.add_string_field("B", 9);
        let layout1 = Rc::new(Layout::new(sch1).unwrap());

        let mut t1 = TableScan::new(Rc::clone(&tx), "T1", Rc::clone(&layout1)).unwrap();
        for i in 0..5 {
            t1.insert().unwrap();
            t1.set_int("A", i).unwrap();
            t1.set_string("B", &format!("bbb{}", i)).unwrap();
        }

        let mut sch2 = Schema::new();
        sch2.add_int_field("C");
        sch2.add_string_field("D", 9);
        let layout2 = Rc::new(Layout::new(sch2).unwrap());

        let mut t2 = TableScan::new(Rc::clone(&tx), "T2", Rc::clone(&layout2)).unwrap();
        for i in 0..5 {
            t2.insert().unwrap();
            t2.set_int("C", 4 - i).unwrap();
            t2.set_string("D", &format!("ddd{}", 4 - i)).unwrap();
        }

        let product = ProductScan::new(Box::new(t1), Box::new(t2)).unwrap();
        let pred = Predicate::with_term(Term::new(
            Expression::FieldName("A".to_string()),
            Expression::FieldName("C".to_string()),
        ));
        let select = SelectScan::new(product, pred);
        let mut proj = ProjectScan::new(
            Box::new(select),
            vec!["B".to_string(), "D".to_string()],
        );

        proj.before_first().unwrap();
        let mut rows = HashSet::new();
        let mut count = 0;
        while proj.next().unwrap() {
            let b = proj.get_string("B").unwrap();
            let d = proj.get_string("D").unwrap();
            let i: i32 = b.trim_start_matches("bbb").parse().unwrap();
            assert_eq!(d, format!("ddd{}", i));
            rows.insert((b, d));
            count += 1;
        }

        assert_eq!(count, 5);
        assert_eq!(rows.len(), 5);
    }
}
