use anyhow::Result;

use crate::record::record_id::RecordId;

use super::constant::Constant;
use super::predicate::Predicate;
use super::scan::{Scan, UpdateScan};

/// Filters an underlying scan to the rows satisfying a `Predicate`.
///
/// Generic over the wrapped scan's concrete type rather than a trait
/// object, so a `SelectScan<TableScan>` stays updatable: a selection over
/// one table is still that table, just narrowed.
pub struct SelectScan<S> {
    scan: S,
    pred: Predicate,
}

impl<S> SelectScan<S> {
    pub fn new(scan: S, pred: Predicate) -> Self {
        Self { scan, pred }
    }
}

impl<S: Scan> Scan for SelectScan<S> {
    fn before_first(&mut self) -> Result<()> {
        self.scan.before_first()
    }

    fn next(&mut self) -> Result<bool> {
        while self.scan.next()? {
            if self.pred.is_satisfied(&mut self.scan)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn get_int(&mut self, field_name: &str) -> Result<i32> {
        self.scan.get_int(field_name)
    }

    fn get_float(&mut self, field_name: &str) -> Result<f32> {
        self.scan.get_float(field_name)
    }

    fn get_string(&mut self, field_name: &str) -> Result<String> {
        self.scan.get_string(field_name)
    }

    fn get_value(&mut self, field_name: &str) -> Result<Constant> {
        self.scan.get_value(field_name)
    }

    fn has_field(&self, field_name: &str) -> bool {
        self.scan.has_field(field_name)
    }

    fn close(&mut self) -> Result<()> {
        self.scan.close()
    }
}

impl<S: UpdateScan> UpdateScan for SelectScan<S> {
    fn set_int(&mut self, field_name: &str, value: i32) -> Result<()> {
        self.scan.set_int(field_name, value)
    }

    fn set_float(&mut self, field_name: &str, value: f32) -> Result<()> {
        self.scan.set_float(field_name, value)
    }

    fn set_string(&mut self, field_name: &str, value: &str) -> Result<()> {
        self.scan.set_string(field_name, value)
    }

    fn set_value(&mut self, field_name: &str, value: Constant) -> Result<()> {
        self.scan.set_value(field_name, value)
    }

    fn insert(&mut self) -> Result<()> {
        self.scan.insert()
    }

    fn delete(&mut self) -> Result<()> {
        self.scan.delete()
    }

    fn get_record_id(&self) -> Result<RecordId> {
        self.scan.get_record_id()
    }

    fn move_to_record_id(&mut self, rid: RecordId) -> Result<()> {
        self.scan.move_to_record_id(rid)
    }
}
