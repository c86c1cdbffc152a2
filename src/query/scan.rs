use anyhow::Result;

use crate::record::record_id::RecordId;

use super::constant::Constant;

/// A pull-based cursor over rows produced by a query operator.
///
/// Implementors are composable: `SelectScan`, `ProjectScan`, and
/// `ProductScan` all wrap an inner `Scan` (or two) and present the same
/// interface, so operators nest without the caller knowing which concrete
/// scan sits underneath.
pub trait Scan {
    fn before_first(&mut self) -> Result<()>;
    fn next(&mut self) -> Result<bool>;
    fn get_int(&mut self, field_name: &str) -> Result<i32>;
    fn get_float(&mut self, field_name: &str) -> Result<f32>;
    fn get_string(&mut self, field_name: &str) -> Result<String>;
    fn get_value(&mut self, field_name: &str) -> Result<Constant>;
    fn has_field(&self, field_name: &str) -> bool;
    fn close(&mut self) -> Result<()>;
}

/// Widens `Scan` with the mutations only a base table scan supports.
///
/// `TableScan` is the sole implementor; operators built on top of it
/// (select, project, product) read through `Scan` alone.
pub trait UpdateScan: Scan {
    fn set_int(&mut self, field_name: &str, value: i32) -> Result<()>;
    fn set_float(&mut self, field_name: &str, value: f32) -> Result<()>;
    fn set_string(&mut self, field_name: &str, value: &str) -> Result<()>;
    fn set_value(&mut self, field_name: &str, value: Constant) -> Result<()>;
    fn insert(&mut self) -> Result<()>;
    fn delete(&mut self) -> Result<()>;
    fn get_record_id(&self) -> Result<RecordId>;
    fn move_to_record_id(&mut self, rid: RecordId) -> Result<()>;
}
