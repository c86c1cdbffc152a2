use anyhow::Result;

use crate::record::schema::Schema;

use super::constant::Constant;
use super::expression::Expression;
use super::scan::Scan;

/// An equality comparison between two expressions: `lhs = rhs`.
#[derive(Debug, Clone)]
pub struct Term {
    lhs: Expression,
    rhs: Expression,
}

impl Term {
    pub fn new(lhs: Expression, rhs: Expression) -> Self {
        Self { lhs, rhs }
    }

    pub fn is_satisfied(&self, scan: &mut dyn Scan) -> Result<bool> {
        let lhs_value = self.lhs.evaluate(scan)?;
        let rhs_value = self.rhs.evaluate(scan)?;
        Ok(lhs_value == rhs_value)
    }

    pub fn applies_to(&self, schema: &Schema) -> bool {
        self.lhs.applies_to(schema) && self.rhs.applies_to(schema)
    }

    /// If one side is a field reference equal to `field_name` and the other
    /// a constant, returns that constant.
    pub fn equates_with_constant(&self, field_name: &str) -> Option<Constant> {
        if self.lhs.is_field_name() ^ self.rhs.is_field_name() {
            if self.lhs.as_field_name() == Some(field_name) {
                return self.rhs.as_constant().cloned();
            }
            if self.rhs.as_field_name() == Some(field_name) {
                return self.lhs.as_constant().cloned();
            }
        }
        None
    }

    /// If both sides are field references and one names `field_name`,
    /// returns the other field's name.
    pub fn equates_with_field(&self, field_name: &str) -> Option<String> {
        if self.lhs.is_field_name() && self.rhs.is_field_name() {
            if self.lhs.as_field_name() == Some(field_name) {
                return self.rhs.as_field_name().map(str::to_string);
            }
            if self.rhs.as_field_name() == Some(field_name) {
                return self.lhs.as_field_name().map(str::to_string);
            }
        }
        None
    }
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = {}", self.lhs, self.rhs)
    }
}
