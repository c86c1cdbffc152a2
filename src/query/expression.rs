use anyhow::Result;

use crate::record::schema::Schema;

use super::constant::Constant;
use super::scan::Scan;

/// Either a literal constant or a field reference, evaluated against a
/// `Scan` row to produce a `Constant`.
#[derive(Debug, Clone)]
pub enum Expression {
    Constant(Constant),
    FieldName(String),
}

impl Expression {
    pub fn evaluate(&self, scan: &mut dyn Scan) -> Result<Constant> {
        match self {
            Expression::Constant(val) => Ok(val.clone()),
            Expression::FieldName(field_name) => scan.get_value(field_name),
        }
    }

    pub fn is_field_name(&self) -> bool {
        matches!(self, Expression::FieldName(_))
    }

    pub fn as_field_name(&self) -> Option<&str> {
        match self {
            Expression::FieldName(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_constant(&self) -> Option<&Constant> {
        match self {
            Expression::Constant(val) => Some(val),
            _ => None,
        }
    }

    pub fn applies_to(&self, schema: &Schema) -> bool {
        match self {
            Expression::Constant(_) => true,
            Expression::FieldName(field_name) => schema.has_field(field_name),
        }
    }
}

impl std::fmt::Display for Expression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expression::Constant(val) => write!(f, "{}", val),
            Expression::FieldName(name) => write!(f, "{}", name),
        }
    }
}
