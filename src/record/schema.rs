use std::collections::HashMap;

use super::field_type::FieldType;

#[derive(Debug, Clone)]
struct FieldInfo {
    field_type: FieldType,
    length: usize,
}

/// The name, type, and (for strings) max length of every field of a table,
/// in declaration order.
///
/// A `Schema` carries no knowledge of a catalog; it is the shape a record
/// has, independent of where that shape came from.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<String>,
    info: HashMap<String, FieldInfo>,
}

impl Schema {
    pub fn new() -> Self {
        Self {
            fields: Vec::new(),
            info: HashMap::new(),
        }
    }

    /// Field names in declaration order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn has_field(&self, field_name: &str) -> bool {
        self.info.contains_key(field_name)
    }

    pub fn field_type(&self, field_name: &str) -> Option<FieldType> {
        self.info.get(field_name).map(|info| info.field_type)
    }

    /// Max character length for a `VarChar` field; meaningless for other types.
    pub fn length(&self, field_name: &str) -> Option<usize> {
        self.info.get(field_name).map(|info| info.length)
    }

    pub fn add_field(&mut self, field_name: &str, field_type: FieldType, length: usize) {
        if !self.info.contains_key(field_name) {
            self.fields.push(field_name.to_string());
        }
        self.info
            .insert(field_name.to_string(), FieldInfo { field_type, length });
    }

    pub fn add_int_field(&mut self, field_name: &str) {
        self.add_field(field_name, FieldType::Integer, 0);
    }

    pub fn add_float_field(&mut self, field_name: &str) {
        self.add_field(field_name, FieldType::Float, 0);
    }

    pub fn add_string_field(&mut self, field_name: &str, length: usize) {
        self.add_field(field_name, FieldType::VarChar, length);
    }

    /// Copies one field's definition over from another schema, if present.
    pub fn add(&mut self, field_name: &str, schema: &Schema) {
        if let (Some(field_type), Some(length)) =
            (schema.field_type(field_name), schema.length(field_name))
        {
            self.add_field(field_name, field_type, length);
        }
    }

    pub fn add_all(&mut self, schema: &Schema) {
        for field_name in schema.fields() {
            self.add(field_name, schema);
        }
    }
}
