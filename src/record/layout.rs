use std::collections::HashMap;
use std::mem::size_of;

use anyhow::Result;

use crate::error::DbError;
use crate::file::page::Page;

use super::field_type::FieldType;
use super::schema::Schema;

const I32_SIZE: usize = size_of::<i32>();

/// Describes the physical layout of records governed by a `Schema`: the byte
/// offset of each field within a slot, and the size of a slot.
///
/// Every slot begins with a 4-byte "in use" flag, followed by the fields in
/// the order the schema declares them.
#[derive(Debug, Clone)]
pub struct Layout {
    schema: Schema,
    offsets: HashMap<String, usize>,
    slot_size: usize,
}

impl Layout {
    /// Computes the layout from a schema, for a table being created for the
    /// first time.
    pub fn new(schema: Schema) -> Result<Self> {
        let mut offsets = HashMap::new();
        let mut position = I32_SIZE;
        for field_name in schema.fields() {
            offsets.insert(field_name.clone(), position);
            position += Self::length_in_bytes(&schema, field_name)?;
        }
        Ok(Self {
            schema,
            offsets,
            slot_size: position,
        })
    }

    /// Reconstructs a layout from metadata read out of the catalog.
    pub fn from_metadata(schema: Schema, offsets: HashMap<String, usize>, slot_size: usize) -> Self {
        Self {
            schema,
            offsets,
            slot_size,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn offset(&self, field_name: &str) -> Result<usize> {
        self.offsets
            .get(field_name)
            .copied()
            .ok_or_else(|| DbError::BadField {
                field: field_name.to_string(),
            }.into())
    }

    pub fn slot_size(&self) -> usize {
        self.slot_size
    }

    fn length_in_bytes(schema: &Schema, field_name: &str) -> Result<usize> {
        let field_type = schema.field_type(field_name).ok_or_else(|| DbError::BadField {
            field: field_name.to_string(),
        })?;
        Ok(match field_type {
            FieldType::Integer | FieldType::Float => I32_SIZE,
            FieldType::VarChar => {
                let length = schema.length(field_name).ok_or_else(|| DbError::BadField {
                    field: field_name.to_string(),
                })?;
                Page::max_length(length)
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lays_out_fields_back_to_back_after_the_flag() {
        let mut schema = Schema::new();
        schema.add_int_field("id");
        schema.add_string_field("name", 9);

        let layout = Layout::new(schema).unwrap();

        assert_eq!(layout.offset("id").unwrap(), I32_SIZE);
        assert_eq!(layout.offset("name").unwrap(), I32_SIZE + I32_SIZE);
        assert!(layout.offset("missing").is_err());
    }
}
