//! Schema Catalog: live section schemas parsed once into typed attribute descriptors.
//!
//! The schema provider hands out rows whose `attributes` / `attributes_type` columns are
//! JSON-encoded strings. Everything downstream (reconciler, compiler) works against the
//! parsed `SectionSchema` so the display-name → field-key mapping and the attribute kind
//! conventions are resolved exactly once per load.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::models::schema::SectionSchemaRow;

pub mod compare;

pub use compare::structurally_equal;

#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("section '{section}': attributes are not valid JSON: {reason}")]
    InvalidAttributes { section: String, reason: String },

    #[error("section '{section}': attributes must be a JSON object")]
    AttributesNotObject { section: String },

    #[error("section '{section}': field key for attribute '{attribute}' must be a string")]
    FieldKeyNotString { section: String, attribute: String },

    #[error("section '{section}': attributes_type is not valid JSON: {reason}")]
    InvalidAttributeTypes { section: String, reason: String },
}

// ────────────────────────────────────────────────────────────────────────────
// Attribute descriptors
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    Date,
    Dropdown,
    Boolean,
    Text,
}

impl AttributeKind {
    /// Bucket name inside `attributes_type`. Checked in this order; first hit wins.
    const BUCKETS: [(&'static str, AttributeKind); 4] = [
        ("date", AttributeKind::Date),
        ("dropdown", AttributeKind::Dropdown),
        ("boolean", AttributeKind::Boolean),
        ("text", AttributeKind::Text),
    ];

    /// Resolves the kind of `display_name` from an `attributes_type` object.
    /// An attribute listed in no bucket is free text.
    pub fn resolve(attributes_type: &Value, display_name: &str) -> AttributeKind {
        for (bucket, kind) in Self::BUCKETS {
            if bucket_contains(attributes_type.get(bucket), display_name) {
                return kind;
            }
        }
        AttributeKind::Text
    }
}

fn bucket_contains(bucket: Option<&Value>, display_name: &str) -> bool {
    match bucket {
        Some(Value::Object(map)) => map.contains_key(display_name),
        Some(Value::Array(items)) => items.iter().any(|v| v.as_str() == Some(display_name)),
        _ => false,
    }
}

/// A schema attribute with its display label, storage key and kind resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDescriptor {
    pub kind: AttributeKind,
    pub display_name: String,
    pub field_key: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Section schema
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionSchema {
    pub data_section_id: String,
    pub title: String,
    pub data_type: String,
    /// Attributes in display order.
    pub attributes: Vec<AttributeDescriptor>,
    /// Raw typed classification, kept for drift comparison.
    pub attributes_type: Value,
}

impl SectionSchema {
    pub fn from_row(row: &SectionSchemaRow) -> Result<Self, SchemaError> {
        let section = row.data_section_id.clone();

        let attributes_value: Value =
            serde_json::from_str(&row.attributes).map_err(|e| SchemaError::InvalidAttributes {
                section: section.clone(),
                reason: e.to_string(),
            })?;
        let Value::Object(attribute_map) = attributes_value else {
            return Err(SchemaError::AttributesNotObject { section });
        };

        let attributes_type = parse_attribute_types(&section, &row.attributes_type)?;

        let mut attributes = Vec::with_capacity(attribute_map.len());
        for (display_name, field_key) in attribute_map {
            let Value::String(field_key) = field_key else {
                return Err(SchemaError::FieldKeyNotString {
                    section,
                    attribute: display_name,
                });
            };
            attributes.push(AttributeDescriptor {
                kind: AttributeKind::resolve(&attributes_type, &display_name),
                display_name,
                field_key,
            });
        }

        Ok(SectionSchema {
            data_section_id: row.data_section_id.clone(),
            title: row.title.clone(),
            data_type: row.data_type.clone(),
            attributes,
            attributes_type,
        })
    }

    pub fn display_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(|a| a.display_name.as_str())
    }

    pub fn attribute(&self, display_name: &str) -> Option<&AttributeDescriptor> {
        self.attributes
            .iter()
            .find(|a| a.display_name == display_name)
    }
}

/// Blank `attributes_type` columns are common for sections without typed fields.
fn parse_attribute_types(section: &str, raw: &str) -> Result<Value, SchemaError> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_str(raw).map_err(|e| SchemaError::InvalidAttributeTypes {
        section: section.to_string(),
        reason: e.to_string(),
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Catalog
// ────────────────────────────────────────────────────────────────────────────

/// All live section schemas, in provider order, indexed by `data_section_id`.
#[derive(Debug, Clone, Default)]
pub struct SchemaCatalog {
    sections: Vec<SectionSchema>,
    by_id: HashMap<String, usize>,
}

impl SchemaCatalog {
    pub fn new(sections: Vec<SectionSchema>) -> Self {
        let by_id = sections
            .iter()
            .enumerate()
            .map(|(i, s)| (s.data_section_id.clone(), i))
            .collect();
        Self { sections, by_id }
    }

    /// Builds a catalog from provider rows. Rows that fail to parse are skipped:
    /// a broken schema row behaves like a section that no longer exists upstream.
    pub fn from_rows(rows: &[SectionSchemaRow]) -> Self {
        let sections = rows
            .iter()
            .filter_map(|row| match SectionSchema::from_row(row) {
                Ok(schema) => Some(schema),
                Err(e) => {
                    warn!(error = %e, "Skipping unparseable section schema");
                    None
                }
            })
            .collect();
        Self::new(sections)
    }

    pub fn get(&self, data_section_id: &str) -> Option<&SectionSchema> {
        self.by_id.get(data_section_id).map(|&i| &self.sections[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &SectionSchema> {
        self.sections.iter()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }
}
