use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A section schema row as exposed by the schema provider.
///
/// `attributes` and `attributes_type` are JSON-encoded objects and are only
/// parsed when the row is loaded into a `SchemaCatalog`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SectionSchemaRow {
    pub data_section_id: String,
    pub title: String,
    pub data_type: String,
    pub attributes: String,
    pub attributes_type: String,
}
