use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One stored CV entry. `data_details` is a JSON-encoded field-key → value object.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CvDataRecordRow {
    pub data_section_id: String,
    pub data_details: String,
}
