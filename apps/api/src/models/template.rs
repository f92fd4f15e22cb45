use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::template::Template;

/// Stored template body. Title and timestamps are only read through
/// `TemplateSummaryRow`.
#[derive(Debug, Clone, FromRow)]
pub struct TemplateRow {
    pub body: Json<Template>,
}

/// Listing entry returned without the template body.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TemplateSummaryRow {
    pub id: Uuid,
    pub title: String,
    pub updated_at: DateTime<Utc>,
}
