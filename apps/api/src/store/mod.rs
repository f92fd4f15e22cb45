//! External boundaries: schema provider, CV data store and template persistence.
//!
//! Carried in `AppState` as `Arc<dyn …>` so the Postgres backend can be swapped for
//! the in-memory one in tests without touching services or handlers.

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::record::CvDataRecordRow;
use crate::models::schema::SectionSchemaRow;
use crate::models::template::TemplateSummaryRow;
use crate::template::Template;

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgStore;

#[async_trait]
pub trait SchemaProvider: Send + Sync {
    /// Every live section schema, in display order.
    async fn list_schemas(&self) -> Result<Vec<SectionSchemaRow>, AppError>;
}

#[async_trait]
pub trait CvDataStore: Send + Sync {
    /// A user's records in the order they were entered.
    async fn records_for_user(&self, user_id: Uuid) -> Result<Vec<CvDataRecordRow>, AppError>;
}

#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn create(&self, template: &Template) -> Result<Uuid, AppError>;

    async fn load(&self, id: Uuid) -> Result<Option<Template>, AppError>;

    /// Overwrites the stored body. Returns `false` when no template has `id`.
    async fn save(&self, id: Uuid, template: &Template) -> Result<bool, AppError>;

    async fn list(&self) -> Result<Vec<TemplateSummaryRow>, AppError>;
}
