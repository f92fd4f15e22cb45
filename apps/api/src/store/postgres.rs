use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::record::CvDataRecordRow;
use crate::models::schema::SectionSchemaRow;
use crate::models::template::{TemplateRow, TemplateSummaryRow};
use crate::store::{CvDataStore, SchemaProvider, TemplateStore};
use crate::template::Template;

/// Postgres-backed implementation of every store trait.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }
}

#[async_trait]
impl SchemaProvider for PgStore {
    async fn list_schemas(&self) -> Result<Vec<SectionSchemaRow>, AppError> {
        Ok(sqlx::query_as::<_, SectionSchemaRow>(
            r#"
            SELECT data_section_id, title, data_type, attributes, attributes_type
            FROM section_schemas
            ORDER BY display_order ASC, data_section_id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?)
    }
}

#[async_trait]
impl CvDataStore for PgStore {
    async fn records_for_user(&self, user_id: Uuid) -> Result<Vec<CvDataRecordRow>, AppError> {
        Ok(sqlx::query_as::<_, CvDataRecordRow>(
            r#"
            SELECT data_section_id, data_details
            FROM cv_data_records
            WHERE user_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }
}

#[async_trait]
impl TemplateStore for PgStore {
    async fn create(&self, template: &Template) -> Result<Uuid, AppError> {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO report_templates (id, title, body) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(&template.title)
            .bind(Json(template))
            .execute(&self.pool)
            .await?;
        Ok(id)
    }

    async fn load(&self, id: Uuid) -> Result<Option<Template>, AppError> {
        let row: Option<TemplateRow> = sqlx::query_as(
            "SELECT body FROM report_templates WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| r.body.0))
    }

    async fn save(&self, id: Uuid, template: &Template) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE report_templates SET title = $2, body = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(&template.title)
        .bind(Json(template))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self) -> Result<Vec<TemplateSummaryRow>, AppError> {
        Ok(sqlx::query_as::<_, TemplateSummaryRow>(
            "SELECT id, title, updated_at FROM report_templates ORDER BY updated_at DESC",
        )
        .fetch_all(&self.pool)
        .await?)
    }
}
