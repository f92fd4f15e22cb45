// In-memory store used by service and router tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::record::CvDataRecordRow;
use crate::models::schema::SectionSchemaRow;
use crate::models::template::TemplateSummaryRow;
use crate::store::{CvDataStore, SchemaProvider, TemplateStore};
use crate::template::Template;

#[derive(Default)]
pub struct MemoryStore {
    pub schemas: Mutex<Vec<SectionSchemaRow>>,
    pub records: Mutex<HashMap<Uuid, Vec<CvDataRecordRow>>>,
    pub templates: Mutex<HashMap<Uuid, Template>>,
}

impl MemoryStore {
    pub fn with_schemas(schemas: Vec<SectionSchemaRow>) -> Self {
        MemoryStore {
            schemas: Mutex::new(schemas),
            ..Default::default()
        }
    }

    pub fn set_schemas(&self, schemas: Vec<SectionSchemaRow>) {
        *self.schemas.lock().unwrap() = schemas;
    }

    pub fn add_records(&self, user_id: Uuid, records: Vec<CvDataRecordRow>) {
        self.records
            .lock()
            .unwrap()
            .entry(user_id)
            .or_default()
            .extend(records);
    }

    pub fn stored(&self, id: Uuid) -> Option<Template> {
        self.templates.lock().unwrap().get(&id).cloned()
    }
}

#[async_trait]
impl SchemaProvider for MemoryStore {
    async fn list_schemas(&self) -> Result<Vec<SectionSchemaRow>, AppError> {
        Ok(self.schemas.lock().unwrap().clone())
    }
}

#[async_trait]
impl CvDataStore for MemoryStore {
    async fn records_for_user(&self, user_id: Uuid) -> Result<Vec<CvDataRecordRow>, AppError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl TemplateStore for MemoryStore {
    async fn create(&self, template: &Template) -> Result<Uuid, AppError> {
        let id = Uuid::new_v4();
        self.templates.lock().unwrap().insert(id, template.clone());
        Ok(id)
    }

    async fn load(&self, id: Uuid) -> Result<Option<Template>, AppError> {
        Ok(self.stored(id))
    }

    async fn save(&self, id: Uuid, template: &Template) -> Result<bool, AppError> {
        let mut templates = self.templates.lock().unwrap();
        match templates.get_mut(&id) {
            Some(slot) => {
                *slot = template.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list(&self) -> Result<Vec<TemplateSummaryRow>, AppError> {
        Ok(self
            .templates
            .lock()
            .unwrap()
            .iter()
            .map(|(id, t)| TemplateSummaryRow {
                id: *id,
                title: t.title.clone(),
                updated_at: Utc::now(),
            })
            .collect())
    }
}
