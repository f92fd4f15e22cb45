use std::sync::Arc;

use crate::report::ReportLayout;
use crate::store::{CvDataStore, SchemaProvider, TemplateStore};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub schemas: Arc<dyn SchemaProvider>,
    pub records: Arc<dyn CvDataStore>,
    pub templates: Arc<dyn TemplateStore>,
    /// Page geometry for compiled reports, resolved once from config.
    pub layout: ReportLayout,
}
