//! Template service: the async glue between the stores and the synchronous engine.
//!
//! Every read path reconciles against a freshly fetched schema catalog, so clients
//! always see drift flags and newly added sections. Saves strip the hidden group.

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::editor::{EditSession, MoveRequest, TemplateEdit};
use crate::errors::AppError;
use crate::models::template::TemplateSummaryRow;
use crate::report::{compile_with, CompileContext, ReportLayout};
use crate::schema::SchemaCatalog;
use crate::store::{CvDataStore, SchemaProvider, TemplateStore};
use crate::template::model::Template;
use crate::template::structure::check_structure;

#[derive(Debug, Deserialize)]
pub struct CreateTemplateRequest {
    pub title: String,
    #[serde(default)]
    pub created_with_role: String,
}

#[derive(Debug, Serialize)]
pub struct TemplateResponse {
    pub id: Uuid,
    pub template: Template,
}

pub async fn load_catalog(schemas: &dyn SchemaProvider) -> Result<SchemaCatalog, AppError> {
    let rows = schemas.list_schemas().await?;
    Ok(SchemaCatalog::from_rows(&rows))
}

/// Creates a template with every live section parked in the hidden group.
pub async fn create_template(
    schemas: &dyn SchemaProvider,
    templates: &dyn TemplateStore,
    req: CreateTemplateRequest,
) -> Result<TemplateResponse, AppError> {
    let title = require_title(&req.title)?;
    let catalog = load_catalog(schemas).await?;
    let template = Template::new(title, req.created_with_role, catalog.iter());

    let id = templates.create(&template.without_hidden_group()).await?;
    info!(template_id = %id, sections = catalog.len(), "Created report template");
    Ok(TemplateResponse { id, template })
}

/// Loads a template, reconciled and with its hidden group rebuilt.
pub async fn open_template(
    schemas: &dyn SchemaProvider,
    templates: &dyn TemplateStore,
    id: Uuid,
) -> Result<Template, AppError> {
    let stored = templates
        .load(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Template {id} not found")))?;
    let catalog = load_catalog(schemas).await?;
    Ok(EditSession::open(stored, &catalog).into_template())
}

pub async fn list_templates(
    templates: &dyn TemplateStore,
) -> Result<Vec<TemplateSummaryRow>, AppError> {
    templates.list().await
}

/// Persists a template after structural validation. The hidden group is a view
/// artifact and is never stored.
pub async fn save_template(
    templates: &dyn TemplateStore,
    id: Uuid,
    mut template: Template,
) -> Result<(), AppError> {
    template.title = require_title(&template.title)?;

    let violations = check_structure(&template);
    if !violations.is_empty() {
        let message = violations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(AppError::Validation(message));
    }

    if !templates.save(id, &template.without_hidden_group()).await? {
        return Err(AppError::NotFound(format!("Template {id} not found")));
    }
    info!(template_id = %id, "Saved report template");
    Ok(())
}

/// Applies one move to a client-held template.
pub async fn move_in_template(
    schemas: &dyn SchemaProvider,
    template: Template,
    request: &MoveRequest,
) -> Result<Template, AppError> {
    let catalog = load_catalog(schemas).await?;
    let mut session = EditSession::open(template, &catalog);
    session.apply_move(request)?;
    Ok(session.into_template())
}

/// Applies one structural edit to a client-held template.
pub async fn edit_template(
    schemas: &dyn SchemaProvider,
    template: Template,
    edit: &TemplateEdit,
) -> Result<Template, AppError> {
    let catalog = load_catalog(schemas).await?;
    let mut session = EditSession::open(template, &catalog);
    session.apply_edit(edit)?;
    Ok(session.into_template())
}

/// Compiles a stored template against one user's CV data.
pub async fn compile_template(
    schemas: &dyn SchemaProvider,
    records: &dyn CvDataStore,
    templates: &dyn TemplateStore,
    layout: &ReportLayout,
    id: Uuid,
    user_id: Uuid,
) -> Result<String, AppError> {
    let stored = templates
        .load(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Template {id} not found")))?;
    let catalog = load_catalog(schemas).await?;
    let template = EditSession::open(stored, &catalog).into_template();

    let rows = records.records_for_user(user_id).await?;
    let ctx = CompileContext::new(catalog, &rows);
    let latex = compile_with(&template, &ctx, layout);
    info!(template_id = %id, %user_id, records = rows.len(), "Compiled report");
    Ok(latex)
}

fn require_title(title: &str) -> Result<String, AppError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("Template title is required".to_string()));
    }
    Ok(trimmed.to_string())
}
