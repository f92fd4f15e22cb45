use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::editor::{MoveRequest, TemplateEdit};
use crate::errors::AppError;
use crate::models::template::TemplateSummaryRow;
use crate::state::AppState;
use crate::template::model::Template;
use crate::template::service::{self, CreateTemplateRequest, TemplateResponse};

#[derive(Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

#[derive(Deserialize)]
pub struct MoveBody {
    pub template: Template,
    #[serde(rename = "move")]
    pub request: MoveRequest,
}

#[derive(Deserialize)]
pub struct EditBody {
    pub template: Template,
    pub edit: TemplateEdit,
}

/// POST /api/v1/templates
pub async fn handle_create_template(
    State(state): State<AppState>,
    Json(req): Json<CreateTemplateRequest>,
) -> Result<(StatusCode, Json<TemplateResponse>), AppError> {
    let created =
        service::create_template(state.schemas.as_ref(), state.templates.as_ref(), req).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/v1/templates
pub async fn handle_list_templates(
    State(state): State<AppState>,
) -> Result<Json<Vec<TemplateSummaryRow>>, AppError> {
    Ok(Json(service::list_templates(state.templates.as_ref()).await?))
}

/// GET /api/v1/templates/:id
pub async fn handle_get_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TemplateResponse>, AppError> {
    let template =
        service::open_template(state.schemas.as_ref(), state.templates.as_ref(), id).await?;
    Ok(Json(TemplateResponse { id, template }))
}

/// PUT /api/v1/templates/:id
pub async fn handle_save_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(template): Json<Template>,
) -> Result<StatusCode, AppError> {
    service::save_template(state.templates.as_ref(), id, template).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/templates/move
pub async fn handle_move(
    State(state): State<AppState>,
    Json(body): Json<MoveBody>,
) -> Result<Json<Template>, AppError> {
    let template =
        service::move_in_template(state.schemas.as_ref(), body.template, &body.request).await?;
    Ok(Json(template))
}

/// POST /api/v1/templates/edit
pub async fn handle_edit(
    State(state): State<AppState>,
    Json(body): Json<EditBody>,
) -> Result<Json<Template>, AppError> {
    let template =
        service::edit_template(state.schemas.as_ref(), body.template, &body.edit).await?;
    Ok(Json(template))
}

/// POST /api/v1/templates/:id/compile?user_id=
pub async fn handle_compile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<UserIdQuery>,
) -> Result<impl IntoResponse, AppError> {
    let latex = service::compile_template(
        state.schemas.as_ref(),
        state.records.as_ref(),
        state.templates.as_ref(),
        &state.layout,
        id,
        params.user_id,
    )
    .await?;
    Ok(([(header::CONTENT_TYPE, "application/x-latex")], latex))
}
