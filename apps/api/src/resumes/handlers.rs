//! Axum route handlers for the Resume API.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::extract::handlers::read_upload;
use crate::json::{JsonBody, OptionalJsonBody};
use crate::models::resume::ResumeDocument;
use crate::resumes;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct BlankRequest {
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateResumeRequest {
    pub content: Value,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ResumeResponse {
    pub resume: ResumeDocument,
}

/// POST /api/v1/resumes/blank
pub async fn handle_create_blank(
    State(state): State<AppState>,
    CurrentUser(owner): CurrentUser,
    OptionalJsonBody(request): OptionalJsonBody<BlankRequest>,
) -> Result<(StatusCode, Json<ResumeResponse>), AppError> {
    let resume =
        resumes::create_blank(state.gateway.as_ref(), owner, request.title.as_deref()).await?;
    Ok((StatusCode::CREATED, Json(ResumeResponse { resume })))
}

/// POST /api/v1/resumes/upload
///
/// Multipart form: `file` (PDF or DOCX) and an optional `title`.
pub async fn handle_upload(
    State(state): State<AppState>,
    CurrentUser(owner): CurrentUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ResumeResponse>), AppError> {
    let upload = read_upload(multipart).await?;
    let resume = resumes::create_from_upload(
        state.gateway.as_ref(),
        state.llm.as_ref(),
        state.upstream_timeout,
        owner,
        upload,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(ResumeResponse { resume })))
}

/// GET /api/v1/resumes/:id
pub async fn handle_get_resume(
    State(state): State<AppState>,
    CurrentUser(owner): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ResumeResponse>, AppError> {
    let resume = resumes::get(state.gateway.as_ref(), owner, id).await?;
    Ok(Json(ResumeResponse { resume }))
}

/// PUT /api/v1/resumes/:id
pub async fn handle_update_resume(
    State(state): State<AppState>,
    CurrentUser(owner): CurrentUser,
    Path(id): Path<Uuid>,
    JsonBody(request): JsonBody<UpdateResumeRequest>,
) -> Result<Json<ResumeResponse>, AppError> {
    let resume = resumes::update_content(
        state.gateway.as_ref(),
        owner,
        id,
        request.content,
        request.title.as_deref(),
    )
    .await?;
    Ok(Json(ResumeResponse { resume }))
}

/// DELETE /api/v1/resumes/:id
pub async fn handle_delete_resume(
    State(state): State<AppState>,
    CurrentUser(owner): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    resumes::delete(state.gateway.as_ref(), owner, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
