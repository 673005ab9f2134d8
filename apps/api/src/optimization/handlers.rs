//! Axum route handlers for optimization-driven rewrites.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::gateway::records;
use crate::json::OptionalJsonBody;
use crate::models::optimization::RegeneratedResume;
use crate::optimization::regenerate::regenerate;
use crate::optimization::rewrite::{rewrite_free_text, RewriteOutcome, RewriteRequest};
use crate::state::AppState;

/// POST /api/v1/optimizations/:id/regenerate
pub async fn handle_regenerate(
    State(state): State<AppState>,
    CurrentUser(owner): CurrentUser,
    Path(optimization_id): Path<Uuid>,
) -> Result<(StatusCode, Json<RegeneratedResume>), AppError> {
    let saved = regenerate(
        state.gateway.as_ref(),
        state.llm.as_ref(),
        state.locks.as_ref(),
        state.upstream_timeout,
        owner,
        optimization_id,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

/// POST /api/v1/optimizations/:id/rewrite
///
/// The body is optional; omitted fields fall back to the stored analysis.
pub async fn handle_rewrite(
    State(state): State<AppState>,
    CurrentUser(owner): CurrentUser,
    Path(optimization_id): Path<Uuid>,
    OptionalJsonBody(request): OptionalJsonBody<RewriteRequest>,
) -> Result<Json<RewriteOutcome>, AppError> {
    let outcome = rewrite_free_text(
        state.gateway.as_ref(),
        state.llm.as_ref(),
        state.upstream_timeout,
        owner,
        optimization_id,
        request,
    )
    .await?;
    Ok(Json(outcome))
}

/// GET /api/v1/regenerated/:id
pub async fn handle_get_regenerated(
    State(state): State<AppState>,
    CurrentUser(owner): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<RegeneratedResume>, AppError> {
    let regenerated = records::load_regenerated(state.gateway.as_ref(), id, owner)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Regenerated resume {id} not found")))?;
    Ok(Json(regenerated))
}
