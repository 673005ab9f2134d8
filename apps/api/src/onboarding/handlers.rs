use axum::{
    extract::{Multipart, State},
    Json,
};

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::extract::handlers::read_upload;
use crate::onboarding::{parse_cv, OnboardingOutcome};
use crate::state::AppState;

/// POST /api/v1/onboarding/parse-cv
///
/// Multipart form with the CV under `file`.
pub async fn handle_parse_cv(
    State(state): State<AppState>,
    CurrentUser(owner): CurrentUser,
    multipart: Multipart,
) -> Result<Json<OnboardingOutcome>, AppError> {
    let upload = read_upload(multipart).await?;
    let outcome = parse_cv(
        state.gateway.as_ref(),
        state.llm.as_ref(),
        state.doc_parser.as_ref(),
        state.upstream_timeout,
        owner,
        upload,
    )
    .await?;
    Ok(Json(outcome))
}
