//! Axum route handlers for the Generation API.

use std::collections::HashMap;

use axum::{
    extract::{FromRequest, Multipart, Request, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::extract::handlers::{fetch_upload, is_multipart, read_upload};
use crate::generation::generator::{
    generate_from_document, generate_from_prompt, GenerateRequest, TailorRequest,
};
use crate::json::JsonBody;
use crate::models::resume::ResumeDocument;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub resume: ResumeDocument,
}

/// POST /api/v1/resumes/generate
///
/// Prompt + job title + job description → a complete, stored resume.
pub async fn handle_generate(
    State(state): State<AppState>,
    CurrentUser(owner): CurrentUser,
    JsonBody(request): JsonBody<GenerateRequest>,
) -> Result<(StatusCode, Json<GenerateResponse>), AppError> {
    let resume = generate_from_prompt(
        state.gateway.as_ref(),
        state.llm.as_ref(),
        state.upstream_timeout,
        owner,
        &request,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(GenerateResponse { resume })))
}

#[derive(Debug, Deserialize)]
pub struct TailorUrlRequest {
    #[serde(default, alias = "fileUrl")]
    pub file_url: String,
    #[serde(flatten)]
    pub target: TailorRequest,
}

fn field(fields: &HashMap<String, String>, names: [&str; 2]) -> String {
    names
        .iter()
        .find_map(|name| fields.get(*name))
        .cloned()
        .unwrap_or_default()
}

/// POST /api/v1/resumes/generate-from-document
///
/// Multipart form (`file`, `jobTitle`, `jobDescription`) or JSON
/// `{ "fileUrl", "jobTitle", "jobDescription" }` → a tailored, stored resume.
pub async fn handle_generate_from_document(
    State(state): State<AppState>,
    CurrentUser(owner): CurrentUser,
    request: Request,
) -> Result<(StatusCode, Json<GenerateResponse>), AppError> {
    let (source, target) = if is_multipart(&request) {
        let multipart = Multipart::from_request(request, &state)
            .await
            .map_err(|e| AppError::MissingInput(e.body_text()))?;
        let upload = read_upload(multipart).await?;
        let target = TailorRequest {
            job_title: field(&upload.fields, ["jobTitle", "job_title"]),
            job_description: field(&upload.fields, ["jobDescription", "job_description"]),
        };
        (upload, target)
    } else {
        let JsonBody(body) = JsonBody::<TailorUrlRequest>::from_request(request, &state).await?;
        if body.target.job_title.trim().is_empty() || body.target.job_description.trim().is_empty()
        {
            return Err(AppError::MissingInput(
                "jobTitle and jobDescription are required".to_string(),
            ));
        }
        (fetch_upload(&state, &body.file_url).await?, body.target)
    };

    let resume = generate_from_document(
        state.gateway.as_ref(),
        state.llm.as_ref(),
        state.upstream_timeout,
        owner,
        source,
        &target,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(GenerateResponse { resume })))
}
