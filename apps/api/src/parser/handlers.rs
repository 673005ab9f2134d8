use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::json::JsonBody;
use crate::parser::parse_section;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ParseSectionRequest {
    #[serde(default, alias = "sectionText", alias = "text")]
    pub section_text: String,
}

#[derive(Debug, Serialize)]
pub struct ParseSectionResponse {
    pub parsed: Map<String, Value>,
}

/// POST /api/v1/resumes/parse-section
pub async fn handle_parse_section(
    State(state): State<AppState>,
    _user: CurrentUser,
    JsonBody(request): JsonBody<ParseSectionRequest>,
) -> Result<Json<ParseSectionResponse>, AppError> {
    let parsed = parse_section(
        state.llm.as_ref(),
        &request.section_text,
        state.upstream_timeout,
    )
    .await?;
    Ok(Json(ParseSectionResponse { parsed }))
}
