//! Structured-Resume Parser: turns a block of resume text into schema-shaped JSON.
//!
//! One completion call per block. The reply must be a JSON object holding at least
//! one recognized top-level key; dates are normalized before the result leaves here.

pub mod handlers;
pub mod prompts;

use std::time::Duration;

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::info;

use crate::errors::AppError;
use crate::llm_client::prompts::{fill, DATE_RULES, RESUME_SCHEMA};
use crate::llm_client::{complete_within, CompletionProvider, CompletionRequest, OutputMode};
use crate::parser::prompts::{SECTION_PARSE_SYSTEM, SECTION_PARSE_USER};
use crate::schema::{dates, validate_partial, ResumeContent};

/// Extraction leans deterministic.
pub const PARSE_TEMPERATURE: f32 = 0.2;

fn system_prompt() -> String {
    fill(
        SECTION_PARSE_SYSTEM,
        &[("schema", RESUME_SCHEMA), ("date_rules", DATE_RULES)],
    )
}

/// Parses one section (or mixed content) into a partial resume.
///
/// Blank input fails with `MissingInput` before any external call.
pub async fn parse_section(
    llm: &dyn CompletionProvider,
    section_text: &str,
    limit: Duration,
) -> Result<Map<String, Value>, AppError> {
    let text = section_text.trim();
    if text.is_empty() {
        return Err(AppError::MissingInput("section text cannot be empty".to_string()));
    }

    let system = system_prompt();
    let user = fill(SECTION_PARSE_USER, &[("text", text)]);
    let raw = complete_within(
        llm,
        CompletionRequest {
            system: &system,
            user: &user,
            mode: OutputMode::StructuredJson,
            temperature: PARSE_TEMPERATURE,
        },
        limit,
    )
    .await?;

    let mut parsed = validate_partial(&raw)?;
    dates::normalize_sections(&mut parsed, Utc::now().date_naive());

    info!(
        "Parsed section into keys: {}",
        parsed.keys().cloned().collect::<Vec<_>>().join(", ")
    );
    Ok(parsed)
}

/// Parses a whole extracted document and lays the result over a blank resume,
/// so the outcome always has the full schema shape.
pub async fn parse_document(
    llm: &dyn CompletionProvider,
    text: &str,
    limit: Duration,
) -> Result<ResumeContent, AppError> {
    let parsed = parse_section(llm, text, limit).await?;
    let mut content = ResumeContent::blank();
    content.merge(&parsed);
    Ok(content.conform())
}
