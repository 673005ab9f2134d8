//! Structured regeneration: optimization record → complete resume with no empty section.

use std::time::Duration;

use chrono::Utc;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::gateway::{records, PersistenceGateway};
use crate::llm_client::prompts::{fill, DATE_RULES, RESUME_SCHEMA};
use crate::llm_client::{complete_within, CompletionProvider, CompletionRequest, OutputMode};
use crate::models::optimization::{OptimizationRecord, RegeneratedResume, RegenerationStatus};
use crate::optimization::lock::{lock_key, RegenerationLock};
use crate::optimization::prompts::{REGENERATE_PROMPT_TEMPLATE, REGENERATE_SYSTEM};
use crate::schema::{dates, validate_complete};

pub const REGENERATION_TEMPERATURE: f32 = 0.3;

fn pretty(value: &impl serde::Serialize) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "[]".to_string())
}

/// The resume the model rewrites: the stored structure, else the stored text.
fn source_resume(record: &OptimizationRecord) -> Value {
    match (&record.structured_resume, &record.resume_text) {
        (Some(structured), _) if !structured.is_null() => structured.clone(),
        (_, Some(text)) => Value::String(text.clone()),
        _ => Value::Object(Default::default()),
    }
}

fn build_prompt(record: &OptimizationRecord) -> String {
    fill(
        REGENERATE_PROMPT_TEMPLATE,
        &[
            ("suggestions", pretty(&record.suggestions).as_str()),
            ("keyword_gaps", pretty(&record.keyword_gaps).as_str()),
            ("resume", pretty(&source_resume(record)).as_str()),
        ],
    )
}

/// Regenerates the resume behind `optimization_id` for its owner.
///
/// Only one regeneration per optimization runs at a time; a second request gets
/// `Conflict` instead of racing the first.
pub async fn regenerate(
    gw: &dyn PersistenceGateway,
    llm: &dyn CompletionProvider,
    locks: &dyn RegenerationLock,
    limit: Duration,
    owner: Uuid,
    optimization_id: Uuid,
) -> Result<RegeneratedResume, AppError> {
    let record = records::load_optimization(gw, optimization_id, owner)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Optimization {optimization_id} not found")))?;

    let _lease = locks
        .try_acquire(&lock_key(optimization_id))
        .await?
        .ok_or_else(|| {
            AppError::Conflict(format!(
                "A regeneration for optimization {optimization_id} is already running"
            ))
        })?;

    info!(
        "Regenerating optimization {optimization_id} ({} suggestions, {} keyword gaps)",
        record.suggestions.len(),
        record.keyword_gaps.len()
    );

    let system = fill(
        REGENERATE_SYSTEM,
        &[("schema", RESUME_SCHEMA), ("date_rules", DATE_RULES)],
    );
    let user = build_prompt(&record);
    let raw = complete_within(
        llm,
        CompletionRequest {
            system: &system,
            user: &user,
            mode: OutputMode::StructuredJson,
            temperature: REGENERATION_TEMPERATURE,
        },
        limit,
    )
    .await?;

    let mut content = validate_complete(&raw)?;
    dates::normalize_sections(content.as_map_mut(), Utc::now().date_naive());

    let regenerated = RegeneratedResume {
        id: Uuid::new_v4(),
        user_id: record.user_id,
        optimization_id,
        regenerated_resume: content.to_value(),
        status: RegenerationStatus::Completed,
        created_at: Utc::now(),
    };
    let saved = records::insert_regenerated(gw, &regenerated)
        .await
        .map_err(|e| AppError::from(e).with_payload(regenerated.regenerated_resume.clone()))?;

    info!("Regenerated resume {} stored for optimization {optimization_id}", saved.id);
    Ok(saved)
}
