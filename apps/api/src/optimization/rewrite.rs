//! Plain-text rewrite. The result is stored as a text blob and the optimization
//! record points at it through `rewritten_resume_file`.

use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::gateway::{records, PersistenceGateway};
use crate::llm_client::prompts::fill;
use crate::llm_client::{complete_within, CompletionProvider, CompletionRequest, OutputMode};
use crate::optimization::prompts::{REWRITE_PROMPT_TEMPLATE, REWRITE_SYSTEM};

pub const REWRITE_TEMPERATURE: f32 = 0.5;
const REWRITE_CONTENT_TYPE: &str = "text/plain";

/// Caller overrides; anything omitted falls back to the stored optimization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RewriteRequest {
    #[serde(default, alias = "resumeText")]
    pub resume_text: Option<String>,
    #[serde(default)]
    pub suggestions: Option<Vec<String>>,
    #[serde(default, alias = "keywordGaps")]
    pub keyword_gaps: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RewriteOutcome {
    pub optimization_id: Uuid,
    /// Blob key stored on the optimization record.
    pub rewritten_resume_file: String,
    pub uri: String,
    pub text: String,
}

pub fn blob_key(optimization_id: Uuid) -> String {
    format!("rewritten/rewritten-resume-{optimization_id}.txt")
}

fn bullets(items: &[String]) -> String {
    items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| format!("- {s}"))
        .collect::<Vec<_>>()
        .join("\n")
}

pub async fn rewrite_free_text(
    gw: &dyn PersistenceGateway,
    llm: &dyn CompletionProvider,
    limit: Duration,
    owner: Uuid,
    optimization_id: Uuid,
    request: RewriteRequest,
) -> Result<RewriteOutcome, AppError> {
    let record = records::load_optimization(gw, optimization_id, owner)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Optimization {optimization_id} not found")))?;

    let resume_text = request
        .resume_text
        .or(record.resume_text)
        .unwrap_or_default();
    if resume_text.trim().is_empty() {
        return Err(AppError::MissingInput("resume_text is required".to_string()));
    }
    let suggestions = bullets(&request.suggestions.unwrap_or(record.suggestions));
    let keyword_gaps = bullets(&request.keyword_gaps.unwrap_or(record.keyword_gaps));
    if suggestions.is_empty() && keyword_gaps.is_empty() {
        return Err(AppError::MissingInput(
            "suggestions or keyword_gaps are required".to_string(),
        ));
    }

    let user = fill(
        REWRITE_PROMPT_TEMPLATE,
        &[
            ("suggestions", suggestions.as_str()),
            ("keyword_gaps", keyword_gaps.as_str()),
            ("resume_text", resume_text.trim()),
        ],
    );
    let raw = complete_within(
        llm,
        CompletionRequest {
            system: REWRITE_SYSTEM,
            user: &user,
            mode: OutputMode::PlainText,
            temperature: REWRITE_TEMPERATURE,
        },
        limit,
    )
    .await?;

    let text = raw.trim().to_string();
    if text.is_empty() {
        return Err(AppError::InvalidModelOutput {
            message: "rewrite returned no text".to_string(),
            raw,
        });
    }

    let key = blob_key(optimization_id);
    let uri = gw
        .put_blob(gw.bucket(), &key, Bytes::from(text.clone()), REWRITE_CONTENT_TYPE)
        .await
        .map_err(|e| AppError::from(e).with_payload(Value::String(text.clone())))?;

    let attached = records::attach_rewritten_file(gw, optimization_id, owner, &key)
        .await
        .map_err(|e| AppError::from(e).with_payload(Value::String(text.clone())))?;
    if !attached {
        return Err(AppError::NotFound(format!(
            "Optimization {optimization_id} disappeared during rewrite"
        )));
    }

    info!("Rewritten resume for optimization {optimization_id} stored at {key}");
    Ok(RewriteOutcome {
        optimization_id,
        rewritten_resume_file: key,
        uri,
        text,
    })
}
