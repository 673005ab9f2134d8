//! Onboarding CV parse.
//!
//! Flow: store the CV as a blob → point the user's onboarding draft at it →
//!       structured reading (external parser when configured, in-process
//!       extraction + parser otherwise) → save it on the draft.

mod doc_parser;
pub mod handlers;

pub use doc_parser::DocumentParserClient;

use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::extract::handlers::Upload;
use crate::extract::{extract_text, resolve_format, DocumentFormat};
use crate::gateway::{records, PersistenceGateway};
use crate::llm_client::CompletionProvider;
use crate::parser::parse_document;

#[derive(Debug, Clone, Serialize)]
pub struct OnboardingOutcome {
    pub resume_url: String,
    pub structured: Value,
}

/// Blob key for a user's CV: one new object per upload, keyed by upload time.
pub fn cv_key(owner: Uuid, format: DocumentFormat) -> String {
    format!("{owner}/{}.{}", Utc::now().timestamp_millis(), format.extension())
}

async fn read_in_process(
    llm: &dyn CompletionProvider,
    limit: Duration,
    upload: &Upload,
    format: DocumentFormat,
) -> Result<Value, AppError> {
    let text = extract_text(upload.bytes.clone(), Some(format.mime())).await?;
    if text.trim().is_empty() {
        return Err(AppError::CorruptDocument(
            "document contains no extractable text".to_string(),
        ));
    }
    Ok(parse_document(llm, &text, limit).await?.to_value())
}

pub async fn parse_cv(
    gw: &dyn PersistenceGateway,
    llm: &dyn CompletionProvider,
    doc_parser: Option<&DocumentParserClient>,
    limit: Duration,
    owner: Uuid,
    upload: Upload,
) -> Result<OnboardingOutcome, AppError> {
    let format = resolve_format(&upload.bytes, upload.content_type.as_deref())?;

    let key = cv_key(owner, format);
    let resume_url = gw
        .put_blob(gw.bucket(), &key, upload.bytes.clone(), format.mime())
        .await?;
    records::upsert_onboarding_draft(gw, owner, &resume_url).await?;
    info!("Onboarding CV for user {owner} stored at {key}");

    let structured = match doc_parser {
        Some(client) => tokio::time::timeout(limit, client.extract(&resume_url))
            .await
            .map_err(|_| AppError::UpstreamTimeout(limit))??,
        None => read_in_process(llm, limit, &upload, format).await?,
    };

    let stored = records::store_parsed_data(gw, owner, &structured)
        .await
        .map_err(|e| AppError::from(e).with_payload(structured.clone()))?;
    if !stored {
        return Err(AppError::PersistenceFailure {
            message: "Onboarding draft could not be updated".to_string(),
            payload: Some(structured),
        });
    }

    info!("Onboarding draft for user {owner} updated with parsed data");
    Ok(OnboardingOutcome {
        resume_url,
        structured,
    })
}
