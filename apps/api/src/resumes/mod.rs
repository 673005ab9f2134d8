//! Resume lifecycle: blank creation, creation from an uploaded file, fetch,
//! content replacement and soft delete.
//!
//! Content is conformed to the resume schema on every write, so a stored
//! resume always carries every recognized key.

pub mod handlers;

use std::time::Duration;

use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::extract::handlers::Upload;
use crate::extract::{extract_text, resolve_format};
use crate::gateway::{records, PersistenceGateway};
use crate::llm_client::CompletionProvider;
use crate::models::resume::{ResumeDocument, SourceType};
use crate::parser::parse_document;
use crate::schema::ResumeContent;

pub const BLANK_TITLE: &str = "Untitled Resume";
pub const UPLOAD_TITLE: &str = "Uploaded Resume";

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Resume {id} not found"))
}

fn chosen_title(title: Option<&str>, fallback: &str) -> String {
    title
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

/// Stores a resume with every section present and empty.
pub async fn create_blank(
    gw: &dyn PersistenceGateway,
    owner: Uuid,
    title: Option<&str>,
) -> Result<ResumeDocument, AppError> {
    let resume = ResumeDocument::new(
        owner,
        chosen_title(title, BLANK_TITLE),
        ResumeContent::blank(),
        SourceType::Blank,
    );
    let saved = records::insert_resume(gw, &resume).await?;
    info!("Blank resume {} created for user {owner}", saved.id);
    Ok(saved)
}

/// Extracts, parses and stores an uploaded resume, keeping the original file as a blob.
///
/// The blob is written only after parsing succeeds.
pub async fn create_from_upload(
    gw: &dyn PersistenceGateway,
    llm: &dyn CompletionProvider,
    limit: Duration,
    owner: Uuid,
    upload: Upload,
) -> Result<ResumeDocument, AppError> {
    let format = resolve_format(&upload.bytes, upload.content_type.as_deref())?;
    let text = extract_text(upload.bytes.clone(), Some(format.mime())).await?;
    if text.trim().is_empty() {
        return Err(AppError::CorruptDocument(
            "document contains no extractable text".to_string(),
        ));
    }

    let content = parse_document(llm, &text, limit).await?;

    let key = format!("{owner}/{}.{}", Uuid::new_v4(), format.extension());
    let source_file = gw
        .put_blob(gw.bucket(), &key, upload.bytes.clone(), format.mime())
        .await
        .map_err(|e| AppError::from(e).with_payload(content.to_value()))?;

    let title = upload
        .fields
        .get("title")
        .map(String::as_str)
        .or_else(|| upload.stem());
    let mut resume = ResumeDocument::new(
        owner,
        chosen_title(title, UPLOAD_TITLE),
        content,
        SourceType::Upload,
    );
    resume.source_file = Some(source_file);

    let saved = records::insert_resume(gw, &resume)
        .await
        .map_err(|e| AppError::from(e).with_payload(resume.content.to_value()))?;
    info!("Uploaded resume {} ({:?}) stored for user {owner}", saved.id, format);
    Ok(saved)
}

pub async fn get(
    gw: &dyn PersistenceGateway,
    owner: Uuid,
    id: Uuid,
) -> Result<ResumeDocument, AppError> {
    records::load_resume(gw, id, owner)
        .await?
        .ok_or_else(|| not_found(id))
}

/// Replaces the content of a live resume. `content` must be a JSON object; unknown
/// keys are kept, missing ones are filled with empty defaults.
pub async fn update_content(
    gw: &dyn PersistenceGateway,
    owner: Uuid,
    id: Uuid,
    content: Value,
    title: Option<&str>,
) -> Result<ResumeDocument, AppError> {
    let Value::Object(map) = content else {
        return Err(AppError::MissingInput(
            "content must be a JSON object".to_string(),
        ));
    };
    let content = ResumeContent::from_map(map).conform();
    let title = title.map(str::trim).filter(|t| !t.is_empty());

    if !records::update_resume_content(gw, id, owner, &content, title).await? {
        return Err(not_found(id));
    }
    get(gw, owner, id).await
}

/// Soft delete: the row stays but every read treats it as missing.
pub async fn delete(gw: &dyn PersistenceGateway, owner: Uuid, id: Uuid) -> Result<(), AppError> {
    if !records::soft_delete_resume(gw, id, owner).await? {
        return Err(not_found(id));
    }
    info!("Resume {id} soft-deleted for user {owner}");
    Ok(())
}
