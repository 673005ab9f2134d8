//! Resume Generation: builds a complete resume from a free-form prompt, or
//! tailors an existing CV document to a target job.
//!
//! Prompt flow: validate inputs → resolve profile (best effort) → compose prompt →
//!       LLM generate → validate complete resume → normalize dates → persist.
//!
//! Document flow: validate inputs → extract text → compose prompt → LLM tailor →
//!       validate → normalize dates → store original → persist.
//!
//! Nothing is written unless generation and validation both succeed. A failed
//! save returns the generated content so the caller can retry only the save.

use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::gateway::{records, PersistenceGateway};
use crate::extract::handlers::Upload;
use crate::extract::{extract_text, resolve_format};
use crate::generation::prompts::{
    GENERATION_SYSTEM, GENERATION_USER_TEMPLATE, IDENTITY_PROMPT_TEMPLATE, TAILOR_SYSTEM,
    TAILOR_USER_TEMPLATE,
};
use crate::llm_client::prompts::{fill, DATE_RULES, RESUME_SCHEMA};
use crate::llm_client::{complete_within, CompletionProvider, CompletionRequest, OutputMode};
use crate::models::resume::{ResumeDocument, SourceType};
use crate::schema::{dates, validate_complete, validate_partial, ResumeContent};

pub const GENERATION_TEMPERATURE: f32 = 0.3;

/// Request body for prompt-based generation. Accepts the camelCase names the
/// web client sends as well.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub prompt: String,
    #[serde(default, alias = "jobTitle")]
    pub job_title: String,
    #[serde(default, alias = "jobDescription")]
    pub job_description: String,
}

/// Target job for tailoring an uploaded or linked CV.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TailorRequest {
    #[serde(default, alias = "jobTitle")]
    pub job_title: String,
    #[serde(default, alias = "jobDescription")]
    pub job_description: String,
}

fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::MissingInput(format!("{field} is required")));
    }
    Ok(value)
}

/// Display name and email for the prompt. Never fails: an unresolvable profile
/// degrades to empty strings.
async fn resolve_identity(gw: &dyn PersistenceGateway, owner: Uuid) -> (String, String) {
    match records::resolve_profile(gw, owner).await {
        Ok(Some(profile)) => (
            profile.full_name.unwrap_or_default(),
            profile.email.unwrap_or_default(),
        ),
        Ok(None) => {
            warn!("No profile for user {owner}; generating without name/email");
            (String::new(), String::new())
        }
        Err(e) => {
            warn!("Profile lookup failed for user {owner}: {e}; generating without name/email");
            (String::new(), String::new())
        }
    }
}

/// Generates, validates and stores a resume with `source_type = prompt`.
pub async fn generate_from_prompt(
    gw: &dyn PersistenceGateway,
    llm: &dyn CompletionProvider,
    limit: Duration,
    owner: Uuid,
    request: &GenerateRequest,
) -> Result<ResumeDocument, AppError> {
    let prompt = required("prompt", &request.prompt)?;
    let job_title = required("jobTitle", &request.job_title)?;
    let job_description = required("jobDescription", &request.job_description)?;
    if owner.is_nil() {
        return Err(AppError::MissingInput("user identity is required".to_string()));
    }

    let (name, email) = resolve_identity(gw, owner).await;
    let identity_prompt = fill(
        IDENTITY_PROMPT_TEMPLATE,
        &[("name", name.as_str()), ("email", email.as_str()), ("prompt", prompt)],
    );
    let system = fill(
        GENERATION_SYSTEM,
        &[("schema", RESUME_SCHEMA), ("date_rules", DATE_RULES)],
    );
    let user = fill(
        GENERATION_USER_TEMPLATE,
        &[
            ("job_title", job_title),
            ("job_description", job_description),
            ("identity_prompt", identity_prompt.as_str()),
        ],
    );

    info!("Generating resume for user {owner} (target: {job_title})");
    let raw = complete_within(
        llm,
        CompletionRequest {
            system: &system,
            user: &user,
            mode: OutputMode::StructuredJson,
            temperature: GENERATION_TEMPERATURE,
        },
        limit,
    )
    .await?;

    let mut content = validate_complete(&raw)?;
    dates::normalize_sections(content.as_map_mut(), Utc::now().date_naive());

    let mut resume = ResumeDocument::new(owner, job_title, content, SourceType::Prompt);
    resume.target_title = Some(job_title.to_string());
    resume.target_description = Some(job_description.to_string());
    resume.ai_prompt = Some(prompt.to_string());

    let saved = records::insert_resume(gw, &resume)
        .await
        .map_err(|e| AppError::from(e).with_payload(resume.content.to_value()))?;

    info!("Generated resume {} saved for user {owner}", saved.id);
    Ok(saved)
}

/// Tailors the CV in `source` to a target job and stores the result with
/// `source_type = upload`. The original file is kept in blob storage and linked
/// from `source_file`.
pub async fn generate_from_document(
    gw: &dyn PersistenceGateway,
    llm: &dyn CompletionProvider,
    limit: Duration,
    owner: Uuid,
    source: Upload,
    request: &TailorRequest,
) -> Result<ResumeDocument, AppError> {
    let job_title = required("jobTitle", &request.job_title)?;
    let job_description = required("jobDescription", &request.job_description)?;
    if owner.is_nil() {
        return Err(AppError::MissingInput("user identity is required".to_string()));
    }

    let format = resolve_format(&source.bytes, source.content_type.as_deref())?;
    let text = extract_text(source.bytes.clone(), Some(format.mime())).await?;
    if text.trim().is_empty() {
        return Err(AppError::CorruptDocument(
            "document contains no extractable text".to_string(),
        ));
    }

    let system = fill(
        TAILOR_SYSTEM,
        &[("schema", RESUME_SCHEMA), ("date_rules", DATE_RULES)],
    );
    let user = fill(
        TAILOR_USER_TEMPLATE,
        &[
            ("resume_text", text.trim()),
            ("job_title", job_title),
            ("job_description", job_description),
        ],
    );

    info!("Tailoring {format:?} resume for user {owner} (target: {job_title})");
    let raw = complete_within(
        llm,
        CompletionRequest {
            system: &system,
            user: &user,
            mode: OutputMode::StructuredJson,
            temperature: GENERATION_TEMPERATURE,
        },
        limit,
    )
    .await?;

    let mut parsed = validate_partial(&raw)?;
    dates::normalize_sections(&mut parsed, Utc::now().date_naive());
    let mut content = ResumeContent::blank();
    content.merge(&parsed);

    let key = format!("{owner}/{}.{}", Uuid::new_v4(), format.extension());
    let source_file = gw
        .put_blob(gw.bucket(), &key, source.bytes.clone(), format.mime())
        .await
        .map_err(|e| AppError::from(e).with_payload(content.to_value()))?;

    let mut resume = ResumeDocument::new(owner, job_title, content, SourceType::Upload);
    resume.target_title = Some(job_title.to_string());
    resume.target_description = Some(job_description.to_string());
    resume.source_file = Some(source_file);

    let saved = records::insert_resume(gw, &resume)
        .await
        .map_err(|e| AppError::from(e).with_payload(resume.content.to_value()))?;

    info!("Tailored resume {} saved for user {owner}", saved.id);
    Ok(saved)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use bytes::Bytes;
    use serde_json::json;

    use super::*;
    use crate::extract::{build_docx, DOCX_MIME};
    use crate::gateway::memory::MemoryGateway;
    use crate::gateway::Table;
    use crate::llm_client::testing::ScriptedProvider;
    use crate::schema::sample_resume;

    const LIMIT: Duration = Duration::from_secs(60);

    fn request() -> GenerateRequest {
        GenerateRequest {
            prompt: "Senior backend engineer, fintech".to_string(),
            job_title: "Backend Engineer".to_string(),
            job_description: "Build and operate payment APIs in Rust.".to_string(),
        }
    }

    async fn gateway_with_profile(owner: Uuid) -> MemoryGateway {
        let gw = MemoryGateway::new();
        let profile = json!({"id": owner, "full_name": "Jane Doe", "email": "jane@x.com"});
        gw.insert(Table::Profiles, profile.as_object().cloned().unwrap())
            .await
            .unwrap();
        gw
    }

    #[tokio::test]
    async fn test_generation_persists_prompt_resume() {
        let owner = Uuid::new_v4();
        let gw = gateway_with_profile(owner).await;
        let llm = ScriptedProvider::replying(&[sample_resume().to_string().as_str()]);

        let resume = generate_from_prompt(&gw, &llm, LIMIT, owner, &request())
            .await
            .unwrap();

        assert_eq!(resume.source_type, SourceType::Prompt);
        assert_eq!(resume.user_id, owner);
        assert!(!resume.content.get("experience").unwrap().as_array().unwrap().is_empty());
        assert_eq!(resume.target_title.as_deref(), Some("Backend Engineer"));
        assert_eq!(resume.ai_prompt.as_deref(), Some("Senior backend engineer, fintech"));
        assert_eq!(gw.rows(Table::Resumes).len(), 1);

        let requests = llm.requests();
        let sent = &requests[0];
        assert!(sent.user.contains("Name: Jane Doe\nEmail: jane@x.com"));
        assert!(sent.user.contains("Target Job Title: Backend Engineer"));
        assert_eq!(sent.mode, OutputMode::StructuredJson);
        assert!((sent.temperature - GENERATION_TEMPERATURE).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn test_generated_dates_are_normalized() {
        let owner = Uuid::new_v4();
        let gw = gateway_with_profile(owner).await;
        let llm = ScriptedProvider::replying(&[sample_resume().to_string().as_str()]);

        let resume = generate_from_prompt(&gw, &llm, LIMIT, owner, &request())
            .await
            .unwrap();

        let job = &resume.content.get("experience").unwrap()[0];
        assert_eq!(job["start_date"], "Jan 2019");
        assert_eq!(job["end_date"], "Dec 2023");
        assert_eq!(job["duration"], "5 yrs");
    }

    #[tokio::test]
    async fn test_missing_job_title_makes_no_call() {
        let gw = MemoryGateway::new();
        let llm = ScriptedProvider::replying(&[sample_resume().to_string().as_str()]);
        let request = GenerateRequest {
            job_title: String::new(),
            ..request()
        };

        let err = generate_from_prompt(&gw, &llm, LIMIT, Uuid::new_v4(), &request)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "MISSING_INPUT");
        assert_eq!(llm.call_count(), 0);
        assert!(gw.rows(Table::Resumes).is_empty());
    }

    #[tokio::test]
    async fn test_non_json_reply_is_invalid_output_with_raw_text() {
        let owner = Uuid::new_v4();
        let gw = gateway_with_profile(owner).await;
        let llm = ScriptedProvider::replying(&["not json"]);

        let err = generate_from_prompt(&gw, &llm, LIMIT, owner, &request())
            .await
            .unwrap_err();

        match err {
            AppError::InvalidModelOutput { raw, .. } => assert_eq!(raw, "not json"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(gw.rows(Table::Resumes).is_empty());
    }

    #[tokio::test]
    async fn test_unknown_profile_degrades_to_blank_identity() {
        let gw = MemoryGateway::new();
        let llm = ScriptedProvider::replying(&[sample_resume().to_string().as_str()]);

        generate_from_prompt(&gw, &llm, LIMIT, Uuid::new_v4(), &request())
            .await
            .unwrap();

        assert!(llm.requests()[0].user.contains("Name: \nEmail: \n"));
    }

    #[tokio::test]
    async fn test_failed_save_returns_generated_payload() {
        let owner = Uuid::new_v4();
        let gw = gateway_with_profile(owner).await;
        gw.fail_writes();
        let llm = ScriptedProvider::replying(&[sample_resume().to_string().as_str()]);

        let err = generate_from_prompt(&gw, &llm, LIMIT, owner, &request())
            .await
            .unwrap_err();

        match err {
            AppError::PersistenceFailure { payload: Some(payload), .. } => {
                assert_eq!(payload["basic_info"]["name"], "Jane Doe");
                assert_eq!(payload["experience"][0]["company"], "Ledgerly");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_upstream_times_out_without_saving() {
        let owner = Uuid::new_v4();
        let gw = gateway_with_profile(owner).await;
        let llm = ScriptedProvider::replying(&[sample_resume().to_string().as_str()])
            .delayed(Duration::from_secs(120));

        let err = generate_from_prompt(&gw, &llm, LIMIT, owner, &request())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "UPSTREAM_TIMEOUT");
        assert!(gw.rows(Table::Resumes).is_empty());
    }

    #[tokio::test]
    async fn test_placeholder_text_in_user_input_is_sent_verbatim() {
        let owner = Uuid::new_v4();
        let gw = gateway_with_profile(owner).await;
        let llm = ScriptedProvider::replying(&[sample_resume().to_string().as_str()]);
        let request = GenerateRequest {
            prompt: "Mentions {job_title} literally".to_string(),
            job_title: "Engineer {identity_prompt}".to_string(),
            ..request()
        };

        generate_from_prompt(&gw, &llm, LIMIT, owner, &request)
            .await
            .unwrap();

        let requests = llm.requests();
        let sent = &requests[0].user;
        assert!(sent.contains("Mentions {job_title} literally"));
        assert!(sent.contains("Target Job Title: Engineer {identity_prompt}"));
        assert_eq!(sent.matches("Name: Jane Doe").count(), 1);
    }

    fn cv() -> Upload {
        Upload {
            bytes: Bytes::from(build_docx(&[&["Jane Doe"], &["Ledgerly, Backend Engineer"]])),
            content_type: Some(DOCX_MIME.to_string()),
            file_name: Some("cv.docx".to_string()),
            fields: HashMap::new(),
        }
    }

    fn target() -> TailorRequest {
        TailorRequest {
            job_title: "Staff Engineer".to_string(),
            job_description: "Lead the payments platform.".to_string(),
        }
    }

    #[tokio::test]
    async fn test_document_is_tailored_and_stored_with_original() {
        let gw = MemoryGateway::new();
        let owner = Uuid::new_v4();
        let llm = ScriptedProvider::replying(&[
            r#"{"basic_info": {"name": "Jane Doe"}, "experience": [{"company": "Ledgerly", "start_date": "2019-01", "end_date": "2023-12"}]}"#,
        ]);

        let resume = generate_from_document(&gw, &llm, LIMIT, owner, cv(), &target())
            .await
            .unwrap();

        assert_eq!(resume.source_type, SourceType::Upload);
        assert_eq!(resume.title, "Staff Engineer");
        assert_eq!(resume.target_title.as_deref(), Some("Staff Engineer"));
        assert_eq!(
            resume.target_description.as_deref(),
            Some("Lead the payments platform.")
        );
        let source_file = resume.source_file.as_deref().unwrap();
        assert!(source_file.starts_with(&format!("memory://resumes/{owner}/")));
        assert!(source_file.ends_with(".docx"));

        let job = &resume.content.get("experience").unwrap()[0];
        assert_eq!(job["start_date"], "Jan 2019");
        assert_eq!(job["end_date"], "Dec 2023");
        assert_eq!(resume.content.get("awards"), Some(&json!([])));
        assert_eq!(gw.rows(Table::Resumes).len(), 1);

        let requests = llm.requests();
        let sent = &requests[0].user;
        assert!(sent.contains("Ledgerly, Backend Engineer"));
        assert!(sent.contains("Target Job Title: Staff Engineer"));
    }

    #[tokio::test]
    async fn test_document_without_job_description_makes_no_call() {
        let gw = MemoryGateway::new();
        let llm = ScriptedProvider::replying(&[sample_resume().to_string().as_str()]);
        let request = TailorRequest {
            job_description: "  ".to_string(),
            ..target()
        };

        let err = generate_from_document(&gw, &llm, LIMIT, Uuid::new_v4(), cv(), &request)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "MISSING_INPUT");
        assert_eq!(llm.call_count(), 0);
        assert!(gw.rows(Table::Resumes).is_empty());
    }

    #[tokio::test]
    async fn test_unrecognized_document_makes_no_call() {
        let gw = MemoryGateway::new();
        let llm = ScriptedProvider::replying(&[sample_resume().to_string().as_str()]);
        let source = Upload {
            bytes: Bytes::from_static(b"GIF89a...."),
            content_type: None,
            ..cv()
        };

        let err = generate_from_document(&gw, &llm, LIMIT, Uuid::new_v4(), source, &target())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "UNSUPPORTED_FORMAT");
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_document_tailoring_surfaces_invalid_output() {
        let gw = MemoryGateway::new();
        let llm = ScriptedProvider::replying(&["I cannot do that."]);

        let err = generate_from_document(&gw, &llm, LIMIT, Uuid::new_v4(), cv(), &target())
            .await
            .unwrap_err();

        match err {
            AppError::InvalidModelOutput { raw, .. } => assert_eq!(raw, "I cannot do that."),
            other => panic!("unexpected {other:?}"),
        }
        assert!(gw.rows(Table::Resumes).is_empty());
    }

    #[tokio::test]
    async fn test_failed_document_save_returns_tailored_payload() {
        let gw = MemoryGateway::new();
        gw.fail_writes();
        let llm = ScriptedProvider::replying(&[r#"{"basic_info": {"name": "Jane Doe"}}"#]);

        let err = generate_from_document(&gw, &llm, LIMIT, Uuid::new_v4(), cv(), &target())
            .await
            .unwrap_err();

        match err {
            AppError::PersistenceFailure { payload: Some(payload), .. } => {
                assert_eq!(payload["basic_info"]["name"], "Jane Doe");
                assert_eq!(payload["experience"], json!([]));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
