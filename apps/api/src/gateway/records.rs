//! Typed access to the rows the orchestrators touch.
//!
//! Every read and write of an owned record carries the owner filter; resumes also
//! filter out soft-deleted rows, so a deleted resume is indistinguishable from a
//! missing one.

use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use super::{Filter, GatewayError, PersistenceGateway, Row, Table};
use crate::models::onboarding::OnboardingDraft;
use crate::models::optimization::{OptimizationRecord, RegeneratedResume};
use crate::models::resume::ResumeDocument;
use crate::models::user::Profile;
use crate::schema::ResumeContent;

fn to_row<T: Serialize>(record: &T) -> Result<Row, GatewayError> {
    match serde_json::to_value(record)? {
        Value::Object(row) => Ok(row),
        _ => Err(GatewayError::Decode(serde::ser::Error::custom(
            "record did not serialize to an object",
        ))),
    }
}

fn from_row<T: DeserializeOwned>(row: Row) -> Result<T, GatewayError> {
    Ok(serde_json::from_value(Value::Object(row))?)
}

fn patch(value: Value) -> Row {
    match value {
        Value::Object(row) => row,
        _ => Row::new(),
    }
}

fn owned(id: Uuid, owner: Uuid) -> [Filter; 2] {
    [Filter::eq("id", id), Filter::eq("user_id", owner)]
}

fn live_resume(id: Uuid, owner: Uuid) -> [Filter; 3] {
    let [by_id, by_owner] = owned(id, owner);
    [by_id, by_owner, Filter::IsNull("deleted_at")]
}

// ── Resumes ─────────────────────────────────────────────────────────────────

pub async fn insert_resume(
    gw: &dyn PersistenceGateway,
    resume: &ResumeDocument,
) -> Result<ResumeDocument, GatewayError> {
    from_row(gw.insert(Table::Resumes, to_row(resume)?).await?)
}

pub async fn load_resume(
    gw: &dyn PersistenceGateway,
    id: Uuid,
    owner: Uuid,
) -> Result<Option<ResumeDocument>, GatewayError> {
    gw.get(Table::Resumes, &live_resume(id, owner))
        .await?
        .map(from_row)
        .transpose()
}

/// Replaces the content (and optionally the title). Returns false when no live row matched.
pub async fn update_resume_content(
    gw: &dyn PersistenceGateway,
    id: Uuid,
    owner: Uuid,
    content: &ResumeContent,
    title: Option<&str>,
) -> Result<bool, GatewayError> {
    let mut changes = patch(json!({
        "content": content,
        "updated_at": Utc::now(),
    }));
    if let Some(title) = title {
        changes.insert("title".to_string(), Value::String(title.to_string()));
    }
    Ok(gw.update(Table::Resumes, &live_resume(id, owner), changes).await? > 0)
}

pub async fn soft_delete_resume(
    gw: &dyn PersistenceGateway,
    id: Uuid,
    owner: Uuid,
) -> Result<bool, GatewayError> {
    let now = Utc::now();
    let changes = patch(json!({ "deleted_at": now, "updated_at": now }));
    Ok(gw.update(Table::Resumes, &live_resume(id, owner), changes).await? > 0)
}

// ── Profiles ────────────────────────────────────────────────────────────────

pub async fn resolve_profile(
    gw: &dyn PersistenceGateway,
    user: Uuid,
) -> Result<Option<Profile>, GatewayError> {
    gw.get(Table::Profiles, &[Filter::eq("id", user)])
        .await?
        .map(from_row)
        .transpose()
}

// ── Optimizations ───────────────────────────────────────────────────────────

pub async fn load_optimization(
    gw: &dyn PersistenceGateway,
    id: Uuid,
    owner: Uuid,
) -> Result<Option<OptimizationRecord>, GatewayError> {
    gw.get(Table::ResumeOptimizations, &owned(id, owner))
        .await?
        .map(from_row)
        .transpose()
}

pub async fn attach_rewritten_file(
    gw: &dyn PersistenceGateway,
    id: Uuid,
    owner: Uuid,
    blob_key: &str,
) -> Result<bool, GatewayError> {
    let changes = patch(json!({ "rewritten_resume_file": blob_key }));
    Ok(gw
        .update(Table::ResumeOptimizations, &owned(id, owner), changes)
        .await?
        > 0)
}

pub async fn insert_regenerated(
    gw: &dyn PersistenceGateway,
    record: &RegeneratedResume,
) -> Result<RegeneratedResume, GatewayError> {
    from_row(gw.insert(Table::RegeneratedResumes, to_row(record)?).await?)
}

pub async fn load_regenerated(
    gw: &dyn PersistenceGateway,
    id: Uuid,
    owner: Uuid,
) -> Result<Option<RegeneratedResume>, GatewayError> {
    gw.get(Table::RegeneratedResumes, &owned(id, owner))
        .await?
        .map(from_row)
        .transpose()
}

// ── Onboarding ──────────────────────────────────────────────────────────────

/// Creates or refreshes the user's draft with a new CV location.
pub async fn upsert_onboarding_draft(
    gw: &dyn PersistenceGateway,
    user: Uuid,
    resume_url: &str,
) -> Result<OnboardingDraft, GatewayError> {
    let row = patch(json!({
        "id": user,
        "resume_url": resume_url,
        "updated_at": Utc::now(),
    }));
    from_row(gw.upsert(Table::OnboardingDrafts, row).await?)
}

pub async fn store_parsed_data(
    gw: &dyn PersistenceGateway,
    user: Uuid,
    parsed: &Value,
) -> Result<bool, GatewayError> {
    let changes = patch(json!({ "parsed_data": parsed, "updated_at": Utc::now() }));
    Ok(gw
        .update(Table::OnboardingDrafts, &[Filter::eq("id", user)], changes)
        .await?
        > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::memory::MemoryGateway;
    use crate::models::resume::SourceType;
    use crate::schema::sample_resume;

    fn content() -> ResumeContent {
        serde_json::from_value(sample_resume()).unwrap()
    }

    #[tokio::test]
    async fn test_saved_content_reloads_byte_identical() {
        let gw = MemoryGateway::new();
        let owner = Uuid::new_v4();
        let resume = ResumeDocument::new(owner, "Backend", content(), SourceType::Prompt);

        insert_resume(&gw, &resume).await.unwrap();
        let loaded = load_resume(&gw, resume.id, owner).await.unwrap().unwrap();

        assert_eq!(
            serde_json::to_vec(&loaded.content).unwrap(),
            serde_json::to_vec(&resume.content).unwrap()
        );
        assert_eq!(loaded, resume);
    }

    #[tokio::test]
    async fn test_other_owner_cannot_see_resume() {
        let gw = MemoryGateway::new();
        let owner = Uuid::new_v4();
        let resume = ResumeDocument::new(owner, "Mine", ResumeContent::blank(), SourceType::Blank);
        insert_resume(&gw, &resume).await.unwrap();

        let stranger = Uuid::new_v4();
        assert!(load_resume(&gw, resume.id, stranger).await.unwrap().is_none());
        assert!(!soft_delete_resume(&gw, resume.id, stranger).await.unwrap());
    }

    #[tokio::test]
    async fn test_soft_deleted_resume_is_invisible_but_kept() {
        let gw = MemoryGateway::new();
        let owner = Uuid::new_v4();
        let resume = ResumeDocument::new(owner, "Old", ResumeContent::blank(), SourceType::Blank);
        insert_resume(&gw, &resume).await.unwrap();

        assert!(soft_delete_resume(&gw, resume.id, owner).await.unwrap());
        assert!(load_resume(&gw, resume.id, owner).await.unwrap().is_none());
        assert!(!soft_delete_resume(&gw, resume.id, owner).await.unwrap());
        assert_eq!(gw.rows(Table::Resumes).len(), 1);
    }

    #[tokio::test]
    async fn test_onboarding_draft_upsert_then_parsed_data() {
        let gw = MemoryGateway::new();
        let user = Uuid::new_v4();

        upsert_onboarding_draft(&gw, user, "memory://resumes/a.pdf").await.unwrap();
        let draft = upsert_onboarding_draft(&gw, user, "memory://resumes/b.pdf")
            .await
            .unwrap();
        assert_eq!(draft.resume_url.as_deref(), Some("memory://resumes/b.pdf"));

        assert!(store_parsed_data(&gw, user, &json!({"basic_info": {}})).await.unwrap());
        let rows = gw.rows(Table::OnboardingDrafts);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["parsed_data"], json!({"basic_info": {}}));
    }
}
