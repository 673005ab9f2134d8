use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::schema::ResumeContent;

/// How a resume came into existence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Blank,
    Upload,
    Prompt,
}

/// A row of `resumes`. `content` always has the full schema shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeDocument {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: ResumeContent,
    pub source_type: SourceType,
    pub target_title: Option<String>,
    pub target_description: Option<String>,
    pub ai_prompt: Option<String>,
    /// Public URI of the uploaded original, for `upload` resumes.
    pub source_file: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ResumeDocument {
    /// A fresh, unsaved document owned by `user_id`.
    pub fn new(
        user_id: Uuid,
        title: impl Into<String>,
        content: ResumeContent,
        source_type: SourceType,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: title.into(),
            content: content.conform(),
            source_type,
            target_title: None,
            target_description: None,
            ai_prompt: None,
            source_file: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}
