use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// One in-progress onboarding per user; `id` is the user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnboardingDraft {
    pub id: Uuid,
    pub resume_url: Option<String>,
    pub parsed_data: Option<Value>,
    pub updated_at: Option<DateTime<Utc>>,
}
