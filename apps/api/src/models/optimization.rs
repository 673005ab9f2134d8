use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Output of the optimization analysis step; consumed by regeneration and rewrite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub job_description: Option<String>,
    pub score: Option<f64>,
    pub resume_text: Option<String>,
    pub structured_resume: Option<Value>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub suggestions: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub keyword_gaps: Vec<String>,
    /// Blob key of the plain-text rewrite, once one exists.
    pub rewritten_resume_file: Option<String>,
    pub status: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegenerationStatus {
    Pending,
    Completed,
    Failed,
}

/// A row of `regenerated_resumes`. Immutable once `completed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegeneratedResume {
    pub id: Uuid,
    pub user_id: Uuid,
    pub optimization_id: Uuid,
    pub regenerated_resume: Value,
    pub status: RegenerationStatus,
    pub created_at: DateTime<Utc>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_lists_decode_as_empty() {
        let record: OptimizationRecord = serde_json::from_value(json!({
            "id": "6c1b7a4e-3f0e-4a57-9a55-1f6f4b7f0c11",
            "user_id": "0b0c3c43-57d8-4a43-8e0a-7f5f9f3f2a10",
            "job_description": null,
            "score": 71.5,
            "resume_text": "Jane Doe",
            "structured_resume": null,
            "suggestions": null,
            "rewritten_resume_file": null,
            "status": "completed",
            "created_at": "2024-06-15T10:00:00+00:00"
        }))
        .unwrap();
        assert!(record.suggestions.is_empty());
        assert!(record.keyword_gaps.is_empty());
    }
}
