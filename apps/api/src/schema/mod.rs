//! Resume Schema: the structured JSON contract passed across every boundary.
//!
//! Two validation levels:
//! - partial: a section parse must carry at least one recognized top-level key;
//! - complete: a generation/regeneration result must populate all nine sections.

pub mod dates;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::error;

use crate::errors::AppError;
use crate::llm_client::strip_json_fences;

/// Every top-level key the schema recognizes.
pub const RECOGNIZED_KEYS: [&str; 11] = [
    "basic_info",
    "education",
    "experience",
    "skills",
    "certifications",
    "projects",
    "awards",
    "publications",
    "volunteer",
    "linkedin_url",
    "portfolio_url",
];

/// The nine content sections. `linkedin_url`/`portfolio_url` are scalars, not sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResumeSection {
    BasicInfo,
    Education,
    Experience,
    Skills,
    Certifications,
    Projects,
    Awards,
    Publications,
    Volunteer,
}

impl ResumeSection {
    pub const ALL: [ResumeSection; 9] = [
        ResumeSection::BasicInfo,
        ResumeSection::Education,
        ResumeSection::Experience,
        ResumeSection::Skills,
        ResumeSection::Certifications,
        ResumeSection::Projects,
        ResumeSection::Awards,
        ResumeSection::Publications,
        ResumeSection::Volunteer,
    ];

    /// Sections stored as ordered sequences of entries.
    pub const SEQUENCES: [ResumeSection; 7] = [
        ResumeSection::Education,
        ResumeSection::Experience,
        ResumeSection::Certifications,
        ResumeSection::Projects,
        ResumeSection::Awards,
        ResumeSection::Publications,
        ResumeSection::Volunteer,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ResumeSection::BasicInfo => "basic_info",
            ResumeSection::Education => "education",
            ResumeSection::Experience => "experience",
            ResumeSection::Skills => "skills",
            ResumeSection::Certifications => "certifications",
            ResumeSection::Projects => "projects",
            ResumeSection::Awards => "awards",
            ResumeSection::Publications => "publications",
            ResumeSection::Volunteer => "volunteer",
        }
    }

    fn empty_value(self) -> Value {
        match self {
            ResumeSection::BasicInfo | ResumeSection::Skills => Value::Object(Map::new()),
            _ => Value::Array(Vec::new()),
        }
    }

    /// True when the section carries at least one entry.
    ///
    /// `basic_info` needs one non-blank field; `skills` needs one non-empty category.
    pub fn is_populated(self, value: Option<&Value>) -> bool {
        match (self, value) {
            (_, None) => false,
            (ResumeSection::BasicInfo, Some(Value::Object(fields))) => {
                fields.values().any(has_content)
            }
            (ResumeSection::Skills, Some(Value::Object(categories))) => {
                categories.values().any(has_content)
            }
            // Some models return skills as a flat list.
            (ResumeSection::Skills, Some(Value::Array(items))) => items.iter().any(has_content),
            (_, Some(Value::Array(entries))) => entries.iter().any(has_content),
            _ => false,
        }
    }
}

fn has_content(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => items.iter().any(has_content),
        Value::Object(fields) => fields.values().any(has_content),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

/// A resume document body. Always an object; extra keys from the model are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResumeContent(Map<String, Value>);

impl ResumeContent {
    /// Every section present and empty.
    pub fn blank() -> Self {
        Self::default().conform()
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Fills missing keys (and `null` sections) with empty collections so the
    /// document always has the full schema shape.
    pub fn conform(mut self) -> Self {
        for section in ResumeSection::ALL {
            let slot = self.0.entry(section.key()).or_insert(Value::Null);
            if slot.is_null() {
                *slot = section.empty_value();
            }
        }
        for key in ["linkedin_url", "portfolio_url"] {
            let slot = self.0.entry(key).or_insert(Value::Null);
            if slot.is_null() {
                *slot = Value::String(String::new());
            }
        }
        self
    }

    /// Overlays the recognized keys of a partial parse.
    pub fn merge(&mut self, partial: &Map<String, Value>) {
        for key in RECOGNIZED_KEYS {
            if let Some(value) = partial.get(key) {
                self.0.insert(key.to_string(), value.clone());
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn as_map_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.0
    }

    /// Sections that are missing or have no entries.
    pub fn empty_sections(&self) -> Vec<ResumeSection> {
        ResumeSection::ALL
            .into_iter()
            .filter(|s| !s.is_populated(self.0.get(s.key())))
            .collect()
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

/// True when the object carries at least one recognized top-level key.
pub fn has_recognized_key(map: &Map<String, Value>) -> bool {
    RECOGNIZED_KEYS.iter().any(|k| map.contains_key(*k))
}

fn invalid(message: impl Into<String>, raw: &str) -> AppError {
    let message = message.into();
    error!("{message}; raw model response: {raw}");
    AppError::InvalidModelOutput {
        message,
        raw: raw.to_string(),
    }
}

/// Parses model output into a JSON object.
///
/// Code fences are stripped; if the text is prose-wrapped, the span from the first
/// `{` to the last `}` is tried before giving up.
pub fn parse_model_object(raw: &str) -> Result<Map<String, Value>, AppError> {
    let text = strip_json_fences(raw);
    let parsed = serde_json::from_str::<Value>(text).or_else(|first_err| {
        match (text.find('{'), text.rfind('}')) {
            (Some(start), Some(end)) if start < end => {
                serde_json::from_str::<Value>(&text[start..=end]).map_err(|_| first_err)
            }
            _ => Err(first_err),
        }
    });

    match parsed {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(invalid("model output is not a JSON object", raw)),
        Err(e) => Err(invalid(format!("model output is not valid JSON: {e}"), raw)),
    }
}

/// Partial validation: at least one recognized top-level key.
pub fn validate_partial(raw: &str) -> Result<Map<String, Value>, AppError> {
    let map = parse_model_object(raw)?;
    if !has_recognized_key(&map) {
        return Err(invalid(
            "model output does not contain any resume section key",
            raw,
        ));
    }
    Ok(map)
}

/// Complete validation: every one of the nine sections has at least one entry.
pub fn validate_complete(raw: &str) -> Result<ResumeContent, AppError> {
    let content = ResumeContent::from_map(parse_model_object(raw)?);
    let empty = content.empty_sections();
    if !empty.is_empty() {
        let names: Vec<&str> = empty.iter().map(|s| s.key()).collect();
        return Err(invalid(
            format!("model output left sections empty: {}", names.join(", ")),
            raw,
        ));
    }
    Ok(content.conform())
}

/// Fully-populated resume used across the orchestrator tests.
#[cfg(test)]
pub fn sample_resume() -> Value {
    serde_json::json!({
        "basic_info": {"name": "Jane Doe", "email": "jane@x.com", "title": "Backend Engineer"},
        "education": [{"degree": "BSc", "institution": "State U", "start_date": "2012-09", "end_date": "2016-06"}],
        "experience": [{"company": "Ledgerly", "designation": "Backend Engineer", "start_date": "2019-01", "end_date": "2023-12", "description": "Built payment rails"}],
        "skills": {"technical_skills": ["Rust", "Postgres"], "soft_skills": ["Mentoring"], "languages": ["English"]},
        "certifications": [{"name": "AWS SAA", "issuer": "Amazon", "date": "2021-05"}],
        "projects": [{"title": "Ledger CLI", "description": "Double-entry tooling", "technologies": ["Rust"]}],
        "awards": [{"name": "Hackathon winner", "issuer": "FinDev", "date": "2020"}],
        "publications": [{"title": "Idempotent payments", "publisher": "Blog", "date": "2022-02"}],
        "volunteer": [{"organization": "Code Club", "role": "Mentor", "start_date": "2018-01", "end_date": "Present"}],
        "linkedin_url": "https://linkedin.com/in/janedoe",
        "portfolio_url": ""
    })
}
