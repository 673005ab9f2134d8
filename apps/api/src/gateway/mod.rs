//! Persistence Gateway: the only path to the relational store and the blob store.
//!
//! Rows travel as JSON objects keyed by column name. Every table declares a
//! column whitelist; rows and filters naming anything else are rejected before
//! a query is built, so identifiers interpolated into SQL are always our own
//! static strings.

#[cfg(test)]
pub mod memory;
pub mod postgres;
pub mod records;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::{Map, Value};
use thiserror::Error;

pub use postgres::PostgresGateway;

pub type Row = Map<String, Value>;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("blob storage error: {0}")]
    Storage(String),

    #[error("column '{column}' is not writable on {table}")]
    UnknownColumn { table: &'static str, column: String },

    #[error("row could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Resumes,
    Profiles,
    OnboardingDrafts,
    ResumeOptimizations,
    RegeneratedResumes,
}

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Table::Resumes => "resumes",
            Table::Profiles => "profiles",
            Table::OnboardingDrafts => "onboarding_drafts",
            Table::ResumeOptimizations => "resume_optimizations",
            Table::RegeneratedResumes => "regenerated_resumes",
        }
    }

    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Table::Resumes => &[
                "id",
                "user_id",
                "title",
                "content",
                "source_type",
                "target_title",
                "target_description",
                "ai_prompt",
                "source_file",
                "created_at",
                "updated_at",
                "deleted_at",
            ],
            Table::Profiles => &["id", "full_name", "email", "updated_at"],
            Table::OnboardingDrafts => &["id", "resume_url", "parsed_data", "updated_at"],
            Table::ResumeOptimizations => &[
                "id",
                "user_id",
                "job_description",
                "score",
                "resume_text",
                "structured_resume",
                "suggestions",
                "keyword_gaps",
                "rewritten_resume_file",
                "status",
                "created_at",
            ],
            Table::RegeneratedResumes => &[
                "id",
                "user_id",
                "optimization_id",
                "regenerated_resume",
                "status",
                "created_at",
            ],
        }
    }

    /// Column an upsert resolves conflicts on.
    pub fn conflict_key(self) -> &'static str {
        "id"
    }

    /// SQL type a text filter value is cast to before comparison, so the
    /// column itself stays uncast and its indexes stay usable.
    pub fn column_type(self, column: &str) -> &'static str {
        match column {
            "id" | "user_id" | "optimization_id" => "uuid",
            _ => "text",
        }
    }

    /// Maps a caller-supplied column name onto the static whitelist entry.
    pub fn column(self, name: &str) -> Result<&'static str, GatewayError> {
        self.columns()
            .iter()
            .copied()
            .find(|c| *c == name)
            .ok_or_else(|| GatewayError::UnknownColumn {
                table: self.name(),
                column: name.to_string(),
            })
    }

    /// Validates every key of `row`, returning the matching static column names in row order.
    pub fn row_columns(self, row: &Row) -> Result<Vec<&'static str>, GatewayError> {
        row.keys().map(|k| self.column(k)).collect()
    }
}

/// One conjunct of a row filter. Equality values travel as text and are cast to the column type.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(&'static str, String),
    IsNull(&'static str),
}

impl Filter {
    pub fn eq(column: &'static str, value: impl ToString) -> Self {
        Filter::Eq(column, value.to_string())
    }

    pub fn column(&self) -> &'static str {
        match self {
            Filter::Eq(c, _) | Filter::IsNull(c) => c,
        }
    }
}

pub fn check_filters(table: Table, filters: &[Filter]) -> Result<(), GatewayError> {
    filters.iter().try_for_each(|f| table.column(f.column()).map(|_| ()))
}

/// Row and blob operations against the external stores.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// First row matching every filter.
    async fn get(&self, table: Table, filters: &[Filter]) -> Result<Option<Row>, GatewayError>;

    async fn insert(&self, table: Table, row: Row) -> Result<Row, GatewayError>;

    /// Applies `patch` to every matching row; returns the number of rows changed.
    async fn update(&self, table: Table, filters: &[Filter], patch: Row)
        -> Result<u64, GatewayError>;

    /// Inserts, or overwrites the supplied columns when the conflict key exists.
    async fn upsert(&self, table: Table, row: Row) -> Result<Row, GatewayError>;

    /// Stores a blob and returns its public URI.
    async fn put_blob(
        &self,
        bucket: &str,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, GatewayError>;

    fn public_uri(&self, bucket: &str, key: &str) -> String;

    /// Bucket that holds user documents.
    fn bucket(&self) -> &str;
}
