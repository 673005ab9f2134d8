use async_trait::async_trait;
use aws_sdk_s3::{error::DisplayErrorContext, primitives::ByteStream, Client as S3Client};
use bytes::Bytes;
use serde_json::Value;
use sqlx::PgPool;
use tracing::{debug, info};

use super::{check_filters, Filter, GatewayError, PersistenceGateway, Row, Table};

/// Postgres rows + S3 blobs.
///
/// Rows are converted with `jsonb_populate_record` on the way in and `to_jsonb` on
/// the way out, so one set of statements serves every table.
#[derive(Clone)]
pub struct PostgresGateway {
    db: PgPool,
    s3: S3Client,
    bucket: String,
    public_base: String,
}

impl PostgresGateway {
    pub fn new(db: PgPool, s3: S3Client, bucket: String, public_base: String) -> Self {
        Self {
            db,
            s3,
            bucket,
            public_base: public_base.trim_end_matches('/').to_string(),
        }
    }
}

/// `WHERE` body for `filters`, with placeholders numbered from `first_param`.
fn where_clause(table: Table, filters: &[Filter], first_param: usize) -> (String, Vec<&str>) {
    if filters.is_empty() {
        return ("TRUE".to_string(), Vec::new());
    }
    let mut binds = Vec::new();
    let conds: Vec<String> = filters
        .iter()
        .map(|f| match f {
            Filter::Eq(col, value) => {
                binds.push(value.as_str());
                let n = first_param + binds.len() - 1;
                format!("t.{col} = ${n}::{}", table.column_type(col))
            }
            Filter::IsNull(col) => format!("t.{col} IS NULL"),
        })
        .collect();
    (conds.join(" AND "), binds)
}

fn select_sql(table: Table, filters: &[Filter]) -> (String, Vec<&str>) {
    let (conds, binds) = where_clause(table, filters, 1);
    (
        format!(
            "SELECT to_jsonb(t) FROM {} t WHERE {conds} LIMIT 1",
            table.name()
        ),
        binds,
    )
}

fn insert_head(table: Table, columns: &[&str]) -> String {
    let cols = columns.join(", ");
    format!(
        "INSERT INTO {t} AS t ({cols}) SELECT {cols} FROM jsonb_populate_record(NULL::{t}, $1)",
        t = table.name()
    )
}

fn insert_sql(table: Table, columns: &[&str]) -> String {
    format!("{} RETURNING to_jsonb(t)", insert_head(table, columns))
}

fn upsert_sql(table: Table, columns: &[&str]) -> String {
    let key = table.conflict_key();
    let mut assignments: Vec<String> = columns
        .iter()
        .filter(|c| **c != key)
        .map(|c| format!("{c} = EXCLUDED.{c}"))
        .collect();
    if assignments.is_empty() {
        assignments.push(format!("{key} = EXCLUDED.{key}"));
    }
    format!(
        "{} ON CONFLICT ({key}) DO UPDATE SET {} RETURNING to_jsonb(t)",
        insert_head(table, columns),
        assignments.join(", ")
    )
}

fn update_sql<'f>(
    table: Table,
    columns: &[&str],
    filters: &'f [Filter],
) -> (String, Vec<&'f str>) {
    let assignments: Vec<String> = columns.iter().map(|c| format!("{c} = r.{c}")).collect();
    let (conds, binds) = where_clause(table, filters, 2);
    (
        format!(
            "UPDATE {t} AS t SET {} FROM jsonb_populate_record(NULL::{t}, $1) AS r WHERE {conds}",
            assignments.join(", "),
            t = table.name()
        ),
        binds,
    )
}

fn into_row(value: Value) -> Result<Row, GatewayError> {
    match value {
        Value::Object(row) => Ok(row),
        other => Err(GatewayError::Decode(serde::de::Error::custom(format!(
            "expected a row object, got {other}"
        )))),
    }
}

#[async_trait]
impl PersistenceGateway for PostgresGateway {
    async fn get(&self, table: Table, filters: &[Filter]) -> Result<Option<Row>, GatewayError> {
        check_filters(table, filters)?;
        let (sql, binds) = select_sql(table, filters);

        let mut query = sqlx::query_scalar::<_, Value>(&sql);
        for value in binds {
            query = query.bind(value);
        }
        query.fetch_optional(&self.db).await?.map(into_row).transpose()
    }

    async fn insert(&self, table: Table, row: Row) -> Result<Row, GatewayError> {
        let columns = table.row_columns(&row)?;
        let sql = insert_sql(table, &columns);

        let inserted = sqlx::query_scalar::<_, Value>(&sql)
            .bind(Value::Object(row))
            .fetch_one(&self.db)
            .await?;
        debug!("Inserted row into {}", table.name());
        into_row(inserted)
    }

    async fn update(
        &self,
        table: Table,
        filters: &[Filter],
        patch: Row,
    ) -> Result<u64, GatewayError> {
        check_filters(table, filters)?;
        let columns = table.row_columns(&patch)?;
        if columns.is_empty() {
            return Ok(0);
        }
        let (sql, binds) = update_sql(table, &columns, filters);

        let mut query = sqlx::query(&sql).bind(Value::Object(patch));
        for value in binds {
            query = query.bind(value);
        }
        let result = query.execute(&self.db).await?;
        debug!(
            "Updated {} row(s) in {}",
            result.rows_affected(),
            table.name()
        );
        Ok(result.rows_affected())
    }

    async fn upsert(&self, table: Table, row: Row) -> Result<Row, GatewayError> {
        let columns = table.row_columns(&row)?;
        let sql = upsert_sql(table, &columns);

        let stored = sqlx::query_scalar::<_, Value>(&sql)
            .bind(Value::Object(row))
            .fetch_one(&self.db)
            .await?;
        into_row(stored)
    }

    async fn put_blob(
        &self,
        bucket: &str,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, GatewayError> {
        let size = bytes.len();
        self.s3
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| GatewayError::Storage(DisplayErrorContext(&e).to_string()))?;

        info!("Stored blob {bucket}/{key} ({size} bytes)");
        Ok(self.public_uri(bucket, key))
    }

    fn public_uri(&self, bucket: &str, key: &str) -> String {
        format!("{}/{bucket}/{key}", self.public_base)
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_numbers_only_equality_filters() {
        let filters = [
            Filter::eq("id", "r1"),
            Filter::IsNull("deleted_at"),
            Filter::eq("user_id", "u1"),
        ];
        let (sql, binds) = select_sql(Table::Resumes, &filters);
        assert_eq!(
            sql,
            "SELECT to_jsonb(t) FROM resumes t WHERE t.id = $1::uuid AND t.deleted_at IS NULL \
             AND t.user_id = $2::uuid LIMIT 1"
        );
        assert_eq!(binds, vec!["r1", "u1"]);
    }

    #[test]
    fn test_update_binds_patch_first() {
        let filters = [Filter::eq("id", "o1")];
        let (sql, binds) = update_sql(
            Table::ResumeOptimizations,
            &["rewritten_resume_file"],
            &filters,
        );
        assert_eq!(
            sql,
            "UPDATE resume_optimizations AS t SET rewritten_resume_file = r.rewritten_resume_file \
             FROM jsonb_populate_record(NULL::resume_optimizations, $1) AS r WHERE t.id = $2::uuid"
        );
        assert_eq!(binds, vec!["o1"]);
    }

    #[test]
    fn test_non_key_columns_compare_as_text() {
        let filters = [Filter::eq("status", "completed"), Filter::eq("optimization_id", "o1")];
        let (sql, _) = select_sql(Table::RegeneratedResumes, &filters);
        assert_eq!(
            sql,
            "SELECT to_jsonb(t) FROM regenerated_resumes t WHERE t.status = $1::text \
             AND t.optimization_id = $2::uuid LIMIT 1"
        );
    }

    #[test]
    fn test_upsert_skips_conflict_key_in_assignments() {
        let sql = upsert_sql(Table::OnboardingDrafts, &["id", "resume_url", "updated_at"]);
        assert_eq!(
            sql,
            "INSERT INTO onboarding_drafts AS t (id, resume_url, updated_at) \
             SELECT id, resume_url, updated_at FROM jsonb_populate_record(NULL::onboarding_drafts, $1) \
             ON CONFLICT (id) DO UPDATE SET resume_url = EXCLUDED.resume_url, \
             updated_at = EXCLUDED.updated_at RETURNING to_jsonb(t)"
        );
    }
}
