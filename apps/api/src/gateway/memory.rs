//! In-process gateway used by tests. Mirrors the column checks and filter
//! semantics of `PostgresGateway`, and can be told to fail every write.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;

use super::{check_filters, Filter, GatewayError, PersistenceGateway, Row, Table};

#[derive(Default)]
pub struct MemoryGateway {
    tables: Mutex<HashMap<Table, Vec<Row>>>,
    blobs: Mutex<HashMap<String, (Bytes, String)>>,
    fail_writes: AtomicBool,
}

fn text_form(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn matches(row: &Row, filters: &[Filter]) -> bool {
    filters.iter().all(|f| match f {
        Filter::Eq(col, expected) => {
            row.get(*col).and_then(text_form).as_deref() == Some(expected.as_str())
        }
        Filter::IsNull(col) => row.get(*col).map_or(true, Value::is_null),
    })
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail with a storage error.
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    pub fn rows(&self, table: Table) -> Vec<Row> {
        self.tables
            .lock()
            .unwrap()
            .get(&table)
            .cloned()
            .unwrap_or_default()
    }

    pub fn blob(&self, bucket: &str, key: &str) -> Option<(Bytes, String)> {
        self.blobs
            .lock()
            .unwrap()
            .get(&format!("{bucket}/{key}"))
            .cloned()
    }

    fn check_write(&self) -> Result<(), GatewayError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(GatewayError::Storage("write rejected".to_string()));
        }
        Ok(())
    }

    /// Fills absent columns with null, as a table default would.
    fn complete(table: Table, mut row: Row) -> Row {
        for column in table.columns() {
            row.entry(*column).or_insert(Value::Null);
        }
        row
    }
}

#[async_trait]
impl PersistenceGateway for MemoryGateway {
    async fn get(&self, table: Table, filters: &[Filter]) -> Result<Option<Row>, GatewayError> {
        check_filters(table, filters)?;
        Ok(self
            .tables
            .lock()
            .unwrap()
            .get(&table)
            .and_then(|rows| rows.iter().find(|r| matches(r, filters)).cloned()))
    }

    async fn insert(&self, table: Table, row: Row) -> Result<Row, GatewayError> {
        table.row_columns(&row)?;
        self.check_write()?;
        let row = Self::complete(table, row);
        self.tables
            .lock()
            .unwrap()
            .entry(table)
            .or_default()
            .push(row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        table: Table,
        filters: &[Filter],
        patch: Row,
    ) -> Result<u64, GatewayError> {
        check_filters(table, filters)?;
        table.row_columns(&patch)?;
        self.check_write()?;
        let mut tables = self.tables.lock().unwrap();
        let mut changed = 0;
        for row in tables.entry(table).or_default().iter_mut() {
            if matches(row, filters) {
                row.extend(patch.clone());
                changed += 1;
            }
        }
        Ok(changed)
    }

    async fn upsert(&self, table: Table, row: Row) -> Result<Row, GatewayError> {
        table.row_columns(&row)?;
        self.check_write()?;
        let key = table.conflict_key();
        let mut tables = self.tables.lock().unwrap();
        let rows = tables.entry(table).or_default();

        let wanted = row.get(key).and_then(text_form);
        let position = rows
            .iter()
            .position(|r| wanted.is_some() && r.get(key).and_then(text_form) == wanted);
        match position {
            Some(i) => {
                rows[i].extend(row);
                Ok(rows[i].clone())
            }
            None => {
                let row = Self::complete(table, row);
                rows.push(row.clone());
                Ok(row)
            }
        }
    }

    async fn put_blob(
        &self,
        bucket: &str,
        key: &str,
        bytes: Bytes,
        content_type: &str,
    ) -> Result<String, GatewayError> {
        self.check_write()?;
        self.blobs
            .lock()
            .unwrap()
            .insert(format!("{bucket}/{key}"), (bytes, content_type.to_string()));
        Ok(self.public_uri(bucket, key))
    }

    fn public_uri(&self, bucket: &str, key: &str) -> String {
        format!("memory://{bucket}/{key}")
    }

    fn bucket(&self) -> &str {
        "resumes"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_filters_compare_text_and_nulls() {
        let gw = MemoryGateway::new();
        gw.insert(Table::Profiles, row(json!({"id": "u1", "full_name": "Jane"})))
            .await
            .unwrap();

        let found = gw
            .get(Table::Profiles, &[Filter::eq("id", "u1"), Filter::IsNull("email")])
            .await
            .unwrap();
        assert_eq!(found.unwrap()["full_name"], "Jane");

        let missing = gw.get(Table::Profiles, &[Filter::eq("id", "u2")]).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_upsert_overwrites_supplied_columns_only() {
        let gw = MemoryGateway::new();
        gw.upsert(
            Table::OnboardingDrafts,
            row(json!({"id": "u1", "resume_url": "a", "parsed_data": {"k": 1}})),
        )
        .await
        .unwrap();
        let stored = gw
            .upsert(Table::OnboardingDrafts, row(json!({"id": "u1", "resume_url": "b"})))
            .await
            .unwrap();

        assert_eq!(stored["resume_url"], "b");
        assert_eq!(stored["parsed_data"], json!({"k": 1}));
        assert_eq!(gw.rows(Table::OnboardingDrafts).len(), 1);
    }

    #[tokio::test]
    async fn test_failed_writes_leave_no_trace() {
        let gw = MemoryGateway::new();
        gw.fail_writes();
        let err = gw
            .insert(Table::Profiles, row(json!({"id": "u1"})))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Storage(_)));
        assert!(gw.rows(Table::Profiles).is_empty());
    }
}
