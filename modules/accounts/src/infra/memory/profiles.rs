use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use parking_lot::Mutex;
use serde_json::Value;

use crate::domain::error::ProfileStoreError;
use crate::domain::ports::{ProfileStore, Record};

/// Columns carrying a unique constraint in every table.
const UNIQUE_COLUMNS: [&str; 3] = ["id", "email", "username"];

#[derive(Default)]
pub struct InMemoryProfileStore {
    tables: Mutex<HashMap<String, Vec<Record>>>,
    lookup_failure: Mutex<Option<ProfileStoreError>>,
    insert_failure: Mutex<Option<ProfileStoreError>>,
    lookups: AtomicUsize,
    inserts: AtomicUsize,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_lookups_with(&self, err: Option<ProfileStoreError>) {
        *self.lookup_failure.lock() = err;
    }

    pub fn fail_inserts_with(&self, err: Option<ProfileStoreError>) {
        *self.insert_failure.lock() = err;
    }

    pub fn lookup_calls(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn insert_calls(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    /// Put a row in place without constraint checks.
    pub fn seed(&self, table: &str, record: Record) {
        self.tables
            .lock()
            .entry(table.to_string())
            .or_default()
            .push(record);
    }

    pub fn rows(&self, table: &str) -> Vec<Record> {
        self.tables.lock().get(table).cloned().unwrap_or_default()
    }
}

fn cell_matches(cell: Option<&Value>, value: &str) -> bool {
    match cell {
        Some(Value::String(s)) => s == value,
        Some(Value::Number(n)) => n.to_string() == value,
        Some(Value::Bool(b)) => b.to_string() == value,
        _ => false,
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn find_by_field(
        &self,
        table: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<Record>, ProfileStoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.lookup_failure.lock().clone() {
            return Err(err);
        }

        let tables = self.tables.lock();
        Ok(tables
            .get(table)
            .map(|rows| {
                rows.iter()
                    .filter(|row| cell_matches(row.get(field), value))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn insert(&self, table: &str, record: Record) -> Result<Record, ProfileStoreError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.insert_failure.lock().clone() {
            return Err(err);
        }

        let Value::Object(mut row) = record else {
            return Err(ProfileStoreError::rejected(400, "row must be a JSON object"));
        };

        let mut tables = self.tables.lock();
        let rows = tables.entry(table.to_string()).or_default();
        for column in UNIQUE_COLUMNS {
            let Some(new_value) = row.get(column).filter(|v| !v.is_null()) else {
                continue;
            };
            if rows.iter().any(|existing| existing.get(column) == Some(new_value)) {
                return Err(ProfileStoreError::unique_violation(column));
            }
        }

        row.entry("created_at").or_insert_with(|| {
            Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true))
        });
        let stored = Value::Object(row);
        rows.push(stored.clone());
        Ok(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn insert_enforces_unique_columns() {
        let store = InMemoryProfileStore::new();
        store
            .insert("users", json!({"id": "a", "email": "ana@x.com", "username": "ana"}))
            .await
            .unwrap();

        let err = store
            .insert("users", json!({"id": "b", "email": "bob@x.com", "username": "ana"}))
            .await
            .unwrap_err();
        assert_eq!(err, ProfileStoreError::unique_violation("username"));
        assert_eq!(store.rows("users").len(), 1);
        assert_eq!(store.insert_calls(), 2);
    }

    #[tokio::test]
    async fn insert_assigns_created_at() {
        let store = InMemoryProfileStore::new();
        let row = store
            .insert("users", json!({"id": "a", "email": "ana@x.com"}))
            .await
            .unwrap();
        assert!(row["created_at"].is_string());
    }

    #[tokio::test]
    async fn insert_rejects_non_objects() {
        let store = InMemoryProfileStore::new();
        let err = store.insert("users", json!([1, 2])).await.unwrap_err();
        assert!(matches!(err, ProfileStoreError::Rejected { status: 400, .. }));
    }

    #[tokio::test]
    async fn lookup_filters_by_exact_value() {
        let store = InMemoryProfileStore::new();
        store.seed("users", json!({"email": "ana@x.com", "country": 1}));
        store.seed("users", json!({"email": "bob@x.com", "country": 2}));

        assert_eq!(store.find_by_field("users", "email", "ana@x.com").await.unwrap().len(), 1);
        assert_eq!(store.find_by_field("users", "country", "2").await.unwrap().len(), 1);
        assert!(store.find_by_field("users", "email", "ANA@x.com").await.unwrap().is_empty());
        assert!(store.find_by_field("other", "email", "ana@x.com").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn lookup_failure_is_injected() {
        let store = InMemoryProfileStore::new();
        store.fail_lookups_with(Some(ProfileStoreError::unavailable("timeout")));
        assert!(store.find_by_field("users", "email", "x").await.is_err());
        assert_eq!(store.lookup_calls(), 1);
    }
}
