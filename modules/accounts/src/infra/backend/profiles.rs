use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use super::{body_text, is_transient, HostedBackend};
use crate::domain::error::ProfileStoreError;
use crate::domain::ports::{ProfileStore, Record};

/// Postgres unique_violation.
const UNIQUE_VIOLATION: &str = "23505";

/// Table store backed by the hosted REST gateway.
pub struct HostedProfileStore {
    backend: HostedBackend,
}

impl HostedProfileStore {
    pub fn new(backend: HostedBackend) -> Self {
        Self { backend }
    }
}

#[derive(Debug, Default, Deserialize)]
struct PgErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

impl PgErrorBody {
    fn parse(raw: &str) -> Self {
        serde_json::from_str(raw).unwrap_or_default()
    }

    fn message(&self, fallback: &str) -> String {
        self.message.clone().unwrap_or_else(|| fallback.to_string())
    }
}

/// Column named by a unique-violation report.
///
/// Reads `Key (column)=(value) already exists.` from the details, then falls
/// back to the constraint name (`<table>_<column>_key`) in the message.
fn violated_field(body: &PgErrorBody, table: &str) -> String {
    if let Some(details) = body.details.as_deref() {
        if let Some(rest) = details.split_once("Key (").map(|(_, r)| r) {
            if let Some((column, _)) = rest.split_once(')') {
                return column.to_string();
            }
        }
    }
    if let Some(message) = body.message.as_deref() {
        let mut quoted = message.split('"');
        if let (Some(_), Some(constraint)) = (quoted.next(), quoted.next()) {
            let trimmed = constraint
                .strip_prefix(&format!("{table}_"))
                .unwrap_or(constraint);
            let trimmed = trimmed
                .strip_suffix("_key")
                .or_else(|| trimmed.strip_suffix("_unique"))
                .unwrap_or(trimmed);
            return trimmed.to_string();
        }
    }
    "unknown".to_string()
}

fn classify(status: StatusCode, body: &PgErrorBody, table: &str) -> ProfileStoreError {
    if status == StatusCode::CONFLICT || body.code.as_deref() == Some(UNIQUE_VIOLATION) {
        ProfileStoreError::unique_violation(violated_field(body, table))
    } else if is_transient(status) {
        ProfileStoreError::unavailable(body.message(status.as_str()))
    } else {
        ProfileStoreError::rejected(status.as_u16(), body.message(status.as_str()))
    }
}

/// With `return=representation` the gateway echoes the inserted rows as an array.
fn first_row(raw: &str) -> Record {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(rows)) => rows.into_iter().next().unwrap_or(Value::Null),
        Ok(row) => row,
        Err(_) => Value::Null,
    }
}

fn transport(e: reqwest::Error) -> ProfileStoreError {
    ProfileStoreError::unavailable(e.to_string())
}

#[async_trait]
impl ProfileStore for HostedProfileStore {
    #[instrument(
        name = "accounts.http.profiles.find_by_field",
        skip(self),
        fields(base = %self.backend.base_url())
    )]
    async fn find_by_field(
        &self,
        table: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<Record>, ProfileStoreError> {
        let mut url = self
            .backend
            .endpoint(&["rest", "v1", table])
            .map_err(ProfileStoreError::unavailable)?;
        url.query_pairs_mut()
            .append_pair(field, &format!("eq.{value}"))
            .append_pair("select", "*");

        let response = self
            .backend
            .request(Method::GET, url)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = PgErrorBody::parse(&body_text(response).await);
            return Err(classify(status, &body, table));
        }

        response
            .json::<Vec<Record>>()
            .await
            .map_err(|e| ProfileStoreError::malformed(e.to_string()))
    }

    #[instrument(
        name = "accounts.http.profiles.insert",
        skip(self, record),
        fields(base = %self.backend.base_url())
    )]
    async fn insert(&self, table: &str, record: Record) -> Result<Record, ProfileStoreError> {
        let url = self
            .backend
            .endpoint(&["rest", "v1", table])
            .map_err(ProfileStoreError::unavailable)?;

        let response = self
            .backend
            .request(Method::POST, url)
            .header("Prefer", "return=representation")
            .json(&record)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        let raw = body_text(response).await;
        if !status.is_success() {
            debug!(status = status.as_u16(), "Insert rejected");
            return Err(classify(status, &PgErrorBody::parse(&raw), table));
        }
        Ok(first_row(&raw))
    }
}
