use async_trait::async_trait;

use crate::domain::error::ProfileStoreError;

/// A row as exchanged with the table store.
pub type Record = serde_json::Value;

/// Port for the hosted structured-record store.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Equality-filtered lookup: rows of `table` where `field == value`.
    async fn find_by_field(
        &self,
        table: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<Record>, ProfileStoreError>;

    /// Insert a row and return it as stored.
    ///
    /// Unique constraints are enforced here; a rejection is authoritative.
    async fn insert(&self, table: &str, record: Record) -> Result<Record, ProfileStoreError>;
}
