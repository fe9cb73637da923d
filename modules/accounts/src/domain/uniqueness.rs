use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::contract::model::UniqueField;
use crate::domain::ports::ProfileStore;

/// Result of an advisory uniqueness lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UniquenessCheck {
    Available,
    Taken,
    /// The lookup failed; treated as available, but not confirmed.
    Degraded { reason: String },
}

impl UniquenessCheck {
    pub fn is_taken(&self) -> bool {
        matches!(self, Self::Taken)
    }
}

/// Early, friendly duplicate detection against the profiles table.
///
/// Results are advisory: nothing is locked between the check and the insert,
/// and the store's unique constraint has the final word.
pub struct UniquenessChecker {
    profiles: Arc<dyn ProfileStore>,
    table: String,
}

impl UniquenessChecker {
    pub fn new(profiles: Arc<dyn ProfileStore>, table: impl Into<String>) -> Self {
        Self {
            profiles,
            table: table.into(),
        }
    }

    #[instrument(
        name = "accounts.uniqueness.check",
        skip(self),
        fields(table = %self.table)
    )]
    pub async fn check(&self, field: UniqueField, value: &str) -> UniquenessCheck {
        match self
            .profiles
            .find_by_field(&self.table, field.column(), value)
            .await
        {
            Ok(rows) if rows.is_empty() => {
                debug!("{} is available", field);
                UniquenessCheck::Available
            }
            Ok(rows) => {
                debug!(matches = rows.len(), "{} is taken", field);
                UniquenessCheck::Taken
            }
            Err(e) => {
                warn!(
                    error = %e,
                    "Uniqueness check for {} degraded; allowing signup to proceed",
                    field
                );
                UniquenessCheck::Degraded {
                    reason: e.to_string(),
                }
            }
        }
    }

    pub async fn check_email(&self, email: &str) -> UniquenessCheck {
        self.check(UniqueField::Email, email).await
    }

    pub async fn check_username(&self, username: &str) -> UniquenessCheck {
        self.check(UniqueField::Username, username).await
    }

    /// True only when a matching row was found; a failed lookup counts as absent.
    pub async fn email_exists(&self, email: &str) -> bool {
        self.check_email(email).await.is_taken()
    }

    /// True only when a matching row was found; a failed lookup counts as absent.
    pub async fn username_exists(&self, username: &str) -> bool {
        self.check_username(username).await.is_taken()
    }
}
