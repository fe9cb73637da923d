use std::collections::BTreeMap;

use async_trait::async_trait;
use secrecy::SecretString;

use crate::contract::model::{IdentityId, Session};
use crate::domain::error::IdentityStoreError;

/// Extra attributes stored alongside a new identity (display name, username, ...).
pub type IdentityAttributes = BTreeMap<String, String>;

/// Port for the hosted authentication provider.
///
/// The plaintext password crosses this boundary exactly once per call and
/// is never stored by the domain.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Create a new identity and return its issued id.
    async fn create_identity(
        &self,
        email: &str,
        password: &SecretString,
        attributes: &IdentityAttributes,
    ) -> Result<IdentityId, IdentityStoreError>;

    /// Verify credentials and open a session.
    async fn authenticate(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Session, IdentityStoreError>;

    /// Close the current session, if any.
    async fn sign_out(&self) -> Result<(), IdentityStoreError>;

    /// Identity of the current session.
    async fn current_identity(&self) -> Option<IdentityId>;
}
