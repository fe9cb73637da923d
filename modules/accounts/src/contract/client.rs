use async_trait::async_trait;
use secrecy::SecretString;

use crate::contract::{
    error::AuthError,
    model::{IdentityId, Session},
};
use crate::domain::session::SignupSession;

/// Public API of the accounts module consumed by the UI layer
#[async_trait]
pub trait AccountsApi: Send + Sync {
    /// Begin a new, empty registration
    fn start_signup(&self) -> SignupSession;

    /// Advisory: true only if a profile with this email was found
    async fn email_exists(&self, email: &str) -> bool;

    /// Advisory: true only if a profile with this username was found
    async fn username_exists(&self, username: &str) -> bool;

    /// Open a session for an existing account
    async fn sign_in(&self, email: &str, password: &SecretString) -> Result<Session, AuthError>;

    /// Close the current session
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Identity of the current session, if any
    async fn current_identity(&self) -> Option<IdentityId>;
}
