use async_trait::async_trait;
use secrecy::SecretString;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::contract::{
    client::AccountsApi,
    error::AuthError,
    model::{IdentityId, Session},
};
use crate::domain::ports::IdentityStore;
use crate::domain::provisioning::ProvisioningOrchestrator;
use crate::domain::session::{SessionOptions, SignupSession};
use crate::domain::uniqueness::UniquenessChecker;

/// Local implementation of the AccountsApi trait that delegates to the domain services
pub struct AccountsLocalClient {
    checker: Arc<UniquenessChecker>,
    orchestrator: Arc<ProvisioningOrchestrator>,
    identities: Arc<dyn IdentityStore>,
    options: SessionOptions,
}

impl AccountsLocalClient {
    pub fn new(
        checker: Arc<UniquenessChecker>,
        orchestrator: Arc<ProvisioningOrchestrator>,
        identities: Arc<dyn IdentityStore>,
        options: SessionOptions,
    ) -> Self {
        Self {
            checker,
            orchestrator,
            identities,
            options,
        }
    }
}

#[async_trait]
impl AccountsApi for AccountsLocalClient {
    fn start_signup(&self) -> SignupSession {
        SignupSession::new(self.checker.clone(), self.orchestrator.clone(), self.options)
    }

    async fn email_exists(&self, email: &str) -> bool {
        self.checker.email_exists(email.trim()).await
    }

    async fn username_exists(&self, username: &str) -> bool {
        self.checker.username_exists(username.trim()).await
    }

    #[instrument(name = "accounts.auth.sign_in", skip(self, password))]
    async fn sign_in(&self, email: &str, password: &SecretString) -> Result<Session, AuthError> {
        let session = self
            .identities
            .authenticate(email.trim(), password)
            .await
            .map_err(|e| {
                warn!(error = %e, "Sign-in failed");
                AuthError::from(e)
            })?;
        info!(identity_id = %session.identity_id, "Signed in");
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.identities.sign_out().await.map_err(Into::into)
    }

    async fn current_identity(&self) -> Option<IdentityId> {
        self.identities.current_identity().await
    }
}
