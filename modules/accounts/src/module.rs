use std::sync::Arc;

use tracing::{debug, info};

use crate::config::AccountsConfig;
use crate::contract::client::AccountsApi;
use crate::domain::events::SignupDomainEvent;
use crate::domain::ports::{EventPublisher, IdentityStore, ProfileStore};
use crate::domain::provisioning::{ProvisioningConfig, ProvisioningOrchestrator};
use crate::domain::session::{SessionOptions, SignupSession};
use crate::domain::uniqueness::UniquenessChecker;
use crate::gateways::local::AccountsLocalClient;
use crate::infra::backend::{HostedBackend, HostedIdentityStore, HostedProfileStore};
use crate::infra::events::TracingEventPublisher;
use crate::infra::memory::{InMemoryIdentityStore, InMemoryProfileStore};

/// Adapters the accounts module is wired against.
#[derive(Clone)]
pub struct AccountsPorts {
    pub identities: Arc<dyn IdentityStore>,
    pub profiles: Arc<dyn ProfileStore>,
    pub events: Arc<dyn EventPublisher<SignupDomainEvent>>,
}

impl AccountsPorts {
    /// Events go to the log unless replaced with [`AccountsPorts::with_events`].
    pub fn new(identities: Arc<dyn IdentityStore>, profiles: Arc<dyn ProfileStore>) -> Self {
        Self {
            identities,
            profiles,
            events: Arc::new(TracingEventPublisher),
        }
    }

    pub fn with_events(mut self, events: Arc<dyn EventPublisher<SignupDomainEvent>>) -> Self {
        self.events = events;
        self
    }

    /// Both stores share one backend connection and its session.
    pub fn hosted(backend: &HostedBackend) -> Self {
        Self::new(
            Arc::new(HostedIdentityStore::new(backend.clone())),
            Arc::new(HostedProfileStore::new(backend.clone())),
        )
    }

    /// Fresh, empty in-process stores.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryIdentityStore::new()),
            Arc::new(InMemoryProfileStore::new()),
        )
    }
}

/// Wired accounts module: uniqueness checker, provisioning orchestrator
/// and the local client exposed to callers.
#[derive(Clone)]
pub struct AccountsModule {
    api: Arc<dyn AccountsApi>,
    checker: Arc<UniquenessChecker>,
    orchestrator: Arc<ProvisioningOrchestrator>,
    options: SessionOptions,
}

impl AccountsModule {
    pub fn init(ports: AccountsPorts, cfg: &AccountsConfig) -> Self {
        info!("Initializing accounts module");
        debug!(
            "Loaded accounts config: profiles_table={}, default_role={:?}, check_uniqueness_on_advance={}",
            cfg.profiles_table, cfg.default_role, cfg.check_uniqueness_on_advance
        );

        let checker = Arc::new(UniquenessChecker::new(
            ports.profiles.clone(),
            cfg.profiles_table.clone(),
        ));
        let orchestrator = Arc::new(ProvisioningOrchestrator::new(
            ports.identities.clone(),
            ports.profiles,
            ports.events,
            ProvisioningConfig {
                profiles_table: cfg.profiles_table.clone(),
                default_role: cfg.default_role,
            },
        ));
        let options = SessionOptions {
            check_uniqueness_on_advance: cfg.check_uniqueness_on_advance,
        };

        let api: Arc<dyn AccountsApi> = Arc::new(AccountsLocalClient::new(
            checker.clone(),
            orchestrator.clone(),
            ports.identities,
            options,
        ));
        info!("Accounts API ready");

        Self {
            api,
            checker,
            orchestrator,
            options,
        }
    }

    pub fn api(&self) -> Arc<dyn AccountsApi> {
        self.api.clone()
    }

    pub fn start_signup(&self) -> SignupSession {
        SignupSession::new(self.checker.clone(), self.orchestrator.clone(), self.options)
    }

    pub fn checker(&self) -> &Arc<UniquenessChecker> {
        &self.checker
    }

    pub fn orchestrator(&self) -> &Arc<ProvisioningOrchestrator> {
        &self.orchestrator
    }
}
