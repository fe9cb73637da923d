#![allow(dead_code)]

use std::sync::Arc;

use accounts::config::AccountsConfig;
use accounts::infra::events::RecordingEventPublisher;
use accounts::infra::memory::{InMemoryIdentityStore, InMemoryProfileStore};
use accounts::model::SignupField;
use accounts::{AccountsModule, AccountsPorts, SignupSession};
use serde_json::json;

pub struct Harness {
    pub identities: Arc<InMemoryIdentityStore>,
    pub profiles: Arc<InMemoryProfileStore>,
    pub events: Arc<RecordingEventPublisher>,
    pub module: AccountsModule,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(AccountsConfig::default())
    }

    pub fn with_config(cfg: AccountsConfig) -> Self {
        let identities = Arc::new(InMemoryIdentityStore::new());
        let profiles = Arc::new(InMemoryProfileStore::new());
        let events = Arc::new(RecordingEventPublisher::new());
        let ports = AccountsPorts::new(identities.clone(), profiles.clone())
            .with_events(events.clone());
        let module = AccountsModule::init(ports, &cfg);
        Self {
            identities,
            profiles,
            events,
            module,
        }
    }

    pub fn session(&self) -> SignupSession {
        self.module.api().start_signup()
    }

    /// A profile row that already owns `email` and `username`.
    pub fn seed_profile(&self, email: &str, username: &str) {
        self.profiles.seed(
            "users",
            json!({
                "id": uuid::Uuid::new_v4().to_string(),
                "name": "Existing User",
                "email": email,
                "username": username,
                "birth_date": "1990-05-05",
                "country": 2,
                "created_at": "2024-01-01T00:00:00Z",
            }),
        );
    }
}

pub fn fill_step1(session: &mut SignupSession) {
    session.update_field(SignupField::Name, "Ana Silva");
    session.update_field(SignupField::Email, "ana@x.com");
    session.update_field(SignupField::BirthDate, "2000-01-01");
    session.update_field(SignupField::Country, "1");
}

pub fn fill_step2(session: &mut SignupSession) {
    session.update_field(SignupField::Username, "anas");
    session.update_field(SignupField::Password, "p@ss1234");
}

/// Walk a fresh session to `Step2Complete` with Ana's details.
pub async fn ready_to_submit(session: &mut SignupSession) {
    fill_step1(session);
    session.advance().await.expect("step 1");
    fill_step2(session);
    session.advance().await.expect("step 2");
}
