use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use parking_lot::Mutex;
use secrecy::{ExposeSecret, SecretString};
use uuid::Uuid;

use crate::contract::model::{IdentityId, Session};
use crate::domain::error::IdentityStoreError;
use crate::domain::ports::{IdentityAttributes, IdentityStore};

struct Account {
    id: IdentityId,
    password: SecretString,
    attributes: IdentityAttributes,
}

#[derive(Default)]
struct State {
    // keyed by lowercased email
    accounts: HashMap<String, Account>,
    current: Option<IdentityId>,
}

#[derive(Default)]
pub struct InMemoryIdentityStore {
    state: Mutex<State>,
    failure: Mutex<Option<IdentityStoreError>>,
    create_calls: AtomicUsize,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with `err` (or succeed again with `None`).
    pub fn fail_with(&self, err: Option<IdentityStoreError>) {
        *self.failure.lock() = err;
    }

    /// Number of `create_identity` attempts, successful or not.
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn identity_count(&self) -> usize {
        self.state.lock().accounts.len()
    }

    pub fn identity_for(&self, email: &str) -> Option<IdentityId> {
        self.state.lock().accounts.get(&key(email)).map(|a| a.id)
    }

    pub fn attributes_for(&self, email: &str) -> Option<IdentityAttributes> {
        self.state
            .lock()
            .accounts
            .get(&key(email))
            .map(|a| a.attributes.clone())
    }

    fn injected(&self) -> Result<(), IdentityStoreError> {
        match self.failure.lock().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn key(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn create_identity(
        &self,
        email: &str,
        password: &SecretString,
        attributes: &IdentityAttributes,
    ) -> Result<IdentityId, IdentityStoreError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.injected()?;

        if !email.contains('@') {
            return Err(IdentityStoreError::invalid_format("email is not valid"));
        }
        if password.expose_secret().trim().is_empty() {
            return Err(IdentityStoreError::invalid_format("password is empty"));
        }

        let mut state = self.state.lock();
        let k = key(email);
        if state.accounts.contains_key(&k) {
            return Err(IdentityStoreError::DuplicateEmail);
        }
        let id = IdentityId::new_v4();
        state.accounts.insert(
            k,
            Account {
                id,
                password: SecretString::from(password.expose_secret().to_string()),
                attributes: attributes.clone(),
            },
        );
        Ok(id)
    }

    async fn authenticate(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Session, IdentityStoreError> {
        self.injected()?;

        let mut state = self.state.lock();
        let id = state
            .accounts
            .get(&key(email))
            .filter(|a| a.password.expose_secret() == password.expose_secret())
            .map(|a| a.id)
            .ok_or(IdentityStoreError::InvalidCredentials)?;
        state.current = Some(id);

        Ok(Session {
            identity_id: id,
            access_token: SecretString::from(format!("mem-{}", Uuid::new_v4())),
            expires_at: Some(Utc::now() + Duration::hours(1)),
        })
    }

    async fn sign_out(&self) -> Result<(), IdentityStoreError> {
        self.injected()?;
        self.state.lock().current = None;
        Ok(())
    }

    async fn current_identity(&self) -> Option<IdentityId> {
        self.state.lock().current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    #[tokio::test]
    async fn duplicate_email_is_case_insensitive() {
        let store = InMemoryIdentityStore::new();
        let attrs = IdentityAttributes::new();
        store
            .create_identity("Ana@X.com", &secret("pw"), &attrs)
            .await
            .unwrap();

        let err = store
            .create_identity("ana@x.com", &secret("pw"), &attrs)
            .await
            .unwrap_err();
        assert_eq!(err, IdentityStoreError::DuplicateEmail);
        assert_eq!(store.identity_count(), 1);
        assert_eq!(store.create_calls(), 2);
    }

    #[tokio::test]
    async fn authenticate_checks_password_and_sets_current() {
        let store = InMemoryIdentityStore::new();
        let id = store
            .create_identity("ana@x.com", &secret("p@ss1234"), &IdentityAttributes::new())
            .await
            .unwrap();

        let err = store
            .authenticate("ana@x.com", &secret("wrong"))
            .await
            .unwrap_err();
        assert_eq!(err, IdentityStoreError::InvalidCredentials);
        assert_eq!(store.current_identity().await, None);

        let session = store
            .authenticate("ana@x.com", &secret("p@ss1234"))
            .await
            .unwrap();
        assert_eq!(session.identity_id, id);
        assert_eq!(store.current_identity().await, Some(id));

        store.sign_out().await.unwrap();
        assert_eq!(store.current_identity().await, None);
    }

    #[tokio::test]
    async fn injected_failure_short_circuits() {
        let store = InMemoryIdentityStore::new();
        store.fail_with(Some(IdentityStoreError::unavailable("down")));

        let err = store
            .create_identity("ana@x.com", &secret("pw"), &IdentityAttributes::new())
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityStoreError::ServiceUnavailable { .. }));
        assert_eq!(store.identity_count(), 0);
    }
}
