use async_trait::async_trait;
use chrono::{Duration, Utc};
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error, instrument};
use uuid::Uuid;

use super::{body_text, is_transient, HostedBackend};
use crate::contract::model::{IdentityId, Session};
use crate::domain::error::IdentityStoreError;
use crate::domain::ports::{IdentityAttributes, IdentityStore};

/// Identity store backed by the hosted auth service.
pub struct HostedIdentityStore {
    backend: HostedBackend,
}

impl HostedIdentityStore {
    pub fn new(backend: HostedBackend) -> Self {
        Self { backend }
    }
}

#[derive(Debug, Deserialize)]
struct UserBody {
    id: Uuid,
}

/// Signup answers with a bare user when confirmation is pending,
/// or with a full session when it is not.
#[derive(Debug, Deserialize)]
struct SignupBody {
    #[serde(default)]
    id: Option<Uuid>,
    #[serde(default)]
    user: Option<UserBody>,
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TokenBody {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    user: UserBody,
}

#[derive(Debug, Default, Deserialize)]
struct AuthErrorBody {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

impl AuthErrorBody {
    fn parse(raw: &str) -> Self {
        serde_json::from_str(raw).unwrap_or_default()
    }

    fn message(&self, fallback: &str) -> String {
        self.msg
            .as_deref()
            .or(self.message.as_deref())
            .or(self.error_description.as_deref())
            .unwrap_or(fallback)
            .to_string()
    }

    fn is_duplicate_email(&self) -> bool {
        if matches!(
            self.error_code.as_deref(),
            Some("user_already_exists" | "email_exists")
        ) {
            return true;
        }
        let text = self.message("").to_ascii_lowercase();
        text.contains("already registered") || text.contains("already exists")
    }
}

fn session_from(identity_id: IdentityId, token: String, expires_in: Option<i64>) -> Session {
    Session {
        identity_id,
        access_token: SecretString::from(token),
        expires_at: expires_in.map(|secs| Utc::now() + Duration::seconds(secs)),
    }
}

fn transport(e: reqwest::Error) -> IdentityStoreError {
    IdentityStoreError::unavailable(e.to_string())
}

#[async_trait]
impl IdentityStore for HostedIdentityStore {
    #[instrument(
        name = "accounts.http.identity.create",
        skip_all,
        fields(base = %self.backend.base_url(), email = %email)
    )]
    async fn create_identity(
        &self,
        email: &str,
        password: &SecretString,
        attributes: &IdentityAttributes,
    ) -> Result<IdentityId, IdentityStoreError> {
        let url = self
            .backend
            .endpoint(&["auth", "v1", "signup"])
            .map_err(IdentityStoreError::unavailable)?;

        let response = self
            .backend
            .request(Method::POST, url)
            .json(&json!({
                "email": email,
                "password": password.expose_secret(),
                "data": attributes,
            }))
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        let raw = body_text(response).await;

        if !status.is_success() {
            let body = AuthErrorBody::parse(&raw);
            debug!(status = status.as_u16(), "Signup rejected");
            return Err(if is_transient(status) {
                IdentityStoreError::unavailable(body.message(status.as_str()))
            } else if body.is_duplicate_email() {
                IdentityStoreError::DuplicateEmail
            } else {
                IdentityStoreError::invalid_format(body.message(status.as_str()))
            });
        }

        // A 2xx means the identity was most likely created; an unreadable
        // answer is reported as such, never as a clean failure.
        let body: SignupBody = serde_json::from_str(&raw).map_err(|e| {
            error!(status = status.as_u16(), error = %e, "Signup accepted but response unreadable");
            IdentityStoreError::malformed(format!("signup response: {e}"))
        })?;

        let id = body
            .user
            .as_ref()
            .map(|u| u.id)
            .or(body.id)
            .map(IdentityId)
            .ok_or_else(|| {
                error!(status = status.as_u16(), "Signup accepted but no user id returned");
                IdentityStoreError::malformed("signup response carried no user id")
            })?;

        if let Some(token) = body.access_token {
            self.backend
                .store_session(session_from(id, token, body.expires_in));
        }
        Ok(id)
    }

    #[instrument(
        name = "accounts.http.identity.authenticate",
        skip_all,
        fields(base = %self.backend.base_url(), email = %email)
    )]
    async fn authenticate(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Session, IdentityStoreError> {
        let mut url = self
            .backend
            .endpoint(&["auth", "v1", "token"])
            .map_err(IdentityStoreError::unavailable)?;
        url.query_pairs_mut().append_pair("grant_type", "password");

        let response = self
            .backend
            .request(Method::POST, url)
            .json(&json!({
                "email": email,
                "password": password.expose_secret(),
            }))
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        let raw = body_text(response).await;

        if !status.is_success() {
            let body = AuthErrorBody::parse(&raw);
            return Err(match status {
                s if is_transient(s) => IdentityStoreError::unavailable(body.message(s.as_str())),
                StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    IdentityStoreError::InvalidCredentials
                }
                s => IdentityStoreError::invalid_format(body.message(s.as_str())),
            });
        }

        let body: TokenBody = serde_json::from_str(&raw)
            .map_err(|e| IdentityStoreError::unavailable(format!("malformed token response: {e}")))?;
        let id = IdentityId(body.user.id);

        // One copy for the shared slot, one for the caller.
        self.backend.store_session(session_from(
            id,
            body.access_token.clone(),
            body.expires_in,
        ));
        Ok(session_from(id, body.access_token, body.expires_in))
    }

    #[instrument(name = "accounts.http.identity.sign_out", skip_all)]
    async fn sign_out(&self) -> Result<(), IdentityStoreError> {
        if self.backend.current_session().is_none() {
            return Ok(());
        }
        let url = self
            .backend
            .endpoint(&["auth", "v1", "logout"])
            .map_err(IdentityStoreError::unavailable)?;

        // Built while the session is still set so the user's token is sent.
        let request = self.backend.request(Method::POST, url);
        self.backend.clear_session();

        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        if status.is_success() || status == StatusCode::UNAUTHORIZED {
            Ok(())
        } else {
            let body = AuthErrorBody::parse(&body_text(response).await);
            Err(IdentityStoreError::unavailable(body.message(status.as_str())))
        }
    }

    async fn current_identity(&self) -> Option<IdentityId> {
        self.backend.current_session().map(|s| s.identity_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_email_detected_from_code_or_message() {
        let by_code = AuthErrorBody::parse(r#"{"error_code":"user_already_exists","msg":"x"}"#);
        assert!(by_code.is_duplicate_email());

        let by_msg = AuthErrorBody::parse(r#"{"msg":"User already registered"}"#);
        assert!(by_msg.is_duplicate_email());

        let weak = AuthErrorBody::parse(r#"{"msg":"Password should be at least 6 characters"}"#);
        assert!(!weak.is_duplicate_email());
    }

    #[test]
    fn error_message_prefers_msg_then_fallback() {
        let body = AuthErrorBody::parse(r#"{"error_description":"Invalid login credentials"}"#);
        assert_eq!(body.message("400"), "Invalid login credentials");

        let garbage = AuthErrorBody::parse("<html>");
        assert_eq!(garbage.message("502"), "502");
    }
}
