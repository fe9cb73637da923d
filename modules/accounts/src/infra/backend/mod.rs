//! Adapters for the hosted backend-as-a-service.
//!
//! Authentication lives under `/auth/v1`, table storage under `/rest/v1`.
//! Every request carries the project `apikey`; the bearer token is the
//! signed-in user's access token when a session exists, the api key otherwise.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::contract::model::Session;

pub mod identity;
pub mod profiles;

pub use identity::HostedIdentityStore;
pub use profiles::HostedProfileStore;

/// Shared connection to one hosted project.
///
/// Cloning is cheap; clones share the HTTP pool and the current session, so
/// a sign-in through the identity adapter authorizes later table requests.
#[derive(Clone)]
pub struct HostedBackend {
    http: reqwest::Client,
    base: Url,
    api_key: Arc<SecretString>,
    session: Arc<ArcSwapOption<Session>>,
}

impl HostedBackend {
    /// `timeout` of `None` leaves requests unbounded.
    pub fn new(
        base: Url,
        api_key: impl Into<String>,
        timeout: Option<Duration>,
    ) -> reqwest::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            base,
            api_key: Arc::new(SecretString::from(api_key.into())),
            session: Arc::new(ArcSwapOption::empty()),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url, String> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| format!("backend url '{}' cannot be a base", self.base))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub(crate) fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let api_key = self.api_key.expose_secret();
        let builder = self.http.request(method, url).header("apikey", api_key);
        match self.session.load_full() {
            Some(session) => builder.bearer_auth(session.access_token.expose_secret()),
            None => builder.bearer_auth(api_key),
        }
    }

    pub(crate) fn current_session(&self) -> Option<Arc<Session>> {
        self.session.load_full()
    }

    pub(crate) fn store_session(&self, session: Session) {
        self.session.store(Some(Arc::new(session)));
    }

    pub(crate) fn clear_session(&self) {
        self.session.store(None);
    }
}

/// Rate limiting and server-side failures are transient.
pub(crate) fn is_transient(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

/// Read a body for diagnostics; an unreadable body becomes an empty string.
pub(crate) async fn body_text(response: reqwest::Response) -> String {
    response.text().await.unwrap_or_default()
}
