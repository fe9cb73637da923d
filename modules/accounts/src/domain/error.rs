use thiserror::Error;

/// Failures reported by an identity store adapter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityStoreError {
    #[error("email is already registered")]
    DuplicateEmail,

    #[error("invalid credential format: {message}")]
    InvalidCredentialFormat { message: String },

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("identity service unavailable: {message}")]
    ServiceUnavailable { message: String },

    /// The service accepted the request but its answer could not be read.
    /// The identity may exist.
    #[error("unreadable identity response: {message}")]
    MalformedResponse { message: String },
}

impl IdentityStoreError {
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidCredentialFormat {
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable {
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }
}

/// Failures reported by a profile (table) store adapter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProfileStoreError {
    #[error("unique constraint violated on '{field}'")]
    UniqueConstraintViolation { field: String },

    #[error("request rejected with HTTP {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("profile service unavailable: {message}")]
    ServiceUnavailable { message: String },

    #[error("malformed response: {message}")]
    MalformedResponse { message: String },
}

impl ProfileStoreError {
    pub fn unique_violation(field: impl Into<String>) -> Self {
        Self::UniqueConstraintViolation {
            field: field.into(),
        }
    }

    pub fn rejected(status: u16, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            message: message.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable {
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }
}
