use thiserror::Error;

use crate::contract::model::{IdentityId, SignupField, SignupState, UniqueField};
use crate::domain::error::{IdentityStoreError, ProfileStoreError};

/// Why the identity store did not confirm a new identity.
///
/// No side effect occurred, except for `OutcomeUnknown`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityFailureCause {
    #[error("email is already registered")]
    DuplicateEmail,

    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    #[error("identity service unavailable: {message}")]
    ServiceUnavailable { message: String },

    /// The store accepted the request but no identity id could be read back.
    #[error("identity may have been created: {message}")]
    OutcomeUnknown { message: String },
}

/// Why the profile row could not be stored after the identity was created.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProfileFailureCause {
    #[error("unique constraint violated on '{field}'")]
    UniqueConstraintViolation { field: String },

    #[error("profile rejected: {message}")]
    Rejected { message: String },

    #[error("profile service unavailable: {message}")]
    ServiceUnavailable { message: String },
}

/// Typed outcome of a failed signup step, surfaced to the UI.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignupError {
    #[error("missing or invalid fields: {}", join_fields(.fields))]
    Validation { fields: Vec<SignupField> },

    #[error("{field} '{value}' is already taken")]
    Conflict { field: UniqueField, value: String },

    #[error("could not create account: {cause}")]
    IdentityCreationFailed { cause: IdentityFailureCause },

    #[error("account {identity_id} was partially created: {cause}")]
    ProfileCreationFailed {
        identity_id: IdentityId,
        cause: ProfileFailureCause,
    },

    #[error("cannot {operation} while signup is {state}")]
    InvalidState {
        operation: &'static str,
        state: SignupState,
    },
}

fn join_fields(fields: &[SignupField]) -> String {
    fields
        .iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl SignupError {
    pub fn validation(fields: Vec<SignupField>) -> Self {
        Self::Validation { fields }
    }

    pub fn conflict(field: UniqueField, value: impl Into<String>) -> Self {
        Self::Conflict {
            field,
            value: value.into(),
        }
    }

    pub fn identity_creation_failed(cause: IdentityFailureCause) -> Self {
        Self::IdentityCreationFailed { cause }
    }

    pub fn profile_creation_failed(identity_id: IdentityId, cause: ProfileFailureCause) -> Self {
        Self::ProfileCreationFailed { identity_id, cause }
    }

    pub fn invalid_state(operation: &'static str, state: SignupState) -> Self {
        Self::InvalidState { operation, state }
    }

    /// Identity left without a profile row, if this failure caused one.
    pub fn orphaned_identity(&self) -> Option<IdentityId> {
        match self {
            Self::ProfileCreationFailed { identity_id, .. } => Some(*identity_id),
            _ => None,
        }
    }

    /// True when an identity exists but its profile does not.
    /// Starting over would hit a duplicate-email rejection.
    pub fn is_orphaning(&self) -> bool {
        self.orphaned_identity().is_some()
    }

    /// True when the user can fix the input (or simply retry) from a clean slate.
    pub fn is_user_recoverable(&self) -> bool {
        !self.is_orphaning() && !self.is_outcome_unknown()
    }

    /// True when an identity may exist that this session cannot name.
    pub fn is_outcome_unknown(&self) -> bool {
        matches!(
            self,
            Self::IdentityCreationFailed {
                cause: IdentityFailureCause::OutcomeUnknown { .. }
            }
        )
    }
}

/// Non-blocking signup diagnostics.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignupWarning {
    #[error("could not verify that {field} is unique: {reason}")]
    UniquenessCheckDegraded { field: UniqueField, reason: String },
}

/// Errors from sign-in and sign-out.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("authentication service unavailable: {message}")]
    ServiceUnavailable { message: String },
}

impl From<IdentityStoreError> for IdentityFailureCause {
    fn from(err: IdentityStoreError) -> Self {
        match err {
            IdentityStoreError::DuplicateEmail => Self::DuplicateEmail,
            IdentityStoreError::InvalidCredentialFormat { message } => {
                Self::InvalidInput { message }
            }
            IdentityStoreError::InvalidCredentials => Self::InvalidInput {
                message: "credentials rejected".to_string(),
            },
            IdentityStoreError::ServiceUnavailable { message } => {
                Self::ServiceUnavailable { message }
            }
            IdentityStoreError::MalformedResponse { message } => Self::OutcomeUnknown { message },
        }
    }
}

impl From<ProfileStoreError> for ProfileFailureCause {
    fn from(err: ProfileStoreError) -> Self {
        match err {
            ProfileStoreError::UniqueConstraintViolation { field } => {
                Self::UniqueConstraintViolation { field }
            }
            ProfileStoreError::Rejected { status, message } => Self::Rejected {
                message: format!("HTTP {status}: {message}"),
            },
            ProfileStoreError::ServiceUnavailable { message } => {
                Self::ServiceUnavailable { message }
            }
            ProfileStoreError::MalformedResponse { message } => Self::Rejected { message },
        }
    }
}

impl From<IdentityStoreError> for AuthError {
    fn from(err: IdentityStoreError) -> Self {
        match err {
            IdentityStoreError::ServiceUnavailable { message }
            | IdentityStoreError::MalformedResponse { message } => {
                Self::ServiceUnavailable { message }
            }
            IdentityStoreError::DuplicateEmail
            | IdentityStoreError::InvalidCredentialFormat { .. }
            | IdentityStoreError::InvalidCredentials => Self::InvalidCredentials,
        }
    }
}
