use chrono::{DateTime, Utc};

use crate::contract::model::IdentityId;

/// Transport-agnostic provisioning event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignupDomainEvent {
    IdentityCreated {
        id: IdentityId,
        at: DateTime<Utc>,
    },
    ProfileCreated {
        id: IdentityId,
        at: DateTime<Utc>,
    },
    /// An identity exists without a profile row and needs compensation.
    IdentityOrphaned {
        id: IdentityId,
        at: DateTime<Utc>,
        reason: String,
    },
}

impl SignupDomainEvent {
    pub fn identity_id(&self) -> IdentityId {
        match self {
            Self::IdentityCreated { id, .. }
            | Self::ProfileCreated { id, .. }
            | Self::IdentityOrphaned { id, .. } => *id,
        }
    }
}
