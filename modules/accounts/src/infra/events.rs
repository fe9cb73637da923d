use parking_lot::Mutex;
use tracing::{error, info};

use crate::domain::events::SignupDomainEvent;
use crate::domain::ports::EventPublisher;

/// Emits provisioning events as structured log records.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventPublisher;

impl EventPublisher<SignupDomainEvent> for TracingEventPublisher {
    fn publish(&self, event: &SignupDomainEvent) {
        match event {
            SignupDomainEvent::IdentityCreated { id, at } => {
                info!(target: "accounts::events", identity_id = %id, at = %at, "identity_created");
            }
            SignupDomainEvent::ProfileCreated { id, at } => {
                info!(target: "accounts::events", identity_id = %id, at = %at, "profile_created");
            }
            SignupDomainEvent::IdentityOrphaned { id, at, reason } => {
                error!(
                    target: "accounts::events",
                    identity_id = %id,
                    at = %at,
                    reason = %reason,
                    "identity_orphaned"
                );
            }
        }
    }
}

/// Keeps every published event in memory, in order.
#[derive(Debug, Default)]
pub struct RecordingEventPublisher {
    events: Mutex<Vec<SignupDomainEvent>>,
}

impl RecordingEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SignupDomainEvent> {
        self.events.lock().clone()
    }
}

impl EventPublisher<SignupDomainEvent> for RecordingEventPublisher {
    fn publish(&self, event: &SignupDomainEvent) {
        self.events.lock().push(event.clone());
    }
}
