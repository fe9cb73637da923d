pub mod identity;
pub mod profile;

pub use identity::{IdentityAttributes, IdentityStore};
pub use profile::{ProfileStore, Record};

/// Output port: publish domain events (no knowledge of transport).
pub trait EventPublisher<E>: Send + Sync + 'static {
    fn publish(&self, event: &E);
}
