//! In-process stores with the same contracts as the hosted backend.
//! Used for offline runs (`--mock`) and tests; failures can be injected.

pub mod identity;
pub mod profiles;

pub use identity::InMemoryIdentityStore;
pub use profiles::InMemoryProfileStore;
