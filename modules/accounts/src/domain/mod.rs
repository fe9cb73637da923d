pub mod draft;
pub mod error;
pub mod events;
pub mod ports;
pub mod provisioning;
pub mod session;
pub mod uniqueness;
