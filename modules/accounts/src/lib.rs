// === PUBLIC CONTRACT ===
pub mod contract;

pub use contract::{client, error, model};

// === MODULE DEFINITION ===
pub mod module;
pub use module::{AccountsModule, AccountsPorts};

pub use domain::draft::SignupDraft;
pub use domain::session::{SessionOptions, SignupSession};

// === INTERNAL MODULES ===
// Exposed for adapters, the CLI and integration tests; prefer `contract`
// for anything meant to stay stable.
pub mod config;
pub mod domain;
pub mod infra;
#[doc(hidden)]
pub mod gateways;
