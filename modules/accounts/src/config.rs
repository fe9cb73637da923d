use serde::{Deserialize, Serialize};

use crate::contract::model::Role;

/// Configuration for the accounts module
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountsConfig {
    /// Table holding one profile row per identity.
    #[serde(default = "default_profiles_table")]
    pub profiles_table: String,
    /// Role assigned to newly registered profiles.
    #[serde(default)]
    pub default_role: Option<Role>,
    /// Run advisory uniqueness checks when completing signup steps.
    #[serde(default = "default_check_uniqueness_on_advance")]
    pub check_uniqueness_on_advance: bool,
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            profiles_table: default_profiles_table(),
            default_role: None,
            check_uniqueness_on_advance: default_check_uniqueness_on_advance(),
        }
    }
}

fn default_profiles_table() -> String {
    "users".to_string()
}

fn default_check_uniqueness_on_advance() -> bool {
    true
}
