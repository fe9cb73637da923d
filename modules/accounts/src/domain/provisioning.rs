use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{debug, error, info, instrument, warn};

use crate::contract::error::{IdentityFailureCause, ProfileFailureCause, SignupError};
use crate::contract::model::{IdentityId, NewProfile, ProfileRecord, Role, SignupField, UniqueField};
use crate::domain::draft::SignupDraft;
use crate::domain::events::SignupDomainEvent;
use crate::domain::ports::{EventPublisher, IdentityAttributes, IdentityStore, ProfileStore, Record};

/// Configuration for the provisioning orchestrator
#[derive(Debug, Clone)]
pub struct ProvisioningConfig {
    pub profiles_table: String,
    pub default_role: Option<Role>,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            profiles_table: "users".to_string(),
            default_role: None,
        }
    }
}

/// Creates the identity, then the profile row keyed by the identity id.
///
/// The two stores share no transaction. A profile failure after a successful
/// identity leaves an orphan, which is reported and never rolled back here.
#[derive(Clone)]
pub struct ProvisioningOrchestrator {
    identities: Arc<dyn IdentityStore>,
    profiles: Arc<dyn ProfileStore>,
    events: Arc<dyn EventPublisher<SignupDomainEvent>>,
    config: ProvisioningConfig,
}

impl ProvisioningOrchestrator {
    pub fn new(
        identities: Arc<dyn IdentityStore>,
        profiles: Arc<dyn ProfileStore>,
        events: Arc<dyn EventPublisher<SignupDomainEvent>>,
        config: ProvisioningConfig,
    ) -> Self {
        Self {
            identities,
            profiles,
            events,
            config,
        }
    }

    #[instrument(
        name = "accounts.provisioning.provision",
        skip_all,
        fields(
            email = %draft.unique_value(UniqueField::Email),
            username = %draft.unique_value(UniqueField::Username)
        )
    )]
    pub async fn provision(&self, draft: &SignupDraft) -> Result<ProfileRecord, SignupError> {
        info!("Provisioning new account");

        let birth_date = complete_birth_date(draft, draft.missing_fields())?;

        let email = draft.unique_value(UniqueField::Email);
        let identity_id = self
            .identities
            .create_identity(email, draft.password(), &identity_attributes(draft))
            .await
            .map_err(|e| {
                let cause = IdentityFailureCause::from(e);
                if matches!(cause, IdentityFailureCause::OutcomeUnknown { .. }) {
                    error!(
                        email = %email,
                        cause = %cause,
                        "Identity may exist without a profile; needs manual reconciliation"
                    );
                } else {
                    warn!(cause = %cause, "Identity creation failed; no profile attempted");
                }
                SignupError::identity_creation_failed(cause)
            })?;

        info!(identity_id = %identity_id, "Identity created");
        self.events.publish(&SignupDomainEvent::IdentityCreated {
            id: identity_id,
            at: Utc::now(),
        });

        self.insert_profile(identity_id, email, draft, birth_date)
            .await
    }

    /// Compensation for an orphaned identity: insert the profile row with
    /// the already-issued id and the email that identity was created with.
    /// Never creates an identity; the draft supplies the remaining columns.
    #[instrument(
        name = "accounts.provisioning.complete_orphan",
        skip_all,
        fields(identity_id = %identity_id, email = %identity_email)
    )]
    pub async fn complete_orphan(
        &self,
        identity_id: IdentityId,
        identity_email: &str,
        draft: &SignupDraft,
    ) -> Result<ProfileRecord, SignupError> {
        info!("Retrying profile insert for orphaned identity");

        let mut missing: Vec<_> = draft
            .missing_fields()
            .into_iter()
            .filter(|f| !matches!(f, SignupField::Password | SignupField::Email))
            .collect();
        if identity_email.trim().is_empty() {
            missing.insert(0, SignupField::Email);
        }
        let birth_date = complete_birth_date(draft, missing)?;

        self.insert_profile(identity_id, identity_email.trim(), draft, birth_date)
            .await
    }

    async fn insert_profile(
        &self,
        identity_id: IdentityId,
        email: &str,
        draft: &SignupDraft,
        birth_date: NaiveDate,
    ) -> Result<ProfileRecord, SignupError> {
        let new_profile = NewProfile {
            id: identity_id,
            name: draft.name().trim().to_string(),
            username: draft.unique_value(UniqueField::Username).to_string(),
            email: email.to_string(),
            birth_date,
            country: draft.country(),
            role: self.config.default_role,
        };

        let inserted = match serde_json::to_value(&new_profile) {
            Ok(payload) => self
                .profiles
                .insert(&self.config.profiles_table, payload)
                .await
                .map_err(ProfileFailureCause::from),
            Err(e) => Err(ProfileFailureCause::Rejected {
                message: format!("profile encoding failed: {e}"),
            }),
        };

        match inserted {
            Ok(row) => {
                let record = decode_inserted(row, new_profile);
                info!(identity_id = %record.id, "Profile created");
                self.events.publish(&SignupDomainEvent::ProfileCreated {
                    id: record.id,
                    at: record.created_at,
                });
                Ok(record)
            }
            Err(cause) => {
                error!(
                    identity_id = %identity_id,
                    cause = %cause,
                    "Profile insert failed; identity is orphaned"
                );
                self.events.publish(&SignupDomainEvent::IdentityOrphaned {
                    id: identity_id,
                    at: Utc::now(),
                    reason: cause.to_string(),
                });
                Err(SignupError::profile_creation_failed(identity_id, cause))
            }
        }
    }
}

fn complete_birth_date(
    draft: &SignupDraft,
    missing: Vec<SignupField>,
) -> Result<NaiveDate, SignupError> {
    if !missing.is_empty() {
        return Err(SignupError::validation(missing));
    }
    draft
        .birth_date()
        .ok_or_else(|| SignupError::validation(vec![SignupField::BirthDate]))
}

fn identity_attributes(draft: &SignupDraft) -> IdentityAttributes {
    IdentityAttributes::from([
        ("name".to_string(), draft.name().trim().to_string()),
        (
            "username".to_string(),
            draft.unique_value(UniqueField::Username).to_string(),
        ),
        ("country".to_string(), draft.country().code().to_string()),
    ])
}

/// The store's echo is preferred; an unusable echo falls back to the payload
/// because the insert itself was accepted.
fn decode_inserted(row: Record, new_profile: NewProfile) -> ProfileRecord {
    match serde_json::from_value::<ProfileRecord>(row) {
        Ok(record) if record.id == new_profile.id => record,
        Ok(record) => {
            warn!(
                expected = %new_profile.id,
                returned = %record.id,
                "Store echoed a different profile id; using insert payload"
            );
            ProfileRecord::from_new(new_profile, Utc::now())
        }
        Err(e) => {
            debug!(error = %e, "Store echo not decodable; using insert payload");
            ProfileRecord::from_new(new_profile, Utc::now())
        }
    }
}
