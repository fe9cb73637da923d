use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::contract::error::{SignupError, SignupWarning};
use crate::contract::model::{IdentityId, ProfileRecord, SignupField, SignupState, UniqueField};
use crate::domain::draft::SignupDraft;
use crate::domain::provisioning::ProvisioningOrchestrator;
use crate::domain::uniqueness::{UniquenessCheck, UniquenessChecker};

/// Options for a signup session.
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    /// Consult the uniqueness checker when completing steps, not only on submit.
    pub check_uniqueness_on_advance: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            check_uniqueness_on_advance: true,
        }
    }
}

/// Identity created without a profile row.
#[derive(Debug, Clone)]
struct PendingOrphan {
    id: IdentityId,
    /// Email the identity was registered with; later draft edits do not move it.
    email: String,
}

/// Multi-step registration state machine over one [`SignupDraft`].
///
/// Every operation takes `&mut self`: one writer per draft, and no two
/// operations on the same session can overlap.
pub struct SignupSession {
    draft: SignupDraft,
    state: SignupState,
    last_error: Option<SignupError>,
    warnings: Vec<SignupWarning>,
    orphan: Option<PendingOrphan>,
    checker: Arc<UniquenessChecker>,
    orchestrator: Arc<ProvisioningOrchestrator>,
    options: SessionOptions,
}

impl SignupSession {
    pub fn new(
        checker: Arc<UniquenessChecker>,
        orchestrator: Arc<ProvisioningOrchestrator>,
        options: SessionOptions,
    ) -> Self {
        Self {
            draft: SignupDraft::new(),
            state: SignupState::Empty,
            last_error: None,
            warnings: Vec::new(),
            orphan: None,
            checker,
            orchestrator,
            options,
        }
    }

    pub fn current_state(&self) -> SignupState {
        self.state
    }

    pub fn last_error(&self) -> Option<&SignupError> {
        self.last_error.as_ref()
    }

    /// Warnings raised by the most recent `advance` or `submit`.
    pub fn warnings(&self) -> &[SignupWarning] {
        &self.warnings
    }

    pub fn draft(&self) -> &SignupDraft {
        &self.draft
    }

    /// Identity created without a profile row, awaiting `retry_profile`.
    pub fn orphaned_identity(&self) -> Option<IdentityId> {
        self.orphan.as_ref().map(|o| o.id)
    }

    /// Mutate the draft. Never changes the state.
    pub fn update_field(&mut self, field: SignupField, value: &str) {
        self.draft.update_field(field, value);
    }

    /// Complete the current step if its fields are valid.
    #[instrument(name = "accounts.session.advance", skip(self), fields(state = %self.state))]
    pub async fn advance(&mut self) -> Result<SignupState, SignupError> {
        self.warnings.clear();
        let result = self.try_advance().await;
        self.record(result)
    }

    async fn try_advance(&mut self) -> Result<SignupState, SignupError> {
        let next = match self.state {
            SignupState::Empty => {
                require(self.draft.missing_step1_fields())?;
                if self.options.check_uniqueness_on_advance {
                    self.ensure_available(UniqueField::Email).await?;
                }
                SignupState::Step1Complete
            }
            SignupState::Step1Complete => {
                require(self.draft.missing_fields())?;
                if self.options.check_uniqueness_on_advance {
                    self.ensure_available(UniqueField::Username).await?;
                }
                SignupState::Step2Complete
            }
            SignupState::Step2Complete => SignupState::Step2Complete,
            SignupState::Failed if self.orphan.is_none() => {
                require(self.draft.missing_fields())?;
                SignupState::Step2Complete
            }
            state => return Err(SignupError::invalid_state("advance", state)),
        };

        debug!(from = %self.state, to = %next, "Signup step advanced");
        self.state = next;
        Ok(next)
    }

    /// Step back without touching the network.
    pub fn back(&mut self) -> Result<SignupState, SignupError> {
        let previous = match self.state {
            SignupState::Step2Complete => SignupState::Step1Complete,
            SignupState::Step1Complete => SignupState::Empty,
            SignupState::Failed if self.orphan.is_none() => SignupState::Step1Complete,
            state => return self.record(Err(SignupError::invalid_state("go back", state))),
        };
        self.state = previous;
        self.last_error = None;
        Ok(previous)
    }

    /// Check uniqueness, then create identity and profile.
    ///
    /// A confirmed conflict blocks before any store mutation and keeps the
    /// session in `Step2Complete`.
    #[instrument(name = "accounts.session.submit", skip(self), fields(state = %self.state))]
    pub async fn submit(&mut self) -> Result<ProfileRecord, SignupError> {
        if self.state != SignupState::Step2Complete {
            return self.record(Err(SignupError::invalid_state("submit", self.state)));
        }
        self.warnings.clear();

        let prechecks = self.precheck().await;
        self.record(prechecks)?;

        self.state = SignupState::Submitting;
        info!("Submitting signup");
        let outcome = self.orchestrator.provision(&self.draft).await;
        self.finish(outcome)
    }

    /// Compensation after `ProfileCreationFailed`: insert the profile row for
    /// the orphaned identity with the same id and the email it was created
    /// with, whatever the draft's email says now.
    #[instrument(name = "accounts.session.retry_profile", skip(self), fields(state = %self.state))]
    pub async fn retry_profile(&mut self) -> Result<ProfileRecord, SignupError> {
        let orphan = match (self.state, &self.orphan) {
            (SignupState::Failed, Some(orphan)) => orphan.clone(),
            (state, _) => {
                return self.record(Err(SignupError::invalid_state("retry profile", state)))
            }
        };

        self.state = SignupState::Submitting;
        let outcome = self
            .orchestrator
            .complete_orphan(orphan.id, &orphan.email, &self.draft)
            .await;
        self.finish(outcome)
    }

    /// Abandon the registration. Nothing external has been touched unless
    /// `submit` already ran.
    pub fn cancel(self) {
        debug!(state = %self.state, "Signup session abandoned");
    }

    async fn precheck(&mut self) -> Result<(), SignupError> {
        require(self.draft.missing_fields())?;
        self.ensure_available(UniqueField::Email).await?;
        self.ensure_available(UniqueField::Username).await
    }

    async fn ensure_available(&mut self, field: UniqueField) -> Result<(), SignupError> {
        let value = self.draft.unique_value(field).to_string();
        match self.checker.check(field, &value).await {
            UniquenessCheck::Available => Ok(()),
            UniquenessCheck::Taken => Err(SignupError::conflict(field, value)),
            UniquenessCheck::Degraded { reason } => {
                self.warnings
                    .push(SignupWarning::UniquenessCheckDegraded { field, reason });
                Ok(())
            }
        }
    }

    fn finish(
        &mut self,
        outcome: Result<ProfileRecord, SignupError>,
    ) -> Result<ProfileRecord, SignupError> {
        match outcome {
            Ok(record) => {
                self.state = SignupState::Succeeded;
                self.orphan = None;
                self.draft = SignupDraft::new();
                self.last_error = None;
                info!(identity_id = %record.id, "Signup succeeded");
                Ok(record)
            }
            Err(e) => {
                self.state = SignupState::Failed;
                if let Some(id) = e.orphaned_identity() {
                    // Only a fresh orphan takes the draft's email; retries keep the original.
                    if self.orphan.as_ref().map(|o| o.id) != Some(id) {
                        self.orphan = Some(PendingOrphan {
                            id,
                            email: self.draft.unique_value(UniqueField::Email).to_string(),
                        });
                    }
                }
                self.last_error = Some(e.clone());
                Err(e)
            }
        }
    }

    fn record<T>(&mut self, result: Result<T, SignupError>) -> Result<T, SignupError> {
        self.last_error = result.as_ref().err().cloned();
        result
    }
}

fn require(missing: Vec<SignupField>) -> Result<(), SignupError> {
    if missing.is_empty() {
        Ok(())
    } else {
        Err(SignupError::validation(missing))
    }
}
