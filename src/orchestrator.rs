//! Credential lifecycle
//!
//! Every invocation inspects what is on disk and picks one path:
//! - no credential document: register a fresh identity
//! - corrupt credential document: discard it and register a fresh identity
//! - valid document, missing WireGuard file: re-render the file locally
//! - valid document and file: nothing to repair
//!
//! Existing identities then replay any requested referrals and refresh their
//! status from the API. A missing WireGuard file is written as soon as it is
//! re-rendered; everything else is written only after the last remote call
//! succeeded.

use std::sync::Arc;
use tracing::info;

use crate::account::{CredentialStore, LoadOutcome, PersistedState};
use crate::client::ProvisioningClient;
use crate::config::ReferralConfig;
use crate::crypto::Keypair;
use crate::error::{Result, WarpError};
use crate::events::{EventSink, StatusEvent};
use crate::quota::{QuotaIncrementer, Sleeper};
use crate::wireguard;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// No credentials existed; a new identity was registered
    Initialized,
    /// Corrupt credentials were replaced by a new identity
    Reinitialized,
    /// The WireGuard file was regenerated from existing credentials
    Repaired,
    /// Existing credentials were refreshed
    Refreshed,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub referrals: u32,
    pub state: PersistedState,
}

pub struct Orchestrator {
    client: Arc<dyn ProvisioningClient>,
    store: Arc<dyn CredentialStore>,
    sleeper: Arc<dyn Sleeper>,
    events: Arc<dyn EventSink>,
    referral: ReferralConfig,
}

impl Orchestrator {
    pub fn new(
        client: Arc<dyn ProvisioningClient>,
        store: Arc<dyn CredentialStore>,
        sleeper: Arc<dyn Sleeper>,
        events: Arc<dyn EventSink>,
        referral: ReferralConfig,
    ) -> Self {
        Self {
            client,
            store,
            sleeper,
            events,
            referral,
        }
    }

    pub async fn run(&self, referrals: u32) -> Result<RunReport> {
        let state = match self.store.load()? {
            LoadOutcome::Absent => {
                return self.initialize(RunOutcome::Initialized, referrals).await;
            }
            LoadOutcome::Corrupted(reason) => {
                self.events.emit(StatusEvent::CorruptedReset { reason });
                return self.initialize(RunOutcome::Reinitialized, referrals).await;
            }
            LoadOutcome::Loaded(state) => state,
        };

        let mut outcome = RunOutcome::Refreshed;
        let mut written = None;
        if !self.store.config_exists()? {
            self.events.emit(StatusEvent::ConfigRegenerating);
            let text = wireguard::render(&state);
            self.store.save_config(&text)?;
            written = Some(text);
            outcome = RunOutcome::Repaired;
        }

        let completed = QuotaIncrementer::new(
            self.client.as_ref(),
            self.sleeper.as_ref(),
            self.events.as_ref(),
            &self.referral,
        )
        .run(&state.credential, referrals)
        .await?;

        let state = self.refresh(state, written.as_deref()).await?;
        Ok(RunReport {
            outcome,
            referrals: completed,
            state,
        })
    }

    /// Generate, register and enable a brand new identity
    async fn initialize(&self, outcome: RunOutcome, referrals: u32) -> Result<RunReport> {
        self.events.emit(StatusEvent::Initializing);
        if referrals > 0 {
            self.events.emit(StatusEvent::ReferralsSkipped { requested: referrals });
        }

        let keypair = Keypair::generate();
        let credential = self.client.register(&keypair).await?;
        self.events.emit(StatusEvent::Registered {
            device_id: credential.device_id.clone(),
        });

        self.client.enable_entitlement(&credential).await?;
        self.events.emit(StatusEvent::EntitlementEnabled);

        let state = PersistedState::new(keypair, credential);
        state.validate().map_err(|reason| WarpError::InvalidResponse {
            operation: "register",
            reason,
        })?;

        let state = self.refresh(state, None).await?;
        Ok(RunReport {
            outcome,
            referrals: 0,
            state,
        })
    }

    /// Pull the remote account status, then overwrite both documents. The
    /// WireGuard file is skipped when `written` already holds the same text.
    async fn refresh(&self, mut state: PersistedState, written: Option<&str>) -> Result<PersistedState> {
        let status = self.client.fetch_info(&state.credential).await?;
        state.credential.apply_status(status);
        self.events.emit(StatusEvent::QuotaRefreshed {
            quota: state.credential.account.quota,
            warp_plus: state.credential.account.warp_plus,
        });

        self.store.save(&state)?;
        let text = wireguard::render(&state);
        if written != Some(text.as_str()) {
            self.store.save_config(&text)?;
        }
        self.events.emit(StatusEvent::Persisted);
        info!(device = %state.credential.device_id, "run complete");
        Ok(state)
    }
}
