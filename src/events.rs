//! Status events emitted while provisioning

use std::sync::Mutex;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum StatusEvent {
    /// No credential document yet
    Initializing,
    /// The credential document was unreadable; a fresh identity replaces it
    CorruptedReset { reason: String },
    Registered { device_id: String },
    EntitlementEnabled,
    /// Credentials exist but the WireGuard file is missing
    ConfigRegenerating,
    /// Referrals requested on an initialization run are not replayed
    ReferralsSkipped { requested: u32 },
    ReferralsStarting { count: u32 },
    ReferralCompleted { index: u32, total: u32 },
    ReferralsFinished { completed: u32 },
    QuotaRefreshed { quota: u64, warp_plus: bool },
    Persisted,
}

/// Receiver for provisioning progress
pub trait EventSink: Send + Sync {
    fn emit(&self, event: StatusEvent);
}

/// Forwards every event to `tracing`
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: StatusEvent) {
        match event {
            StatusEvent::Initializing => info!("Initializing Warp credentials..."),
            StatusEvent::CorruptedReset { reason } => {
                warn!("Credential document is corrupt ({}), all credentials will be reset...", reason)
            }
            StatusEvent::Registered { device_id } => info!("Registered device {}", device_id),
            StatusEvent::EntitlementEnabled => info!("Warp+ enabled"),
            StatusEvent::ConfigRegenerating => {
                info!("WireGuard configuration missing but credentials exist, regenerating...")
            }
            StatusEvent::ReferralsSkipped { requested } => warn!(
                "Skipped {} referral(s) on the initialization run, run again to apply them",
                requested
            ),
            StatusEvent::ReferralsStarting { count } => {
                info!("Preparing to fake Warp+ referral for {} times", count)
            }
            StatusEvent::ReferralCompleted { index, total } => {
                info!("#{}/{} fake referral finished", index, total)
            }
            StatusEvent::ReferralsFinished { completed } => info!("{} fake referral(s) finished", completed),
            StatusEvent::QuotaRefreshed { quota, warp_plus } => {
                info!(quota, warp_plus, "Account status refreshed")
            }
            StatusEvent::Persisted => info!("Credentials saved"),
        }
    }
}

/// Collects events in memory
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<StatusEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<StatusEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: StatusEvent) {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).push(event);
    }
}
