// WARP provisioning client
pub mod api;

use async_trait::async_trait;

use crate::account::{AccountCredential, AccountStatus};
use crate::crypto::Keypair;
use crate::error::Result;

pub use api::WarpClient;

/// Remote operations of the WARP provisioning API. Every call is an
/// independent network request that may fail.
#[async_trait]
pub trait ProvisioningClient: Send + Sync {
    /// Bind a public key to a new device identity
    async fn register(&self, keypair: &Keypair) -> Result<AccountCredential>;

    /// Switch the device to Warp+
    async fn enable_entitlement(&self, credential: &AccountCredential) -> Result<()>;

    /// Read-only status refresh
    async fn fetch_info(&self, credential: &AccountCredential) -> Result<AccountStatus>;

    /// Register a throwaway install that names this device as its referrer
    async fn fake_referral(&self, credential: &AccountCredential) -> Result<()>;
}
