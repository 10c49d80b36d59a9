//! Credential document types

use serde::{Deserialize, Serialize};
use crate::crypto::{decode_key, Keypair};

/// Status fields the WARP API reports for an account. Refreshed on every run.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AccountStatus {
    pub warp_plus: bool,
    pub quota: u64,             // Bytes
    #[serde(default)]
    pub referral_count: u64,
    #[serde(default)]
    pub account_type: String,   // "free", "limited", "unlimited", ...
}

impl AccountStatus {
    /// Quota in (decimal) gigabytes, as the WARP app shows it
    pub fn quota_gb(&self) -> f64 {
        self.quota as f64 / 1_000_000_000.0
    }
}

/// Tunnel parameters issued at registration
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TunnelConfig {
    pub peer_public_key: String,
    pub endpoint: String,
    pub address_v4: String,
    pub address_v6: String,
}

/// Identity and authorization bundle issued by the WARP API for one keypair
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AccountCredential {
    // Identity
    pub device_id: String,
    pub token: String,
    pub account_id: String,

    // Status
    pub account: AccountStatus,

    // Tunnel
    pub tunnel: TunnelConfig,
}

impl AccountCredential {
    /// Take the remote view of the account status. Identity fields are never touched.
    pub fn apply_status(&mut self, status: AccountStatus) {
        self.account.warp_plus = status.warp_plus;
        self.account.quota = status.quota;
        self.account.referral_count = status.referral_count;
        self.account.account_type = status.account_type;
    }
}

/// The credential document: keypair plus account credential, saved as one JSON object
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct PersistedState {
    #[serde(flatten)]
    pub keypair: Keypair,
    #[serde(flatten)]
    pub credential: AccountCredential,
}

impl PersistedState {
    pub fn new(keypair: Keypair, credential: AccountCredential) -> Self {
        Self { keypair, credential }
    }

    /// Reject documents that parse but cannot drive a tunnel.
    pub fn validate(&self) -> Result<(), String> {
        self.keypair.validate()?;

        let required = [
            ("deviceId", &self.credential.device_id),
            ("token", &self.credential.token),
            ("accountId", &self.credential.account_id),
            ("tunnel.endpoint", &self.credential.tunnel.endpoint),
            ("tunnel.addressV4", &self.credential.tunnel.address_v4),
            ("tunnel.addressV6", &self.credential.tunnel.address_v6),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(format!("{} is empty", field));
            }
        }

        decode_key(&self.credential.tunnel.peer_public_key)
            .map_err(|e| format!("tunnel.peerPublicKey: {}", e))?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;

    pub fn credential() -> AccountCredential {
        AccountCredential {
            device_id: "device-0001".to_string(),
            token: "token-0001".to_string(),
            account_id: "account-0001".to_string(),
            account: AccountStatus {
                warp_plus: true,
                quota: 1_000_000_000,
                referral_count: 1,
                account_type: "limited".to_string(),
            },
            tunnel: TunnelConfig {
                peer_public_key: STANDARD.encode([9u8; 32]),
                endpoint: "engage.cloudflareclient.com:2408".to_string(),
                address_v4: "172.16.0.2".to_string(),
                address_v6: "2606:4700:110:8a36::2".to_string(),
            },
        }
    }

    pub fn state() -> PersistedState {
        PersistedState::new(Keypair::generate(), credential())
    }
}
