use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{Result, WarpError};

pub const SETTINGS_FILE: &str = "config.toml";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct WarpConfig {
    pub api: ApiConfig,
    pub referral: ReferralConfig,
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub user_agent: String,
    pub locale: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.cloudflareclient.com/v0a745".to_string(),
            user_agent: "okhttp/3.12.1".to_string(),
            locale: "en_US".to_string(),
        }
    }
}

/// Where the referral throttle sleeps
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DelayPolicy {
    /// Sleep before every referral, including the first
    #[default]
    BeforeEach,
    /// Sleep only between consecutive referrals
    BetweenCalls,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ReferralConfig {
    pub delay_secs: u64,
    pub delay_policy: DelayPolicy,
}

impl Default for ReferralConfig {
    fn default() -> Self {
        Self {
            delay_secs: 20,
            delay_policy: DelayPolicy::BeforeEach,
        }
    }
}

impl ReferralConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

impl WarpConfig {
    /// Load `config.toml` from the storage directory. A missing file means defaults;
    /// a malformed one is an error. Never writes.
    pub fn load_or_default(dir: &Path) -> Result<Self> {
        let path = dir.join(SETTINGS_FILE);
        let text = match std::fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        Self::parse(&text).map_err(|reason| WarpError::Settings {
            path: path.display().to_string(),
            reason,
        })
    }

    pub fn parse(text: &str) -> std::result::Result<Self, String> {
        toml::from_str(text).map_err(|e| e.to_string())
    }
}
