// HTTPS client for the WARP registration API
use async_trait::async_trait;
use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::{Client, Method};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::ProvisioningClient;
use crate::account::{AccountCredential, AccountStatus, TunnelConfig};
use crate::config::ApiConfig;
use crate::crypto::Keypair;
use crate::error::{Result, WarpError};

pub struct WarpClient {
    base_url: String,
    locale: String,
    client: Client,
}

#[derive(Deserialize)]
struct WireDevice {
    id: String,
    #[serde(default)]
    token: String,
    account: WireAccount,
    #[serde(default)]
    config: Option<WireConfig>,
}

#[derive(Deserialize)]
struct WireAccount {
    #[serde(default)]
    id: String,
    #[serde(default)]
    warp_plus: bool,
    #[serde(default)]
    quota: Option<u64>,
    #[serde(default)]
    premium_data: u64,
    #[serde(default)]
    referral_count: u64,
    #[serde(default)]
    account_type: String,
}

impl From<WireAccount> for AccountStatus {
    fn from(account: WireAccount) -> Self {
        AccountStatus {
            warp_plus: account.warp_plus,
            quota: account.quota.unwrap_or(account.premium_data),
            referral_count: account.referral_count,
            account_type: account.account_type,
        }
    }
}

#[derive(Deserialize)]
struct WireConfig {
    peers: Vec<WirePeer>,
    interface: WireInterface,
}

#[derive(Deserialize)]
struct WirePeer {
    public_key: String,
    endpoint: WireEndpoint,
}

#[derive(Deserialize)]
struct WireEndpoint {
    host: String,
}

#[derive(Deserialize)]
struct WireInterface {
    addresses: WireAddresses,
}

#[derive(Deserialize)]
struct WireAddresses {
    v4: String,
    v6: String,
}

impl WarpClient {
    pub fn new(api: &ApiConfig) -> Result<Self> {
        let client = Client::builder().user_agent(api.user_agent.clone()).build()?;
        Ok(Self {
            base_url: api.base_url.trim_end_matches('/').to_string(),
            locale: api.locale.clone(),
            client,
        })
    }

    // Helper for sending requests; unwraps the optional `result` envelope
    async fn send_request(
        &self,
        operation: &'static str,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, path);
        debug!("{} {} ({})", method, url, operation);

        let mut request = self.client.request(method, &url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(WarpError::Api {
                operation,
                status: status.as_u16(),
                body: text,
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        let mut json: Value = serde_json::from_str(&text).map_err(|e| WarpError::InvalidResponse {
            operation,
            reason: e.to_string(),
        })?;
        if json.get("result").is_some_and(Value::is_object) {
            return Ok(json["result"].take());
        }
        Ok(json)
    }

    fn parse_device(operation: &'static str, value: Value) -> Result<WireDevice> {
        serde_json::from_value(value).map_err(|e| WarpError::InvalidResponse {
            operation,
            reason: e.to_string(),
        })
    }
}

fn tos_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

fn random_token(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[async_trait]
impl ProvisioningClient for WarpClient {
    async fn register(&self, keypair: &Keypair) -> Result<AccountCredential> {
        let body = json!({
            "install_id": "",
            "fcm_token": "",
            "tos": tos_timestamp(),
            "key": keypair.public_key,
            "type": "ios",
            "locale": self.locale,
        });
        let value = self
            .send_request("register", Method::POST, "reg", None, Some(body))
            .await?;
        let device = Self::parse_device("register", value)?;

        let config = device.config.ok_or_else(|| WarpError::InvalidResponse {
            operation: "register",
            reason: "missing tunnel config".to_string(),
        })?;
        let peer = config.peers.into_iter().next().ok_or_else(|| WarpError::InvalidResponse {
            operation: "register",
            reason: "no peers in tunnel config".to_string(),
        })?;
        if device.token.is_empty() {
            return Err(WarpError::InvalidResponse {
                operation: "register",
                reason: "missing token".to_string(),
            });
        }

        Ok(AccountCredential {
            device_id: device.id,
            token: device.token,
            account_id: device.account.id.clone(),
            account: device.account.into(),
            tunnel: TunnelConfig {
                peer_public_key: peer.public_key,
                endpoint: peer.endpoint.host,
                address_v4: config.interface.addresses.v4,
                address_v6: config.interface.addresses.v6,
            },
        })
    }

    async fn enable_entitlement(&self, credential: &AccountCredential) -> Result<()> {
        let path = format!("reg/{}", credential.device_id);
        self.send_request(
            "enable_entitlement",
            Method::PATCH,
            &path,
            Some(&credential.token),
            Some(json!({ "warp_enabled": true })),
        )
        .await?;
        Ok(())
    }

    async fn fetch_info(&self, credential: &AccountCredential) -> Result<AccountStatus> {
        let path = format!("reg/{}", credential.device_id);
        let value = self
            .send_request("fetch_info", Method::GET, &path, Some(&credential.token), None)
            .await?;
        let device = Self::parse_device("fetch_info", value)?;
        Ok(device.account.into())
    }

    async fn fake_referral(&self, credential: &AccountCredential) -> Result<()> {
        let install_id = random_token(22);
        let body = json!({
            "install_id": install_id,
            "fcm_token": format!("{}:APA91b{}", install_id, random_token(134)),
            "referrer": credential.device_id,
            "warp_enabled": false,
            "tos": tos_timestamp(),
            "type": "Android",
            "locale": self.locale,
        });
        self.send_request("fake_referral", Method::POST, "reg", None, Some(body))
            .await?;
        Ok(())
    }
}
