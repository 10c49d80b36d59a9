use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use x25519_dalek::{PublicKey, StaticSecret};

/// WireGuard keypair, both halves base64 encoded as `wg genkey` prints them.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Keypair {
    pub private_key: String,
    pub public_key: String,
}

impl Keypair {
    /// Generate a new X25519 keypair from the OS entropy source
    pub fn generate() -> Self {
        let secret = StaticSecret::random_from_rng(OsRng);
        let public = PublicKey::from(&secret);
        Keypair {
            private_key: STANDARD.encode(secret.to_bytes()),
            public_key: STANDARD.encode(public.as_bytes()),
        }
    }

    /// Check that both keys decode to 32 bytes and that the public key
    /// belongs to the private key.
    pub fn validate(&self) -> Result<(), String> {
        let private = decode_key(&self.private_key).map_err(|e| format!("privateKey: {}", e))?;
        let public = decode_key(&self.public_key).map_err(|e| format!("publicKey: {}", e))?;

        let derived = PublicKey::from(&StaticSecret::from(private));
        if derived.as_bytes() != &public {
            return Err("publicKey does not match privateKey".to_string());
        }
        Ok(())
    }
}

/// Decode a base64 WireGuard key into its raw 32 bytes
pub fn decode_key(encoded: &str) -> Result<[u8; 32], String> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| format!("invalid base64: {}", e))?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| format!("expected 32 bytes, got {}", b.len()))
}
