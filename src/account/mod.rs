//! Persisted WARP credentials
//!
//! - `types`: the credential document schema and its validation
//! - `store`: loading/saving the credential document and the rendered WireGuard file

pub mod types;
pub mod store;

pub use types::{AccountCredential, AccountStatus, PersistedState, TunnelConfig};
pub use store::{CredentialStore, FileStore, LoadOutcome, MemoryStore};
