pub mod account;
pub mod cli;
pub mod client;
pub mod config;
pub mod crypto;
pub mod error;
pub mod events;
pub mod orchestrator;
pub mod quota;
pub mod wireguard;

pub use error::{Result, WarpError};
pub use orchestrator::{Orchestrator, RunOutcome, RunReport};
