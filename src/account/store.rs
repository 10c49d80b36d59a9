//! Credential and configuration document storage

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tempfile::NamedTempFile;
use tracing::debug;

use super::types::PersistedState;
use crate::error::Result;

pub const DATA_FILE: &str = "data.json";
pub const CONFIG_FILE: &str = "cf-warp.conf";

/// What `load` found on disk
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Loaded(PersistedState),
    Absent,
    /// The document exists but is not a valid credential document
    Corrupted(String),
}

/// Storage for the credential document and the rendered WireGuard file.
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Result<LoadOutcome>;
    fn save(&self, state: &PersistedState) -> Result<()>;
    fn config_exists(&self) -> Result<bool>;
    fn save_config(&self, text: &str) -> Result<()>;
}

/// Parse and validate the bytes of a credential document
pub fn parse_document(bytes: &[u8]) -> LoadOutcome {
    let state: PersistedState = match serde_json::from_slice(bytes) {
        Ok(s) => s,
        // serde messages can quote document values, which include the token and private key
        Err(e) => {
            return LoadOutcome::Corrupted(format!(
                "{:?} error at line {}, column {}",
                e.classify(),
                e.line(),
                e.column()
            ))
        }
    };
    match state.validate() {
        Ok(()) => LoadOutcome::Loaded(state),
        Err(reason) => LoadOutcome::Corrupted(reason),
    }
}

/// Serialize a credential document, 2-space indented
pub fn render_document(state: &PersistedState) -> Result<String> {
    Ok(serde_json::to_string_pretty(state)?)
}

/// File-backed store rooted at a storage directory
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn data_path(&self) -> PathBuf {
        self.dir.join(DATA_FILE)
    }

    pub fn config_path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE)
    }

    /// Write to a temp file in the same directory, then rename over the target.
    fn write_atomic(&self, path: &Path, contents: &[u8], private: bool) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;

        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(contents)?;
        tmp.as_file().sync_all()?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if private {
                tmp.as_file()
                    .set_permissions(std::fs::Permissions::from_mode(0o600))?;
            }
        }
        #[cfg(not(unix))]
        let _ = private;

        tmp.persist(path).map_err(|e| e.error)?;
        debug!("wrote {}", path.display());
        Ok(())
    }
}

impl CredentialStore for FileStore {
    fn load(&self) -> Result<LoadOutcome> {
        let bytes = match std::fs::read(self.data_path()) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(LoadOutcome::Absent),
            Err(e) => return Err(e.into()),
        };
        Ok(parse_document(&bytes))
    }

    fn save(&self, state: &PersistedState) -> Result<()> {
        let json = render_document(state)?;
        self.write_atomic(&self.data_path(), json.as_bytes(), true)
    }

    fn config_exists(&self) -> Result<bool> {
        Ok(self.config_path().try_exists()?)
    }

    fn save_config(&self, text: &str) -> Result<()> {
        self.write_atomic(&self.config_path(), text.as_bytes(), true)
    }
}

/// In-memory store holding the raw document bytes, for tests and dry runs.
#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<Option<Vec<u8>>>,
    config: Mutex<Option<String>>,
    config_writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with raw document bytes, valid or not
    pub fn with_raw_data(bytes: impl Into<Vec<u8>>) -> Self {
        let store = Self::default();
        *store.data.lock().unwrap_or_else(|e| e.into_inner()) = Some(bytes.into());
        store
    }

    pub fn with_state(state: &PersistedState) -> Result<Self> {
        Ok(Self::with_raw_data(render_document(state)?))
    }

    pub fn raw_data(&self) -> Option<Vec<u8>> {
        self.data.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn config(&self) -> Option<String> {
        self.config.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of `save_config` calls so far
    pub fn config_writes(&self) -> usize {
        self.config_writes.load(Ordering::SeqCst)
    }

    pub fn set_config(&self, text: Option<String>) {
        *self.config.lock().unwrap_or_else(|e| e.into_inner()) = text;
    }
}

impl CredentialStore for MemoryStore {
    fn load(&self) -> Result<LoadOutcome> {
        Ok(match self.raw_data() {
            None => LoadOutcome::Absent,
            Some(bytes) => parse_document(&bytes),
        })
    }

    fn save(&self, state: &PersistedState) -> Result<()> {
        let json = render_document(state)?;
        *self.data.lock().unwrap_or_else(|e| e.into_inner()) = Some(json.into_bytes());
        Ok(())
    }

    fn config_exists(&self) -> Result<bool> {
        Ok(self.config().is_some())
    }

    fn save_config(&self, text: &str) -> Result<()> {
        self.config_writes.fetch_add(1, Ordering::SeqCst);
        self.set_config(Some(text.to_string()));
        Ok(())
    }
}
