//! Credential store keyed by instance name.
//!
//! The on-disk format is the JSON `.wirecloudrc` file in the user's home
//! directory:
//!
//! ```json
//! {
//!     "hosts": {
//!         "fiwarelab": {
//!             "url": "https://mashup.lab.fiware.org",
//!             "client_id": "...",
//!             "client_secret": "...",
//!             "token_info": { "access_token": "...", "expires_in": 3600, "expires_on": 1700000000000 }
//!         }
//!     }
//! }
//! ```
//!
//! There is no locking; two concurrent invocations may lose each other's
//! updates (last writer wins).

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::auth::token::TokenRecord;
use crate::error::{Error, Result};

const CREDENTIAL_FILE_NAME: &str = ".wirecloudrc";

/// One configured marketplace server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct InstanceRecord {
    pub url: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    /// Overrides the server's advertised redirect uri for the
    /// authorization-code flow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,
    #[serde(
        rename = "token_info",
        alias = "token",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub token: Option<TokenRecord>,
}

impl InstanceRecord {
    pub fn new(url: String, client_id: String, client_secret: String) -> Self {
        Self {
            url,
            client_id,
            client_secret,
            redirect_uri: None,
            token: None,
        }
    }

    /// Bearer token of the cached token record, if any.
    pub fn access_token(&self) -> Option<&str> {
        self.token
            .as_ref()
            .map(|t| t.access_token.as_str())
            .filter(|t| !t.is_empty())
    }
}

/// Whole content of the credential file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CredentialFile {
    #[serde(default)]
    pub hosts: BTreeMap<String, InstanceRecord>,
    /// Keys written by other tools are kept as-is.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl CredentialFile {
    pub fn get(&self, name: &str) -> Option<&InstanceRecord> {
        self.hosts.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, instance: InstanceRecord) {
        self.hosts.insert(name.into(), instance);
    }
}

/// Load/save access to the credential mapping.
pub trait CredentialStore: Send + Sync {
    /// Returns an empty mapping when nothing has been stored yet.
    fn load(&self) -> Result<CredentialFile>;

    /// Replaces the stored mapping.
    fn save(&self, credentials: &CredentialFile) -> Result<()>;
}

/// JSON file backed store.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.wirecloudrc`
    pub fn default_location() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::CredentialStore("Cannot determine home directory".to_string()))?;
        Ok(Self::new(home.join(CREDENTIAL_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| CREDENTIAL_FILE_NAME.to_string());
        self.path.with_file_name(format!("{}.tmp", file_name))
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<CredentialFile> {
        debug!("Loading credentials from: {:?}", self.path);

        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("Credential file doesn't exist, starting with no instances");
                return Ok(CredentialFile::default());
            }
            Err(e) => {
                return Err(Error::CredentialStore(format!(
                    "Failed to read {:?}: {}",
                    self.path, e
                )));
            }
        };

        let credentials: CredentialFile = serde_json::from_str(&content).map_err(|e| {
            Error::CredentialStore(format!("Failed to parse {:?}: {}", self.path, e))
        })?;

        debug!("Loaded {} instances", credentials.hosts.len());
        Ok(credentials)
    }

    fn save(&self, credentials: &CredentialFile) -> Result<()> {
        debug!("Saving credentials to: {:?}", self.path);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    Error::CredentialStore(format!("Failed to create {:?}: {}", parent, e))
                })?;
            }
        }

        let mut content = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut content, formatter);
        credentials
            .serialize(&mut serializer)
            .map_err(|e| Error::CredentialStore(format!("Failed to serialize credentials: {}", e)))?;
        content.push(b'\n');

        let temp_path = self.temp_path();
        fs::write(&temp_path, &content).map_err(|e| {
            Error::CredentialStore(format!("Failed to write {:?}: {}", temp_path, e))
        })?;
        fs::rename(&temp_path, &self.path).map_err(|e| {
            Error::CredentialStore(format!("Failed to replace {:?}: {}", self.path, e))
        })?;

        info!("Credentials saved successfully");
        Ok(())
    }
}

/// Store kept in memory, for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    credentials: CredentialFile,
    saves: usize,
}

impl MemoryCredentialStore {
    pub fn new(credentials: CredentialFile) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                credentials,
                saves: 0,
            }),
        }
    }

    pub fn with_instance(name: &str, instance: InstanceRecord) -> Self {
        let mut credentials = CredentialFile::default();
        credentials.insert(name, instance);
        Self::new(credentials)
    }

    /// Current content.
    pub fn snapshot(&self) -> CredentialFile {
        self.state
            .lock()
            .map(|s| s.credentials.clone())
            .unwrap_or_default()
    }

    /// Number of completed saves.
    pub fn save_count(&self) -> usize {
        self.state.lock().map(|s| s.saves).unwrap_or_default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<CredentialFile> {
        let state = self
            .state
            .lock()
            .map_err(|_| Error::CredentialStore("credential store lock poisoned".to_string()))?;
        Ok(state.credentials.clone())
    }

    fn save(&self, credentials: &CredentialFile) -> Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| Error::CredentialStore("credential store lock poisoned".to_string()))?;
        state.credentials = credentials.clone();
        state.saves += 1;
        Ok(())
    }
}
