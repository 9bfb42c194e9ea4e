//! Persistent configuration: the per-user credential file and the
//! per-project task file.

pub mod credentials;
pub mod task;

pub use credentials::{
    CredentialFile, CredentialStore, FileCredentialStore, InstanceRecord, MemoryCredentialStore,
};
pub use task::{TaskConfig, UploadDefaults};

/// Server used when an instance is created without an explicit url.
pub const DEFAULT_INSTANCE_URL: &str = "https://mashup.lab.fiware.org";

/// Instance alias used when neither the command line nor the task file
/// names one.
pub const DEFAULT_INSTANCE_NAME: &str = "fiwarelab";

/// Bearer token that bypasses every grant flow when set.
pub const ACCESS_TOKEN_ENV: &str = "WIRECLOUD_ACCESS_TOKEN";

/// Server url paired with [`ACCESS_TOKEN_ENV`].
pub const URL_ENV: &str = "WIRECLOUD_URL";
