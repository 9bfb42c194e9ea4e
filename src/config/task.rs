//! Project task file (`wirecloud.toml`) holding default upload options.

use anyhow::{Context, Result};
use log::{debug, info};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::api::PublicFlag;

pub const TASK_FILE_NAME: &str = "wirecloud.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskConfig {
    #[serde(default)]
    pub upload: UploadDefaults,
}

/// `[upload]` table. Every key is optional; command line flags win.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadDefaults {
    pub file: Option<PathBuf>,
    pub instance: Option<String>,
    pub overwrite: Option<bool>,
    /// Kept untyped so that a non-boolean value is reported by the upload
    /// operation instead of failing the whole file.
    pub public: Option<toml::Value>,
    pub vendor: Option<String>,
    pub name: Option<String>,
    pub version: Option<String>,
}

impl UploadDefaults {
    pub fn public_flag(&self) -> PublicFlag {
        match &self.public {
            None => PublicFlag::Unset,
            Some(toml::Value::Boolean(value)) => PublicFlag::Set(*value),
            Some(other) => PublicFlag::Invalid(other.to_string()),
        }
    }
}

impl TaskConfig {
    /// Loads `path` when given (it must exist), otherwise `wirecloud.toml`
    /// from the working directory if there is one.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(TASK_FILE_NAME), false),
        };

        if !path.exists() {
            if required {
                anyhow::bail!("Task file not found: {:?}", path);
            }
            debug!("No task file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read task file: {:?}", path))?;
        let config = Self::parse(&content)
            .with_context(|| format!("Failed to parse task file: {:?}", path))?;

        info!("Loaded task file {:?}", path);
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
