//! Shared state built once per invocation from the global options.

use anyhow::{Context, Result};
use is_terminal::IsTerminal;
use log::debug;
use std::path::PathBuf;
use std::sync::Arc;

use crate::api::{MarketplaceClient, ReqwestTransport, Transport};
use crate::auth::{SystemBrowser, TokenAcquirer, TokenOverride};
use crate::config::{
    CredentialStore, DEFAULT_INSTANCE_NAME, FileCredentialStore, TaskConfig, UploadDefaults,
};
use crate::descriptor::IdentityOverride;
use crate::ui::prompts::{DialoguerPrompter, NonInteractivePrompter, Prompter};

use super::app::Cli;
use super::commands::IdentityArgs;

pub struct AppContext {
    pub store: Arc<dyn CredentialStore>,
    pub prompter: Arc<dyn Prompter>,
    pub task: TaskConfig,
    pub token_override: Option<TokenOverride>,
}

impl AppContext {
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let store = match &cli.credentials {
            Some(path) => FileCredentialStore::new(path),
            None => FileCredentialStore::default_location()?,
        };
        debug!("Using credential file {:?}", store.path());

        let interactive = !cli.non_interactive && std::io::stdin().is_terminal();
        let prompter: Arc<dyn Prompter> = if interactive {
            Arc::new(DialoguerPrompter)
        } else {
            debug!("Prompting disabled");
            Arc::new(NonInteractivePrompter)
        };

        let task = TaskConfig::load(cli.config.as_deref())?;

        Ok(Self {
            store: Arc::new(store),
            prompter,
            task,
            token_override: TokenOverride::from_env(),
        })
    }

    pub fn defaults(&self) -> &UploadDefaults {
        &self.task.upload
    }

    pub fn acquirer(&self, transport: Arc<dyn Transport>) -> TokenAcquirer {
        TokenAcquirer::new(self.store.clone(), transport, self.prompter.clone())
            .with_browser(Arc::new(SystemBrowser))
            .with_override(self.token_override.clone())
    }

    pub fn client(&self) -> Result<MarketplaceClient> {
        let transport: Arc<dyn Transport> =
            Arc::new(ReqwestTransport::new().context("Failed to initialise HTTP client")?);
        let acquirer = Arc::new(self.acquirer(transport.clone()));
        Ok(MarketplaceClient::new(acquirer, transport))
    }

    pub fn instance(&self, explicit: Option<String>) -> String {
        resolve_instance(explicit, self.defaults())
    }

    pub fn package(&self, explicit: Option<PathBuf>) -> Result<PathBuf> {
        resolve_package(explicit, self.defaults())
    }

    pub fn identity(&self, args: IdentityArgs) -> IdentityOverride {
        resolve_identity_args(args, self.defaults())
    }
}

pub fn resolve_instance(explicit: Option<String>, defaults: &UploadDefaults) -> String {
    explicit
        .or_else(|| defaults.instance.clone())
        .unwrap_or_else(|| DEFAULT_INSTANCE_NAME.to_string())
}

pub fn resolve_package(explicit: Option<PathBuf>, defaults: &UploadDefaults) -> Result<PathBuf> {
    explicit
        .or_else(|| defaults.file.clone())
        .context("Missing info about the file to upload")
}

/// Command line identity fields win over the task file, field by field.
pub fn resolve_identity_args(args: IdentityArgs, defaults: &UploadDefaults) -> IdentityOverride {
    IdentityOverride {
        vendor: args.vendor.or_else(|| defaults.vendor.clone()),
        name: args.name.or_else(|| defaults.name.clone()),
        version: args.component_version.or_else(|| defaults.version.clone()),
    }
}
