pub mod auth;
pub mod component;
pub mod upload;

use clap::Args;

pub use auth::{AuthCommands, auth_command};
pub use component::{delete_command, exists_command};
pub use upload::upload_command;

/// Explicit component identity; overrides the package's config.xml.
#[derive(Args, Debug, Clone, Default)]
pub struct IdentityArgs {
    /// Component vendor
    #[arg(long)]
    pub vendor: Option<String>,
    /// Component name
    #[arg(long)]
    pub name: Option<String>,
    /// Component version
    #[arg(long = "version")]
    pub component_version: Option<String>,
}
