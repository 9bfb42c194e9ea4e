use super::commands::AuthCommands;
use super::commands::component::{ComponentArgs, DeleteArgs};
use super::commands::upload::UploadArgs;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "wirecloud-upload")]
#[command(about = "Upload Mashable Application Components to a WireCloud instance")]
pub struct Cli {
    /// Credential file (defaults to ~/.wirecloudrc)
    #[arg(long, global = true)]
    pub credentials: Option<PathBuf>,
    /// Task file with upload defaults (defaults to ./wirecloud.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Never prompt; unknown instances fail instead of being created
    #[arg(long, global = true)]
    pub non_interactive: bool,
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upload a packaged component, optionally replacing an existing copy
    Upload(UploadArgs),
    /// Check whether a component is already on the server
    Exists(ComponentArgs),
    /// Delete a component and everything depending on it
    Delete(DeleteArgs),
    /// Instance authentication management
    Auth(AuthCommands),
}
