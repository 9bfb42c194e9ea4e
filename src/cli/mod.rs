pub mod app;
pub mod commands;
pub mod context;

pub use app::{Cli, Commands};
pub use context::AppContext;

use anyhow::Result;
use log::debug;

use commands::{auth_command, delete_command, exists_command, upload_command};

pub async fn run(cli: Cli) -> Result<()> {
    let ctx = AppContext::from_cli(&cli)?;

    match cli.command {
        Commands::Upload(args) => {
            debug!("Dispatching upload");
            upload_command(&ctx, args).await
        }
        Commands::Exists(args) => exists_command(&ctx, args).await,
        Commands::Delete(args) => delete_command(&ctx, args).await,
        Commands::Auth(args) => auth_command(&ctx, args).await,
    }
}
