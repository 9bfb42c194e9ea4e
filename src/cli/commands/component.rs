use anyhow::Result;
use clap::Args;
use colored::*;
use log::info;
use std::path::PathBuf;

use super::IdentityArgs;
use crate::api::ComponentOperations;
use crate::cli::context::AppContext;
use crate::descriptor::{ComponentIdentity, resolve_identity};

#[derive(Args)]
pub struct ComponentArgs {
    /// Packaged component whose config.xml identifies the component
    pub file: Option<PathBuf>,
    /// Target instance alias
    #[arg(short, long)]
    pub instance: Option<String>,
    #[command(flatten)]
    pub identity: IdentityArgs,
}

#[derive(Args)]
pub struct DeleteArgs {
    #[command(flatten)]
    pub component: ComponentArgs,
    /// Skip confirmation prompt
    #[arg(short, long)]
    pub force: bool,
}

fn identity(ctx: &AppContext, file: Option<PathBuf>, args: IdentityArgs) -> Result<ComponentIdentity> {
    let overrides = ctx.identity(args);
    if let Some(identity) = overrides.complete() {
        return Ok(identity);
    }
    let package = ctx.package(file)?;
    Ok(resolve_identity(&package, &overrides)?)
}

pub async fn exists_command(ctx: &AppContext, args: ComponentArgs) -> Result<()> {
    let component = identity(ctx, args.file, args.identity)?;
    let instance = ctx.instance(args.instance);
    info!("Checking {} on {}", component, instance);

    let client = ctx.client()?;
    if client.exists(&instance, &component).await? {
        println!("{} {} is available on {}", "✓".green(), component, instance);
    } else {
        println!("{} {} is not available on {}", "○".dimmed(), component, instance);
    }
    Ok(())
}

pub async fn delete_command(ctx: &AppContext, args: DeleteArgs) -> Result<()> {
    let component = identity(ctx, args.component.file, args.component.identity)?;
    let instance = ctx.instance(args.component.instance);

    if !args.force {
        let confirmed = ctx.prompter.confirm(
            &format!("Delete {} and its dependents from {}?", component, instance),
            false,
        )?;
        if !confirmed {
            println!("Deletion cancelled.");
            return Ok(());
        }
    }

    let client = ctx.client()?;
    client.delete(&instance, &component).await?;
    println!("{} Deleted {} from {}", "✓".green(), component, instance);
    Ok(())
}
