//! Instance authentication commands

use anyhow::Result;
use chrono::{DateTime, Local};
use clap::{Args, Subcommand};
use colored::*;
use log::info;

use crate::auth::TokenRecord;
use crate::cli::context::AppContext;
use crate::config::ACCESS_TOKEN_ENV;

#[derive(Args)]
pub struct AuthCommands {
    #[command(subcommand)]
    pub command: AuthSubcommands,
}

#[derive(Subcommand)]
pub enum AuthSubcommands {
    /// Obtain (or refresh) a token for an instance
    Login {
        /// Instance alias
        #[arg(short, long)]
        instance: Option<String>,
    },
    /// Show configured instances and their tokens
    Status,
}

pub async fn auth_command(ctx: &AppContext, args: AuthCommands) -> Result<()> {
    match args.command {
        AuthSubcommands::Login { instance } => login_command(ctx, instance).await,
        AuthSubcommands::Status => status_command(ctx),
    }
}

fn format_millis(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| millis.to_string())
}

fn describe_token(token: Option<&TokenRecord>, now_ms: i64) -> String {
    match token {
        None => "no token".dimmed().to_string(),
        Some(t) if t.access_token.is_empty() => "no token".dimmed().to_string(),
        Some(t) => match t.expires_on {
            Some(expires_on) if t.is_valid_at(now_ms) => {
                format!("valid until {}", format_millis(expires_on)).green().to_string()
            }
            _ if t.refresh_token.is_some() => "expired (refreshable)".yellow().to_string(),
            _ => "expired".red().to_string(),
        },
    }
}

async fn login_command(ctx: &AppContext, instance: Option<String>) -> Result<()> {
    let instance_name = ctx.instance(instance);
    info!("Executing auth login for {}", instance_name);

    let client = ctx.client()?;
    let acquirer = client.acquirer();
    let instance = acquirer.acquire(&instance_name).await?;

    println!("{} Authenticated against {} ({})", "✓".green(), instance_name, instance.url);
    println!(
        "  Token: {}",
        describe_token(instance.token.as_ref(), acquirer.now_millis())
    );
    Ok(())
}

fn status_command(ctx: &AppContext) -> Result<()> {
    info!("Executing auth status command");

    println!("WireCloud Instances");
    println!("===================");

    if ctx.token_override.is_some() {
        println!(
            "{} {} is set; stored tokens are ignored",
            "⚠".yellow(),
            ACCESS_TOKEN_ENV
        );
    }

    let credentials = ctx.store.load()?;
    if credentials.hosts.is_empty() {
        println!("No instances configured.");
        println!("Run 'wirecloud-upload auth login --instance <name>' to create one.");
        return Ok(());
    }

    let now_ms = chrono::Utc::now().timestamp_millis();
    for (name, instance) in &credentials.hosts {
        println!("  ● {} {}", name.bold(), instance.url.dimmed());
        println!("    {}", describe_token(instance.token.as_ref(), now_ms));
    }
    Ok(())
}
