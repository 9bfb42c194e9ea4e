use anyhow::Result;
use clap::Args;
use colored::*;
use log::{debug, info};
use std::io::Write;
use std::path::PathBuf;

use super::IdentityArgs;
use crate::api::PublicFlag;
use crate::cli::context::{AppContext, resolve_identity_args, resolve_instance, resolve_package};
use crate::config::UploadDefaults;
use crate::upload::{self, UploadPlan};

#[derive(Args)]
pub struct UploadArgs {
    /// Packaged component (.wgt/.zip); defaults to the task file's `file`
    pub file: Option<PathBuf>,
    /// Target instance alias
    #[arg(short, long)]
    pub instance: Option<String>,
    /// Delete an existing copy of the component before uploading
    #[arg(long)]
    pub overwrite: bool,
    /// Keep an existing copy even if the task file enables overwrite
    #[arg(long, conflicts_with = "overwrite")]
    pub no_overwrite: bool,
    /// Make the component public (true) or private (false)
    #[arg(long, value_name = "true|false")]
    pub public: Option<String>,
    #[command(flatten)]
    pub identity: IdentityArgs,
}

/// Merges the command line over the task file; no I/O happens here.
pub fn build_plan(args: UploadArgs, defaults: &UploadDefaults) -> Result<UploadPlan> {
    let overwrite = if args.overwrite {
        true
    } else if args.no_overwrite {
        false
    } else {
        defaults.overwrite.unwrap_or(false)
    };

    Ok(UploadPlan {
        file: resolve_package(args.file, defaults)?,
        instance: resolve_instance(args.instance, defaults),
        overwrite,
        public: args
            .public
            .as_deref()
            .map(PublicFlag::parse)
            .unwrap_or_else(|| defaults.public_flag()),
        identity: resolve_identity_args(args.identity, defaults),
    })
}

pub async fn upload_command(ctx: &AppContext, args: UploadArgs) -> Result<()> {
    let plan = build_plan(args, ctx.defaults())?;
    info!("Upload plan: {:?}", plan);

    print!("Uploading {} to {}... ", plan.file.display(), plan.instance);
    std::io::stdout().flush().ok();

    let client = ctx.client()?;
    match upload::run(&client, &plan).await {
        Ok(report) => {
            println!("{}", "✓".green());
            if let Some(identity) = report.identity {
                if report.replaced {
                    println!("  Replaced existing {}", identity);
                } else {
                    println!("  Uploaded {}", identity);
                }
            }
            Ok(())
        }
        Err(failure) => {
            println!("{}", "✗".red());
            debug!("Upload failed: {:?}", failure);
            if failure.deleted {
                println!(
                    "{} the previous version was deleted but the new one was not uploaded",
                    "⚠".yellow()
                );
            }
            Err(failure.into())
        }
    }
}
