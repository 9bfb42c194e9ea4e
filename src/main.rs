use clap::Parser;
use colored::*;
use log::{LevelFilter, info};

use wirecloud_upload::cli::{self, Cli};

fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // RUST_LOG still wins when set
    env_logger::Builder::new()
        .filter_level(level_for(cli.verbose))
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .init();

    info!("Starting wirecloud-upload");

    if let Err(e) = cli::run(cli).await {
        eprintln!("{} {:#}", "✗".red(), e);
        std::process::exit(1);
    }
}
