mod commands;
mod config;
mod error;
mod models;
mod services;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use crate::config::Config;

/// Keeps a curated IPTV playlist's stream URLs alive
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Refresh stream URLs from the upstream playlists
    Update {
        /// Skip the remote name-matched source and use only the local files
        #[arg(long)]
        no_fuzzy: bool,
    },
    /// Probe every stream, park dead ones on the placeholder URL and record them
    Fix,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "playlist_sync=info".into());

    let fmt_layer = if std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().with_target(false).boxed()
    };

    tracing_subscriber::registry().with(filter).with(fmt_layer).init();
}

async fn run(command: Command, config: &Config) -> anyhow::Result<()> {
    match command {
        Command::Update { no_fuzzy } => {
            let report = commands::update::run(config, !no_fuzzy).await?;
            println!("{}", report);
        }
        Command::Fix => {
            let report = commands::fix_broken::run(config).await?;
            println!("{}", report);
            println!(
                "Dead ledger written to {}; run `update` to look for replacements",
                config.dead_ledger_path.display()
            );
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing();

    let args = Args::parse();
    let config = Config::from_env();

    tracing::debug!("Configuration: {:?}", config);

    if let Err(e) = run(args.command, &config).await {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_update_args() {
        let args = Args::try_parse_from(["playlist-sync", "update", "--no-fuzzy"]).unwrap();
        assert!(matches!(args.command, Command::Update { no_fuzzy: true }));

        let args = Args::try_parse_from(["playlist-sync", "fix"]).unwrap();
        assert!(matches!(args.command, Command::Fix));

        assert!(Args::try_parse_from(["playlist-sync"]).is_err());
    }
}
