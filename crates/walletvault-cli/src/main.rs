mod cli;
mod commands;
mod config;
mod storage;

use std::io;

use clap::Parser;
use color_eyre::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cli::{Command, ConfigCommand};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = cli::Cli::parse();
    let config = config::load()?;
    let mut out = io::stdout();
    match cli.command {
        Command::Version => print_version(),
        Command::Config(ConfigCommand::Init) => init_config(&config)?,
        Command::Health => {
            let store = storage::store_from_config(&config).await?;
            commands::health(&store, &mut out).await?
        }
        Command::Wallet(cmd) => {
            let store = storage::store_from_config(&config).await?;
            commands::wallet(&store, cmd, &mut out).await?
        }
        Command::Account(cmd) => {
            let store = storage::store_from_config(&config).await?;
            commands::account(&store, cmd, &mut out).await?
        }
    }

    Ok(())
}

fn init_tracing() {
    // Respect user-provided filters, default to info; logs go to stderr so records stay pipeable.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(io::stderr);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn print_version() {
    println!("walletvault {}", env!("CARGO_PKG_VERSION"));
}

fn init_config(config: &config::Config) -> Result<()> {
    let path = config::write_default_if_missing(config)?;
    println!("Config initialized at {}", path.display());
    Ok(())
}
