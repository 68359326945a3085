use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use uuid::Uuid;

/// CLI surface definition.
#[derive(Parser, Debug)]
#[command(
    name = "walletvault",
    about = "Store and inspect wallets and accounts in object stores or secret services",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print version and exit.
    Version,
    /// Check that the configured backend can be listed and report its state.
    Health,
    /// Manage CLI configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Store and read wallets.
    #[command(subcommand)]
    Wallet(WalletCommand),
    /// Store and read accounts.
    #[command(subcommand)]
    Account(AccountCommand),
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommand {
    /// Create a default config file if one does not exist.
    Init,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum WalletCommand {
    /// Store a wallet record read from a file or stdin.
    Put {
        #[arg(long)]
        id: Uuid,
        #[arg(long)]
        name: String,
        #[command(flatten)]
        input: Input,
        /// Refuse a name already used by another wallet.
        #[arg(long)]
        unique: bool,
    },
    /// Print one wallet record.
    Get(WalletSelector),
    /// Print every wallet record, one per line.
    List,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
#[group(required = true, multiple = false)]
pub struct WalletSelector {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub id: Option<Uuid>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum AccountCommand {
    /// Store an account record read from a file or stdin.
    Put {
        #[arg(long)]
        wallet: Uuid,
        #[arg(long)]
        id: Uuid,
        #[command(flatten)]
        input: Input,
        /// Refuse a name already used by another account in the wallet.
        #[arg(long)]
        unique: bool,
    },
    /// Print one account record.
    Get {
        #[arg(long)]
        wallet: Uuid,
        #[arg(long)]
        id: Uuid,
    },
    /// Print every account record of a wallet, one per line.
    List {
        #[arg(long)]
        wallet: Uuid,
    },
}

#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct Input {
    /// Read the record from this file instead of stdin.
    #[arg(long)]
    pub file: Option<PathBuf>,
}
