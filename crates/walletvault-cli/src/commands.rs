use std::{
    fs,
    io::{self, Read, Write},
};

use color_eyre::{eyre::eyre, Result};
use walletvault_core::storage::Backend;
use walletvault_store::{Records, Store};

use crate::cli::{AccountCommand, Input, WalletCommand};

/// Execute a wallet subcommand, writing records to `out`.
pub async fn wallet<B: Backend + 'static>(
    store: &Store<B>,
    cmd: WalletCommand,
    out: &mut impl Write,
) -> Result<()> {
    match cmd {
        WalletCommand::Put {
            id,
            name,
            input,
            unique,
        } => {
            let data = read_input(&input)?;
            if unique {
                store.store_wallet_unique(id, &name, &data).await?;
            } else {
                store.store_wallet(id, &name, &data).await?;
            }
            writeln!(out, "stored wallet {id}")?;
        }
        WalletCommand::Get(selector) => {
            let data = match (selector.name, selector.id) {
                (Some(name), _) => store.retrieve_wallet(&name).await?,
                (None, Some(id)) => store.retrieve_wallet_by_id(id).await?,
                (None, None) => return Err(eyre!("either --name or --id is required")),
            };
            write_record(out, &data)?;
        }
        WalletCommand::List => {
            let count = drain(store.retrieve_wallets(), out).await?;
            if count == 0 {
                writeln!(out, "No wallets yet. Add one with `walletvault wallet put`.")?;
            }
        }
    }
    Ok(())
}

/// Execute an account subcommand, writing records to `out`.
pub async fn account<B: Backend + 'static>(
    store: &Store<B>,
    cmd: AccountCommand,
    out: &mut impl Write,
) -> Result<()> {
    match cmd {
        AccountCommand::Put {
            wallet,
            id,
            input,
            unique,
        } => {
            let data = read_input(&input)?;
            if unique {
                store.store_account_unique(wallet, id, &data).await?;
            } else {
                store.store_account(wallet, id, &data).await?;
            }
            writeln!(out, "stored account {id} in wallet {wallet}")?;
        }
        AccountCommand::Get { wallet, id } => {
            let data = store.retrieve_account(wallet, id).await?;
            write_record(out, &data)?;
        }
        AccountCommand::List { wallet } => {
            let count = drain(store.retrieve_accounts(wallet), out).await?;
            if count == 0 {
                writeln!(out, "No accounts in wallet {wallet}.")?;
            }
        }
    }
    Ok(())
}

/// Report backend kind, encryption and how many wallets can be read.
pub async fn health<B: Backend + 'static>(store: &Store<B>, out: &mut impl Write) -> Result<()> {
    let wallets = store.retrieve_wallets().collect().await.len();
    writeln!(out, "Backend: {}", store.backend().kind())?;
    writeln!(
        out,
        "Encryption: {}",
        if store.is_encrypted() { "on" } else { "off" }
    )?;
    writeln!(out, "Wallets: {wallets}")?;
    Ok(())
}

async fn drain(mut records: Records, out: &mut impl Write) -> Result<usize> {
    let mut count = 0;
    while let Some(data) = records.next().await {
        write_record(out, &data)?;
        count += 1;
    }
    Ok(count)
}

fn write_record(out: &mut impl Write, data: &[u8]) -> Result<()> {
    out.write_all(data)?;
    if !data.ends_with(b"\n") {
        out.write_all(b"\n")?;
    }
    Ok(())
}

fn read_input(input: &Input) -> Result<Vec<u8>> {
    match &input.file {
        Some(path) => Ok(fs::read(path)?),
        None => {
            let mut buf = Vec::new();
            io::stdin().read_to_end(&mut buf)?;
            Ok(buf)
        }
    }
}
