//! quorum-vault CLI - drive a persisted vault and its reference ledger
//!
//! Usage:
//! ```bash
//! quorum-vault init --owner alice --owner bob --owner carol --threshold 3
//! quorum-vault mint --asset usdc --to alice --amount 500
//! quorum-vault approve --asset usdc --owner alice --amount 50
//! quorum-vault register --caller alice --asset usdc
//! quorum-vault deposit --caller alice --asset usdc --amount 50
//! quorum-vault propose --caller alice --asset usdc --amount 50
//! quorum-vault confirm --caller bob --index 0
//! quorum-vault execute --caller bob --index 0
//! quorum-vault show
//! ```
//!
//! Accounts and tokens are given either as `0x` hex addresses or as labels,
//! which map to a fixed address derived from the label.

use clap::{Parser, Subcommand};
use quorum_vault::custody::{CustodyState, ExecutionPolicy};
use quorum_vault::identity::AddressError;
use quorum_vault::ledger::{LedgerError, MemoryLedger};
use quorum_vault::storage::{CustodyStore, StoreError};
use quorum_vault::{Address, Amount, AssetId, CustodyConfig, CustodyError, Vault};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Custody(#[from] CustodyError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Address(#[from] AddressError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("No vault found in {0}; run `init` first")]
    NotInitialized(PathBuf),

    #[error("Vault already initialized in {0}")]
    AlreadyInitialized(PathBuf),
}

/// M-of-N custody vault
#[derive(Parser)]
#[command(name = "quorum-vault")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory holding the vault database
    #[arg(long, default_value = "data/quorum-vault", global = true)]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new vault
    Init {
        /// Owner account (repeat for each owner, in order)
        #[arg(long = "owner", required = true)]
        owners: Vec<String>,
        /// Confirmations required; defaults to every owner
        #[arg(long)]
        threshold: Option<usize>,
        /// Only owners may execute
        #[arg(long)]
        owners_only: bool,
    },

    /// Create funds on the reference ledger
    Mint {
        /// `native` or a token
        #[arg(long)]
        asset: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        amount: Amount,
    },

    /// Allow the vault to pull tokens from an account
    Approve {
        #[arg(long)]
        asset: String,
        #[arg(long)]
        owner: String,
        #[arg(long)]
        amount: Amount,
    },

    /// Register an external asset on the balance sheet
    Register {
        #[arg(long)]
        caller: String,
        #[arg(long)]
        asset: String,
    },

    /// Deposit native value or a registered token
    Deposit {
        #[arg(long)]
        caller: String,
        #[arg(long)]
        asset: String,
        #[arg(long)]
        amount: Amount,
        /// Native value to attach; defaults to `amount` for native deposits
        #[arg(long)]
        value: Option<Amount>,
    },

    /// Propose a withdrawal
    Propose {
        #[arg(long)]
        caller: String,
        #[arg(long)]
        asset: String,
        #[arg(long)]
        amount: Amount,
    },

    /// Confirm a proposal
    Confirm {
        #[arg(long)]
        caller: String,
        #[arg(long)]
        index: usize,
    },

    /// Execute a proposal; funds go to the caller
    Execute {
        #[arg(long)]
        caller: String,
        #[arg(long)]
        index: usize,
    },

    /// Show vault state or one transaction
    Show {
        #[arg(long)]
        index: Option<usize>,
    },

    /// Show an account's holdings
    Balance {
        #[arg(long)]
        asset: String,
        #[arg(long)]
        account: String,
    },
}

/// `0x` hex or a label
fn parse_account(s: &str) -> Result<Address, CliError> {
    if s.starts_with("0x") {
        Ok(Address::parse(s)?)
    } else {
        Ok(Address::from_label(s))
    }
}

/// `native`, `0x` hex or a label
fn parse_asset(s: &str) -> Result<AssetId, CliError> {
    if s.eq_ignore_ascii_case("native") {
        Ok(AssetId::Native)
    } else {
        parse_account(s).map(AssetId::External)
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let store = CustodyStore::open(&cli.data_dir)?;
    let ledger = Arc::new(MemoryLedger::from_book(store.load_ledger()?.unwrap_or_default()));

    if let Commands::Init {
        owners,
        threshold,
        owners_only,
    } = &cli.command
    {
        if store.load_state()?.is_some() {
            return Err(CliError::AlreadyInitialized(cli.data_dir));
        }
        let owners = owners
            .iter()
            .map(|o| parse_account(o))
            .collect::<Result<Vec<_>, _>>()?;
        let threshold = threshold.unwrap_or(owners.len());
        let policy = if *owners_only {
            ExecutionPolicy::OwnersOnly
        } else {
            ExecutionPolicy::AnyCaller
        };
        let state = CustodyState::new(CustodyConfig::new(owners, threshold).with_execution_policy(policy))?;
        println!("custody account: {}", state.config().custody_account);
        store.save_state(&state)?;
        store.save_ledger(&ledger.snapshot())?;
        store.flush()?;
        return Ok(());
    }

    let state = store
        .load_state()?
        .ok_or_else(|| CliError::NotInitialized(cli.data_dir.clone()))?;
    let vault = Vault::from_state(state, ledger.clone());
    let custody = vault.config().custody_account;

    match cli.command {
        Commands::Init { .. } => {}
        Commands::Mint { asset, to, amount } => {
            let to = parse_account(&to)?;
            match parse_asset(&asset)? {
                AssetId::Native => ledger.mint_native(&to, amount)?,
                AssetId::External(token) => ledger.mint(&token, &to, amount)?,
            }
        }
        Commands::Approve {
            asset,
            owner,
            amount,
        } => {
            let owner = parse_account(&owner)?;
            match parse_asset(&asset)? {
                AssetId::Native => println!("native deposits need no approval"),
                AssetId::External(token) => ledger.approve(&token, &owner, &custody, amount),
            }
        }
        Commands::Register { caller, asset } => {
            vault.register_asset(&parse_account(&caller)?, parse_asset(&asset)?)?;
        }
        Commands::Deposit {
            caller,
            asset,
            amount,
            value,
        } => {
            let caller = parse_account(&caller)?;
            let asset = parse_asset(&asset)?;
            let attached = value.unwrap_or(if asset.is_native() { amount } else { 0 });
            // The host moves attached native value out of the caller's wallet.
            ledger.withdraw_native(&caller, attached)?;
            if let Err(e) = vault.deposit(&caller, asset, amount, attached) {
                ledger.mint_native(&caller, attached)?;
                return Err(e.into());
            }
        }
        Commands::Propose {
            caller,
            asset,
            amount,
        } => {
            let index = vault.propose(&parse_account(&caller)?, parse_asset(&asset)?, amount)?;
            println!("proposal index: {}", index);
        }
        Commands::Confirm { caller, index } => {
            let count = vault.confirm(&parse_account(&caller)?, index)?;
            println!("confirmations: {}/{}", count, vault.threshold());
        }
        Commands::Execute { caller, index } => {
            let release = vault.execute(&parse_account(&caller)?, index)?;
            println!(
                "released {} {} to {}",
                release.amount, release.asset, release.recipient
            );
        }
        Commands::Show { index: Some(index) } => {
            let tx = vault.transaction(index)?;
            println!("transaction {}", tx.index());
            println!("  asset:         {}", tx.asset());
            println!("  amount:        {}", tx.amount());
            println!("  proposer:      {}", tx.proposer());
            println!("  proposed at:   {}", tx.proposed_at());
            println!("  confirmations: {}/{}", tx.confirmations(), vault.threshold());
            for owner in tx.confirmed_by() {
                println!("    {}", owner);
            }
            println!("  executed:      {}", tx.is_executed());
            if let Some(by) = tx.executed_by() {
                println!("  executed by:   {}", by);
            }
        }
        Commands::Show { index: None } => {
            let stats = vault.stats();
            println!("custody account: {}", custody);
            println!("owners ({} of {} required):", stats.threshold, stats.owner_count);
            for owner in vault.owners() {
                println!("  {}", owner);
            }
            println!("native balance: {}", stats.native_balance);
            for asset in vault.registered_assets() {
                println!("asset {}: {}", asset, vault.custody_holdings(&asset));
            }
            println!(
                "transactions: {} ({} executed, {} pending)",
                stats.proposals, stats.executed, stats.pending
            );
        }
        Commands::Balance { asset, account } => {
            let asset = parse_asset(&asset)?;
            println!("{}", vault.holdings_of(&asset, &parse_account(&account)?));
        }
    }

    for event in vault.poll_events() {
        println!("event: {}", event);
    }

    store.save_state(&vault.export_state())?;
    store.save_ledger(&ledger.snapshot())?;
    store.flush()?;
    Ok(())
}
