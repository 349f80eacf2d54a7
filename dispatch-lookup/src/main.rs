//! dispatch-lookup - enumerate the justifications of a formula
//!
//! Usage:
//!   dispatch-lookup <FORMULA_CID> <ASSERTION_LIST.json> [--output-dir DIR]
//!
//! Configuration is read from `--config`, else from
//! `~/.config/dispatch/config.toml` when present. Flags override file values.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use dispatch_lookup::{lookup, LookupConfig, StoreBackend};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dispatch-lookup")]
#[command(about = "Enumerate the signed justifications of a formula")]
struct Args {
    /// CID of the formula to justify
    formula: String,

    /// JSON file holding the list of candidate assertion CIDs
    assertions: PathBuf,

    /// Directory the result file is written to
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, env = "DISPATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Record source
    #[arg(long, value_enum)]
    backend: Option<StoreBackend>,

    /// IPFS node RPC API URL
    #[arg(long, env = "DISPATCH_IPFS_API")]
    ipfs_api: Option<String>,

    /// Gateway for completing missing DAGs
    #[arg(long, env = "DISPATCH_GATEWAY")]
    gateway: Option<String>,

    /// Directory of the `fs` backend
    #[arg(long)]
    store_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("dispatch_lookup=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let mut config = LookupConfig::load_or_default(args.config.as_deref())?;
    if let Some(backend) = args.backend {
        config.backend = backend;
    }
    if let Some(url) = args.ipfs_api {
        config.ipfs_api_url = url;
    }
    if let Some(gateway) = args.gateway {
        config.gateway = Some(gateway);
    }
    if let Some(dir) = args.store_dir {
        config.store_dir = dir;
    }
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }

    info!(backend = ?config.backend, "Opening record store");
    let store = config.open_store().await?;

    let outcome = lookup(store.as_ref(), &args.formula, &args.assertions, &config.output_dir)
        .await
        .with_context(|| format!("lookup of {} failed", args.formula))?;

    println!(
        "the result of lookup for the formula: {} was output in the file {}",
        outcome.formula,
        outcome.artifact.display()
    );
    Ok(())
}
