//! Plasma CLI - build block commitments and inclusion proofs
//!
//! Operator-side tool around the plasma sparse Merkle tree:
//! - Computing roots and proofs for a set of occupied slots
//! - Verifying proofs against a root
//! - Assembling blocks and exit payloads from transaction files

mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[derive(Parser)]
#[command(name = "plasma", version, about = "Plasma sparse Merkle tree tool")]
struct Cli {
    /// Tree depth (overrides config file and PLASMA_TREE_DEPTH)
    #[arg(long, global = true)]
    depth: Option<usize>,

    /// Config file (default: ~/.plasma/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sparse Merkle tree operations
    Tree {
        #[command(subcommand)]
        action: TreeAction,
    },
    /// Block and exit assembly
    Block {
        #[command(subcommand)]
        action: BlockAction,
    },
}

#[derive(Subcommand)]
pub enum TreeAction {
    /// Print the root for a leaves file ({"<slot>": "0x<hash>", ...})
    Root {
        #[arg(long)]
        leaves: PathBuf,
    },
    /// Print the inclusion proof for a slot
    Proof {
        #[arg(long)]
        leaves: PathBuf,
        #[arg(long)]
        slot: String,
    },
    /// Verify a proof; exits non-zero when it does not hold
    Verify {
        #[arg(long)]
        root: String,
        #[arg(long)]
        slot: String,
        /// Leaf hash (omit to prove the slot is empty)
        #[arg(long)]
        leaf: Option<String>,
        #[arg(long)]
        proof: String,
    },
    /// Print the default node of every level
    Defaults,
}

#[derive(Subcommand)]
pub enum BlockAction {
    /// Assemble a block from a JSON array of transactions
    Assemble {
        #[arg(long)]
        number: u64,
        #[arg(long)]
        transactions: PathBuf,
        /// Unix seconds (default: now)
        #[arg(long)]
        timestamp: Option<u64>,
    },
    /// Build the exit payload for a slot
    Exit {
        #[arg(long)]
        slot: String,
        /// Block number that mined the exiting transaction
        #[arg(long)]
        number: u64,
        #[arg(long)]
        transactions: PathBuf,
        /// Block number that mined the previous transaction
        #[arg(long, requires = "prev_transactions")]
        prev_number: Option<u64>,
        #[arg(long, requires = "prev_number")]
        prev_transactions: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(depth) = cli.depth {
        config.depth = depth;
    }
    config.validate()?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(depth = config.depth, "configuration loaded");

    match cli.command {
        Commands::Tree { action } => commands::tree::handle(action, &config),
        Commands::Block { action } => commands::block::handle(action, &config),
    }
}
