//! Tree command handlers

use crate::commands::read_json;
use crate::config::Config;
use anyhow::{Context, Result};
use colored::Colorize;
use plasma_merkle::{DefaultNodes, HashValue, Slot, SparseMerkleProof, SparseMerkleTree};
use std::collections::BTreeMap;
use std::path::Path;

pub fn handle(action: crate::TreeAction, config: &Config) -> Result<()> {
    match action {
        crate::TreeAction::Root { leaves } => {
            let tree = build_tree(&leaves, config.depth)?;
            println!("{} Built tree", "✓".green().bold());
            println!("  Depth:  {}", config.depth.to_string().cyan());
            println!("  Leaves: {}", tree.len().to_string().cyan());
            println!("  Root:   {}", tree.root().to_string().cyan());
            Ok(())
        }

        crate::TreeAction::Proof { leaves, slot } => {
            let tree = build_tree(&leaves, config.depth)?;
            let slot: Slot = slot.parse()?;
            let proof = tree.get_proof(&slot)?;

            let status = if tree.leaf(&slot).is_some() {
                "occupied".green()
            } else {
                "empty".yellow()
            };
            println!("{} Proof for slot {} ({})", "✓".green().bold(), slot.to_string().cyan(), status);
            println!("  Root:     {}", tree.root());
            println!("  Siblings: {}", proof.sibling_count());
            println!("  Proof:    {}", proof.to_hex());
            Ok(())
        }

        crate::TreeAction::Verify { root, slot, leaf, proof } => {
            let defaults = DefaultNodes::for_depth(config.depth)?;
            let root = HashValue::from_hex(&root).context("Invalid root")?;
            let slot: Slot = slot.parse()?;
            let leaf = match leaf {
                Some(leaf) => HashValue::from_hex(&leaf).context("Invalid leaf")?,
                None => defaults.leaf(),
            };
            let proof = SparseMerkleProof::from_hex(config.depth, &proof)?;

            match proof.verify(&root, &slot, &leaf) {
                Ok(()) => {
                    println!("{} Proof is valid for slot {}", "✓".green().bold(), slot.to_string().cyan());
                    Ok(())
                }
                Err(e) => {
                    println!("{} {}", "✗".red().bold(), e.to_string().red());
                    anyhow::bail!("proof does not verify for slot {}", slot)
                }
            }
        }

        crate::TreeAction::Defaults => {
            let defaults = DefaultNodes::for_depth(config.depth)?;
            println!("{} Default nodes for depth {}", "→".cyan().bold(), config.depth);
            for (level, node) in defaults.as_slice().iter().enumerate() {
                println!("  {:>3}  {}", level, node);
            }
            Ok(())
        }
    }
}

/// Load a `{"<slot>": "0x<hash>"}` leaves file and build its tree.
fn build_tree(path: &Path, depth: usize) -> Result<SparseMerkleTree> {
    let leaves: BTreeMap<Slot, HashValue> = read_json(path)?;
    Ok(SparseMerkleTree::build(depth, leaves)?)
}
