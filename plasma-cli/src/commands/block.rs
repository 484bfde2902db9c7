//! Block command handlers

use crate::commands::read_json;
use crate::config::Config;
use anyhow::{Context, Result};
use colored::Colorize;
use plasma_merkle::Slot;
use plasma_types::{AssembledBlock, Block, ExitData, Transaction};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

pub fn handle(action: crate::BlockAction, config: &Config) -> Result<()> {
    match action {
        crate::BlockAction::Assemble { number, transactions, timestamp } => {
            let timestamp = match timestamp {
                Some(ts) => ts,
                None => now()?,
            };
            let assembled = assemble(number, timestamp, &transactions, config.depth)?;
            eprintln!(
                "{} Assembled block {} with {} transaction(s)",
                "✓".green().bold(),
                number.to_string().cyan(),
                assembled.transactions.len()
            );
            println!("{}", serde_json::to_string_pretty(&assembled.block)?);
            Ok(())
        }

        crate::BlockAction::Exit {
            slot,
            number,
            transactions,
            prev_number,
            prev_transactions,
        } => {
            let slot: Slot = slot.parse()?;

            let exiting_block = assemble(number, 0, &transactions, config.depth)?;
            let exiting_tx = exiting_block
                .transaction(&slot)
                .with_context(|| format!("Block {} has no transaction for slot {}", number, slot))?;
            let exiting_proof = exiting_block.proof(&slot)?;

            let prev_block = match (prev_number, prev_transactions) {
                (Some(prev_number), Some(prev_transactions)) => {
                    Some(assemble(prev_number, 0, &prev_transactions, config.depth)?)
                }
                _ => None,
            };
            let prev = match &prev_block {
                Some(block) => {
                    let tx = block.transaction(&slot).with_context(|| {
                        format!(
                            "Block {} has no transaction for slot {}",
                            block.block.block_number, slot
                        )
                    })?;
                    Some((tx, block.proof(&slot)?))
                }
                None => None,
            };

            let exit = ExitData::new(
                exiting_tx,
                &exiting_proof,
                prev.as_ref().map(|(tx, proof)| (*tx, proof)),
            )?;
            eprintln!("{} Exit data for slot {}", "✓".green().bold(), slot.to_string().cyan());
            println!("{}", serde_json::to_string_pretty(&exit)?);
            Ok(())
        }
    }
}

/// Read a transactions file and assemble it into a block.
fn assemble(number: u64, timestamp: u64, path: &Path, depth: usize) -> Result<AssembledBlock> {
    let transactions: Vec<Transaction> = read_json(path)?;
    for tx in &transactions {
        if !tx.hash_matches()? {
            warn!(slot = %tx.slot, hash = %tx.hash, "transaction hash does not match its contents");
            anyhow::bail!("Transaction for slot {} has an inconsistent hash", tx.slot);
        }
    }
    Ok(Block::assemble(number, timestamp, depth, transactions)?)
}

fn now() -> Result<u64> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use plasma_types::Address;
    use std::io::Write;

    fn tx_file(txs: &[Transaction]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", serde_json::to_string(txs).unwrap()).unwrap();
        file
    }

    fn tx(slot: u64) -> Transaction {
        Transaction::new(
            Slot::from(slot),
            Address::new([1u8; 20]),
            Address::new([2u8; 20]),
            0,
            "0x00",
        )
        .unwrap()
    }

    #[test]
    fn test_assemble_from_file() {
        let file = tx_file(&[tx(1), tx(2)]);
        let assembled = assemble(7, 100, file.path(), 64).unwrap();
        assert_eq!(assembled.block.block_number, 7);
        assert_eq!(assembled.block.transactions.len(), 2);
    }

    #[test]
    fn test_inconsistent_hash_rejected() {
        let mut bad = tx(1);
        bad.block_spent = 9;
        let file = tx_file(&[bad]);
        assert!(assemble(7, 100, file.path(), 64).is_err());
    }
}
