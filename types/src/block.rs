//! Plasma blocks.
//!
//! A block commits the transactions it settles with the root of a sparse
//! Merkle tree holding one leaf per transaction, keyed by slot. The tree is
//! kept next to the block so inclusion proofs can be served for it.

use plasma_merkle::{HashValue, Slot, SparseMerkleProof, SparseMerkleTree};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use crate::serde_helpers::u64_string;
use crate::transaction::Transaction;
use crate::{PlasmaError, PlasmaResult};

/// The persisted form of a block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    #[serde(with = "u64_string")]
    pub block_number: u64,
    pub root_hash: HashValue,
    pub timestamp: u64,
    /// Hashes of the settled transactions, in slot order
    pub transactions: Vec<HashValue>,
}

/// A freshly assembled block with its tree and mined transactions.
#[derive(Clone, Debug)]
pub struct AssembledBlock {
    pub block: Block,
    pub tree: SparseMerkleTree,
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Leaves for a set of transactions: one `slot -> hash` entry each.
    pub fn leaves(transactions: &[Transaction]) -> PlasmaResult<BTreeMap<Slot, HashValue>> {
        let mut leaves = BTreeMap::new();
        for tx in transactions {
            if leaves.insert(tx.slot.clone(), tx.hash).is_some() {
                return Err(PlasmaError::DuplicateSlot(tx.slot.clone()));
            }
        }
        Ok(leaves)
    }

    /// Commit `transactions` into block `block_number`.
    ///
    /// Each slot may be spent at most once per block. The returned
    /// transactions are marked as mined in this block.
    pub fn assemble(
        block_number: u64,
        timestamp: u64,
        depth: usize,
        transactions: Vec<Transaction>,
    ) -> PlasmaResult<AssembledBlock> {
        let leaves = Self::leaves(&transactions)?;
        let tree = SparseMerkleTree::build(depth, leaves.clone())?;

        let block = Block {
            block_number,
            root_hash: tree.root(),
            timestamp,
            transactions: leaves.into_values().collect(),
        };

        let mut transactions = transactions;
        transactions.sort_by(|a, b| a.slot.cmp(&b.slot));
        for tx in &mut transactions {
            tx.mined_block = Some(block_number);
            tx.mined_timestamp = Some(timestamp);
        }

        info!(
            block_number,
            transactions = transactions.len(),
            root = %block.root_hash,
            "assembled block"
        );

        Ok(AssembledBlock {
            block,
            tree,
            transactions,
        })
    }
}

impl AssembledBlock {
    /// Inclusion proof for `slot` against this block's root.
    pub fn proof(&self, slot: &Slot) -> PlasmaResult<SparseMerkleProof> {
        Ok(self.tree.get_proof(slot)?)
    }

    pub fn transaction(&self, slot: &Slot) -> Option<&Transaction> {
        self.transactions.iter().find(|tx| &tx.slot == slot)
    }
}
