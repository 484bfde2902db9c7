//! Exit payloads.
//!
//! Exiting a coin takes the transaction that gave the exitor the coin and,
//! when the coin has moved before, the transaction preceding it. Each comes
//! with its inclusion proof against the block that mined it.

use plasma_merkle::SparseMerkleProof;
use serde::{Deserialize, Serialize};

use crate::transaction::Transaction;
use crate::{PlasmaError, PlasmaResult};

/// Placeholder for the previous transaction and its proof when there is none.
pub const NO_PREVIOUS_TX: &str = "0x0";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitData {
    pub prev_tx_bytes: String,
    pub exiting_tx_bytes: String,
    pub prev_tx_inclusion_proof: String,
    pub exiting_tx_inclusion_proof: String,
    pub signature: String,
    /// `[previous tx block, exiting tx block]`; the first is 0 without a previous tx
    pub blocks: [u64; 2],
}

impl ExitData {
    pub fn new(
        exiting_tx: &Transaction,
        exiting_proof: &SparseMerkleProof,
        prev: Option<(&Transaction, &SparseMerkleProof)>,
    ) -> PlasmaResult<Self> {
        let exiting_block = exiting_tx
            .mined_block
            .ok_or_else(|| PlasmaError::NotMined(exiting_tx.slot.clone()))?;

        let (prev_tx_bytes, prev_tx_inclusion_proof, prev_block) = match prev {
            Some((prev_tx, prev_proof)) => {
                let prev_block = prev_tx
                    .mined_block
                    .ok_or_else(|| PlasmaError::NotMined(prev_tx.slot.clone()))?;
                (prev_tx.to_hex()?, prev_proof.to_hex(), prev_block)
            }
            None => (NO_PREVIOUS_TX.to_string(), NO_PREVIOUS_TX.to_string(), 0),
        };

        Ok(Self {
            prev_tx_bytes,
            exiting_tx_bytes: exiting_tx.to_hex()?,
            prev_tx_inclusion_proof,
            exiting_tx_inclusion_proof: exiting_proof.to_hex(),
            signature: exiting_tx.signature.clone(),
            blocks: [prev_block, exiting_block],
        })
    }
}
