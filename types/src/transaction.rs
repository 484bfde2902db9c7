//! Plasma transactions.
//!
//! A transaction moves the coin in `slot` to `recipient`, referencing the
//! block in which the coin was last spent. Its hash is the leaf value the
//! block's sparse Merkle tree commits at `slot`.

use plasma_merkle::{keccak256, HashValue, Slot};
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::serde_helpers::u64_string;
use crate::PlasmaResult;

/// Every plasma-cash coin is indivisible: one unit per slot.
pub const DENOMINATION: u64 = 1;

/// Canonical transaction bytes: four uint256 ABI words,
/// `slot || block_spent || denomination || recipient`.
pub fn transaction_bytes(
    slot: &Slot,
    block_spent: u64,
    denomination: u64,
    recipient: &Address,
) -> PlasmaResult<Vec<u8>> {
    let mut out = Vec::with_capacity(4 * 32);
    out.extend_from_slice(&slot.to_word()?);
    out.extend_from_slice(&Slot::from(block_spent).to_word()?);
    out.extend_from_slice(&Slot::from(denomination).to_word()?);
    let mut word = [0u8; 32];
    word[32 - recipient.as_bytes().len()..].copy_from_slice(recipient.as_bytes());
    out.extend_from_slice(&word);
    Ok(out)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub slot: Slot,
    pub owner: Address,
    pub recipient: Address,
    pub hash: HashValue,
    #[serde(with = "u64_string")]
    pub block_spent: u64,
    /// Owner's signature over `hash`, hex encoded. Produced and checked outside this crate.
    pub signature: String,

    pub mined_timestamp: Option<u64>,
    pub mined_block: Option<u64>,
}

impl Transaction {
    /// A new, not yet mined transaction with its hash computed.
    pub fn new(
        slot: Slot,
        owner: Address,
        recipient: Address,
        block_spent: u64,
        signature: impl Into<String>,
    ) -> PlasmaResult<Self> {
        let bytes = transaction_bytes(&slot, block_spent, DENOMINATION, &recipient)?;
        Ok(Self {
            slot,
            owner,
            recipient,
            hash: keccak256(&bytes),
            block_spent,
            signature: signature.into(),
            mined_timestamp: None,
            mined_block: None,
        })
    }

    /// Canonical bytes of this transaction.
    pub fn to_bytes(&self) -> PlasmaResult<Vec<u8>> {
        transaction_bytes(&self.slot, self.block_spent, DENOMINATION, &self.recipient)
    }

    /// `0x`-prefixed hex of [`Self::to_bytes`].
    pub fn to_hex(&self) -> PlasmaResult<String> {
        Ok(format!("0x{}", hex::encode(self.to_bytes()?)))
    }

    /// Whether `hash` matches the transaction's contents.
    pub fn hash_matches(&self) -> PlasmaResult<bool> {
        Ok(keccak256(&self.to_bytes()?) == self.hash)
    }

    pub fn is_mined(&self) -> bool {
        self.mined_block.is_some()
    }
}
