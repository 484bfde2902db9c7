// ========== Core Modules ==========
pub mod address;
pub mod block; // Block records and block assembly
pub mod exit; // Exit payloads for the withdrawal flow
pub mod serde_helpers;
pub mod transaction;

// Re-export the commitment types records are keyed and hashed with
pub use plasma_merkle::{HashValue, Slot, SparseMerkleProof, SparseMerkleTree};

pub use address::Address;
pub use block::{AssembledBlock, Block};
pub use exit::{ExitData, NO_PREVIOUS_TX};
pub use transaction::{transaction_bytes, Transaction, DENOMINATION};

// Error types
pub type PlasmaResult<T> = Result<T, PlasmaError>;

#[derive(Debug, thiserror::Error)]
pub enum PlasmaError {
    #[error("Merkle error: {0}")]
    Merkle(#[from] plasma_merkle::MerkleError),

    #[error("Duplicate slot {0} in block")]
    DuplicateSlot(Slot),

    #[error("Transaction for slot {0} has not been mined")]
    NotMined(Slot),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}
