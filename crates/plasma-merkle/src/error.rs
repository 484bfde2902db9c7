//! Error types for the sparse Merkle tree.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MerkleError {
    #[error("Invalid tree depth {depth}: must be at most {max}")]
    InvalidDepth { depth: usize, max: usize },

    #[error("Invalid hash length: expected {expected} bytes, got {got}")]
    InvalidHashLength { expected: usize, got: usize },

    #[error("Slot {slot} out of range for depth {depth}")]
    SlotOutOfRange { slot: String, depth: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid proof: {0}")]
    InvalidProof(String),
}

pub type MerkleResult<T> = Result<T, MerkleError>;
