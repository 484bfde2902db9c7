//! # plasma-merkle
//!
//! The commitment-and-proof engine for plasma blocks.
//!
//! A block commits every transaction it settles into a [`sparse::SparseMerkleTree`]
//! keyed by slot. The slot space is huge (2^64 slots at the usual depth) and
//! almost entirely empty, so the tree only materializes paths to occupied
//! slots and substitutes precomputed default nodes everywhere else.
//!
//! ## Modules
//!
//! - [`hash`]: [`HashValue`] and the Keccak-256 node combiner
//! - [`slot`]: arbitrary-precision slot indices
//! - [`defaults`]: the shared table of empty-subtree hashes
//! - [`sparse`]: tree construction and proof generation
//! - [`proof`]: the bitmap + sibling-hash wire format and its verifier
//!
//! ## Compatibility
//!
//! Node hashing is `keccak256(left || right)` and the empty leaf is the
//! Keccak-256 of the uint256 zero word, so roots and proofs agree bit-for-bit
//! with `soliditySha3`-based verifiers.

pub mod defaults;
pub mod error;
pub mod hash;
pub mod proof;
pub mod slot;
pub mod sparse;

pub use defaults::{DefaultNodes, MAX_DEPTH};
pub use error::{MerkleError, MerkleResult};
pub use hash::{empty_leaf_hash, hash_pair, keccak256, HashValue};
pub use proof::{bitmap_width, verify_proof, SparseMerkleProof};
pub use slot::Slot;
pub use sparse::SparseMerkleTree;

/// The length of hash digests used in merkle trees (32 bytes = 256 bits)
pub const HASH_LENGTH: usize = 32;

/// Tree depth used for plasma blocks: one leaf per 64-bit slot.
pub const DEFAULT_TREE_DEPTH: usize = 64;
