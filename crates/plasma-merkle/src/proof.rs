//! Bit-packed inclusion proofs.
//!
//! Wire format, as consumed by the exit flow and by on-chain verifiers:
//!
//! ```text
//! | bitmap: bitmap_width(depth) bytes, big-endian | sibling_0 | sibling_1 | ... |
//! ```
//!
//! Bit `i` of the bitmap is set iff the sibling at level `i` is non-default.
//! Only those siblings are carried, 32 bytes each, in ascending level order.
//! A depth of at most 64 gives the 8-byte bitmap existing verifiers expect;
//! deeper trees get a proportionally wider bitmap rather than a truncated one.

use tracing::trace;

use crate::defaults::DefaultNodes;
use crate::error::{MerkleError, MerkleResult};
use crate::hash::{hash_pair, HashValue};
use crate::slot::Slot;
use crate::HASH_LENGTH;

/// Width of the legacy 64-bit bitmap.
pub const MIN_BITMAP_BYTES: usize = 8;

/// Number of bitmap bytes used for a tree of `depth` levels.
pub fn bitmap_width(depth: usize) -> usize {
    MIN_BITMAP_BYTES.max(depth.div_ceil(8))
}

/// An inclusion (or absence) proof for a single slot.
/// Exchanged as bytes; see [`Self::to_bytes`] and [`Self::from_bytes`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SparseMerkleProof {
    depth: usize,
    /// Big-endian bitmap, `bitmap_width(depth)` bytes
    bitmap: Vec<u8>,
    /// Non-default siblings, lowest level first
    siblings: Vec<HashValue>,
}

impl SparseMerkleProof {
    /// Start an empty proof (every sibling default).
    pub(crate) fn new(depth: usize) -> Self {
        Self {
            depth,
            bitmap: vec![0u8; bitmap_width(depth)],
            siblings: Vec::new(),
        }
    }

    /// Record the non-default sibling at `level`. Levels must be pushed in ascending order.
    pub(crate) fn push_sibling(&mut self, level: usize, sibling: HashValue) {
        debug_assert!(level < self.depth);
        let width = self.bitmap.len();
        self.bitmap[width - 1 - level / 8] |= 1 << (level % 8);
        self.siblings.push(sibling);
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn siblings(&self) -> &[HashValue] {
        &self.siblings
    }

    pub fn sibling_count(&self) -> usize {
        self.siblings.len()
    }

    pub fn has_sibling(&self, level: usize) -> bool {
        if level >= self.depth {
            return false;
        }
        let width = self.bitmap.len();
        self.bitmap[width - 1 - level / 8] & (1 << (level % 8)) != 0
    }

    /// Serialize to the wire format.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.bitmap.len() + self.siblings.len() * HASH_LENGTH);
        out.extend_from_slice(&self.bitmap);
        for sibling in &self.siblings {
            out.extend_from_slice(sibling.as_bytes());
        }
        out
    }

    /// `0x`-prefixed hex of [`Self::to_bytes`].
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }

    /// Decode a proof for a tree of `depth` levels.
    pub fn from_bytes(depth: usize, bytes: &[u8]) -> MerkleResult<Self> {
        // Validates depth against the supported maximum.
        DefaultNodes::for_depth(depth)?;

        let width = bitmap_width(depth);
        if bytes.len() < width {
            return Err(MerkleError::InvalidProof(format!(
                "Proof is {} bytes, shorter than its {}-byte bitmap",
                bytes.len(),
                width
            )));
        }
        let (bitmap, rest) = bytes.split_at(width);
        if rest.len() % HASH_LENGTH != 0 {
            return Err(MerkleError::InvalidProof(format!(
                "Sibling section of {} bytes is not a multiple of {}",
                rest.len(),
                HASH_LENGTH
            )));
        }

        let proof = Self {
            depth,
            bitmap: bitmap.to_vec(),
            siblings: rest
                .chunks_exact(HASH_LENGTH)
                .map(HashValue::from_slice)
                .collect::<MerkleResult<Vec<_>>>()?,
        };

        let set_bits: u32 = proof.bitmap.iter().map(|b| b.count_ones()).sum();
        let in_range = (0..depth).filter(|level| proof.has_sibling(*level)).count();
        if set_bits as usize != in_range {
            return Err(MerkleError::InvalidProof(format!(
                "Bitmap marks levels at or beyond depth {}",
                depth
            )));
        }
        if in_range != proof.siblings.len() {
            return Err(MerkleError::InvalidProof(format!(
                "Bitmap marks {} siblings but proof carries {}",
                in_range,
                proof.siblings.len()
            )));
        }
        Ok(proof)
    }

    /// Decode from `0x`-prefixed (or bare) hex.
    pub fn from_hex(depth: usize, hex_str: &str) -> MerkleResult<Self> {
        let hex_str = hex_str.strip_prefix("0x").unwrap_or(hex_str);
        let bytes = hex::decode(hex_str)
            .map_err(|e| MerkleError::InvalidInput(format!("Invalid hex: {}", e)))?;
        Self::from_bytes(depth, &bytes)
    }

    /// Recompute the root implied by `leaf` sitting at `slot`.
    pub fn compute_root(&self, slot: &Slot, leaf: &HashValue) -> MerkleResult<HashValue> {
        slot.check_range(self.depth)?;
        let defaults = DefaultNodes::for_depth(self.depth)?;

        let mut siblings = self.siblings.iter();
        let mut index = slot.clone();
        let mut current = *leaf;
        for level in 0..self.depth {
            let sibling = if self.has_sibling(level) {
                *siblings.next().ok_or_else(|| {
                    MerkleError::InvalidProof(format!("Missing sibling for level {}", level))
                })?
            } else {
                defaults.get(level)
            };
            current = if index.is_even() {
                hash_pair(&current, &sibling)
            } else {
                hash_pair(&sibling, &current)
            };
            index = index.parent();
        }
        Ok(current)
    }

    /// Check that `leaf` at `slot` is committed to by `root`.
    pub fn verify(&self, root: &HashValue, slot: &Slot, leaf: &HashValue) -> MerkleResult<()> {
        let computed = self.compute_root(slot, leaf)?;
        trace!(%slot, %computed, expected = %root, "verifying sparse merkle proof");
        if &computed == root {
            Ok(())
        } else {
            Err(MerkleError::InvalidProof(format!(
                "Root mismatch: expected {}, computed {}",
                root, computed
            )))
        }
    }
}

/// Verify serialized proof bytes. Any decoding error counts as a failed proof.
pub fn verify_proof(
    depth: usize,
    root: &HashValue,
    slot: &Slot,
    leaf: &HashValue,
    proof: &[u8],
) -> bool {
    SparseMerkleProof::from_bytes(depth, proof)
        .and_then(|proof| proof.verify(root, slot, leaf))
        .is_ok()
}
