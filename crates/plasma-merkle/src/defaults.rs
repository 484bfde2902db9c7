//! Default (all-empty subtree) node hashes.
//!
//! `defaults[0]` is the empty-leaf hash and `defaults[i] = H(defaults[i-1], defaults[i-1])`.
//! The chain does not depend on the tree depth, so one table computed up to
//! [`MAX_DEPTH`] serves every tree in the process; a tree of depth `d` views
//! its first `d + 1` entries.

use crate::error::{MerkleError, MerkleResult};
use crate::hash::{empty_hash_chain, HashValue};

/// Deepest tree supported. Bounds the shared default table.
pub const MAX_DEPTH: usize = 256;

lazy_static::lazy_static! {
    static ref DEFAULT_NODES: Vec<HashValue> = empty_hash_chain(MAX_DEPTH);
}

/// Read-only view of the default node for every level `0..=depth`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DefaultNodes {
    nodes: &'static [HashValue],
}

impl DefaultNodes {
    pub fn for_depth(depth: usize) -> MerkleResult<Self> {
        if depth > MAX_DEPTH {
            return Err(MerkleError::InvalidDepth {
                depth,
                max: MAX_DEPTH,
            });
        }
        Ok(Self {
            nodes: &DEFAULT_NODES[..=depth],
        })
    }

    pub fn depth(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Default node at `level`. Panics if `level > depth`.
    pub fn get(&self, level: usize) -> HashValue {
        self.nodes[level]
    }

    /// Hash of an empty leaf.
    pub fn leaf(&self) -> HashValue {
        self.nodes[0]
    }

    /// Root of a tree with no occupied slots.
    pub fn root(&self) -> HashValue {
        self.nodes[self.depth()]
    }

    pub fn as_slice(&self) -> &'static [HashValue] {
        self.nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::{empty_leaf_hash, hash_pair};

    #[test]
    fn test_chain() {
        let defaults = DefaultNodes::for_depth(4).unwrap();
        assert_eq!(defaults.depth(), 4);
        assert_eq!(defaults.as_slice().len(), 5);
        assert_eq!(defaults.leaf(), empty_leaf_hash());
        for level in 1..=4 {
            let below = defaults.get(level - 1);
            assert_eq!(defaults.get(level), hash_pair(&below, &below));
        }
        assert_eq!(defaults.root(), defaults.get(4));
    }

    #[test]
    fn test_known_values() {
        let defaults = DefaultNodes::for_depth(64).unwrap();
        assert_eq!(
            defaults.get(1).to_string(),
            "0x633dc4d7da7256660a892f8f1604a44b5432649cc8ec5cb3ced4c4e6ac94dd1d"
        );
        assert_eq!(
            defaults.get(2).to_string(),
            "0x890740a8eb06ce9be422cb8da5cdafc2b58c0a5e24036c578de2a433c828ff7d"
        );
        assert_eq!(
            defaults.root().to_string(),
            "0x6f35419d1da1260bc0f33d52e8f6d73fc5d672c0dca13bb960b4ae1adec17937"
        );
    }

    #[test]
    fn test_shallow_is_prefix_of_deep() {
        let shallow = DefaultNodes::for_depth(8).unwrap();
        let deep = DefaultNodes::for_depth(MAX_DEPTH).unwrap();
        assert_eq!(shallow.as_slice(), &deep.as_slice()[..9]);
    }

    #[test]
    fn test_depth_zero() {
        let defaults = DefaultNodes::for_depth(0).unwrap();
        assert_eq!(defaults.root(), empty_leaf_hash());
    }

    #[test]
    fn test_depth_too_large() {
        assert_eq!(
            DefaultNodes::for_depth(MAX_DEPTH + 1),
            Err(MerkleError::InvalidDepth {
                depth: MAX_DEPTH + 1,
                max: MAX_DEPTH
            })
        );
    }
}
