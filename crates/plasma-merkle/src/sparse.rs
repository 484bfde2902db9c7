//! Sparse Merkle Tree implementation.
//!
//! Commits a `2^depth` slot space to one root while only materializing nodes
//! that have at least one occupied descendant. Everything else is implicitly
//! the default node of its level.
//!
//! # Design
//!
//! - Level 0 holds the occupied leaves keyed by slot; level `depth` holds at
//!   most the root at index 0.
//! - Level `L + 1` is derived from level `L`: an even index always produces
//!   its parent (pairing with its right sibling or the default), an odd index
//!   produces it only when its left sibling is absent.
//! - Parent index is `floor(index / 2)` everywhere, including proofs.
//! - The tree has no mutating API. A new leaf set means a new tree, so a
//!   built tree can be shared across threads and serve proofs concurrently.
//!
//! # Example
//!
//! ```
//! use plasma_merkle::{keccak256, verify_proof, Slot, SparseMerkleTree};
//!
//! let leaf = keccak256(b"tx");
//! let tree = SparseMerkleTree::build(64, [(Slot::from(5), leaf)]).unwrap();
//!
//! let proof = tree.prove(&Slot::from(5)).unwrap();
//! assert!(verify_proof(64, &tree.root(), &Slot::from(5), &leaf, &proof));
//! ```

use std::collections::BTreeMap;
use tracing::debug;

use crate::defaults::DefaultNodes;
use crate::error::MerkleResult;
use crate::hash::{hash_pair, HashValue};
use crate::proof::SparseMerkleProof;
use crate::slot::Slot;

/// Non-default nodes of one level, keyed by index.
type SparseLevel = BTreeMap<Slot, HashValue>;

/// An immutable sparse Merkle tree built from a snapshot of occupied slots.
#[derive(Clone, Debug)]
pub struct SparseMerkleTree {
    depth: usize,
    defaults: DefaultNodes,
    /// `levels[0]` are the leaves, `levels[depth]` the root. Empty when no slot is occupied.
    levels: Vec<SparseLevel>,
    root: HashValue,
}

impl SparseMerkleTree {
    /// A tree with every slot unoccupied.
    pub fn empty(depth: usize) -> MerkleResult<Self> {
        let defaults = DefaultNodes::for_depth(depth)?;
        Ok(Self {
            depth,
            defaults,
            levels: Vec::new(),
            root: defaults.root(),
        })
    }

    /// Build a tree of `depth` levels from `(slot, leaf hash)` pairs.
    ///
    /// Every slot must lie in `[0, 2^depth)`; this is checked before any hashing.
    /// A leaf equal to the empty-leaf hash is the same as no leaf and is dropped.
    /// When a slot is given twice, the last value wins.
    pub fn build<I>(depth: usize, leaves: I) -> MerkleResult<Self>
    where
        I: IntoIterator<Item = (Slot, HashValue)>,
    {
        let defaults = DefaultNodes::for_depth(depth)?;

        let mut occupied = SparseLevel::new();
        for (slot, leaf) in leaves {
            slot.check_range(depth)?;
            if leaf == defaults.leaf() {
                occupied.remove(&slot);
            } else {
                occupied.insert(slot, leaf);
            }
        }

        if occupied.is_empty() {
            debug!(depth, "built empty sparse merkle tree");
            return Self::empty(depth);
        }

        let leaf_count = occupied.len();
        let levels = Self::create_levels(occupied, depth, &defaults);
        let root = levels[depth]
            .get(&Slot::zero())
            .copied()
            .unwrap_or_else(|| defaults.root());

        debug!(depth, leaves = leaf_count, %root, "built sparse merkle tree");

        Ok(Self {
            depth,
            defaults,
            levels,
            root,
        })
    }

    /// Derive every level above the leaves, returning `depth + 1` levels.
    fn create_levels(leaves: SparseLevel, depth: usize, defaults: &DefaultNodes) -> Vec<SparseLevel> {
        let mut levels = Vec::with_capacity(depth + 1);
        let mut current = leaves;

        for level in 0..depth {
            let default = defaults.get(level);
            let mut next = SparseLevel::new();

            for (index, hash) in &current {
                let sibling_index = index.sibling();
                if index.is_even() {
                    let sibling = current.get(&sibling_index).copied().unwrap_or(default);
                    next.insert(index.parent(), hash_pair(hash, &sibling));
                } else if !current.contains_key(&sibling_index) {
                    // A present left sibling already produced this parent.
                    next.insert(index.parent(), hash_pair(&default, hash));
                }
            }

            levels.push(std::mem::replace(&mut current, next));
        }

        levels.push(current);
        levels
    }

    /// Get the root hash of the tree.
    pub fn root(&self) -> HashValue {
        self.root
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn defaults(&self) -> &DefaultNodes {
        &self.defaults
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.levels.first().map_or(0, |leaves| leaves.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Leaf hash at `slot`, if occupied.
    pub fn leaf(&self, slot: &Slot) -> Option<HashValue> {
        self.node(0, slot)
    }

    /// Leaf hash at `slot`, or the empty-leaf hash.
    pub fn leaf_or_default(&self, slot: &Slot) -> HashValue {
        self.leaf(slot).unwrap_or_else(|| self.defaults.leaf())
    }

    /// A materialized node. `None` means the node is the default of its level.
    pub fn node(&self, level: usize, index: &Slot) -> Option<HashValue> {
        self.levels.get(level)?.get(index).copied()
    }

    /// Occupied slots and their leaf hashes, in slot order.
    pub fn leaves(&self) -> impl Iterator<Item = (&Slot, &HashValue)> {
        self.levels.first().into_iter().flat_map(|leaves| leaves.iter())
    }

    /// Build the inclusion proof for `slot`, occupied or not.
    pub fn get_proof(&self, slot: &Slot) -> MerkleResult<SparseMerkleProof> {
        slot.check_range(self.depth)?;

        let mut proof = SparseMerkleProof::new(self.depth);
        let mut index = slot.clone();
        for level in 0..self.depth {
            if let Some(sibling) = self.node(level, &index.sibling()) {
                proof.push_sibling(level, sibling);
            }
            index = index.parent();
        }
        Ok(proof)
    }

    /// Serialized proof for `slot` (bitmap followed by sibling hashes).
    pub fn prove(&self, slot: &Slot) -> MerkleResult<Vec<u8>> {
        Ok(self.get_proof(slot)?.to_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MerkleError;
    use crate::hash::{empty_leaf_hash, keccak256};
    use crate::proof::verify_proof;
    use std::sync::Arc;

    fn leaf(data: &str) -> HashValue {
        keccak256(data.as_bytes())
    }

    fn leaves(entries: &[(u64, &str)]) -> Vec<(Slot, HashValue)> {
        entries
            .iter()
            .map(|(slot, data)| (Slot::from(*slot), leaf(data)))
            .collect()
    }

    #[test]
    fn test_empty_tree() {
        let tree = SparseMerkleTree::build(64, Vec::<(Slot, HashValue)>::new()).unwrap();
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert_eq!(
            tree.root().to_string(),
            "0x6f35419d1da1260bc0f33d52e8f6d73fc5d672c0dca13bb960b4ae1adec17937"
        );
        assert_eq!(tree.root(), SparseMerkleTree::empty(64).unwrap().root());
    }

    #[test]
    fn test_two_leaf_pairing() {
        let tree = SparseMerkleTree::build(1, leaves(&[(0, "h0"), (1, "h1")])).unwrap();
        assert_eq!(tree.root(), hash_pair(&leaf("h0"), &leaf("h1")));
    }

    #[test]
    fn test_scenario_depth_two() {
        let tree = SparseMerkleTree::build(2, leaves(&[(0, "a"), (3, "d")])).unwrap();
        let default0 = empty_leaf_hash();

        let left = hash_pair(&leaf("a"), &default0);
        let right = hash_pair(&default0, &leaf("d"));
        assert_eq!(tree.node(1, &Slot::from(0)), Some(left));
        assert_eq!(tree.node(1, &Slot::from(1)), Some(right));
        assert_eq!(tree.root(), hash_pair(&left, &right));
        assert_eq!(
            tree.root().to_string(),
            "0x9a1009fb54caadc26d47fc144020d3d2cc57f02c8619dad4accab5cfa9a5476f"
        );

        // Slot 1 is unoccupied, so only the level-1 sibling is carried.
        let proof = tree.get_proof(&Slot::from(0)).unwrap();
        assert!(!proof.has_sibling(0));
        assert!(proof.has_sibling(1));
        assert_eq!(proof.siblings(), &[right]);

        let bytes = proof.to_bytes();
        assert_eq!(bytes[..8], [0, 0, 0, 0, 0, 0, 0, 0b10]);
        assert_eq!(bytes[8..], *right.as_bytes());
    }

    #[test]
    fn test_single_leaf_pairs_with_defaults() {
        let depth = 8;
        let tree = SparseMerkleTree::build(depth, leaves(&[(77, "only")])).unwrap();
        let defaults = tree.defaults();

        let mut expected = leaf("only");
        let mut index = Slot::from(77);
        for level in 0..depth {
            expected = if index.is_even() {
                hash_pair(&expected, &defaults.get(level))
            } else {
                hash_pair(&defaults.get(level), &expected)
            };
            index = index.parent();
        }
        assert_eq!(tree.root(), expected);

        // Only the path to the leaf is materialized
        for level in 0..=depth {
            assert_eq!(tree.levels[level].len(), 1);
        }
        assert_eq!(tree.get_proof(&Slot::from(77)).unwrap().sibling_count(), 0);
    }

    #[test]
    fn test_default_leaf_changes_nothing() {
        let empty = SparseMerkleTree::build(16, Vec::<(Slot, HashValue)>::new()).unwrap();
        for slot in [0u64, 1, 12345, 65535] {
            let tree =
                SparseMerkleTree::build(16, vec![(Slot::from(slot), empty_leaf_hash())]).unwrap();
            assert_eq!(tree.root(), empty.root());
            assert_eq!(
                tree.prove(&Slot::from(slot)).unwrap(),
                empty.prove(&Slot::from(slot)).unwrap()
            );
        }
    }

    #[test]
    fn test_every_slot_verifies() {
        let depth = 4;
        let tree =
            SparseMerkleTree::build(depth, leaves(&[(0, "a"), (3, "b"), (4, "c"), (5, "d"), (14, "e")]))
                .unwrap();
        let root = tree.root();

        for s in 0..16u64 {
            let slot = Slot::from(s);
            let value = tree.leaf_or_default(&slot);
            let proof = tree.prove(&slot).unwrap();
            assert!(verify_proof(depth, &root, &slot, &value, &proof), "slot {}", s);

            // A different value at the same slot must not verify
            assert!(!verify_proof(depth, &root, &slot, &leaf("forged"), &proof));
        }
    }

    #[test]
    fn test_proof_never_carries_defaults() {
        let depth = 6;
        let tree = SparseMerkleTree::build(depth, leaves(&[(2, "x"), (40, "y"), (41, "z")])).unwrap();
        for s in 0..64u64 {
            let proof = tree.get_proof(&Slot::from(s)).unwrap();
            assert!(proof.sibling_count() <= depth);
            let mut siblings = proof.siblings().iter();
            for level in 0..depth {
                if proof.has_sibling(level) {
                    assert_ne!(*siblings.next().unwrap(), tree.defaults().get(level));
                }
            }
        }
    }

    #[test]
    fn test_deterministic() {
        let forward = leaves(&[(9, "p"), (1, "q"), (1000, "r")]);
        let mut backward = forward.clone();
        backward.reverse();

        let t1 = SparseMerkleTree::build(32, forward).unwrap();
        let t2 = SparseMerkleTree::build(32, backward).unwrap();
        assert_eq!(t1.root(), t2.root());
        for s in [0u64, 1, 9, 1000, 4_000_000_000] {
            let slot = Slot::from(s);
            assert_eq!(t1.prove(&slot).unwrap(), t2.prove(&slot).unwrap());
        }
    }

    #[test]
    fn test_beyond_u64_slots() {
        let depth = 80;
        let slot: Slot = "0xffffffffffffffffffff".parse().unwrap(); // 2^80 - 1
        let tree = SparseMerkleTree::build(depth, vec![(slot.clone(), leaf("high"))]).unwrap();

        let proof = tree.prove(&slot).unwrap();
        assert_eq!(proof.len(), 10);
        assert!(verify_proof(depth, &tree.root(), &slot, &leaf("high"), &proof));
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert_eq!(
            SparseMerkleTree::build(2, leaves(&[(4, "x")])).unwrap_err(),
            MerkleError::SlotOutOfRange {
                slot: "4".to_string(),
                depth: 2
            }
        );

        let tree = SparseMerkleTree::build(2, leaves(&[(1, "x")])).unwrap();
        assert!(matches!(
            tree.get_proof(&Slot::from(4)),
            Err(MerkleError::SlotOutOfRange { .. })
        ));
    }

    #[test]
    fn test_invalid_depth() {
        assert!(matches!(
            SparseMerkleTree::build(257, Vec::<(Slot, HashValue)>::new()),
            Err(MerkleError::InvalidDepth { depth: 257, .. })
        ));
        assert!(SparseMerkleTree::empty(300).is_err());
    }

    #[test]
    fn test_depth_zero() {
        let tree = SparseMerkleTree::build(0, leaves(&[(0, "solo")])).unwrap();
        assert_eq!(tree.root(), leaf("solo"));
        assert_eq!(tree.prove(&Slot::zero()).unwrap(), vec![0u8; 8]);
    }

    #[test]
    fn test_leaf_accessors() {
        let tree = SparseMerkleTree::build(8, leaves(&[(3, "c"), (1, "a")])).unwrap();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree.leaf(&Slot::from(3)), Some(leaf("c")));
        assert_eq!(tree.leaf(&Slot::from(2)), None);
        assert_eq!(tree.leaf_or_default(&Slot::from(2)), empty_leaf_hash());

        let slots: Vec<_> = tree.leaves().map(|(slot, _)| slot.clone()).collect();
        assert_eq!(slots, vec![Slot::from(1), Slot::from(3)]);
    }

    #[test]
    fn test_concurrent_proofs() {
        let tree = Arc::new(
            SparseMerkleTree::build(64, (0..32u64).map(|i| (Slot::from(i * 7), leaf(&i.to_string()))))
                .unwrap(),
        );

        let handles: Vec<_> = (0..4u64)
            .map(|t| {
                let tree = Arc::clone(&tree);
                std::thread::spawn(move || {
                    (0..32u64)
                        .filter(|i| i % 4 == t)
                        .all(|i| {
                            let slot = Slot::from(i * 7);
                            let proof = tree.prove(&slot).unwrap();
                            verify_proof(64, &tree.root(), &slot, &tree.leaf_or_default(&slot), &proof)
                        })
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }
}
