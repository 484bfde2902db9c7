//! Hash utilities and types for the sparse Merkle tree.
//!
//! Every node hash is Keccak-256, combined the way `soliditySha3(bytes32, bytes32)`
//! does it, so roots and proofs produced here can be checked by an EVM contract.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;

use crate::{MerkleError, MerkleResult, HASH_LENGTH};

/// A 256-bit hash value used for leaves and internal nodes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct HashValue([u8; HASH_LENGTH]);

impl HashValue {
    /// The zero hash (all zeros)
    pub const ZERO: HashValue = HashValue([0u8; HASH_LENGTH]);

    /// Create a new HashValue from a fixed-size array
    pub fn new(bytes: [u8; HASH_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Create a HashValue from a slice
    pub fn from_slice(bytes: &[u8]) -> MerkleResult<Self> {
        if bytes.len() != HASH_LENGTH {
            return Err(MerkleError::InvalidHashLength {
                expected: HASH_LENGTH,
                got: bytes.len(),
            });
        }
        let mut arr = [0u8; HASH_LENGTH];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }

    /// Create a HashValue from a hex string, with or without the `0x` prefix
    pub fn from_hex(hex_str: &str) -> MerkleResult<Self> {
        let hex_str = hex_str.strip_prefix("0x").unwrap_or(hex_str);
        let bytes = hex::decode(hex_str)
            .map_err(|e| MerkleError::InvalidInput(format!("Invalid hex: {}", e)))?;
        Self::from_slice(&bytes)
    }

    /// Get the underlying bytes
    pub fn as_bytes(&self) -> &[u8; HASH_LENGTH] {
        &self.0
    }

    /// Convert to a Vec<u8>
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl fmt::Display for HashValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for HashValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HashValue({})", self)
    }
}

impl FromStr for HashValue {
    type Err = MerkleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl AsRef<[u8]> for HashValue {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; HASH_LENGTH]> for HashValue {
    fn from(bytes: [u8; HASH_LENGTH]) -> Self {
        Self(bytes)
    }
}

impl Serialize for HashValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for HashValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(de::Error::custom)
    }
}

/// Keccak-256 of arbitrary data.
pub fn keccak256(data: &[u8]) -> HashValue {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut bytes = [0u8; HASH_LENGTH];
    bytes.copy_from_slice(&result);
    HashValue(bytes)
}

/// Hash two child hashes into their parent: `keccak256(left || right)`.
pub fn hash_pair(left: &HashValue, right: &HashValue) -> HashValue {
    let mut hasher = Keccak256::new();
    hasher.update(left.as_bytes());
    hasher.update(right.as_bytes());
    let result = hasher.finalize();
    let mut bytes = [0u8; HASH_LENGTH];
    bytes.copy_from_slice(&result);
    HashValue(bytes)
}

/// Left-pad a big-endian unsigned integer into a single 32-byte ABI word.
pub fn uint256_word(be_bytes: &[u8]) -> MerkleResult<[u8; HASH_LENGTH]> {
    let first = be_bytes
        .iter()
        .position(|b| *b != 0)
        .unwrap_or(be_bytes.len());
    let significant = &be_bytes[first..];
    if significant.len() > HASH_LENGTH {
        return Err(MerkleError::InvalidInput(format!(
            "Integer of {} bytes does not fit a uint256 word",
            significant.len()
        )));
    }
    let mut word = [0u8; HASH_LENGTH];
    word[HASH_LENGTH - significant.len()..].copy_from_slice(significant);
    Ok(word)
}

/// Hash of an unoccupied leaf: the uint256 `0` ABI word run through Keccak-256.
pub fn empty_leaf_hash() -> HashValue {
    keccak256(&[0u8; HASH_LENGTH])
}

/// Empty-subtree hashes for levels `0..=depth`, leaf level first.
pub fn empty_hash_chain(depth: usize) -> Vec<HashValue> {
    let mut chain = Vec::with_capacity(depth + 1);
    chain.push(empty_leaf_hash());
    for level in 1..=depth {
        let below = chain[level - 1];
        chain.push(hash_pair(&below, &below));
    }
    chain
}
