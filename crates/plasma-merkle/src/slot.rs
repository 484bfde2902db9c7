//! Slot indices.
//!
//! A slot addresses one leaf of the tree. Realistic depths (64 and up) put the
//! index space beyond native machine words, so slots are arbitrary-precision
//! unsigned integers. Parent addressing is always floor division by two.

use num_bigint::BigUint;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::hash::uint256_word;
use crate::{MerkleError, MerkleResult, HASH_LENGTH};

/// Index of a leaf (or of a node, at higher levels) in the tree.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Slot(BigUint);

impl Slot {
    pub fn new(value: BigUint) -> Self {
        Self(value)
    }

    pub fn zero() -> Self {
        Self(BigUint::default())
    }

    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }

    pub fn is_even(&self) -> bool {
        !self.0.bit(0)
    }

    /// The other child of this node's parent.
    pub fn sibling(&self) -> Self {
        if self.is_even() {
            Self(&self.0 + 1u32)
        } else {
            Self(&self.0 - 1u32)
        }
    }

    /// Index of the parent node one level up: `floor(index / 2)`.
    pub fn parent(&self) -> Self {
        Self(&self.0 >> 1u32)
    }

    /// Number of significant bits.
    pub fn bits(&self) -> u64 {
        self.0.bits()
    }

    /// Reject slots outside `[0, 2^depth)`.
    pub fn check_range(&self, depth: usize) -> MerkleResult<()> {
        if self.bits() > depth as u64 {
            return Err(MerkleError::SlotOutOfRange {
                slot: self.to_string(),
                depth,
            });
        }
        Ok(())
    }

    /// The slot as a 32-byte big-endian ABI word.
    pub fn to_word(&self) -> MerkleResult<[u8; HASH_LENGTH]> {
        uint256_word(&self.0.to_bytes_be())
    }
}

impl From<u64> for Slot {
    fn from(value: u64) -> Self {
        Self(BigUint::from(value))
    }
}

impl From<BigUint> for Slot {
    fn from(value: BigUint) -> Self {
        Self(value)
    }
}

impl FromStr for Slot {
    type Err = MerkleError;

    /// Parses decimal, or hex with a `0x` prefix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parsed = match s.strip_prefix("0x") {
            Some(hex_digits) => BigUint::parse_bytes(hex_digits.as_bytes(), 16),
            None => BigUint::parse_bytes(s.as_bytes(), 10),
        };
        parsed
            .map(Self)
            .ok_or_else(|| MerkleError::InvalidInput(format!("Invalid slot: {:?}", s)))
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Slot({})", self.0)
    }
}

impl Serialize for Slot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct SlotVisitor;

impl<'de> de::Visitor<'de> for SlotVisitor {
    type Value = Slot;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative integer or a decimal/0x-hex string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Slot, E> {
        Ok(Slot::from(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Slot, E> {
        u64::try_from(v)
            .map(Slot::from)
            .map_err(|_| E::custom(format!("negative slot {}", v)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Slot, E> {
        v.parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Slot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(SlotVisitor)
    }
}
