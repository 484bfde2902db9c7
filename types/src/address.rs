//! Account addresses.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::{PlasmaError, PlasmaResult};

pub const ADDRESS_LENGTH: usize = 20;

/// A 20-byte account address, shown as `0x`-prefixed lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    pub fn new(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Parse hex in any letter case, with or without `0x`.
    pub fn from_hex(hex_str: &str) -> PlasmaResult<Self> {
        let hex_str = hex_str.strip_prefix("0x").unwrap_or(hex_str);
        let bytes = hex::decode(hex_str)
            .map_err(|e| PlasmaError::InvalidData(format!("Invalid address hex: {}", e)))?;
        if bytes.len() != ADDRESS_LENGTH {
            return Err(PlasmaError::InvalidData(format!(
                "Address must be {} bytes, got {}",
                ADDRESS_LENGTH,
                bytes.len()
            )));
        }
        let mut arr = [0u8; ADDRESS_LENGTH];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl FromStr for Address {
    type Err = PlasmaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed_case() {
        let addr: Address = "0x6893aD12e1fCD46aB2df0De632D54Eef82FAc13E".parse().unwrap();
        assert_eq!(addr.to_string(), "0x6893ad12e1fcd46ab2df0de632d54eef82fac13e");
        assert_eq!(Address::from_hex(&addr.to_string()).unwrap(), addr);
    }

    #[test]
    fn test_rejects_wrong_length() {
        assert!(matches!(
            Address::from_hex("0x1234"),
            Err(PlasmaError::InvalidData(_))
        ));
        assert!(Address::from_hex("not-hex").is_err());
    }
}
