//! Serde adapters for the JSON wire form of records.

/// `u64` carried as a decimal string, as block numbers and spent-block
/// references are in the plasma JSON records. Plain JSON integers are
/// accepted on input.
pub mod u64_string {
    use serde::{de, Deserializer, Serializer};
    use std::fmt;

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        deserializer.deserialize_any(U64Visitor)
    }

    struct U64Visitor;

    impl<'de> de::Visitor<'de> for U64Visitor {
        type Value = u64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an unsigned integer or a decimal string")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<u64, E> {
            Ok(v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<u64, E> {
            u64::try_from(v).map_err(|_| E::custom(format!("negative value {}", v)))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<u64, E> {
            v.trim().parse().map_err(E::custom)
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Wrapper {
        #[serde(with = "super::u64_string")]
        n: u64,
    }

    #[test]
    fn test_u64_string() {
        let json = serde_json::to_string(&Wrapper { n: 42 }).unwrap();
        assert_eq!(json, r#"{"n":"42"}"#);
        assert_eq!(serde_json::from_str::<Wrapper>(&json).unwrap().n, 42);
        assert_eq!(serde_json::from_str::<Wrapper>(r#"{"n":7}"#).unwrap().n, 7);
        assert!(serde_json::from_str::<Wrapper>(r#"{"n":"-1"}"#).is_err());
    }
}
