//! Unsigned transaction drafts handed back for external signing.

use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

/// An unsigned transaction skeleton.
///
/// `to` is `null` for contract creation. `value` is wei as a decimal string
/// because JSON numbers cannot carry 256-bit integers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxDraft {
    pub to: Option<Address>,
    pub data: Bytes,
    #[serde(with = "u256_decimal")]
    pub value: U256,
    pub description: String,
}

impl TxDraft {
    pub fn is_contract_creation(&self) -> bool {
        self.to.is_none()
    }
}

/// Serde adapter: `U256` as a base-10 string. Accepts `0x` hex and plain
/// integers on input.
pub mod u256_decimal {
    use alloy_primitives::U256;
    use serde::{de, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &U256, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<U256, D::Error> {
        struct U256Visitor;

        impl<'de> de::Visitor<'de> for U256Visitor {
            type Value = U256;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a non-negative integer as decimal string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                let parsed = match v.strip_prefix("0x") {
                    Some(hex) => U256::from_str_radix(hex, 16),
                    None => U256::from_str_radix(v, 10),
                };
                parsed.map_err(|e| E::custom(format!("invalid U256 '{v}': {e}")))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(U256::from(v))
            }
        }

        deserializer.deserialize_any(U256Visitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_serializes_as_decimal_string() {
        let draft = TxDraft {
            to: None,
            data: Bytes::from(vec![0x60, 0x80]),
            value: U256::from(500_000_000_000_000_000u64),
            description: "Deploy".into(),
        };
        let v = serde_json::to_value(&draft).unwrap();
        assert_eq!(v["value"], "500000000000000000");
        assert_eq!(v["to"], serde_json::Value::Null);
        assert_eq!(v["data"], "0x6080");
    }

    #[test]
    fn test_value_beyond_u64_survives() {
        let big = U256::from(10u64).pow(U256::from(30u64));
        let raw = json!({
            "to": "0x10ED43C718714eb63d5aA57B78B54704E256024E",
            "data": "0x",
            "value": big.to_string(),
            "description": "swap"
        });
        let draft: TxDraft = serde_json::from_value(raw).unwrap();
        assert_eq!(draft.value, big);
        assert!(!draft.is_contract_creation());
    }
}
