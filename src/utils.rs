use alloy::primitives::U256;
use bigdecimal::BigDecimal;
use bigdecimal::num_bigint::{BigInt, Sign};
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Converts a raw integer token amount to a decimal value using the token's decimals.
/// Useful for displaying human-readable balances returned by the balance endpoints.
pub fn format_units(amount: U256, decimals: u8) -> BigDecimal {
    let digits = BigInt::from_bytes_be(Sign::Plus, &amount.to_be_bytes::<32>());
    BigDecimal::new(digits, i64::from(decimals))
}

/// A boolean that can only ever hold the value `V`.
/// Used for request fields whose literal value selects the response type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Flag<const V: bool>;

impl<const V: bool> Flag<V> {
    /// Returns the literal value of the flag.
    pub const fn value(self) -> bool {
        V
    }
}

impl<const V: bool> Serialize for Flag<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bool(V)
    }
}

impl<'de, const V: bool> Deserialize<'de> for Flag<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = bool::deserialize(deserializer)?;
        if value == V {
            Ok(Flag)
        } else {
            Err(de::Error::custom(format!("expected literal `{V}`")))
        }
    }
}

/// Serde helpers for `u64` values carried as hex quantities (`"0x3e8"`).
/// Plain JSON numbers and decimal strings are accepted on input.
pub mod hex_quantity {
    use super::*;

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{value:#x}"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        deserializer.deserialize_any(QuantityVisitor)
    }

    pub(crate) fn parse(s: &str) -> Result<u64, String> {
        match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u64::from_str_radix(hex, 16),
            None => s.parse::<u64>(),
        }
        .map_err(|e| format!("invalid quantity `{s}`: {e}"))
    }
}

/// Serde helpers for `u64` values the service sends either as numbers or as strings.
pub mod string_or_number {
    use super::*;

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(*value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        deserializer.deserialize_any(QuantityVisitor)
    }
}

struct QuantityVisitor;

impl Visitor<'_> for QuantityVisitor {
    type Value = u64;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an unsigned integer, a decimal string or a hex quantity")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<u64, E> {
        Ok(v)
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<u64, E> {
        u64::try_from(v).map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<u64, E> {
        hex_quantity::parse(v).map_err(E::custom)
    }
}

/// Renders a token id the way the public types expose it: as a base-10 string.
/// Hex ids (`0x...`) are converted, anything unparsable is kept verbatim.
pub(crate) fn token_id_to_decimal(token_id: &str) -> String {
    U256::from_str(token_id)
        .map(|id| id.to_string())
        .unwrap_or_else(|_| token_id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    struct Quantity {
        #[serde(with = "hex_quantity")]
        count: u64,
    }

    #[test]
    fn test_format_units() {
        let amount = U256::from(1_500_000u64);
        assert_eq!(format_units(amount, 6), BigDecimal::from_str("1.5").unwrap());
        assert_eq!(format_units(U256::from(42u64), 0), BigDecimal::from(42));
        assert_eq!(format_units(U256::ZERO, 18), BigDecimal::from(0));
    }

    #[test]
    fn test_format_units_keeps_large_scales() {
        assert_eq!(
            format_units(U256::from(1u64), 40),
            BigDecimal::from_str("1e-40").unwrap()
        );
        let max = U256::MAX.to_string();
        assert_eq!(
            format_units(U256::MAX, 77),
            BigDecimal::from_str(&format!("1.{}", &max[1..])).unwrap()
        );
    }

    #[test]
    fn test_flag_accepts_only_its_literal() {
        assert_eq!(serde_json::to_string(&Flag::<true>).unwrap(), "true");
        assert!(serde_json::from_str::<Flag<true>>("true").is_ok());
        assert!(serde_json::from_str::<Flag<true>>("false").is_err());
        assert!(serde_json::from_str::<Flag<false>>("false").is_ok());
    }

    #[test]
    fn test_hex_quantity() {
        let json = serde_json::to_string(&Quantity { count: 1000 }).unwrap();
        assert_eq!(json, r#"{"count":"0x3e8"}"#);
        let parsed: Quantity = serde_json::from_str(r#"{"count":250}"#).unwrap();
        assert_eq!(parsed.count, 250);
        let parsed: Quantity = serde_json::from_str(r#"{"count":"17"}"#).unwrap();
        assert_eq!(parsed.count, 17);
    }

    #[test]
    fn test_token_id_to_decimal() {
        assert_eq!(token_id_to_decimal("0x0000000000000000000000000000000000000000000000000000000000000010"), "16");
        assert_eq!(token_id_to_decimal("42"), "42");
    }
}
