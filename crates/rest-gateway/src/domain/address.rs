//! Address parsing and validation.
//!
//! Addresses have the form `<network-prefix>:<payload>`. Route parameters must
//! match the fixed pattern `^kaspa(test)?:[a-z0-9]{61,63}$` before any store or
//! node access. The activity index is keyed by payload only.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Network prefixes accepted by [`Address::parse`].
pub const NETWORK_PREFIXES: [&str; 2] = ["kaspa", "kaspatest"];

/// Separator between network prefix and payload.
pub const PREFIX_SEPARATOR: char = ':';

const PAYLOAD_MIN_LEN: usize = 61;
const PAYLOAD_MAX_LEN: usize = 63;

/// Example used in error messages.
pub const ADDRESS_EXAMPLE: &str =
    "kaspa:qqkqkzjvr7zwxxmjxjkmxxdwju9kjs6e9u82uh59z07vgaks6gg62v8707g73";

/// A validated address string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

/// Why an address was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("missing ':' separator in address '{0}'")]
    MissingSeparator(String),
    #[error("more than one ':' separator in address '{0}'")]
    ExtraSeparator(String),
    #[error("unknown network prefix '{prefix}' in address '{address}'")]
    UnknownPrefix { prefix: String, address: String },
    #[error("invalid payload in address '{0}'")]
    InvalidPayload(String),
}

impl Address {
    /// Validate `raw` against the address pattern.
    pub fn parse(raw: &str) -> Result<Self, AddressError> {
        let (prefix, payload) = split_payload(raw)?;

        if !NETWORK_PREFIXES.contains(&prefix) {
            return Err(AddressError::UnknownPrefix {
                prefix: prefix.to_string(),
                address: raw.to_string(),
            });
        }

        let valid_len = (PAYLOAD_MIN_LEN..=PAYLOAD_MAX_LEN).contains(&payload.len());
        let valid_chars = payload
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit());
        if !valid_len || !valid_chars {
            return Err(AddressError::InvalidPayload(raw.to_string()));
        }

        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn prefix(&self) -> &str {
        self.split().0
    }

    /// The part after the separator, used as the activity index key.
    pub fn payload(&self) -> &str {
        self.split().1
    }

    fn split(&self) -> (&str, &str) {
        // Parsed addresses always carry the separator.
        self.0
            .split_once(PREFIX_SEPARATOR)
            .unwrap_or(("", self.0.as_str()))
    }
}

/// Split `prefix:payload` without validating either side.
///
/// Batch activity checks only require exactly one separator; the payload is
/// used as the lookup key as-is.
pub fn split_payload(raw: &str) -> Result<(&str, &str), AddressError> {
    match raw.split_once(PREFIX_SEPARATOR) {
        Some((_, payload)) if payload.contains(PREFIX_SEPARATOR) => {
            Err(AddressError::ExtraSeparator(raw.to_string()))
        }
        Some((prefix, payload)) if !prefix.is_empty() && !payload.is_empty() => {
            Ok((prefix, payload))
        }
        _ => Err(AddressError::MissingSeparator(raw.to_string())),
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Address::parse(&value)
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_example() {
        let address = Address::parse(ADDRESS_EXAMPLE).unwrap();
        assert_eq!(address.prefix(), "kaspa");
        assert_eq!(
            address.payload(),
            "qqkqkzjvr7zwxxmjxjkmxxdwju9kjs6e9u82uh59z07vgaks6gg62v8707g73"
        );
    }

    #[test]
    fn test_parse_testnet_prefix() {
        let raw = format!("kaspatest:{}", "q".repeat(61));
        assert!(Address::parse(&raw).is_ok());
    }

    #[test]
    fn test_reject_missing_separator() {
        assert!(matches!(
            Address::parse("kaspaqqkqkzjvr7zwxxmjxjkmxx"),
            Err(AddressError::MissingSeparator(_))
        ));
    }

    #[test]
    fn test_reject_unknown_prefix() {
        let raw = format!("bitcoin:{}", "q".repeat(61));
        assert!(matches!(
            Address::parse(&raw),
            Err(AddressError::UnknownPrefix { .. })
        ));
    }

    #[test]
    fn test_reject_bad_payload() {
        let too_short = format!("kaspa:{}", "q".repeat(60));
        let too_long = format!("kaspa:{}", "q".repeat(64));
        let upper = format!("kaspa:{}", "Q".repeat(61));
        for raw in [too_short, too_long, upper] {
            assert!(matches!(
                Address::parse(&raw),
                Err(AddressError::InvalidPayload(_))
            ));
        }
    }

    #[test]
    fn test_split_payload() {
        assert_eq!(split_payload("kaspa:abc").unwrap(), ("kaspa", "abc"));
        assert!(split_payload("kaspa:").is_err());
        assert!(matches!(
            split_payload("kaspa:a:b"),
            Err(AddressError::ExtraSeparator(_))
        ));
        assert!(split_payload(":abc").is_err());
        assert!(split_payload("abc").is_err());
    }

    #[test]
    fn test_serde_roundtrip_validates() {
        let json = format!("\"{}\"", ADDRESS_EXAMPLE);
        let address: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(address.as_str(), ADDRESS_EXAMPLE);
        assert!(serde_json::from_str::<Address>("\"nope\"").is_err());
    }
}
