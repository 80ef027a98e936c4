//! Lower-case hex helpers shared by the JSON model and the CLI.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HexError {
    #[error("odd number of hex digits: {len}")]
    OddLength { len: usize },
    #[error("invalid hex digit {digit:?} at position {position}")]
    InvalidDigit { digit: char, position: usize },
}

/// Format bytes as contiguous lower-case hex.
///
/// # Examples
/// ```
/// assert_eq!(ddp_core::to_hex(&[0x40, 0x0f]), "400f");
/// ```
pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Parse hex text into bytes.
///
/// Whitespace is ignored, as is a leading `0x`. Both cases are accepted.
///
/// # Examples
/// ```
/// assert_eq!(ddp_core::parse_hex("0x40 0F").unwrap(), vec![0x40, 0x0f]);
/// ```
pub fn parse_hex(text: &str) -> Result<Vec<u8>, HexError> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let digits: Vec<char> = body.chars().filter(|c| !c.is_whitespace()).collect();
    if digits.len() % 2 != 0 {
        return Err(HexError::OddLength { len: digits.len() });
    }

    let mut out = Vec::with_capacity(digits.len() / 2);
    for (pair_idx, pair) in digits.chunks(2).enumerate() {
        let hi = hex_value(pair[0], pair_idx * 2)?;
        let lo = hex_value(pair[1], pair_idx * 2 + 1)?;
        out.push((hi << 4) | lo);
    }
    Ok(out)
}

fn hex_value(digit: char, position: usize) -> Result<u8, HexError> {
    digit
        .to_digit(16)
        .map(|v| v as u8)
        .ok_or(HexError::InvalidDigit { digit, position })
}

/// Serde adapter storing byte payloads as hex strings.
pub(crate) mod serde_hex {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::to_hex(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::parse_hex(&text).map_err(D::Error::custom)
    }
}
