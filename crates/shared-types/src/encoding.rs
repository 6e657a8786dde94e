//! # Hex Encoding
//!
//! `0x`-prefixed hex conversion for fixed-width primitives, plus serde helpers
//! so JSON payloads carry readable addresses instead of byte arrays.

use crate::errors::EncodingError;

/// Encode bytes as `0x`-prefixed lowercase hex.
pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decode a hex string (with or without `0x`) into a variable-length buffer.
pub fn decode_hex(input: &str) -> Result<Vec<u8>, EncodingError> {
    let trimmed = input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input);
    hex::decode(trimmed).map_err(|e| EncodingError::InvalidHex(e.to_string()))
}

/// Decode a hex string into exactly `N` bytes.
pub fn from_hex<const N: usize>(input: &str) -> Result<[u8; N], EncodingError> {
    let bytes = decode_hex(input)?;
    if bytes.len() != N {
        return Err(EncodingError::InvalidLength {
            expected: N,
            actual: bytes.len(),
        });
    }
    let mut out = [0u8; N];
    out.copy_from_slice(&bytes);
    Ok(out)
}

/// Serde adapter for fixed-width byte arrays as `0x` hex strings.
///
/// Use with `#[serde(with = "shared_types::hex_bytes")]`.
pub mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S, const N: usize>(bytes: &[u8; N], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::to_hex(bytes))
    }

    pub fn deserialize<'de, D, const N: usize>(deserializer: D) -> Result<[u8; N], D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        super::from_hex::<N>(&text).map_err(serde::de::Error::custom)
    }
}
