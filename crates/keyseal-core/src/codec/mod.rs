//! Keyset encodings.
//!
//! Two lossless encodings of the same [`Keyset`]:
//!
//! - [`binary`]: compact, deterministic protobuf bytes for storage as one
//!   opaque blob
//! - [`text`]: structured JSON for human inspection, compact or pretty
//!
//! The two are never converted into each other directly. Transcoding always
//! decodes into the in-memory [`Keyset`] first, so every conversion is also a
//! full validation.
//!
//! # Invariants
//!
//! - `binary::decode(&binary::encode(k)) == k`
//! - `text::decode(&text::encode(k)) == k`
//! - `text::decode(&text::encode_pretty(k)) == k`

pub mod binary;
pub mod text;
pub(crate) mod wire;

use crate::{error::Result, keyset::Keyset};

/// Re-encode a binary keyset as JSON.
///
/// # Errors
///
/// - `MalformedKeyset`: `bytes` is not a valid binary keyset
pub fn binary_to_text(bytes: &[u8], pretty: bool) -> Result<String> {
    let keyset = binary::decode(bytes)?;
    Ok(if pretty { text::encode_pretty(&keyset) } else { text::encode(&keyset) })
}

/// Re-encode a JSON keyset as binary.
///
/// # Errors
///
/// - `MalformedKeyset`: `text` is not a valid JSON keyset
pub fn text_to_binary(text: &str) -> Result<Vec<u8>> {
    text::decode(text).map(|keyset| binary::encode(&keyset))
}

impl Keyset {
    /// Compact binary encoding. See [`binary`].
    pub fn to_binary(&self) -> Vec<u8> {
        binary::encode(self)
    }

    /// Decode the compact binary encoding.
    ///
    /// # Errors
    ///
    /// - `MalformedKeyset`: see [`binary::decode`]
    pub fn from_binary(bytes: &[u8]) -> Result<Self> {
        binary::decode(bytes)
    }

    /// Compact JSON encoding. See [`text`].
    pub fn to_json(&self) -> String {
        text::encode(self)
    }

    /// Tab-indented JSON encoding for display.
    pub fn to_json_pretty(&self) -> String {
        text::encode_pretty(self)
    }

    /// Decode the JSON encoding, compact or pretty.
    ///
    /// # Errors
    ///
    /// - `MalformedKeyset`: see [`text::decode`]
    pub fn from_json(text: &str) -> Result<Self> {
        text::decode(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_text_binary_is_identity() {
        let keyset = Keyset::from_secret(&[0x11; 24]).unwrap();
        let bytes = keyset.to_binary();

        let pretty = binary_to_text(&bytes, true).unwrap();
        let compact = binary_to_text(&bytes, false).unwrap();

        assert_eq!(text_to_binary(&pretty).unwrap(), bytes);
        assert_eq!(text_to_binary(&compact).unwrap(), bytes);
    }

    #[test]
    fn transcoding_validates() {
        assert!(binary_to_text(&[0xFF], false).is_err());
        assert!(text_to_binary("{}").is_err());
    }
}
