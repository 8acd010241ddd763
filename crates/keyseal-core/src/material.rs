//! Raw AES key material and its embedded form.
//!
//! A keyset entry never holds a `KeyMaterial` directly. It holds the
//! serialized `AesGcmKey` message produced by [`KeyMaterial::embed`], and the
//! material is recovered with [`KeyMaterial::from_embedded`] when a handle is
//! resolved or a key is exported.

use std::fmt;

use zeroize::Zeroize;

use crate::{
    codec::wire::{self, Reader, WireType},
    error::{KeysetError, Result},
};

/// AES key sizes accepted by the cipher, in bytes.
pub const SUPPORTED_KEY_SIZES: [usize; 3] = [16, 24, 32];

/// Current `AesGcmKey` format version.
pub const KEY_FORMAT_VERSION: u32 = 0;

// AesGcmKey field numbers
const FIELD_VERSION: u32 = 1;
const FIELD_KEY_VALUE: u32 = 3;

/// Symmetric key bytes for AES-GCM.
///
/// The bytes are copied verbatim from the caller. This is NOT a key
/// derivation function: no salt, no stretching.
///
/// Key bytes are zeroized on drop and never appear in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyMaterial {
    key_bytes: Vec<u8>,
    format_version: u32,
}

impl KeyMaterial {
    /// Copy `secret` into a new key.
    ///
    /// # Errors
    ///
    /// - `InvalidKeyLength`: `secret` is not 16, 24 or 32 bytes
    pub fn derive_from_secret(secret: &[u8]) -> Result<Self> {
        validate_key_size(secret.len())?;
        Ok(Self { key_bytes: secret.to_vec(), format_version: KEY_FORMAT_VERSION })
    }

    /// The exact bytes this key was constructed from.
    pub fn raw_bytes(&self) -> &[u8] {
        &self.key_bytes
    }

    /// Format version tag (always [`KEY_FORMAT_VERSION`]).
    pub fn format_version(&self) -> u32 {
        self.format_version
    }

    /// Key size in bytes.
    pub fn len(&self) -> usize {
        self.key_bytes.len()
    }

    /// Always false: construction rejects empty keys.
    pub fn is_empty(&self) -> bool {
        self.key_bytes.is_empty()
    }

    /// Serialize into the opaque blob stored in a keyset entry.
    ///
    /// Layout is the protobuf `AesGcmKey` message: `version` (field 1,
    /// omitted when zero) then `key_value` (field 3).
    pub fn embed(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.key_bytes.len() + 4);
        wire::put_uint_field(&mut buf, FIELD_VERSION, u64::from(self.format_version));
        wire::put_bytes_field(&mut buf, FIELD_KEY_VALUE, &self.key_bytes);
        buf
    }

    /// Parse the opaque blob stored in a keyset entry.
    ///
    /// # Errors
    ///
    /// - `MalformedKeyset`: structural error or unsupported format version
    /// - `InvalidKeyLength`: the embedded key is not a supported size
    pub fn from_embedded(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(bytes, "AesGcmKey");
        let mut version = None;
        let mut key_value: Option<&[u8]> = None;

        while !reader.is_empty() {
            match reader.read_tag()? {
                (FIELD_VERSION, WireType::Varint) => {
                    let value = reader.read_u32()?;
                    wire::set_once(&mut version, value, &reader, "version")?;
                },
                (FIELD_KEY_VALUE, WireType::LengthDelimited) => {
                    let value = reader.read_bytes()?;
                    wire::set_once(&mut key_value, value, &reader, "key_value")?;
                },
                (field, wire_type) => return Err(reader.unexpected_field(field, wire_type)),
            }
        }

        let format_version = version.unwrap_or(0);
        if format_version != KEY_FORMAT_VERSION {
            return Err(KeysetError::malformed(format!(
                "AesGcmKey: unsupported version {format_version}"
            )));
        }

        let key_value = key_value.unwrap_or_default();
        validate_key_size(key_value.len())?;

        Ok(Self { key_bytes: key_value.to_vec(), format_version })
    }
}

impl Drop for KeyMaterial {
    fn drop(&mut self) {
        self.key_bytes.zeroize();
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("len", &self.key_bytes.len())
            .field("format_version", &self.format_version)
            .finish_non_exhaustive()
    }
}

fn validate_key_size(len: usize) -> Result<()> {
    if SUPPORTED_KEY_SIZES.contains(&len) {
        Ok(())
    } else {
        Err(KeysetError::InvalidKeyLength { actual: len })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8; 32] = b"change this password to a secret";

    #[test]
    fn derive_copies_bytes_verbatim() {
        let material = KeyMaterial::derive_from_secret(SECRET).unwrap();
        assert_eq!(material.raw_bytes(), SECRET);
        assert_eq!(material.format_version(), 0);
        assert_eq!(material.len(), 32);
    }

    #[test]
    fn derive_accepts_all_aes_sizes() {
        for size in SUPPORTED_KEY_SIZES {
            let secret = vec![0x5A; size];
            assert_eq!(KeyMaterial::derive_from_secret(&secret).unwrap().len(), size);
        }
    }

    #[test]
    fn derive_rejects_other_sizes() {
        for size in [0, 1, 15, 17, 23, 25, 31, 33, 64] {
            let secret = vec![0u8; size];
            assert_eq!(
                KeyMaterial::derive_from_secret(&secret),
                Err(KeysetError::InvalidKeyLength { actual: size })
            );
        }
    }

    #[test]
    fn embed_matches_tink_layout() {
        let material = KeyMaterial::derive_from_secret(SECRET).unwrap();
        let embedded = material.embed();

        // key_value tag (field 3, length-delimited) then length 32; version 0 omitted
        assert_eq!(&embedded[..2], &[0x1A, 0x20]);
        assert_eq!(&embedded[2..], SECRET);
    }

    #[test]
    fn embedded_roundtrip() {
        let material = KeyMaterial::derive_from_secret(&[7u8; 16]).unwrap();
        let recovered = KeyMaterial::from_embedded(&material.embed()).unwrap();
        assert_eq!(recovered, material);
    }

    #[test]
    fn explicit_zero_version_is_accepted() {
        let mut blob = vec![0x08, 0x00];
        blob.extend_from_slice(&KeyMaterial::derive_from_secret(SECRET).unwrap().embed());
        assert!(KeyMaterial::from_embedded(&blob).is_ok());
    }

    #[test]
    fn nonzero_version_is_rejected() {
        let mut blob = vec![0x08, 0x01];
        blob.extend_from_slice(&KeyMaterial::derive_from_secret(SECRET).unwrap().embed());
        assert!(matches!(
            KeyMaterial::from_embedded(&blob),
            Err(KeysetError::MalformedKeyset { reason }) if reason.contains("version")
        ));
    }

    #[test]
    fn missing_key_value_is_invalid_length() {
        assert_eq!(KeyMaterial::from_embedded(&[]), Err(KeysetError::InvalidKeyLength {
            actual: 0
        }));
    }

    #[test]
    fn duplicate_key_value_is_rejected() {
        let single = KeyMaterial::derive_from_secret(&[1u8; 16]).unwrap().embed();
        let doubled = [single.clone(), single].concat();
        assert!(matches!(
            KeyMaterial::from_embedded(&doubled),
            Err(KeysetError::MalformedKeyset { .. })
        ));
    }

    #[test]
    fn debug_redacts_key_bytes() {
        let material = KeyMaterial::derive_from_secret(SECRET).unwrap();
        let debug = format!("{material:?}");
        assert!(!debug.contains("change"));
        assert!(debug.contains("len: 32"));
    }
}
