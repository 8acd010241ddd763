//! Runtime handle that turns a keyset's primary entry into an AEAD.
//!
//! Resolution is the only path by which embedded key bytes become an active
//! cipher. The handle keeps the cipher, never the bytes, and offers no way to
//! read them back; raw key access lives in [`crate::export`].
//!
//! # Ciphertext framing
//!
//! ```text
//! Tink prefix:  0x01 || key_id (4 bytes BE) || nonce (12) || ciphertext || tag (16)
//! Raw prefix:                                  nonce (12) || ciphertext || tag (16)
//! ```

use std::fmt;

use crate::{
    aead::{Aead, AesGcm},
    env::{Entropy, OsEntropy},
    error::{KeysetError, Result},
    keyset::{KeyStatus, Keyset, OutputPrefixType},
    material::KeyMaterial,
};

/// AEAD bound to the primary entry of a keyset.
pub struct KeysetHandle {
    primary_key_id: u32,
    output_prefix: OutputPrefixType,
    prefix: Vec<u8>,
    cipher: AesGcm,
}

impl KeysetHandle {
    /// Resolve the primary entry of `keyset` into a usable AEAD.
    ///
    /// # Errors
    ///
    /// - `PrimaryKeyNotFound`: no entry has the primary id, or the primary
    ///   entry is not enabled
    /// - `UnsupportedPrimitiveType`: the primary is not AES-GCM material
    /// - `MalformedKeyset` / `InvalidKeyLength`: the embedded material is
    ///   corrupt
    pub fn resolve(keyset: &Keyset) -> Result<Self> {
        let primary = keyset.find_primary()?;

        if primary.status != KeyStatus::Enabled {
            tracing::debug!(
                key_id = primary.key_id,
                status = ?primary.status,
                "primary key is not enabled"
            );
            return Err(KeysetError::PrimaryKeyNotFound { primary_key_id: primary.key_id });
        }

        if !primary.is_aes_gcm() {
            return Err(KeysetError::UnsupportedPrimitiveType {
                type_url: primary.type_url.clone(),
            });
        }

        // Material is zeroized when it goes out of scope at the end of this call
        let material = KeyMaterial::from_embedded(&primary.value)?;
        let cipher = AesGcm::new(&material)?;

        tracing::debug!(
            key_id = primary.key_id,
            output_prefix = ?primary.output_prefix,
            key_size = cipher.key_size(),
            "resolved keyset primary"
        );

        Ok(Self {
            primary_key_id: primary.key_id,
            output_prefix: primary.output_prefix,
            prefix: primary.output_prefix_bytes(),
            cipher,
        })
    }

    /// Id of the entry this handle encrypts with.
    pub fn primary_key_id(&self) -> u32 {
        self.primary_key_id
    }

    /// Prefix mode applied to ciphertexts.
    pub fn output_prefix(&self) -> OutputPrefixType {
        self.output_prefix
    }

    /// Encrypt with nonce bytes drawn from `entropy`.
    ///
    /// # Errors
    ///
    /// - `EncryptionFailure`: `entropy` failed
    pub fn encrypt_with(
        &self,
        entropy: &impl Entropy,
        plaintext: &[u8],
        associated_data: &[u8],
    ) -> Result<Vec<u8>> {
        let sealed = self.cipher.encrypt_with(entropy, plaintext, associated_data)?;
        if self.prefix.is_empty() {
            return Ok(sealed);
        }

        let mut ciphertext = Vec::with_capacity(self.prefix.len() + sealed.len());
        ciphertext.extend_from_slice(&self.prefix);
        ciphertext.extend_from_slice(&sealed);
        Ok(ciphertext)
    }
}

impl TryFrom<&Keyset> for KeysetHandle {
    type Error = KeysetError;

    fn try_from(keyset: &Keyset) -> Result<Self> {
        Self::resolve(keyset)
    }
}

impl Aead for KeysetHandle {
    fn encrypt(&self, plaintext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>> {
        self.encrypt_with(&OsEntropy, plaintext, associated_data)
    }

    fn decrypt(&self, ciphertext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>> {
        let sealed = ciphertext
            .strip_prefix(self.prefix.as_slice())
            .ok_or(KeysetError::AuthenticationFailure)?;
        self.cipher.decrypt(sealed, associated_data)
    }
}

impl fmt::Debug for KeysetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeysetHandle")
            .field("primary_key_id", &self.primary_key_id)
            .field("output_prefix", &self.output_prefix)
            .field("cipher", &self.cipher)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        aead::{MIN_CIPHERTEXT_SIZE, NONCE_SIZE},
        keyset::{ImportConfig, KeyEntry},
    };

    const SECRET: &[u8; 32] = b"change this password to a secret";

    fn keyset_with(key_id: u32, output_prefix: OutputPrefixType) -> Keyset {
        let config = ImportConfig { key_id: Some(key_id), output_prefix };
        Keyset::from_secret_with(SECRET, &config, &OsEntropy).unwrap()
    }

    fn rebuild(keyset: &Keyset, edit: impl FnOnce(&mut KeyEntry)) -> Keyset {
        let mut entry = keyset.entries()[0].clone();
        edit(&mut entry);
        Keyset::new(keyset.primary_key_id(), vec![entry]).unwrap()
    }

    #[test]
    fn tink_prefix_is_prepended() {
        let keyset = keyset_with(0x9ACB_0442, OutputPrefixType::Tink);
        let handle = KeysetHandle::resolve(&keyset).unwrap();
        let ciphertext = handle.encrypt(b"Greed", b"").unwrap();

        assert_eq!(&ciphertext[..5], &[0x01, 0x9A, 0xCB, 0x04, 0x42]);
        assert_eq!(ciphertext.len(), 5 + b"Greed".len() + MIN_CIPHERTEXT_SIZE);
        assert_eq!(handle.decrypt(&ciphertext, b"").unwrap(), b"Greed");
    }

    #[test]
    fn raw_prefix_is_bare_aes_gcm() {
        let handle = KeysetHandle::resolve(&keyset_with(1, OutputPrefixType::Raw)).unwrap();
        let ciphertext = handle.encrypt(b"Greed", b"").unwrap();

        assert_eq!(ciphertext.len(), b"Greed".len() + MIN_CIPHERTEXT_SIZE);

        // A bare cipher over the same key accepts it directly
        let material = KeyMaterial::derive_from_secret(SECRET).unwrap();
        let cipher = AesGcm::new(&material).unwrap();
        assert_eq!(cipher.decrypt(&ciphertext, b"").unwrap(), b"Greed");
    }

    #[test]
    fn wrong_prefix_fails_authentication() {
        let handle = KeysetHandle::resolve(&keyset_with(7, OutputPrefixType::Tink)).unwrap();
        let other = KeysetHandle::resolve(&keyset_with(8, OutputPrefixType::Tink)).unwrap();
        let ciphertext = other.encrypt(b"data", b"").unwrap();

        assert_eq!(handle.decrypt(&ciphertext, b""), Err(KeysetError::AuthenticationFailure));
    }

    #[test]
    fn short_input_fails_authentication() {
        let handle = KeysetHandle::resolve(&keyset_with(7, OutputPrefixType::Tink)).unwrap();
        assert_eq!(handle.decrypt(&[0x01], b""), Err(KeysetError::AuthenticationFailure));
        assert_eq!(
            handle.decrypt(&[0x01, 0, 0, 0, 7, 0, 0], b""),
            Err(KeysetError::AuthenticationFailure)
        );
    }

    #[test]
    fn missing_primary_is_reported() {
        let keyset = keyset_with(5, OutputPrefixType::Tink);
        let orphaned = Keyset::new(6, keyset.entries().to_vec()).unwrap();

        assert_eq!(
            KeysetHandle::resolve(&orphaned).unwrap_err(),
            KeysetError::PrimaryKeyNotFound { primary_key_id: 6 }
        );
    }

    #[test]
    fn disabled_primary_is_not_usable() {
        let keyset = rebuild(&keyset_with(5, OutputPrefixType::Tink), |entry| {
            entry.status = KeyStatus::Disabled;
        });

        assert_eq!(
            KeysetHandle::resolve(&keyset).unwrap_err(),
            KeysetError::PrimaryKeyNotFound { primary_key_id: 5 }
        );
    }

    #[test]
    fn unsupported_type_is_rejected() {
        let keyset = rebuild(&keyset_with(5, OutputPrefixType::Tink), |entry| {
            entry.type_url = "type.googleapis.com/google.crypto.tink.HmacKey".to_string();
        });

        assert!(matches!(
            KeysetHandle::resolve(&keyset),
            Err(KeysetError::UnsupportedPrimitiveType { type_url }) if type_url.ends_with("HmacKey")
        ));
    }

    #[test]
    fn corrupt_material_is_rejected() {
        let keyset = rebuild(&keyset_with(5, OutputPrefixType::Tink), |entry| {
            entry.value.truncate(10);
        });

        assert!(matches!(
            KeysetHandle::resolve(&keyset),
            Err(KeysetError::MalformedKeyset { .. })
        ));
    }

    #[test]
    fn nonce_follows_prefix() {
        struct Fixed;
        impl Entropy for Fixed {
            fn fill(&self, buffer: &mut [u8]) -> Result<()> {
                buffer.fill(0x42);
                Ok(())
            }
        }

        let handle = KeysetHandle::resolve(&keyset_with(3, OutputPrefixType::Tink)).unwrap();
        let ciphertext = handle.encrypt_with(&Fixed, b"x", b"").unwrap();
        assert_eq!(&ciphertext[5..5 + NONCE_SIZE], &[0x42; NONCE_SIZE]);
    }

    #[test]
    fn handle_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<KeysetHandle>();
        assert_send_sync::<Keyset>();
        assert_send_sync::<KeyMaterial>();
    }

    #[test]
    fn debug_does_not_expose_key() {
        let handle = KeysetHandle::resolve(&keyset_with(3, OutputPrefixType::Raw)).unwrap();
        let debug = format!("{handle:?}");
        assert!(debug.contains("primary_key_id: 3"));
        assert!(!debug.contains("change"));
    }
}
