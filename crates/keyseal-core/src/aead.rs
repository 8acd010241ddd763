//! AEAD primitive using AES-GCM
//!
//! Ciphertext layout: `nonce (12 bytes) || ciphertext || tag (16 bytes)`.
//! The nonce is drawn fresh for every call and travels with the ciphertext,
//! so no state is kept between calls.

use std::fmt;

use aes::Aes192;
use aes_gcm::{
    Aes128Gcm, Aes256Gcm, AesGcm as AesGcmCipher, KeyInit,
    aead::{Aead as _, Payload, consts::U12, generic_array::GenericArray},
};

use crate::{
    env::{Entropy, OsEntropy},
    error::{KeysetError, Result},
    material::KeyMaterial,
};

/// Size of the random nonce prepended to every ciphertext (96 bits)
pub const NONCE_SIZE: usize = 12;

/// GCM authentication tag size (16 bytes)
pub const TAG_SIZE: usize = 16;

/// Shortest ciphertext `decrypt` will consider: empty plaintext.
pub const MIN_CIPHERTEXT_SIZE: usize = NONCE_SIZE + TAG_SIZE;

type Aes192Gcm = AesGcmCipher<Aes192, U12>;

/// Authenticated encryption with associated data.
///
/// `associated_data` is authenticated but not encrypted, and is not carried
/// in the ciphertext: decryption must be given the same value.
pub trait Aead {
    /// Encrypt `plaintext`, binding it to `associated_data`.
    ///
    /// # Errors
    ///
    /// - `EncryptionFailure`: the randomness source failed
    fn encrypt(&self, plaintext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>>;

    /// Decrypt and verify `ciphertext` against `associated_data`.
    ///
    /// # Errors
    ///
    /// - `AuthenticationFailure`: wrong key, tampered input, mismatched
    ///   associated data, or input too short
    fn decrypt(&self, ciphertext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>>;
}

enum Cipher {
    Aes128(Aes128Gcm),
    Aes192(Aes192Gcm),
    Aes256(Aes256Gcm),
}

/// AES-GCM bound to one key. Key size selects AES-128, AES-192 or AES-256.
pub struct AesGcm {
    cipher: Cipher,
}

impl AesGcm {
    /// Build a cipher for `material`.
    ///
    /// # Errors
    ///
    /// - `InvalidKeyLength`: unreachable for material built through
    ///   [`KeyMaterial`], kept so the cipher validates on its own
    pub fn new(material: &KeyMaterial) -> Result<Self> {
        let key = material.raw_bytes();
        let invalid = |_| KeysetError::InvalidKeyLength { actual: key.len() };

        let cipher = match key.len() {
            16 => Cipher::Aes128(Aes128Gcm::new_from_slice(key).map_err(invalid)?),
            24 => Cipher::Aes192(Aes192Gcm::new_from_slice(key).map_err(invalid)?),
            32 => Cipher::Aes256(Aes256Gcm::new_from_slice(key).map_err(invalid)?),
            actual => return Err(KeysetError::InvalidKeyLength { actual }),
        };

        Ok(Self { cipher })
    }

    /// Key size in bytes.
    pub fn key_size(&self) -> usize {
        match self.cipher {
            Cipher::Aes128(_) => 16,
            Cipher::Aes192(_) => 24,
            Cipher::Aes256(_) => 32,
        }
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
        let mut nonce = [0u8; NONCE_SIZE];
        entropy.fill(&mut nonce)?;

        let sealed = self
            .seal(&nonce, Payload { msg: plaintext, aad: associated_data })
            .map_err(|_| KeysetError::EncryptionFailure {
                reason: "plaintext exceeds AES-GCM limits".to_string(),
            })?;

        let mut ciphertext = Vec::with_capacity(NONCE_SIZE + sealed.len());
        ciphertext.extend_from_slice(&nonce);
        ciphertext.extend_from_slice(&sealed);

        debug_assert_eq!(ciphertext.len(), plaintext.len() + MIN_CIPHERTEXT_SIZE);
        Ok(ciphertext)
    }

    fn seal(
        &self,
        nonce: &[u8; NONCE_SIZE],
        payload: Payload<'_, '_>,
    ) -> std::result::Result<Vec<u8>, aes_gcm::Error> {
        let nonce = GenericArray::from_slice(nonce);
        match &self.cipher {
            Cipher::Aes128(cipher) => cipher.encrypt(nonce, payload),
            Cipher::Aes192(cipher) => cipher.encrypt(nonce, payload),
            Cipher::Aes256(cipher) => cipher.encrypt(nonce, payload),
        }
    }

    fn open(
        &self,
        nonce: &[u8],
        payload: Payload<'_, '_>,
    ) -> std::result::Result<Vec<u8>, aes_gcm::Error> {
        let nonce = GenericArray::from_slice(nonce);
        match &self.cipher {
            Cipher::Aes128(cipher) => cipher.decrypt(nonce, payload),
            Cipher::Aes192(cipher) => cipher.decrypt(nonce, payload),
            Cipher::Aes256(cipher) => cipher.decrypt(nonce, payload),
        }
    }
}

impl Aead for AesGcm {
    fn encrypt(&self, plaintext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>> {
        self.encrypt_with(&OsEntropy, plaintext, associated_data)
    }

    fn decrypt(&self, ciphertext: &[u8], associated_data: &[u8]) -> Result<Vec<u8>> {
        if ciphertext.len() < MIN_CIPHERTEXT_SIZE {
            return Err(KeysetError::AuthenticationFailure);
        }

        let (nonce, sealed) = ciphertext.split_at(NONCE_SIZE);
        self.open(nonce, Payload { msg: sealed, aad: associated_data })
            .map_err(|_| KeysetError::AuthenticationFailure)
    }
}

impl fmt::Debug for AesGcm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AesGcm").field("key_size", &self.key_size()).finish_non_exhaustive()
    }
}
