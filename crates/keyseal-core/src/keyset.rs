//! Keyset data model.
//!
//! A [`Keyset`] is an ordered list of [`KeyEntry`] slots plus the id of the
//! primary slot. Entries carry their key material as an opaque embedded blob
//! tagged with a type URL; only the handle and the export module look inside.
//!
//! # Invariants
//!
//! - Non-empty: a keyset always has at least one entry
//! - Unique ids: no two entries share a `key_id`
//! - Order: insertion order is preserved by every encoder, so encoding is
//!   deterministic. Lookups are by `key_id`, never by position.
//!
//! The primary id is checked when the keyset is used, not when it is built
//! (see [`Keyset::find_primary`]), so a hand-edited keyset can still be
//! decoded and inspected.

use std::{collections::HashSet, fmt};

use serde::{Deserialize, Serialize};

use crate::{
    env::{Entropy, OsEntropy},
    error::{KeysetError, Result},
    material::KeyMaterial,
};

/// Type URL of AES-GCM key material, the only supported primitive family.
pub const AES_GCM_TYPE_URL: &str = "type.googleapis.com/google.crypto.tink.AesGcmKey";

/// Lifecycle status of a key entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KeyStatus {
    /// Usable for encryption and decryption
    Enabled,
    /// Present but not usable
    Disabled,
    /// Key material has been destroyed
    Destroyed,
}

impl KeyStatus {
    /// Protobuf enum value.
    pub fn to_proto(self) -> i32 {
        match self {
            Self::Enabled => 1,
            Self::Disabled => 2,
            Self::Destroyed => 3,
        }
    }

    /// Parse a protobuf enum value. `None` if unrecognized (including 0).
    pub fn from_proto(value: i32) -> Option<Self> {
        match value {
            1 => Some(Self::Enabled),
            2 => Some(Self::Disabled),
            3 => Some(Self::Destroyed),
            _ => None,
        }
    }
}

/// Whether ciphertexts carry a prefix identifying the key that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutputPrefixType {
    /// 5-byte prefix: `0x01 || key_id (big-endian)`
    #[default]
    Tink,
    /// No prefix
    Raw,
}

impl OutputPrefixType {
    /// Leading byte of a `Tink` prefix.
    pub const TINK_START_BYTE: u8 = 0x01;

    /// Length of a `Tink` prefix.
    pub const TINK_PREFIX_SIZE: usize = 5;

    /// Protobuf enum value.
    pub fn to_proto(self) -> i32 {
        match self {
            Self::Tink => 1,
            Self::Raw => 3,
        }
    }

    /// Parse a protobuf enum value. `None` if unrecognized.
    pub fn from_proto(value: i32) -> Option<Self> {
        match value {
            1 => Some(Self::Tink),
            3 => Some(Self::Raw),
            _ => None,
        }
    }

    /// Ciphertext prefix for `key_id` under this mode.
    pub fn prefix(self, key_id: u32) -> Vec<u8> {
        match self {
            Self::Tink => {
                let mut prefix = Vec::with_capacity(Self::TINK_PREFIX_SIZE);
                prefix.push(Self::TINK_START_BYTE);
                prefix.extend_from_slice(&key_id.to_be_bytes());
                prefix
            },
            Self::Raw => Vec::new(),
        }
    }
}

/// Kind of key material held by an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KeyMaterialType {
    /// Secret symmetric key
    Symmetric,
    /// Private half of a key pair
    AsymmetricPrivate,
    /// Public half of a key pair
    AsymmetricPublic,
    /// Key held by a remote key management system
    Remote,
}

impl KeyMaterialType {
    /// Protobuf enum value.
    pub fn to_proto(self) -> i32 {
        match self {
            Self::Symmetric => 1,
            Self::AsymmetricPrivate => 2,
            Self::AsymmetricPublic => 3,
            Self::Remote => 4,
        }
    }

    /// Parse a protobuf enum value. `None` if unrecognized (including 0).
    pub fn from_proto(value: i32) -> Option<Self> {
        match value {
            1 => Some(Self::Symmetric),
            2 => Some(Self::AsymmetricPrivate),
            3 => Some(Self::AsymmetricPublic),
            4 => Some(Self::Remote),
            _ => None,
        }
    }
}

/// One addressable slot in a keyset.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyEntry {
    /// Identifier, unique within the owning keyset
    pub key_id: u32,
    /// Lifecycle status
    pub status: KeyStatus,
    /// Ciphertext prefix mode
    pub output_prefix: OutputPrefixType,
    /// Type tag naming how to interpret `value`
    pub type_url: String,
    /// Kind of key material in `value`
    pub key_material_type: KeyMaterialType,
    /// Embedded, serialized key material (opaque to the keyset)
    pub value: Vec<u8>,
}

impl KeyEntry {
    /// An enabled, symmetric AES-GCM entry embedding `material`.
    pub fn aes_gcm(key_id: u32, material: &KeyMaterial, output_prefix: OutputPrefixType) -> Self {
        Self {
            key_id,
            status: KeyStatus::Enabled,
            output_prefix,
            type_url: AES_GCM_TYPE_URL.to_string(),
            key_material_type: KeyMaterialType::Symmetric,
            value: material.embed(),
        }
    }

    /// True if this entry holds AES-GCM material.
    pub fn is_aes_gcm(&self) -> bool {
        self.type_url == AES_GCM_TYPE_URL
    }

    /// Ciphertext prefix this entry produces.
    pub fn output_prefix_bytes(&self) -> Vec<u8> {
        self.output_prefix.prefix(self.key_id)
    }
}

impl fmt::Debug for KeyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyEntry")
            .field("key_id", &self.key_id)
            .field("status", &self.status)
            .field("output_prefix", &self.output_prefix)
            .field("type_url", &self.type_url)
            .field("key_material_type", &self.key_material_type)
            .field("value", &format_args!("<{} bytes>", self.value.len()))
            .finish()
    }
}

/// Options for building a keyset from a secret.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportConfig {
    /// Fixed key id. `None` draws one uniformly at random.
    ///
    /// A fixed id reproduces a keyset whose prefixed ciphertexts were
    /// produced elsewhere.
    pub key_id: Option<u32>,
    /// Ciphertext prefix mode of the new entry
    pub output_prefix: OutputPrefixType,
}

/// Ordered collection of key entries with one designated primary.
///
/// Two keysets are equal when they share a primary id and hold the same
/// entries. Entry order does not affect equality.
#[derive(Debug, Clone)]
pub struct Keyset {
    primary_key_id: u32,
    entries: Vec<KeyEntry>,
}

impl Keyset {
    /// Assemble a keyset from decoded or hand-built parts.
    ///
    /// # Errors
    ///
    /// - `MalformedKeyset`: `entries` is empty or two entries share a key id
    pub fn new(primary_key_id: u32, entries: Vec<KeyEntry>) -> Result<Self> {
        if entries.is_empty() {
            return Err(KeysetError::malformed("keyset has no keys"));
        }

        let mut seen = HashSet::with_capacity(entries.len());
        if let Some(duplicate) = entries.iter().find(|entry| !seen.insert(entry.key_id)) {
            return Err(KeysetError::malformed(format!("duplicate key id {}", duplicate.key_id)));
        }

        Ok(Self { primary_key_id, entries })
    }

    /// Build a single-entry keyset from a raw secret with a random key id.
    ///
    /// The secret is copied verbatim into the key (see
    /// [`KeyMaterial::derive_from_secret`]). The entry is enabled, uses the
    /// `Tink` output prefix and is the primary.
    ///
    /// # Errors
    ///
    /// - `InvalidKeyLength`: `secret` is not 16, 24 or 32 bytes
    /// - `EncryptionFailure`: the OS RNG failed while drawing the key id
    pub fn from_secret(secret: &[u8]) -> Result<Self> {
        Self::from_secret_with(secret, &ImportConfig::default(), &OsEntropy)
    }

    /// Build a single-entry keyset from a raw secret with explicit options
    /// and randomness source.
    ///
    /// # Errors
    ///
    /// - `InvalidKeyLength`: `secret` is not 16, 24 or 32 bytes
    /// - `EncryptionFailure`: `entropy` failed while drawing the key id
    pub fn from_secret_with(
        secret: &[u8],
        config: &ImportConfig,
        entropy: &impl Entropy,
    ) -> Result<Self> {
        let material = KeyMaterial::derive_from_secret(secret)?;
        let key_id = match config.key_id {
            Some(key_id) => key_id,
            None => entropy.random_u32()?,
        };

        tracing::debug!(key_id, key_size = material.len(), "built keyset from secret");

        let entry = KeyEntry::aes_gcm(key_id, &material, config.output_prefix);
        Ok(Self { primary_key_id: key_id, entries: vec![entry] })
    }

    /// Id of the primary entry.
    pub fn primary_key_id(&self) -> u32 {
        self.primary_key_id
    }

    /// All entries, in insertion order.
    pub fn entries(&self) -> &[KeyEntry] {
        &self.entries
    }

    /// Entry with the given id.
    pub fn get(&self, key_id: u32) -> Option<&KeyEntry> {
        self.entries.iter().find(|entry| entry.key_id == key_id)
    }

    /// The entry named by `primary_key_id`.
    ///
    /// # Errors
    ///
    /// - `PrimaryKeyNotFound`: no entry has the primary id, which means the
    ///   keyset was corrupted or edited by hand
    pub fn find_primary(&self) -> Result<&KeyEntry> {
        self.get(self.primary_key_id)
            .ok_or(KeysetError::PrimaryKeyNotFound { primary_key_id: self.primary_key_id })
    }
}

impl PartialEq for Keyset {
    fn eq(&self, other: &Self) -> bool {
        // Ids are unique, so equal length plus a match per id is multiset equality
        self.primary_key_id == other.primary_key_id
            && self.entries.len() == other.entries.len()
            && self.entries.iter().all(|entry| other.get(entry.key_id) == Some(entry))
    }
}

impl Eq for Keyset {}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8; 32] = b"change this password to a secret";

    struct FixedEntropy([u8; 4]);

    impl Entropy for FixedEntropy {
        fn fill(&self, buffer: &mut [u8]) -> Result<()> {
            buffer.copy_from_slice(&self.0[..buffer.len()]);
            Ok(())
        }
    }

    fn entry(key_id: u32) -> KeyEntry {
        let material = KeyMaterial::derive_from_secret(&[key_id as u8; 16]).unwrap();
        KeyEntry::aes_gcm(key_id, &material, OutputPrefixType::Tink)
    }

    #[test]
    fn from_secret_builds_single_primary_entry() {
        let keyset = Keyset::from_secret(SECRET).unwrap();

        assert_eq!(keyset.entries().len(), 1);
        let primary = keyset.find_primary().unwrap();
        assert_eq!(primary.key_id, keyset.primary_key_id());
        assert_eq!(primary.status, KeyStatus::Enabled);
        assert_eq!(primary.output_prefix, OutputPrefixType::Tink);
        assert_eq!(primary.key_material_type, KeyMaterialType::Symmetric);
        assert!(primary.is_aes_gcm());
    }

    #[test]
    fn from_secret_draws_key_id_from_entropy() {
        let keyset = Keyset::from_secret_with(
            SECRET,
            &ImportConfig::default(),
            &FixedEntropy([0x9A, 0xCB, 0x04, 0x42]),
        )
        .unwrap();

        assert_eq!(keyset.primary_key_id(), 2_596_996_162);
    }

    #[test]
    fn from_secret_honours_fixed_key_id() {
        let config = ImportConfig { key_id: Some(7), output_prefix: OutputPrefixType::Raw };
        let keyset = Keyset::from_secret_with(SECRET, &config, &FixedEntropy([0xFF; 4])).unwrap();

        assert_eq!(keyset.primary_key_id(), 7);
        assert_eq!(keyset.find_primary().unwrap().output_prefix, OutputPrefixType::Raw);
    }

    #[test]
    fn from_secret_rejects_bad_length() {
        assert_eq!(Keyset::from_secret(b"too short"), Err(KeysetError::InvalidKeyLength {
            actual: 9
        }));
    }

    #[test]
    fn new_rejects_empty() {
        assert!(matches!(Keyset::new(1, Vec::new()), Err(KeysetError::MalformedKeyset { .. })));
    }

    #[test]
    fn new_rejects_duplicate_ids() {
        let result = Keyset::new(1, vec![entry(1), entry(2), entry(1)]);
        assert!(matches!(
            result,
            Err(KeysetError::MalformedKeyset { reason }) if reason.contains("duplicate key id 1")
        ));
    }

    #[test]
    fn find_primary_is_by_id_not_position() {
        let keyset = Keyset::new(3, vec![entry(1), entry(2), entry(3)]).unwrap();
        assert_eq!(keyset.find_primary().unwrap().key_id, 3);
    }

    #[test]
    fn missing_primary_is_reported() {
        let keyset = Keyset::new(99, vec![entry(1)]).unwrap();
        assert_eq!(keyset.find_primary(), Err(KeysetError::PrimaryKeyNotFound {
            primary_key_id: 99
        }));
    }

    #[test]
    fn equality_ignores_entry_order() {
        let forward = Keyset::new(2, vec![entry(1), entry(2)]).unwrap();
        let reversed = Keyset::new(2, vec![entry(2), entry(1)]).unwrap();
        assert_eq!(forward, reversed);

        let mut changed = entry(1);
        changed.status = KeyStatus::Disabled;
        assert_ne!(forward, Keyset::new(2, vec![changed, entry(2)]).unwrap());
        assert_ne!(forward, Keyset::new(1, vec![entry(1), entry(2)]).unwrap());
        assert_ne!(forward, Keyset::new(2, vec![entry(2)]).unwrap());
    }

    #[test]
    fn tink_prefix_layout() {
        assert_eq!(OutputPrefixType::Tink.prefix(0x9ACB_0442), [0x01, 0x9A, 0xCB, 0x04, 0x42]);
        assert!(OutputPrefixType::Raw.prefix(0x9ACB_0442).is_empty());
    }

    #[test]
    fn proto_enum_values() {
        for status in [KeyStatus::Enabled, KeyStatus::Disabled, KeyStatus::Destroyed] {
            assert_eq!(KeyStatus::from_proto(status.to_proto()), Some(status));
        }
        assert_eq!(KeyStatus::from_proto(0), None);
        assert_eq!(OutputPrefixType::from_proto(2), None);
        assert_eq!(KeyMaterialType::from_proto(5), None);
    }

    #[test]
    fn debug_redacts_value() {
        let debug = format!("{:?}", Keyset::from_secret(SECRET).unwrap());
        assert!(!debug.contains("change"));
        assert!(debug.contains("<34 bytes>"));
    }
}
