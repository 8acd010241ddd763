//! Keyseal Core
//!
//! Cleartext AEAD keysets. A keyset is a list of key entries plus the id of
//! the primary entry. It can be stored as one opaque binary blob, rendered as
//! JSON for inspection, and resolved into an AES-GCM cipher.
//!
//! Both encodings follow the Tink cleartext keyset layout, so blobs and
//! ciphertexts produced here interoperate with other Tink AES-GCM consumers.
//!
//! # Key Flow
//!
//! ```text
//! secret bytes
//!        │
//!        ▼
//! KeyMaterial (16, 24 or 32 bytes)
//!        │  embed
//!        ▼
//! KeyEntry (key_id, status, output prefix, type URL)
//!        │
//!        ▼
//! Keyset ◄──► binary blob / JSON document
//!        │
//!        ├─ KeysetHandle::resolve → Aead (encrypt / decrypt)
//!        │
//!        └─ export::extract_raw_key → secret bytes
//! ```
//!
//! # Security
//!
//! - Cleartext: keysets are not wrapped by a key encryption key. Whoever
//!   holds the blob holds the key.
//! - No derivation: the secret is used verbatim as the AES key. It must
//!   already be uniformly random.
//! - Key bytes are zeroized on drop and never appear in `Debug` output or
//!   logs. Only the [`export`] module hands them back to callers.
//! - Every encryption draws a fresh 96-bit nonce from the OS RNG.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod aead;
pub mod codec;
pub mod env;
pub mod error;
pub mod export;
pub mod handle;
pub mod keyset;
pub mod material;

pub use aead::{Aead, AesGcm, MIN_CIPHERTEXT_SIZE, NONCE_SIZE, TAG_SIZE};
pub use env::{Entropy, OsEntropy};
pub use error::{KeysetError, Result};
pub use handle::KeysetHandle;
pub use keyset::{
    AES_GCM_TYPE_URL, ImportConfig, KeyEntry, KeyMaterialType, KeyStatus, Keyset, OutputPrefixType,
};
pub use material::{KeyMaterial, SUPPORTED_KEY_SIZES};
