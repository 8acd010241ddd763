//! Raw key extraction.
//!
//! Recovers the secret bytes a keyset was built from, for inspection or
//! migration to another system. Encryption and decryption never need this
//! module: [`crate::KeysetHandle`] builds its cipher without handing bytes
//! back to the caller.
//!
//! Every returned buffer is [`Zeroizing`], so the copy is wiped when the
//! caller drops it.

use zeroize::Zeroizing;

use crate::{
    error::{KeysetError, Result},
    keyset::{KeyEntry, Keyset},
    material::KeyMaterial,
};

/// Raw key bytes of the primary entry.
///
/// Unlike [`crate::KeysetHandle::resolve`], the primary does not have to be
/// enabled.
///
/// # Errors
///
/// - `PrimaryKeyNotFound`: no entry has the primary id
/// - `UnsupportedPrimitiveType`: the primary is not AES-GCM material
/// - `MalformedKeyset` / `InvalidKeyLength`: the embedded material is corrupt
pub fn extract_raw_key(keyset: &Keyset) -> Result<Zeroizing<Vec<u8>>> {
    extract_entry_key(keyset.find_primary()?)
}

/// Raw key bytes of every entry, as `(key_id, bytes)` in keyset order.
///
/// # Errors
///
/// Fails on the first entry that cannot be extracted, see
/// [`extract_entry_key`].
pub fn extract_raw_keys(keyset: &Keyset) -> Result<Vec<(u32, Zeroizing<Vec<u8>>)>> {
    keyset
        .entries()
        .iter()
        .map(|entry| Ok((entry.key_id, extract_entry_key(entry)?)))
        .collect()
}

/// Raw key bytes of a single entry.
///
/// # Errors
///
/// - `UnsupportedPrimitiveType`: the entry is not AES-GCM material
/// - `MalformedKeyset` / `InvalidKeyLength`: the embedded material is corrupt
pub fn extract_entry_key(entry: &KeyEntry) -> Result<Zeroizing<Vec<u8>>> {
    if !entry.is_aes_gcm() {
        return Err(KeysetError::UnsupportedPrimitiveType { type_url: entry.type_url.clone() });
    }

    let material = KeyMaterial::from_embedded(&entry.value)?;
    tracing::debug!(key_id = entry.key_id, key_size = material.len(), "extracted raw key");
    Ok(Zeroizing::new(material.raw_bytes().to_vec()))
}
