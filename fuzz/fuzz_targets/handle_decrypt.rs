//! Fuzz target for KeysetHandle decryption
//!
//! Arbitrary ciphertexts and associated data against a fixed Tink-prefixed
//! key. Decryption must never panic and must never accept input that the
//! key did not produce.

#![no_main]

use arbitrary::Arbitrary;
use keyseal_core::{Aead, ImportConfig, Keyset, KeysetHandle, OsEntropy, OutputPrefixType};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    raw_prefix: bool,
    ciphertext: Vec<u8>,
    associated_data: Vec<u8>,
}

fuzz_target!(|input: Input| {
    let output_prefix =
        if input.raw_prefix { OutputPrefixType::Raw } else { OutputPrefixType::Tink };
    let config = ImportConfig { key_id: Some(0x9ACB_0442), output_prefix };
    let Ok(keyset) = Keyset::from_secret_with(&[0x42; 32], &config, &OsEntropy) else { return };
    let Ok(handle) = KeysetHandle::resolve(&keyset) else { return };

    assert!(handle.decrypt(&input.ciphertext, &input.associated_data).is_err());
});
