//! Fuzz target for the binary keyset decoder
//!
//! Feeds arbitrary bytes to the protobuf decoder to find:
//! - Panics on truncated or overlong varints
//! - Length prefixes that read past the buffer
//! - Inputs that decode but do not re-encode to an equal keyset
//!
//! The decoder should NEVER panic. All invalid inputs should return an error.

#![no_main]

use keyseal_core::{Keyset, codec};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(keyset) = Keyset::from_binary(data) else { return };

    // Anything that decodes must survive both encodings unchanged
    let reencoded = keyset.to_binary();
    assert_eq!(Keyset::from_binary(&reencoded).ok().as_ref(), Some(&keyset));
    assert_eq!(codec::text_to_binary(&keyset.to_json()).ok(), Some(reencoded));
});
