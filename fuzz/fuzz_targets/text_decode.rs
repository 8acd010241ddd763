//! Fuzz target for the JSON keyset decoder
//!
//! The decoder should NEVER panic, and any document it accepts must
//! round-trip through the pretty rendering.

#![no_main]

use keyseal_core::Keyset;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else { return };
    let Ok(keyset) = Keyset::from_json(text) else { return };

    assert_eq!(Keyset::from_json(&keyset.to_json_pretty()).ok().as_ref(), Some(&keyset));
});
