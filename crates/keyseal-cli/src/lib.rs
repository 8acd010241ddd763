//! Keyseal command-line tool.
//!
//! # Usage
//!
//! ```text
//! keyseal [OPTIONS] <COMMAND>
//!
//! Commands:
//!   import   Build a keyset from a raw secret
//!   export   Load a keyset, show it, and check an encrypt / decrypt round trip
//!   encrypt  Encrypt a plaintext with a keyset's primary key
//!   decrypt  Decrypt base64 ciphertexts with a keyset's primary key
//!   inspect  Show a keyset in both encodings
//! ```
//!
//! # Examples
//!
//! ```bash
//! # Build a keyset and check it against ciphertexts produced elsewhere
//! KEYSEAL_SECRET="change this password to a secret" \
//!     keyseal import --decrypt AZrLBEKaUq6kFMfPY7XzKcFxvSCJQ31WYqnJEPAzsHPhk6WQ0S4=
//!
//! # Round-trip a stored keyset through its JSON form
//! KEYSEAL_KEYSET="CMKIrNYJEmQK..." keyseal export --plaintext Greed
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod args;
pub mod commands;
pub mod error;
pub mod source;

pub use args::{Args, Command, KeysetSource};
pub use commands::{Report, run};
pub use error::{CliError, CliResult};
