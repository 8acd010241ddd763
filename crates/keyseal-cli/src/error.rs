//! CLI error types.

use std::path::{Path, PathBuf};

use keyseal_core::KeysetError;
use thiserror::Error;

/// Errors reported by `keyseal` subcommands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Keyset construction, decoding or AEAD operation failed
    #[error(transparent)]
    Keyset(#[from] KeysetError),

    /// A command-line value was not valid standard base64
    #[error("invalid base64 in {what}: {source}")]
    Base64 {
        /// Which value failed to decode
        what: &'static str,
        /// Decoder error
        #[source]
        source: base64::DecodeError,
    },

    /// Reading or writing a file failed
    #[error("cannot {action} {}: {source}", .path.display())]
    Io {
        /// `read` or `write`
        action: &'static str,
        /// File involved
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A JSON keyset file was not UTF-8
    #[error("{} is not UTF-8 text", .path.display())]
    NotText {
        /// File involved
        path: PathBuf,
    },

    /// No keyset source was given
    #[error("no keyset given: pass --keyset, --keyset-file or --json-file, or set KEYSEAL_KEYSET")]
    MissingKeyset,

    /// A keyset read back from its own JSON decrypted to something else
    #[error("round trip through JSON changed the plaintext")]
    RoundTripMismatch,
}

impl CliError {
    pub(crate) fn base64(what: &'static str) -> impl FnOnce(base64::DecodeError) -> Self {
        move |source| Self::Base64 { what, source }
    }

    pub(crate) fn io(action: &'static str, path: &Path) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.to_path_buf();
        move |source| Self::Io { action, path, source }
    }
}

/// Result alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;
