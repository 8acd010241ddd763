//! Error types for keyset operations

use thiserror::Error;

/// Errors from keyset construction, encoding and AEAD operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeysetError {
    /// Key material is not a supported AES key size (16, 24 or 32 bytes)
    #[error("invalid key length: {actual} bytes (expected 16, 24 or 32)")]
    InvalidKeyLength {
        /// Length of the rejected key material
        actual: usize,
    },

    /// Binary or textual encoding failed structural or type validation
    #[error("malformed keyset: {reason}")]
    MalformedKeyset {
        /// What the decoder rejected
        reason: String,
    },

    /// The primary key id does not resolve to a usable entry
    #[error("primary key {primary_key_id} not found in keyset")]
    PrimaryKeyNotFound {
        /// The primary id the keyset declares
        primary_key_id: u32,
    },

    /// The entry's type tag is not the supported AEAD family
    #[error("unsupported primitive type: {type_url}")]
    UnsupportedPrimitiveType {
        /// The type tag found on the entry
        type_url: String,
    },

    /// The randomness source failed while producing a nonce or key id
    #[error("encryption failed: {reason}")]
    EncryptionFailure {
        /// Why the randomness source failed
        reason: String,
    },

    /// Tag verification failed or the ciphertext was too short.
    ///
    /// Carries no payload so that no plaintext or tag material can leak.
    #[error("authentication failed")]
    AuthenticationFailure,
}

impl KeysetError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedKeyset { reason: reason.into() }
    }

    /// Returns true if the error was caused by the caller's input data
    /// (secret, encoded keyset or ciphertext) rather than the runtime.
    ///
    /// Input errors will fail again on retry with the same data. Only an
    /// `EncryptionFailure` may succeed on retry.
    pub fn is_input_error(&self) -> bool {
        match self {
            Self::InvalidKeyLength { .. }
            | Self::MalformedKeyset { .. }
            | Self::PrimaryKeyNotFound { .. }
            | Self::UnsupportedPrimitiveType { .. }
            | Self::AuthenticationFailure => true,

            Self::EncryptionFailure { .. } => false,
        }
    }
}

/// Result alias for keyset operations.
pub type Result<T> = std::result::Result<T, KeysetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authentication_failure_is_input_error() {
        assert!(KeysetError::AuthenticationFailure.is_input_error());
    }

    #[test]
    fn encryption_failure_is_not_input_error() {
        let err = KeysetError::EncryptionFailure { reason: "entropy unavailable".to_string() };
        assert!(!err.is_input_error());
    }

    #[test]
    fn error_display() {
        let err = KeysetError::InvalidKeyLength { actual: 7 };
        assert_eq!(err.to_string(), "invalid key length: 7 bytes (expected 16, 24 or 32)");

        let err = KeysetError::PrimaryKeyNotFound { primary_key_id: 42 };
        assert_eq!(err.to_string(), "primary key 42 not found in keyset");
    }

    #[test]
    fn authentication_failure_display_has_no_detail() {
        assert_eq!(KeysetError::AuthenticationFailure.to_string(), "authentication failed");
    }
}
