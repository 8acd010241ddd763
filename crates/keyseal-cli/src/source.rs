//! Keyset loading from command-line sources.

use std::{fs, path::Path};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use keyseal_core::Keyset;

use crate::{
    args::KeysetSource,
    error::{CliError, CliResult},
};

impl KeysetSource {
    /// Decode the keyset named by these arguments.
    ///
    /// # Errors
    ///
    /// - `MissingKeyset`: no source was given
    /// - `Io` / `NotText`: the file could not be read
    /// - `Base64`: `--keyset` is not base64
    /// - `Keyset`: the keyset itself is malformed
    pub fn load(&self) -> CliResult<Keyset> {
        if let Some(path) = &self.json_file {
            return load_json_file(path);
        }

        if let Some(path) = &self.keyset_file {
            let bytes = fs::read(path).map_err(CliError::io("read", path))?;
            tracing::debug!(path = %path.display(), bytes = bytes.len(), "read binary keyset file");
            return Ok(Keyset::from_binary(&bytes)?);
        }

        let encoded = self.keyset.as_deref().ok_or(CliError::MissingKeyset)?;
        let bytes = STANDARD.decode(encoded.trim()).map_err(CliError::base64("keyset"))?;
        Ok(Keyset::from_binary(&bytes)?)
    }
}

fn load_json_file(path: &Path) -> CliResult<Keyset> {
    let bytes = fs::read(path).map_err(CliError::io("read", path))?;
    let text =
        String::from_utf8(bytes).map_err(|_| CliError::NotText { path: path.to_path_buf() })?;
    tracing::debug!(path = %path.display(), "read JSON keyset file");
    Ok(Keyset::from_json(&text)?)
}

#[cfg(test)]
mod tests {
    use keyseal_core::KeysetError;

    use super::*;

    const REFERENCE: &str = concat!(
        "CMKIrNYJEmQKWAowdHlwZS5nb29nbGVhcGlzLmNvbS9nb29nbGUuY3J5cHRvLnRpbmsuQWVzR2NtS2V5",
        "EiIaIGNoYW5nZSB0aGlzIHBhc3N3b3JkIHRvIGEgc2VjcmV0GAEQARjCiKzWCSAB",
    );

    #[test]
    fn base64_keyset() {
        let source = KeysetSource { keyset: Some(format!("{REFERENCE}\n")), ..Default::default() };
        assert_eq!(source.load().unwrap().primary_key_id(), 2_596_996_162);
    }

    #[test]
    fn nothing_given() {
        assert!(matches!(KeysetSource::default().load(), Err(CliError::MissingKeyset)));
    }

    #[test]
    fn bad_base64() {
        let source = KeysetSource { keyset: Some("not base64!".to_string()), ..Default::default() };
        assert!(matches!(source.load(), Err(CliError::Base64 { what: "keyset", .. })));
    }

    #[test]
    fn malformed_keyset() {
        let source = KeysetSource { keyset: Some("CAE=".to_string()), ..Default::default() };
        assert!(matches!(
            source.load(),
            Err(CliError::Keyset(KeysetError::MalformedKeyset { .. }))
        ));
    }

    #[test]
    fn files_take_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let keyset = Keyset::from_secret(&[7; 16]).unwrap();

        let binary = dir.path().join("keyset.bin");
        fs::write(&binary, keyset.to_binary()).unwrap();
        let json = dir.path().join("keyset.json");
        fs::write(&json, keyset.to_json_pretty()).unwrap();

        let from_binary = KeysetSource {
            keyset: Some(REFERENCE.to_string()),
            keyset_file: Some(binary.clone()),
            json_file: None,
        };
        assert_eq!(from_binary.load().unwrap(), keyset);

        let from_json = KeysetSource { json_file: Some(json), ..from_binary };
        assert_eq!(from_json.load().unwrap(), keyset);
    }

    #[test]
    fn missing_file() {
        let source = KeysetSource {
            json_file: Some("/nonexistent/keyset.json".into()),
            ..Default::default()
        };
        assert!(matches!(source.load(), Err(CliError::Io { action: "read", .. })));
    }
}
