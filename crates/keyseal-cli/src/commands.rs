//! Subcommand implementations.
//!
//! Each command returns a report instead of printing, so the flows can be
//! checked without capturing logs. [`Report::log`] renders a report through
//! `tracing`.

use std::fs;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use keyseal_core::{
    Aead, ImportConfig, Keyset, KeysetHandle, OsEntropy, OutputPrefixType,
    export::extract_raw_keys,
};
use zeroize::Zeroizing;

use crate::{
    args::{Command, DecryptArgs, EncryptArgs, ExportArgs, ImportArgs, InspectArgs},
    error::{CliError, CliResult},
};

/// Raw key of one entry, extracted on request.
pub struct RawKey {
    /// Entry the key belongs to
    pub key_id: u32,
    /// Key bytes, wiped on drop
    pub bytes: Zeroizing<Vec<u8>>,
}

/// Outcome of `keyseal import`.
pub struct ImportReport {
    /// The new keyset
    pub keyset: Keyset,
    /// Binary encoding, base64
    pub binary_base64: String,
    /// Tab-indented JSON encoding
    pub json_pretty: String,
    /// Plaintexts of `--decrypt` ciphertexts, in order
    pub decrypted: Vec<Vec<u8>>,
    /// Extracted raw keys if `--show-key` was given
    pub raw_keys: Vec<RawKey>,
}

/// Outcome of `keyseal export`.
pub struct ExportReport {
    /// Loaded keyset
    pub keyset: Keyset,
    /// Tab-indented JSON encoding
    pub json_pretty: String,
    /// Ciphertext of the round-trip plaintext, base64
    pub ciphertext_base64: String,
    /// Plaintext recovered by the keyset re-read from `json_pretty`
    pub plaintext: Vec<u8>,
    /// Extracted raw keys if `--show-key` was given
    pub raw_keys: Vec<RawKey>,
}

/// Outcome of `keyseal inspect`.
pub struct InspectReport {
    /// Loaded keyset
    pub keyset: Keyset,
    /// Binary encoding, base64
    pub binary_base64: String,
    /// Tab-indented JSON encoding
    pub json_pretty: String,
}

/// Outcome of any subcommand.
pub enum Report {
    /// `import`
    Import(ImportReport),
    /// `export`
    Export(ExportReport),
    /// `encrypt`: base64 ciphertext
    Encrypt(String),
    /// `decrypt`: plaintexts in argument order
    Decrypt(Vec<Vec<u8>>),
    /// `inspect`
    Inspect(InspectReport),
}

/// Run `command`.
///
/// # Errors
///
/// Whatever the chosen subcommand reports.
pub fn run(command: &Command) -> CliResult<Report> {
    match command {
        Command::Import(args) => import(args).map(Report::Import),
        Command::Export(args) => export(args).map(Report::Export),
        Command::Encrypt(args) => encrypt(args).map(Report::Encrypt),
        Command::Decrypt(args) => decrypt(args).map(Report::Decrypt),
        Command::Inspect(args) => inspect(args).map(Report::Inspect),
    }
}

/// Build a keyset from a secret, decrypt any given ciphertexts with it and
/// optionally write its JSON form to a file.
///
/// # Errors
///
/// - `Keyset(InvalidKeyLength)`: the secret is not 16, 24 or 32 bytes
/// - `Base64` / `Keyset(AuthenticationFailure)`: a ciphertext is unusable
/// - `Io`: the JSON file could not be written
pub fn import(args: &ImportArgs) -> CliResult<ImportReport> {
    let output_prefix =
        if args.raw_prefix { OutputPrefixType::Raw } else { OutputPrefixType::Tink };
    let config = ImportConfig { key_id: args.key_id, output_prefix };
    let keyset = Keyset::from_secret_with(args.secret.as_bytes(), &config, &OsEntropy)?;

    let handle = KeysetHandle::resolve(&keyset)?;
    let decrypted = decrypt_all(&handle, &args.ciphertexts, args.associated_data.as_bytes())?;

    let json_pretty = keyset.to_json_pretty();
    if let Some(path) = &args.write_json {
        fs::write(path, &json_pretty).map_err(CliError::io("write", path))?;
        tracing::debug!(path = %path.display(), "wrote JSON keyset");
    }

    let raw_keys = if args.show_key { raw_keys(&keyset)? } else { Vec::new() };

    Ok(ImportReport {
        binary_base64: STANDARD.encode(keyset.to_binary()),
        json_pretty,
        decrypted,
        raw_keys,
        keyset,
    })
}

/// Load a keyset, encrypt a plaintext, then decrypt it with a second handle
/// built from the keyset's own pretty JSON.
///
/// # Errors
///
/// - `MissingKeyset` / `Io` / `Base64` / `Keyset`: the keyset is unusable
/// - `RoundTripMismatch`: the re-read keyset decrypted something else
pub fn export(args: &ExportArgs) -> CliResult<ExportReport> {
    let keyset = args.source.load()?;
    let handle = KeysetHandle::resolve(&keyset)?;
    let json_pretty = keyset.to_json_pretty();

    let associated_data = args.associated_data.as_bytes();
    let ciphertext = handle.encrypt(args.plaintext.as_bytes(), associated_data)?;

    let reread = Keyset::from_json(&json_pretty)?;
    let plaintext = KeysetHandle::resolve(&reread)?.decrypt(&ciphertext, associated_data)?;
    if plaintext != args.plaintext.as_bytes() {
        return Err(CliError::RoundTripMismatch);
    }

    let raw_keys = if args.show_key { raw_keys(&keyset)? } else { Vec::new() };

    Ok(ExportReport {
        keyset,
        json_pretty,
        ciphertext_base64: STANDARD.encode(ciphertext),
        plaintext,
        raw_keys,
    })
}

/// Encrypt a plaintext, returning the base64 ciphertext.
///
/// # Errors
///
/// - `MissingKeyset` / `Io` / `Base64` / `Keyset`: the keyset is unusable
pub fn encrypt(args: &EncryptArgs) -> CliResult<String> {
    let handle = KeysetHandle::resolve(&args.source.load()?)?;
    let ciphertext =
        handle.encrypt(args.plaintext.as_bytes(), args.associated_data.as_bytes())?;
    Ok(STANDARD.encode(ciphertext))
}

/// Decrypt base64 ciphertexts.
///
/// # Errors
///
/// - `MissingKeyset` / `Io` / `Base64` / `Keyset`: the keyset is unusable
/// - `Base64` / `Keyset(AuthenticationFailure)`: a ciphertext is unusable
pub fn decrypt(args: &DecryptArgs) -> CliResult<Vec<Vec<u8>>> {
    let handle = KeysetHandle::resolve(&args.source.load()?)?;
    decrypt_all(&handle, &args.ciphertexts, args.associated_data.as_bytes())
}

/// Transcode a keyset into both encodings.
///
/// # Errors
///
/// - `MissingKeyset` / `Io` / `Base64` / `Keyset`: the keyset is unreadable
pub fn inspect(args: &InspectArgs) -> CliResult<InspectReport> {
    let keyset = args.source.load()?;
    Ok(InspectReport {
        binary_base64: STANDARD.encode(keyset.to_binary()),
        json_pretty: keyset.to_json_pretty(),
        keyset,
    })
}

fn decrypt_all(
    handle: &KeysetHandle,
    ciphertexts: &[String],
    associated_data: &[u8],
) -> CliResult<Vec<Vec<u8>>> {
    ciphertexts
        .iter()
        .map(|encoded| {
            let ciphertext =
                STANDARD.decode(encoded.trim()).map_err(CliError::base64("ciphertext"))?;
            Ok(handle.decrypt(&ciphertext, associated_data)?)
        })
        .collect()
}

fn raw_keys(keyset: &Keyset) -> CliResult<Vec<RawKey>> {
    Ok(extract_raw_keys(keyset)?
        .into_iter()
        .map(|(key_id, bytes)| RawKey { key_id, bytes })
        .collect())
}

impl Report {
    /// Render through `tracing` at `info` level. Raw keys are logged at
    /// `warn` so they stand out.
    pub fn log(&self) {
        match self {
            Self::Import(report) => {
                tracing::info!(primary_key_id = report.keyset.primary_key_id(), "keyset created");
                tracing::info!("binary keyset (base64): {}", report.binary_base64);
                tracing::info!("JSON keyset:\n{}", report.json_pretty);
                log_plaintexts(&report.decrypted);
                log_raw_keys(&report.raw_keys);
            },
            Self::Export(report) => {
                tracing::info!(primary_key_id = report.keyset.primary_key_id(), "keyset loaded");
                tracing::info!("JSON keyset:\n{}", report.json_pretty);
                tracing::info!("encrypted (base64): {}", report.ciphertext_base64);
                tracing::info!(
                    "decrypted after JSON round trip: {}",
                    String::from_utf8_lossy(&report.plaintext)
                );
                log_raw_keys(&report.raw_keys);
            },
            Self::Encrypt(ciphertext) => tracing::info!("encrypted (base64): {ciphertext}"),
            Self::Decrypt(plaintexts) => log_plaintexts(plaintexts),
            Self::Inspect(report) => {
                for entry in report.keyset.entries() {
                    tracing::info!(
                        key_id = entry.key_id,
                        primary = entry.key_id == report.keyset.primary_key_id(),
                        status = ?entry.status,
                        output_prefix = ?entry.output_prefix,
                        type_url = %entry.type_url,
                        "entry"
                    );
                }
                tracing::info!("binary keyset (base64): {}", report.binary_base64);
                tracing::info!("JSON keyset:\n{}", report.json_pretty);
            },
        }
    }
}

fn log_plaintexts(plaintexts: &[Vec<u8>]) {
    for plaintext in plaintexts {
        tracing::info!("decrypted: {}", String::from_utf8_lossy(plaintext));
    }
}

fn log_raw_keys(keys: &[RawKey]) {
    for key in keys {
        tracing::warn!(key_id = key.key_id, "raw key (base64): {}", STANDARD.encode(&*key.bytes));
    }
}
