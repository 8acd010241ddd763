//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Cleartext AES-GCM keyset tool
#[derive(Parser, Debug)]
#[command(name = "keyseal")]
#[command(about = "Import, export and inspect cleartext AES-GCM keysets")]
#[command(version)]
pub struct Args {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,

    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,
}

/// `keyseal` subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build a keyset from a raw secret
    Import(ImportArgs),
    /// Load a keyset, show it, and check an encrypt / decrypt round trip
    Export(ExportArgs),
    /// Encrypt a plaintext with a keyset's primary key
    Encrypt(EncryptArgs),
    /// Decrypt base64 ciphertexts with a keyset's primary key
    Decrypt(DecryptArgs),
    /// Show a keyset in both encodings
    Inspect(InspectArgs),
}

/// Where to read a keyset from.
///
/// When several are given, `--json-file` wins over `--keyset-file`, which
/// wins over `--keyset`.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct KeysetSource {
    /// Binary keyset, base64 encoded
    #[arg(long, env = "KEYSEAL_KEYSET", hide_env_values = true)]
    pub keyset: Option<String>,

    /// File holding a binary keyset
    #[arg(long, value_name = "PATH")]
    pub keyset_file: Option<PathBuf>,

    /// File holding a JSON keyset
    #[arg(long, value_name = "PATH")]
    pub json_file: Option<PathBuf>,
}

/// Arguments for `keyseal import`.
#[derive(clap::Args, Debug, Clone)]
pub struct ImportArgs {
    /// Secret used verbatim as the AES key (16, 24 or 32 bytes)
    #[arg(long, env = "KEYSEAL_SECRET", hide_env_values = true)]
    pub secret: String,

    /// Fixed key id instead of a random one
    #[arg(long)]
    pub key_id: Option<u32>,

    /// Produce ciphertexts without the 5-byte key id prefix
    #[arg(long)]
    pub raw_prefix: bool,

    /// Base64 ciphertexts to decrypt with the new keyset
    #[arg(long = "decrypt", value_name = "B64")]
    pub ciphertexts: Vec<String>,

    /// Associated data for `--decrypt`
    #[arg(long, default_value = "")]
    pub associated_data: String,

    /// Write the JSON keyset to this file
    #[arg(long, value_name = "PATH")]
    pub write_json: Option<PathBuf>,

    /// Log the raw key extracted back out of the keyset
    #[arg(long)]
    pub show_key: bool,
}

/// Arguments for `keyseal export`.
#[derive(clap::Args, Debug, Clone)]
pub struct ExportArgs {
    /// Keyset to load
    #[command(flatten)]
    pub source: KeysetSource,

    /// Plaintext for the round-trip check
    #[arg(long, default_value = "Greed")]
    pub plaintext: String,

    /// Associated data for the round-trip check
    #[arg(long, default_value = "")]
    pub associated_data: String,

    /// Log the raw keys of every entry
    #[arg(long)]
    pub show_key: bool,
}

/// Arguments for `keyseal encrypt`.
#[derive(clap::Args, Debug, Clone)]
pub struct EncryptArgs {
    /// Keyset to encrypt with
    #[command(flatten)]
    pub source: KeysetSource,

    /// Plaintext to encrypt
    pub plaintext: String,

    /// Associated data bound to the ciphertext
    #[arg(long, default_value = "")]
    pub associated_data: String,
}

/// Arguments for `keyseal decrypt`.
#[derive(clap::Args, Debug, Clone)]
pub struct DecryptArgs {
    /// Keyset to decrypt with
    #[command(flatten)]
    pub source: KeysetSource,

    /// Base64 ciphertexts
    #[arg(required = true, value_name = "B64")]
    pub ciphertexts: Vec<String>,

    /// Associated data the ciphertexts were bound to
    #[arg(long, default_value = "")]
    pub associated_data: String,
}

/// Arguments for `keyseal inspect`.
#[derive(clap::Args, Debug, Clone)]
pub struct InspectArgs {
    /// Keyset to show
    #[command(flatten)]
    pub source: KeysetSource,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn import_flags_parse() {
        let args = Args::try_parse_from([
            "keyseal",
            "import",
            "--secret",
            "0123456789abcdef",
            "--key-id",
            "7",
            "--raw-prefix",
            "--decrypt",
            "AAAA",
            "--decrypt",
            "BBBB",
        ])
        .unwrap();

        let Command::Import(import) = args.command else { panic!("expected import") };
        assert_eq!(import.secret, "0123456789abcdef");
        assert_eq!(import.key_id, Some(7));
        assert!(import.raw_prefix);
        assert_eq!(import.ciphertexts, ["AAAA", "BBBB"]);
        assert!(!import.show_key);
    }

    #[test]
    fn decrypt_requires_ciphertext() {
        assert!(Args::try_parse_from(["keyseal", "decrypt", "--keyset", "AAAA"]).is_err());
    }

    #[test]
    fn log_level_is_global() {
        let args = Args::try_parse_from([
            "keyseal",
            "inspect",
            "--json-file",
            "keyset.json",
            "--log-level",
            "debug",
        ])
        .unwrap();

        assert_eq!(args.log_level, "debug");
        let Command::Inspect(inspect) = args.command else { panic!("expected inspect") };
        assert_eq!(inspect.source.json_file, Some(PathBuf::from("keyset.json")));
    }
}
