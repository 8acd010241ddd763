//! Keyseal binary.
//!
//! # Usage
//!
//! ```bash
//! # Create a keyset from a secret and write its JSON form
//! keyseal import --secret "change this password to a secret" --write-json keyset.json
//!
//! # Decrypt with a stored keyset
//! keyseal decrypt --json-file keyset.json AZrLBEKaUq6kFMfPY7XzKcFxvSCJQ31WYqnJEPAzsHPhk6WQ0S4=
//! ```

use clap::Parser;
use keyseal_cli::{Args, CliError, run};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), CliError> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    match run(&args.command) {
        Ok(report) => {
            report.log();
            Ok(())
        },
        Err(err) => {
            tracing::error!("{err}");
            Err(err)
        },
    }
}
