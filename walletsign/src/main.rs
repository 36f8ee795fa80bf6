//! Application for the creation of wallet transaction signatures and the management of keys.

use std::{fs::File, io::BufReader, path::PathBuf, process::ExitCode};

use clap::Parser;
use log::info;
use serde_json::json;
use walletsign::{
    SigningRequest,
    SigningRouter,
    cli::{Cli, Command, KeyArgs, KmsCommand},
    kms_client,
    verify,
};
use walletsign_config::Config;
use walletsign_crypto::key::Key;

/// Walletsign error.
#[derive(Debug, thiserror::Error)]
enum Error {
    /// The key pairs file can not be opened.
    #[error("Unable to open key pairs file {path}:\n{source}")]
    KeysFile {
        /// The path of the file.
        path: PathBuf,
        /// The source error.
        source: std::io::Error,
    },

    /// JSON error.
    #[error("JSON error:\n{0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] walletsign_config::Error),

    /// Signing or key management error.
    #[error(transparent)]
    Walletsign(#[from] walletsign::Error),

    /// Key store error.
    #[error(transparent)]
    KeyStore(#[from] walletsign_keystore::Error),

    /// Key management service error.
    #[error(transparent)]
    Kms(#[from] walletsign_kms::Error),

    /// A walletsign-common logging error.
    #[error(transparent)]
    WalletsignCommonLogging(#[from] walletsign_common::logging::Error),
}

/// Reads the key pairs in the JSON file at `path`.
fn read_keys(path: PathBuf) -> Result<Vec<Key>, Error> {
    let file = File::open(&path).map_err(|source| Error::KeysFile { path, source })?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Runs the command of `cli`.
///
/// Results are written to stdout as JSON.
/// Private keys are never written.
/// Verification does not use the configuration.
///
/// # Errors
///
/// Returns an error if
/// * the configuration can not be loaded for a command that needs it,
/// * the key store or the key management service client can not be set up for a command that
///   needs it,
/// * or the command fails.
fn run(cli: Cli) -> Result<(), Error> {
    let config = || -> Result<Config, Error> {
        let mut config = Config::load(cli.config.as_deref())?;
        if cli.hsm {
            config.hsm_enable = true;
        }
        Ok(config)
    };
    let router =
        || -> Result<SigningRouter, Error> { Ok(SigningRouter::from_config(&config()?)?) };
    let output = match cli.command {
        Command::Generate { scheme, count } => {
            let router = router()?;
            let mut public_keys = Vec::with_capacity(count);
            for _ in 0..count {
                public_keys.push(router.generate(scheme)?.public_key);
            }
            json!({ "scheme": scheme, "public_keys": public_keys })
        }
        Command::Store { keys, atomic } => {
            let router = router()?;
            let keys = read_keys(keys)?;
            let stored = if atomic {
                router.store_keys_atomic(&keys)?
            } else {
                router.store_keys(&keys).into_result()?
            };
            info!("Stored {stored} keys");
            json!({ "stored": stored })
        }
        Command::Sign(KeyArgs {
            scheme,
            public_key,
            payload,
        }) => {
            let request = SigningRequest::new(scheme, public_key, payload);
            json!({ "signature": router()?.sign(&request)? })
        }
        Command::Verify { key, signature } => json!({
            "valid": verify(key.scheme, &key.public_key, &key.payload, &signature)?,
        }),
        Command::Delete { scheme, public_key } => json!({
            "deleted": router()?.delete_key(scheme, &public_key)?,
        }),
        Command::Kms(KmsCommand::CreateKeyRing(key_ring)) => json!({
            "key_ring": kms_client(&config()?)?.create_key_ring(
                &key_ring.project,
                &key_ring.location,
                &key_ring.key_ring,
            )?,
        }),
        Command::Kms(KmsCommand::CreateKey {
            key_ring,
            key_id,
            algorithm,
        }) => json!({
            "key_name": kms_client(&config()?)?
                .create_crypto_key(
                    &key_ring.project,
                    &key_ring.location,
                    &key_ring.key_ring,
                    &key_id,
                    algorithm,
                )?
                .to_string(),
        }),
    };
    println!("{output}");

    Ok(())
}

/// Runs the requested command and writes its result to stdout.
fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(error) = walletsign_common::logging::setup_logging(
        cli.log_target,
        cli.verbosity.log_level_filter(),
    ) {
        eprintln!("{error}");
        return ExitCode::FAILURE;
    }

    if let Err(error) = run(cli) {
        log::error!(error:err; "Processing command failed: {error}");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
