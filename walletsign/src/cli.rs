//! Command line interface for `walletsign`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_verbosity_flag::Verbosity;
use walletsign_common::logging::LogTarget;
use walletsign_crypto::key::SignatureScheme;
use walletsign_kms::KeyAlgorithm;

/// Command line arguments of `walletsign`.
#[derive(Debug, Parser)]
#[command(
    about = "Sign wallet transactions with locally stored or HSM-backed keys.",
    long_about = "Sign wallet transactions with locally stored or HSM-backed keys.

ECDSA (secp256k1) signing operates on 32-byte digests, EdDSA (ed25519) signing on raw messages.
All keys, digests, messages and signatures are hexadecimal text with an optional `0x` prefix.

Unless `--config` is provided, the configuration is read from the first existing file of
/etc/walletsign/config.toml, /run/walletsign/config.toml,
/usr/local/share/walletsign/config.toml and /usr/share/walletsign/config.toml."
)]
pub struct Cli {
    /// The configuration file to use.
    #[arg(global = true, long, env = "WALLETSIGN_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Sign ECDSA digests with the configured HSM-backed key, regardless of the configuration.
    #[arg(global = true, long)]
    pub hsm: bool,

    /// Where to write log records ("auto", "journal" or "stderr").
    #[arg(default_value_t = LogTarget::Auto, global = true, long)]
    pub log_target: LogTarget,

    /// Global processing log verbosity.
    #[command(flatten)]
    pub verbosity: Verbosity,

    /// The command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// The commands of `walletsign`.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate key pairs, store them and print their public keys as JSON.
    Generate {
        /// The signature scheme of the key pairs.
        #[arg(long, short)]
        scheme: SignatureScheme,

        /// The number of key pairs to generate.
        #[arg(default_value_t = 1, long, short)]
        count: usize,
    },

    /// Store key pairs from a JSON file.
    ///
    /// The file contains an array of objects with `scheme`, `public_key` and `private_key`.
    /// Keys are stored in order and storing stops at the first invalid key, unless `--atomic` is
    /// provided.
    Store {
        /// The JSON file with the key pairs.
        #[arg(long, value_name = "FILE")]
        keys: PathBuf,

        /// Store all keys or none of them.
        #[arg(long)]
        atomic: bool,
    },

    /// Sign a digest (ECDSA) or message (EdDSA) and print the signature.
    Sign(KeyArgs),

    /// Verify a signature and print whether it is valid.
    Verify {
        /// The key to verify with and the signed payload.
        #[command(flatten)]
        key: KeyArgs,

        /// The signature.
        #[arg(long)]
        signature: String,
    },

    /// Delete a key pair from the key store.
    Delete {
        /// The signature scheme of the key pair.
        #[arg(long, short)]
        scheme: SignatureScheme,

        /// The public key of the key pair.
        #[arg(long)]
        public_key: String,
    },

    /// Provision resources of the key management service.
    #[command(subcommand)]
    Kms(KmsCommand),
}

/// The key and payload of a signing or verification.
#[derive(Args, Debug)]
pub struct KeyArgs {
    /// The signature scheme.
    #[arg(long, short)]
    pub scheme: SignatureScheme,

    /// The public key identifying the key pair.
    #[arg(long)]
    pub public_key: String,

    /// The 32-byte digest (ECDSA) or the message (EdDSA).
    #[arg(long)]
    pub payload: String,
}

/// The location of a key ring.
#[derive(Args, Debug)]
pub struct KeyRingArgs {
    /// The project id.
    #[arg(long)]
    pub project: String,

    /// The location id (e.g. "global").
    #[arg(long)]
    pub location: String,

    /// The key ring id.
    #[arg(long)]
    pub key_ring: String,
}

/// Administrative commands for the key management service.
#[derive(Debug, Subcommand)]
pub enum KmsCommand {
    /// Create a key ring.
    CreateKeyRing(KeyRingArgs),

    /// Create an HSM-protected signing key in an existing key ring.
    CreateKey {
        /// The key ring of the key.
        #[command(flatten)]
        key_ring: KeyRingArgs,

        /// The key id.
        #[arg(long)]
        key_id: String,

        /// The key algorithm ("ecdsa" or "rsa").
        #[arg(default_value_t = KeyAlgorithm::EcdsaSecp256k1, long)]
        algorithm: KeyAlgorithm,
    },
}
