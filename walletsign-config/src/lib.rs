//! Configuration file handling for walletsign.
//!
//! The configuration is a TOML file, which is looked up in the locations provided by
//! [`walletsign_common::paths`] unless a path is given explicitly.
//!
//! ```toml
//! storage_path = "/var/lib/walletsign/keys"
//! public_key_encoding = "uncompressed"
//! credentials_file = "/etc/walletsign/service-account.json"
//! key_name = "projects/p/locations/global/keyRings/r/cryptoKeys/k/cryptoKeyVersions/1"
//! hsm_enable = true
//!
//! [rpc_server]
//! host = "127.0.0.1"
//! port = 8983
//!
//! [kms]
//! endpoint = "https://cloudkms.googleapis.com/v1/"
//! timeout_seconds = 10
//! max_attempts = 3
//! backoff_millis = 200
//! ```

mod config;
mod error;

pub use config::{Config, DEFAULT_RPC_HOST, DEFAULT_RPC_PORT, KmsConfig, RpcServerConfig};
pub use error::Error;
