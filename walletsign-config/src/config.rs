//! The walletsign configuration file.

use std::{
    error::Error as StdError,
    path::{Path, PathBuf},
    time::Duration,
};

use log::{debug, info};
use serde::{Deserialize, Serialize};
use url::Url;
use walletsign_common::paths::{get_config_file, get_default_storage_path};
use walletsign_crypto::codec::PublicKeyEncoding;
use walletsign_kms::{
    CryptoKeyName,
    DEFAULT_BACKOFF,
    DEFAULT_ENDPOINT,
    DEFAULT_MAX_ATTEMPTS,
    DEFAULT_TIMEOUT_SECONDS,
    KmsOptions,
    RetryPolicy,
};

use crate::Error;

/// The default host of the RPC server.
pub const DEFAULT_RPC_HOST: &str = "127.0.0.1";

/// The default port of the RPC server.
pub const DEFAULT_RPC_PORT: u16 = 8983;

/// Settings of the RPC server that exposes signing to other services.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct RpcServerConfig {
    /// The host name or address to listen on.
    pub host: String,
    /// The port to listen on.
    pub port: u16,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_RPC_HOST.to_string(),
            port: DEFAULT_RPC_PORT,
        }
    }
}

/// Settings for connecting to the key management service.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct KmsConfig {
    /// The base URL of the REST API.
    pub endpoint: String,
    /// The timeout of requests in seconds.
    pub timeout_seconds: u64,
    /// The maximum number of attempts of a signing request.
    pub max_attempts: u32,
    /// The delay in milliseconds before the first retry of a signing request.
    pub backoff_millis: u64,
}

impl Default for KmsConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_millis: DEFAULT_BACKOFF.as_millis() as u64,
        }
    }
}

/// The walletsign configuration.
///
/// Every setting has a default, so that a configuration file only needs to contain the settings
/// that differ from it.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct Config {
    /// The directory of the embedded key store.
    pub storage_path: PathBuf,
    /// The encoding of secp256k1 public keys in the key store.
    pub public_key_encoding: PublicKeyEncoding,
    /// The service account credentials file for the key management service.
    pub credentials_file: Option<PathBuf>,
    /// The name of the HSM-backed key version used for remote signing.
    pub key_name: Option<CryptoKeyName>,
    /// Whether ECDSA signing uses the HSM-backed key instead of the key store.
    pub hsm_enable: bool,
    /// Settings of the RPC server.
    pub rpc_server: RpcServerConfig,
    /// Settings for connecting to the key management service.
    pub kms: KmsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_path: get_default_storage_path(),
            public_key_encoding: PublicKeyEncoding::default(),
            credentials_file: None,
            key_name: None,
            hsm_enable: false,
            rpc_server: RpcServerConfig::default(),
            kms: KmsConfig::default(),
        }
    }
}

impl Config {
    /// Loads and validates a [`Config`].
    ///
    /// If `path` is provided, the configuration is read from it.
    /// Otherwise the first configuration file in the default locations is used (see
    /// [`get_config_file`]) and the defaults apply if there is none.
    ///
    /// # Errors
    ///
    /// Returns an error if
    /// * `path` is provided but does not exist,
    /// * the configuration file can not be read or parsed,
    /// * or the configuration is invalid (see [`Config::validate`]).
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io::Write;
    ///
    /// use walletsign_config::Config;
    ///
    /// # fn main() -> testresult::TestResult {
    /// let mut file = tempfile::NamedTempFile::new()?;
    /// writeln!(file, "storage_path = \"/tmp/keys\"")?;
    ///
    /// let config = Config::load(Some(file.path()))?;
    /// assert_eq!(config.storage_path.to_str(), Some("/tmp/keys"));
    /// assert!(!config.hsm_enable);
    /// # Ok(())
    /// # }
    /// ```
    pub fn load(path: Option<&Path>) -> Result<Self, Error> {
        let path = match path {
            Some(path) if !path.is_file() => return Err(Error::Missing(path.to_path_buf())),
            Some(path) => Some(path.to_path_buf()),
            None => get_config_file(),
        };

        let config: Config = match path {
            Some(path) => {
                debug!("Loading configuration from {}", path.display());
                confy::load_path(&path).map_err(|error| Error::Load {
                    description: if let Some(error) = error.source() {
                        error.to_string()
                    } else {
                        "".to_string()
                    },
                    source: error,
                })?
            }
            None => {
                info!("No configuration file found, using defaults");
                Config::default()
            }
        };
        config.validate()?;

        Ok(config)
    }

    /// Validates the [`Config`].
    ///
    /// # Errors
    ///
    /// Returns an error if
    /// * `hsm_enable` is set, but `credentials_file` or `key_name` are not,
    /// * `hsm_enable` is set, but `key_name` does not name a key version,
    /// * or the key management service endpoint is not a valid URL.
    pub fn validate(&self) -> Result<(), Error> {
        if self.hsm_enable {
            if self.credentials_file.is_none() {
                return Err(Error::MissingHsmSetting {
                    setting: "credentials_file",
                });
            }
            let Some(key_name) = &self.key_name else {
                return Err(Error::MissingHsmSetting {
                    setting: "key_name",
                });
            };
            // signing requests address a single key version
            if key_name.version().is_none() {
                return Err(Error::UnversionedKeyName {
                    name: key_name.to_string(),
                });
            }
        }
        self.endpoint()?;

        Ok(())
    }

    /// Returns the parsed key management service endpoint.
    fn endpoint(&self) -> Result<Url, Error> {
        Url::parse(&self.kms.endpoint).map_err(|source| Error::InvalidEndpoint {
            endpoint: self.kms.endpoint.clone(),
            source,
        })
    }

    /// Returns the [`KmsOptions`] described by the `kms` settings.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::InvalidEndpoint`] if the endpoint is not a valid URL.
    pub fn kms_options(&self) -> Result<KmsOptions, Error> {
        let mut options = KmsOptions::new(self.endpoint()?);
        options.timeout = Duration::from_secs(self.kms.timeout_seconds);
        options.retry = RetryPolicy::new(
            self.kms.max_attempts,
            Duration::from_millis(self.kms.backoff_millis),
        );

        Ok(options)
    }
}
