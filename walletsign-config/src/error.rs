//! Error handling.

use std::path::PathBuf;

/// Errors related to configuration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A config loading error
    ///
    /// The variant tracks a [`ConfyError`][`confy::ConfyError`] and an optional
    /// description of an inner Error type.
    /// The description is tracked separately, as otherwise we do not get to useful error messages
    /// of wrapped Error types (e.g. those for loading TOML files).
    #[error("Config loading issue: {source}\n{description}")]
    Load {
        /// The source error.
        source: confy::ConfyError,
        /// The description of the inner error.
        description: String,
    },

    /// An explicitly requested config file does not exist.
    #[error("The config file {0} does not exist")]
    Missing(PathBuf),

    /// A setting required for remote signing is missing.
    #[error("The setting {setting} is required when hsm_enable is set")]
    MissingHsmSetting {
        /// The name of the missing setting.
        setting: &'static str,
    },

    /// The configured signing key does not name a key version.
    #[error("The key_name {name} must end in /cryptoKeyVersions/{{version}} when hsm_enable is set")]
    UnversionedKeyName {
        /// The configured key name.
        name: String,
    },

    /// The key management service endpoint is not a valid URL.
    #[error("Invalid key management service endpoint {endpoint}: {source}")]
    InvalidEndpoint {
        /// The configured endpoint.
        endpoint: String,
        /// The source error.
        source: url::ParseError,
    },
}
