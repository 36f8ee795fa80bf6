//! Error handling.

/// An error that may occur when routing signing requests.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A configuration error.
    #[error("Configuration error:\n{0}")]
    Config(#[from] walletsign_config::Error),

    /// A cryptographic error.
    #[error("Cryptographic operation failed:\n{0}")]
    Crypto(#[from] walletsign_crypto::Error),

    /// A key store error.
    #[error("Key store error:\n{0}")]
    KeyStore(#[from] walletsign_keystore::Error),

    /// A key management service error.
    #[error("Key management service error:\n{0}")]
    Kms(#[from] walletsign_kms::Error),
}

impl Error {
    /// Returns whether the error is caused by malformed input.
    pub fn is_decode(&self) -> bool {
        match self {
            Self::Crypto(error) => error.is_decode(),
            Self::KeyStore(walletsign_keystore::Error::Decode(error)) => error.is_decode(),
            _ => false,
        }
    }
}
