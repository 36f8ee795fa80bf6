//! Error handling.

use crate::key::SignatureScheme;

/// An error that may occur when encoding, generating or using keys.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Hexadecimal input can not be decoded.
    #[error("Decoding hexadecimal input failed: {0}")]
    Decode(#[from] hex::FromHexError),

    /// Decoded input has an unexpected length.
    #[error("Invalid length of {context}: expected {expected} bytes, but got {actual}")]
    InvalidLength {
        /// The kind of input that has the wrong length (e.g. "digest").
        context: &'static str,
        /// The expected length in bytes.
        expected: usize,
        /// The actual length in bytes.
        actual: usize,
    },

    /// Public key data is invalid.
    #[error("Public key data is invalid because {context}")]
    InvalidPublicKey {
        /// The context in which the error occurred.
        ///
        /// This is meant to complete the sentence "Public key data is invalid because ".
        context: String,
    },

    /// A cryptographic signing operation failed.
    #[error("Signing failed while {context}:\n{source}")]
    SignFailure {
        /// The context in which the error occurred.
        ///
        /// This is meant to complete the sentence "Signing failed while ".
        context: &'static str,
        /// The source error.
        source: Box<dyn std::error::Error + 'static + Send + Sync>,
    },

    /// The random source of the operating system failed.
    #[error("Random source failure while {context}: {source}")]
    RandomSource {
        /// The context in which the error occurred.
        context: &'static str,
        /// The source error.
        source: rand::Error,
    },

    /// A signing key does not support a signature scheme.
    #[error("The signature scheme {0} is not supported by this signing key")]
    UnsupportedScheme(SignatureScheme),

    /// An HSM operation error.
    #[error("HSM operation failed while {context}:\n{source}")]
    Hsm {
        /// The context in which an HSM error occurred.
        ///
        /// This is meant to complete the sentence "HSM operation failed while ".
        context: &'static str,
        /// The source error.
        source: Box<dyn std::error::Error + 'static + Send + Sync>,
    },
}

impl Error {
    /// Returns whether the error is caused by malformed (hexadecimal) input.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_) | Self::InvalidLength { .. })
    }
}
