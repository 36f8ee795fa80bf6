//! Error handling.

/// An error that may occur when using a key store.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Key material can not be decoded.
    #[error("Decoding key material failed:\n{0}")]
    Decode(#[from] walletsign_crypto::Error),

    /// No private key is stored for a public key.
    #[error("No private key is stored for public key {public_key}")]
    KeyNotFound {
        /// The normalized public key that has been looked up.
        public_key: String,
    },

    /// The storage engine failed.
    #[error("Key store I/O failed while {context}:\n{source}")]
    StoreIo {
        /// The context in which the error occurred.
        ///
        /// This is meant to complete the sentence "Key store I/O failed while ".
        context: &'static str,
        /// The source error.
        source: sled::Error,
    },

    /// Storing a sequence of keys stopped at a failing key.
    #[error("Stored {stored} of {total} keys, storing key {index} failed:\n{source}")]
    Incomplete {
        /// The number of keys that have been written.
        stored: usize,
        /// The number of keys that were to be written.
        total: usize,
        /// The index of the key that failed.
        index: usize,
        /// The error of the key that failed.
        source: Box<Error>,
    },
}
