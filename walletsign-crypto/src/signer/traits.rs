//! Traits for the low-level signer interface.

use std::fmt::Debug;

use crate::{Error, key::SignatureScheme};

/// Represents a signing key for low-level operations.
///
/// Implementations either hold private key material in process memory or merely a handle to a key
/// that never leaves a remote signing service.
pub trait RawSigningKey: Debug {
    /// Returns the key identifier as a string.
    ///
    /// Each signing key has an identifier in an implementation defined format.
    fn key_id(&self) -> String;

    /// Returns the signature scheme of the signing key.
    fn scheme(&self) -> SignatureScheme;

    /// Signs a raw payload.
    ///
    /// For ECDSA the payload is a 32-byte digest, which is not hashed again.
    /// For EdDSA the payload is the message itself.
    ///
    /// # Errors
    ///
    /// If the operation fails, the implementation should return an appropriate error.
    /// The [`Error::Hsm`] variant is appropriate for forwarding client-specific HSM errors.
    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, Error>;
}
