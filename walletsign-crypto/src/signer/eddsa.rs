//! EdDSA signing over ed25519.

use std::fmt::{Debug, Formatter};

use ed25519_dalek::{
    KEYPAIR_LENGTH,
    PUBLIC_KEY_LENGTH,
    SECRET_KEY_LENGTH,
    Signature,
    Signer,
    SigningKey,
    Verifier,
    VerifyingKey,
};
use log::trace;

use crate::{Error, codec::encode_hex, key::SignatureScheme, signer::traits::RawSigningKey};

/// The length of an ed25519 signature.
pub const EDDSA_SIGNATURE_LENGTH: usize = 64;

/// An ed25519 signing key held in process memory.
///
/// The key material is zeroized on drop.
pub struct EdDsaSigningKey(SigningKey);

impl EdDsaSigningKey {
    /// Creates a new [`EdDsaSigningKey`] from raw private key bytes.
    ///
    /// Accepts the 64-byte form (32-byte seed followed by the 32-byte public key) and the bare
    /// 32-byte seed.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::SignFailure`] if
    /// * `bytes` has neither 32 nor 64 bytes,
    /// * or the public key half of a 64-byte private key does not belong to its seed.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        match bytes.len() {
            KEYPAIR_LENGTH => {
                let mut keypair = [0u8; KEYPAIR_LENGTH];
                keypair.copy_from_slice(bytes);
                let signing_key = SigningKey::from_keypair_bytes(&keypair);
                zeroize::Zeroize::zeroize(&mut keypair);
                signing_key
                    .map(Self)
                    .map_err(|source| Error::SignFailure {
                        context: "loading an ed25519 private key",
                        source: Box::new(source),
                    })
            }
            SECRET_KEY_LENGTH => {
                let mut seed = [0u8; SECRET_KEY_LENGTH];
                seed.copy_from_slice(bytes);
                let signing_key = SigningKey::from_bytes(&seed);
                zeroize::Zeroize::zeroize(&mut seed);
                Ok(Self(signing_key))
            }
            actual => Err(Error::SignFailure {
                context: "loading an ed25519 private key",
                source: Box::new(Error::InvalidLength {
                    context: "ed25519 private key",
                    expected: KEYPAIR_LENGTH,
                    actual,
                }),
            }),
        }
    }

    /// Returns the 32-byte public key.
    pub fn public_key(&self) -> [u8; PUBLIC_KEY_LENGTH] {
        self.0.verifying_key().to_bytes()
    }

    /// Signs `message`.
    ///
    /// The message is hashed internally as part of the signature scheme.
    pub fn sign_message(&self, message: &[u8]) -> [u8; EDDSA_SIGNATURE_LENGTH] {
        self.0.sign(message).to_bytes()
    }
}

impl Debug for EdDsaSigningKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdDsaSigningKey")
            .field("public_key", &self.key_id())
            .finish()
    }
}

impl RawSigningKey for EdDsaSigningKey {
    /// Returns the public key as hexadecimal text.
    fn key_id(&self) -> String {
        encode_hex(self.public_key())
    }

    fn scheme(&self) -> SignatureScheme {
        SignatureScheme::EdDsa
    }

    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, Error> {
        Ok(self.sign_message(payload).to_vec())
    }
}

/// Verifies an ed25519 `signature` over `message` using `public_key`.
///
/// Returns `false` if the signature is invalid or if `public_key` or `signature` do not have the
/// length or form required by ed25519.
pub fn verify_message(public_key: &[u8], message: &[u8], signature: &[u8]) -> bool {
    let Ok(public_key) = <[u8; PUBLIC_KEY_LENGTH]>::try_from(public_key) else {
        trace!(
            "Rejecting ed25519 signature for a public key of {} bytes",
            public_key.len()
        );
        return false;
    };
    let Ok(verifying_key) = VerifyingKey::from_bytes(&public_key) else {
        return false;
    };
    let Ok(signature) = Signature::from_slice(signature) else {
        return false;
    };

    verifying_key.verify(message, &signature).is_ok()
}
