//! ECDSA signing over secp256k1.

use std::fmt::{Debug, Formatter};

use log::trace;
use secp256k1::{
    Message,
    PublicKey,
    Secp256k1,
    SecretKey,
    ecdsa::Signature,
};

use crate::{
    Error,
    codec::{
        DIGEST_LENGTH,
        PublicKeyEncoding,
        encode_hex,
        parse_secp256k1_public_key,
        serialize_secp256k1_public_key,
    },
    key::SignatureScheme,
    signer::traits::RawSigningKey,
};

/// The length of an ECDSA signature (`r ‖ s ‖ recovery id`).
pub const ECDSA_SIGNATURE_LENGTH: usize = 65;

/// The length of the `r ‖ s` part of an ECDSA signature.
const COMPACT_SIGNATURE_LENGTH: usize = 64;

/// A secp256k1 signing key held in process memory.
pub struct EcdsaSigningKey {
    secret_key: SecretKey,
    public_key: PublicKey,
}

impl EcdsaSigningKey {
    /// Creates a new [`EcdsaSigningKey`] from a 32-byte secret scalar.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::SignFailure`] if `bytes` is not a valid secp256k1 secret scalar.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let secret_key = SecretKey::from_slice(bytes).map_err(|source| Error::SignFailure {
            context: "loading a secp256k1 private key",
            source: Box::new(source),
        })?;
        let public_key = PublicKey::from_secret_key(&Secp256k1::signing_only(), &secret_key);
        Ok(Self {
            secret_key,
            public_key,
        })
    }

    /// Returns the public key using `encoding`.
    pub fn public_key(&self, encoding: PublicKeyEncoding) -> Vec<u8> {
        serialize_secp256k1_public_key(&self.public_key, encoding)
    }

    /// Signs a 32-byte `digest` using a deterministic (RFC 6979) nonce.
    ///
    /// Returns `r ‖ s ‖ recovery id`, with `s` normalized to the lower half of the curve order.
    pub fn sign_digest(&self, digest: &[u8; DIGEST_LENGTH]) -> [u8; ECDSA_SIGNATURE_LENGTH] {
        let message = Message::from_digest(*digest);
        let (recovery_id, compact) = Secp256k1::signing_only()
            .sign_ecdsa_recoverable(&message, &self.secret_key)
            .serialize_compact();

        let mut signature = [0u8; ECDSA_SIGNATURE_LENGTH];
        signature[..COMPACT_SIGNATURE_LENGTH].copy_from_slice(&compact);
        // The recovery id is always in 0..=3.
        signature[COMPACT_SIGNATURE_LENGTH] = recovery_id.to_i32() as u8;
        signature
    }
}

impl Debug for EcdsaSigningKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EcdsaSigningKey")
            .field("public_key", &self.key_id())
            .finish()
    }
}

impl RawSigningKey for EcdsaSigningKey {
    /// Returns the compressed public key as hexadecimal text.
    fn key_id(&self) -> String {
        encode_hex(self.public_key(PublicKeyEncoding::Compressed))
    }

    fn scheme(&self) -> SignatureScheme {
        SignatureScheme::Ecdsa
    }

    /// Signs a 32-byte digest.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::InvalidLength`] if `payload` is not exactly 32 bytes long.
    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, Error> {
        let digest =
            <&[u8; DIGEST_LENGTH]>::try_from(payload).map_err(|_| Error::InvalidLength {
                context: "digest",
                expected: DIGEST_LENGTH,
                actual: payload.len(),
            })?;
        Ok(self.sign_digest(digest).to_vec())
    }
}

/// Verifies an ECDSA `signature` over `digest` using `public_key`.
///
/// Only the first 64 bytes (`r ‖ s`) of `signature` are considered; a trailing recovery id is
/// ignored. `public_key` may be compressed or uncompressed.
///
/// Returns `false` if the signature is cryptographically invalid, shorter than 64 bytes, not in
/// normalized (low `s`) form, or if `public_key` is not a curve point.
pub fn verify_digest(public_key: &[u8], digest: &[u8; DIGEST_LENGTH], signature: &[u8]) -> bool {
    let Ok(public_key) = parse_secp256k1_public_key(public_key) else {
        trace!("Rejecting ECDSA signature for a public key that is not a curve point");
        return false;
    };
    let Some(compact) = signature.get(..COMPACT_SIGNATURE_LENGTH) else {
        trace!(
            "Rejecting ECDSA signature of {} bytes as too short",
            signature.len()
        );
        return false;
    };
    let Ok(signature) = Signature::from_compact(compact) else {
        return false;
    };

    Secp256k1::verification_only()
        .verify_ecdsa(&Message::from_digest(*digest), &signature, &public_key)
        .is_ok()
}
