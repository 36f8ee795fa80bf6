//! Software signing and verification.
//!
//! The free functions in this module operate on hexadecimal text and are the entry points used by
//! request handlers. The signing keys in [`ecdsa`] and [`eddsa`] operate on raw bytes and
//! implement [`RawSigningKey`].

pub mod ecdsa;
pub mod eddsa;
pub mod traits;

use log::error;

use crate::{
    Error,
    codec::{decode_digest, decode_hex, encode_hex},
    key::{PrivateKey, SignatureScheme},
    signer::{
        ecdsa::{EcdsaSigningKey, verify_digest},
        eddsa::{EdDsaSigningKey, verify_message},
        traits::RawSigningKey,
    },
};

/// Creates a software signing key for `scheme` from raw `private_key` bytes.
///
/// # Errors
///
/// Returns an [`Error::SignFailure`] if `private_key` is not valid key material for `scheme`.
pub fn software_signing_key(
    scheme: SignatureScheme,
    private_key: &PrivateKey,
) -> Result<Box<dyn RawSigningKey + Send + Sync>, Error> {
    Ok(match scheme {
        SignatureScheme::Ecdsa => Box::new(EcdsaSigningKey::from_bytes(private_key.expose_bytes())?),
        SignatureScheme::EdDsa => Box::new(EdDsaSigningKey::from_bytes(private_key.expose_bytes())?),
    })
}

/// Signs a 32-byte digest with a secp256k1 private key.
///
/// Both `private_key` and `digest` are hexadecimal text. The digest is signed as is and not hashed
/// again. Signing is deterministic: the same key and digest always yield the same signature.
///
/// Returns the 65-byte `r ‖ s ‖ recovery id` signature as hexadecimal text.
///
/// # Errors
///
/// Returns an error if
/// * `private_key` or `digest` are not valid hexadecimal text,
/// * `digest` is not exactly 32 bytes long,
/// * or `private_key` is not a valid secp256k1 secret scalar.
///
/// # Examples
///
/// ```
/// use walletsign_crypto::signer::sign_ecdsa;
///
/// # fn main() -> testresult::TestResult {
/// let signature = sign_ecdsa(
///     "fb26155c1ff94bb97692793d1197d9c6c8091f25f8c8ac703f92695d32c5194b",
///     "0x3e4f9a460233ec33862da1ac3dabf5b32db01400fba166cdec40ad6dc735b4ab",
/// )?;
/// assert_eq!(signature.len(), 130);
/// # Ok(())
/// # }
/// ```
pub fn sign_ecdsa(private_key: &str, digest: &str) -> Result<String, Error> {
    let private_key = PrivateKey::new(decode_hex(private_key).inspect_err(|error| {
        error!("Decoding secp256k1 private key failed: {error}");
    })?);
    let digest = decode_digest(digest).inspect_err(|error| {
        error!("Decoding digest failed: {error}");
    })?;
    let signing_key = EcdsaSigningKey::from_bytes(private_key.expose_bytes())?;

    Ok(encode_hex(signing_key.sign_digest(&digest)))
}

/// Verifies an ECDSA signature over a 32-byte digest with a secp256k1 public key.
///
/// All arguments are hexadecimal text. `public_key` may be compressed or uncompressed.
/// Only the first 64 bytes of `signature` (`r ‖ s`) are verified, the recovery id is ignored.
///
/// Returns `false` for signatures that are structurally decodable but cryptographically invalid.
///
/// # Errors
///
/// Returns an error if any argument is not valid hexadecimal text or if `digest` is not exactly 32
/// bytes long.
pub fn verify_ecdsa(public_key: &str, digest: &str, signature: &str) -> Result<bool, Error> {
    let public_key = decode_hex(public_key)?;
    let digest = decode_digest(digest)?;
    let signature = decode_hex(signature)?;

    Ok(verify_digest(&public_key, &digest, &signature))
}

/// Signs a message with an ed25519 private key.
///
/// Both `private_key` and `message` are hexadecimal text. The `private_key` is either the 64-byte
/// form (seed followed by public key) or the 32-byte seed.
///
/// Returns the 64-byte signature as hexadecimal text.
///
/// # Errors
///
/// Returns an error if
/// * `private_key` or `message` are not valid hexadecimal text,
/// * or `private_key` is not valid ed25519 key material.
pub fn sign_eddsa(private_key: &str, message: &str) -> Result<String, Error> {
    let private_key = PrivateKey::new(decode_hex(private_key).inspect_err(|error| {
        error!("Decoding ed25519 private key failed: {error}");
    })?);
    let message = decode_hex(message).inspect_err(|error| {
        error!("Decoding message failed: {error}");
    })?;
    let signing_key = EdDsaSigningKey::from_bytes(private_key.expose_bytes())?;

    Ok(encode_hex(signing_key.sign_message(&message)))
}

/// Verifies an ed25519 signature over a message.
///
/// All arguments are hexadecimal text.
///
/// Returns `false` for signatures that are cryptographically invalid and for public keys or
/// signatures that do not have the length or form required by ed25519.
///
/// # Errors
///
/// Returns an error if any argument is not valid hexadecimal text.
pub fn verify_eddsa(public_key: &str, message: &str, signature: &str) -> Result<bool, Error> {
    let public_key = decode_hex(public_key)?;
    let message = decode_hex(message)?;
    let signature = decode_hex(signature)?;

    Ok(verify_message(&public_key, &message, &signature))
}

/// Verifies a signature for `scheme`.
///
/// Dispatches to [`verify_ecdsa`] or [`verify_eddsa`].
///
/// # Errors
///
/// Returns an error if the arguments can not be decoded for `scheme`.
pub fn verify(
    scheme: SignatureScheme,
    public_key: &str,
    payload: &str,
    signature: &str,
) -> Result<bool, Error> {
    match scheme {
        SignatureScheme::Ecdsa => verify_ecdsa(public_key, payload, signature),
        SignatureScheme::EdDsa => verify_eddsa(public_key, payload, signature),
    }
}
