//! Key types and key generation.

use std::fmt::{Debug, Formatter};

use ed25519_dalek::SigningKey;
use log::{debug, error};
use rand::{RngCore, rngs::OsRng};
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::{
    Error,
    codec::{PublicKeyEncoding, encode_hex, serialize_secp256k1_public_key},
};

/// The length of an ed25519 seed and of a secp256k1 secret scalar.
const SECRET_LENGTH: usize = 32;

/// A signature scheme supported by walletsign.
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
    strum::Display,
    strum::EnumIter,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
pub enum SignatureScheme {
    /// ECDSA over secp256k1.
    Ecdsa,

    /// EdDSA over ed25519.
    EdDsa,
}

/// Raw private key material.
///
/// The bytes are zeroized on drop and never shown by [`Debug`].
#[derive(Clone, Eq, PartialEq)]
pub struct PrivateKey(Zeroizing<Vec<u8>>);

impl PrivateKey {
    /// Creates a new [`PrivateKey`] from raw bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(Zeroizing::new(bytes))
    }

    /// Exposes the raw private key bytes.
    pub fn expose_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Exposes the private key as hexadecimal text.
    pub fn expose_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(encode_hex(self.0.as_slice()))
    }
}

impl Debug for PrivateKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("PrivateKey([REDACTED])")
    }
}

/// A freshly generated secp256k1 key pair.
///
/// All members are hexadecimal text.
#[derive(Clone, Deserialize, Serialize)]
pub struct EcdsaKeyPair {
    /// The 32-byte secret scalar.
    pub private_key: Zeroizing<String>,
    /// The 65-byte uncompressed public key.
    pub uncompressed_public_key: String,
    /// The 33-byte compressed public key.
    pub compressed_public_key: String,
}

impl Debug for EcdsaKeyPair {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EcdsaKeyPair")
            .field("private_key", &"[REDACTED]")
            .field("uncompressed_public_key", &self.uncompressed_public_key)
            .field("compressed_public_key", &self.compressed_public_key)
            .finish()
    }
}

/// A freshly generated ed25519 key pair.
///
/// All members are hexadecimal text.
#[derive(Clone, Deserialize, Serialize)]
pub struct EdDsaKeyPair {
    /// The 64-byte private key (32-byte seed followed by the 32-byte public key).
    pub private_key: Zeroizing<String>,
    /// The 32-byte public key.
    pub public_key: String,
}

impl Debug for EdDsaKeyPair {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdDsaKeyPair")
            .field("private_key", &"[REDACTED]")
            .field("public_key", &self.public_key)
            .finish()
    }
}

/// A key record as handed to a key store.
///
/// The public key identifies the record and the private key is its payload.
/// Both are hexadecimal text.
/// The key store does not verify that `public_key` is derived from `private_key`.
#[derive(Clone, Deserialize, Serialize)]
pub struct Key {
    /// The signature scheme of the key pair.
    pub scheme: SignatureScheme,
    /// The public key.
    pub public_key: String,
    /// The private key.
    pub private_key: Zeroizing<String>,
}

impl Key {
    /// Creates a new [`Key`].
    pub fn new(scheme: SignatureScheme, public_key: String, private_key: String) -> Self {
        Self {
            scheme,
            public_key,
            private_key: Zeroizing::new(private_key),
        }
    }
}

impl Debug for Key {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Key")
            .field("scheme", &self.scheme)
            .field("public_key", &self.public_key)
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

impl From<EcdsaKeyPair> for Key {
    /// Creates a [`Key`] identified by the uncompressed public key of `value`.
    fn from(value: EcdsaKeyPair) -> Self {
        Self {
            scheme: SignatureScheme::Ecdsa,
            public_key: value.uncompressed_public_key,
            private_key: value.private_key,
        }
    }
}

impl From<EdDsaKeyPair> for Key {
    fn from(value: EdDsaKeyPair) -> Self {
        Self {
            scheme: SignatureScheme::EdDsa,
            public_key: value.public_key,
            private_key: value.private_key,
        }
    }
}

/// Fills a secret buffer from the random source of the operating system.
fn random_secret(context: &'static str) -> Result<Zeroizing<[u8; SECRET_LENGTH]>, Error> {
    let mut secret = Zeroizing::new([0u8; SECRET_LENGTH]);
    OsRng
        .try_fill_bytes(&mut secret[..])
        .map_err(|source| {
            error!("Reading from the random source failed while {context}: {source}");
            Error::RandomSource { context, source }
        })?;
    Ok(secret)
}

/// Creates a new secp256k1 key pair.
///
/// # Errors
///
/// Returns an [`Error::RandomSource`] if the random source of the operating system fails.
///
/// # Examples
///
/// ```
/// use walletsign_crypto::key::create_ecdsa_key_pair;
///
/// # fn main() -> testresult::TestResult {
/// let pair = create_ecdsa_key_pair()?;
/// assert_eq!(pair.private_key.len(), 64);
/// assert!(pair.uncompressed_public_key.starts_with("04"));
/// # Ok(())
/// # }
/// ```
pub fn create_ecdsa_key_pair() -> Result<EcdsaKeyPair, Error> {
    let secp = Secp256k1::signing_only();
    // Retry the (astronomically unlikely) case of a scalar outside of the curve order.
    let secret_key = loop {
        let secret = random_secret("generating a secp256k1 key")?;
        if let Ok(secret_key) = SecretKey::from_slice(&secret[..]) {
            break secret_key;
        }
    };
    let public_key = PublicKey::from_secret_key(&secp, &secret_key);
    debug!("Created secp256k1 key pair");

    Ok(EcdsaKeyPair {
        private_key: Zeroizing::new(encode_hex(secret_key.secret_bytes())),
        uncompressed_public_key: encode_hex(serialize_secp256k1_public_key(
            &public_key,
            PublicKeyEncoding::Uncompressed,
        )),
        compressed_public_key: encode_hex(serialize_secp256k1_public_key(
            &public_key,
            PublicKeyEncoding::Compressed,
        )),
    })
}

/// Creates a new ed25519 key pair.
///
/// # Errors
///
/// Returns an [`Error::RandomSource`] if the random source of the operating system fails.
///
/// # Examples
///
/// ```
/// use walletsign_crypto::key::create_eddsa_key_pair;
///
/// # fn main() -> testresult::TestResult {
/// let pair = create_eddsa_key_pair()?;
/// assert_eq!(pair.private_key.len(), 128);
/// assert!(pair.private_key.ends_with(&pair.public_key));
/// # Ok(())
/// # }
/// ```
pub fn create_eddsa_key_pair() -> Result<EdDsaKeyPair, Error> {
    let seed = random_secret("generating an ed25519 key")?;
    let signing_key = SigningKey::from_bytes(&seed);
    debug!("Created ed25519 key pair");

    Ok(EdDsaKeyPair {
        private_key: Zeroizing::new(encode_hex(signing_key.to_keypair_bytes())),
        public_key: encode_hex(signing_key.verifying_key().to_bytes()),
    })
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rstest::rstest;
    use testresult::TestResult;

    use super::*;
    use crate::codec::{decode_hex, encode_secp256k1_public_key};

    #[rstest]
    #[case("ecdsa", SignatureScheme::Ecdsa)]
    #[case("ECDSA", SignatureScheme::Ecdsa)]
    #[case("eddsa", SignatureScheme::EdDsa)]
    #[case("EdDSA", SignatureScheme::EdDsa)]
    fn signature_scheme_from_str(
        #[case] input: &str,
        #[case] expected: SignatureScheme,
    ) -> TestResult {
        assert_eq!(SignatureScheme::from_str(input)?, expected);
        Ok(())
    }

    #[test]
    fn signature_scheme_serialization() -> TestResult {
        assert_eq!(SignatureScheme::EdDsa.to_string(), "eddsa");
        assert_eq!(serde_json::to_string(&SignatureScheme::Ecdsa)?, "\"ecdsa\"");
        assert!(SignatureScheme::from_str("rsa").is_err());
        Ok(())
    }

    #[test]
    fn ecdsa_key_pair_encodings_are_consistent() -> TestResult {
        let pair = create_ecdsa_key_pair()?;
        let uncompressed = decode_hex(&pair.uncompressed_public_key)?;
        let compressed = decode_hex(&pair.compressed_public_key)?;

        assert_eq!(decode_hex(&pair.private_key)?.len(), 32);
        assert_eq!(uncompressed.len(), 65);
        assert_eq!(uncompressed[0], 0x04);
        assert_eq!(compressed.len(), 33);
        assert_eq!(
            encode_secp256k1_public_key(&uncompressed, PublicKeyEncoding::Compressed)?,
            compressed
        );
        Ok(())
    }

    #[test]
    fn eddsa_private_key_embeds_public_key() -> TestResult {
        let pair = create_eddsa_key_pair()?;
        let private_key = decode_hex(&pair.private_key)?;

        assert_eq!(private_key.len(), 64);
        assert_eq!(&private_key[32..], decode_hex(&pair.public_key)?.as_slice());
        Ok(())
    }

    #[test]
    fn generated_key_pairs_differ() -> TestResult {
        assert_ne!(
            create_ecdsa_key_pair()?.compressed_public_key,
            create_ecdsa_key_pair()?.compressed_public_key
        );
        assert_ne!(
            create_eddsa_key_pair()?.public_key,
            create_eddsa_key_pair()?.public_key
        );
        Ok(())
    }

    #[test]
    fn secrets_are_redacted_in_debug_output() -> TestResult {
        let pair = create_eddsa_key_pair()?;
        let key = Key::from(pair.clone());

        assert!(!format!("{pair:?}").contains(pair.private_key.as_str()));
        assert!(!format!("{key:?}").contains(pair.private_key.as_str()));
        assert_eq!(
            format!("{:?}", PrivateKey::new(vec![1, 2, 3])),
            "PrivateKey([REDACTED])"
        );
        Ok(())
    }

    #[test]
    fn ecdsa_key_record_uses_uncompressed_public_key() -> TestResult {
        let pair = create_ecdsa_key_pair()?;
        let uncompressed = pair.uncompressed_public_key.clone();
        let key = Key::from(pair);

        assert_eq!(key.scheme, SignatureScheme::Ecdsa);
        assert_eq!(key.public_key, uncompressed);
        Ok(())
    }
}
