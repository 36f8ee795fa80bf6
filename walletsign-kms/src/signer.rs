//! Signing with HSM-backed keys.

use std::sync::Arc;

use walletsign_crypto::{
    codec::DIGEST_LENGTH,
    key::SignatureScheme,
    signer::traits::RawSigningKey,
};

use crate::{client::KmsClient, key_name::CryptoKeyName};

/// A secp256k1 signing key that resides in an HSM of the key management service.
///
/// Only the name of the key is known locally.
#[derive(Clone, Debug)]
pub struct KmsSigningKey {
    client: Arc<KmsClient>,
    key_name: CryptoKeyName,
}

impl KmsSigningKey {
    /// Creates a new [`KmsSigningKey`] for the key version `key_name`.
    pub fn new(client: Arc<KmsClient>, key_name: CryptoKeyName) -> Self {
        Self { client, key_name }
    }

    /// Returns the name of the key version.
    pub fn key_name(&self) -> &CryptoKeyName {
        &self.key_name
    }
}

impl RawSigningKey for KmsSigningKey {
    fn key_id(&self) -> String {
        self.key_name.to_string()
    }

    fn scheme(&self) -> SignatureScheme {
        SignatureScheme::Ecdsa
    }

    /// Signs the 32-byte digest `payload` remotely.
    ///
    /// # Errors
    ///
    /// Returns an error if
    /// * `payload` is not exactly 32 bytes long,
    /// * or the key management service fails to sign.
    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, walletsign_crypto::Error> {
        let digest = <[u8; DIGEST_LENGTH]>::try_from(payload).map_err(|_| {
            walletsign_crypto::Error::InvalidLength {
                context: "digest",
                expected: DIGEST_LENGTH,
                actual: payload.len(),
            }
        })?;

        self.client
            .asymmetric_sign(&self.key_name, &digest)
            .map_err(|source| walletsign_crypto::Error::Hsm {
                context: "signing a digest with a remote key",
                source: Box::new(source),
            })
    }
}
