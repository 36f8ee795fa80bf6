//! Routing of signing requests to a signing backend.

use std::sync::Arc;

use log::{debug, info};
use walletsign_config::Config;
use walletsign_crypto::{
    codec::{decode_digest, decode_hex, encode_hex},
    key::{Key, SignatureScheme, create_ecdsa_key_pair, create_eddsa_key_pair},
    signer::{software_signing_key, traits::RawSigningKey},
};
use walletsign_keystore::{KeyStore, KeyValueStore, SledStore, StoreReport};
use walletsign_kms::{KmsClient, KmsSigningKey};

use crate::Error;

/// A request to sign a payload with the key identified by a public key.
///
/// For ECDSA the payload is a 32-byte digest, for EdDSA the message itself.
/// Both `public_key` and `payload` are hexadecimal text.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SigningRequest {
    /// The signature scheme to sign with.
    pub scheme: SignatureScheme,
    /// The public key identifying the signing key.
    pub public_key: String,
    /// The payload to sign.
    pub payload: String,
}

impl SigningRequest {
    /// Creates a new [`SigningRequest`].
    pub fn new(scheme: SignatureScheme, public_key: String, payload: String) -> Self {
        Self {
            scheme,
            public_key,
            payload,
        }
    }
}

/// The backend that creates signatures.
#[derive(Clone, Debug)]
pub enum Backend {
    /// Signs with private keys from the key store.
    Software,

    /// Signs ECDSA digests with a single key that resides in an HSM.
    Hsm(KmsSigningKey),
}

impl Backend {
    /// Returns the name of the backend for messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Software => "software",
            Self::Hsm(_) => "HSM",
        }
    }
}

/// Dispatches signing requests to the backend selected at construction.
///
/// The router owns the key store, which is used for software signing and key management
/// regardless of the backend.
#[derive(Debug)]
pub struct SigningRouter<S: KeyValueStore = SledStore> {
    keystore: KeyStore<S>,
    backend: Backend,
}

impl SigningRouter<SledStore> {
    /// Creates a [`SigningRouter`] from `config`.
    ///
    /// Opens the key store at the configured storage path and, if `hsm_enable` is set, sets up
    /// the HSM backend with the configured key.
    ///
    /// # Errors
    ///
    /// Returns an error if
    /// * the configuration is invalid,
    /// * the key store can not be opened,
    /// * or the key management service client can not be created.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        config.validate()?;
        let keystore = KeyStore::open(&config.storage_path, config.public_key_encoding)?;
        let backend = if config.hsm_enable {
            let key_name = config
                .key_name
                .clone()
                .ok_or(walletsign_config::Error::MissingHsmSetting {
                    setting: "key_name",
                })?;
            Backend::Hsm(KmsSigningKey::new(
                Arc::new(kms_client(config)?),
                key_name,
            ))
        } else {
            Backend::Software
        };
        info!("Signing with the {} backend", backend.name());

        Ok(Self::new(keystore, backend))
    }
}

impl<S: KeyValueStore> SigningRouter<S> {
    /// Creates a new [`SigningRouter`].
    pub fn new(keystore: KeyStore<S>, backend: Backend) -> Self {
        Self { keystore, backend }
    }

    /// Returns the backend.
    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Returns the key store.
    pub fn keystore(&self) -> &KeyStore<S> {
        &self.keystore
    }

    /// Signs the payload of `request`.
    ///
    /// With the software backend the private key for the request's public key is looked up in the
    /// key store. With the HSM backend the configured remote key signs and the request's public
    /// key is not used.
    ///
    /// Returns the signature as hexadecimal text.
    ///
    /// # Errors
    ///
    /// Returns an error if
    /// * the public key or payload can not be decoded,
    /// * no private key is stored for the public key,
    /// * the HSM backend is asked to sign with EdDSA,
    /// * or the signing operation fails.
    pub fn sign(&self, request: &SigningRequest) -> Result<String, Error> {
        let signature = match &self.backend {
            Backend::Software => {
                let private_key = self
                    .keystore
                    .get_private_key(request.scheme, &request.public_key)?;
                let signing_key = software_signing_key(request.scheme, &private_key)?;
                signing_key.sign(&decode_payload(request)?)?
            }
            Backend::Hsm(signing_key) => {
                if request.scheme != signing_key.scheme() {
                    return Err(walletsign_crypto::Error::UnsupportedScheme(request.scheme).into());
                }
                debug!(
                    "Signing for public key {} with remote key {}",
                    request.public_key,
                    signing_key.key_id()
                );
                signing_key.sign(&decode_payload(request)?)?
            }
        };

        Ok(encode_hex(signature))
    }

    /// Stores `keys` one after the other, stopping at the first failure.
    ///
    /// See [`KeyStore::store_keys`].
    pub fn store_keys(&self, keys: &[Key]) -> StoreReport {
        self.keystore.store_keys(keys)
    }

    /// Stores all `keys` or none of them.
    ///
    /// # Errors
    ///
    /// See [`KeyStore::store_keys_atomic`].
    pub fn store_keys_atomic(&self, keys: &[Key]) -> Result<usize, Error> {
        Ok(self.keystore.store_keys_atomic(keys)?)
    }

    /// Removes the private key for `public_key` from the key store.
    ///
    /// Returns whether a private key has been removed.
    ///
    /// # Errors
    ///
    /// See [`KeyStore::delete_key`].
    pub fn delete_key(&self, scheme: SignatureScheme, public_key: &str) -> Result<bool, Error> {
        Ok(self.keystore.delete_key(scheme, public_key)?)
    }

    /// Generates a key pair for `scheme` and stores it in the key store.
    ///
    /// Returns the stored [`Key`].
    ///
    /// # Errors
    ///
    /// Returns an error if the key pair can not be generated or stored.
    pub fn generate(&self, scheme: SignatureScheme) -> Result<Key, Error> {
        let key = match scheme {
            SignatureScheme::Ecdsa => Key::from(create_ecdsa_key_pair()?),
            SignatureScheme::EdDsa => Key::from(create_eddsa_key_pair()?),
        };
        self.keystore.store_keys_atomic(std::slice::from_ref(&key))?;
        info!("Generated {scheme} key with public key {}", key.public_key);

        Ok(key)
    }
}

/// Verifies `signature` over `payload` with `public_key`.
///
/// Verification is local and needs neither the key store nor the HSM backend.
///
/// # Errors
///
/// Returns an error if any argument can not be decoded.
pub fn verify(
    scheme: SignatureScheme,
    public_key: &str,
    payload: &str,
    signature: &str,
) -> Result<bool, Error> {
    Ok(walletsign_crypto::signer::verify(
        scheme, public_key, payload, signature,
    )?)
}

/// Decodes the payload of `request` for its signature scheme.
fn decode_payload(request: &SigningRequest) -> Result<Vec<u8>, Error> {
    Ok(match request.scheme {
        SignatureScheme::Ecdsa => decode_digest(&request.payload)?.to_vec(),
        SignatureScheme::EdDsa => decode_hex(&request.payload)?,
    })
}

/// Creates a [`KmsClient`] from the credentials file and `kms` settings of `config`.
///
/// # Errors
///
/// Returns an error if
/// * `config` has no credentials file,
/// * the `kms` settings are invalid,
/// * or the credentials can not be read.
pub fn kms_client(config: &Config) -> Result<KmsClient, Error> {
    let credentials_file = config.credentials_file.as_ref().ok_or(
        walletsign_config::Error::MissingHsmSetting {
            setting: "credentials_file",
        },
    )?;

    Ok(KmsClient::connect(credentials_file, config.kms_options()?)?)
}
