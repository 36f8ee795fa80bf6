//! Private keys indexed by public key.

use std::path::Path;

use log::{debug, error, info, warn};
use walletsign_crypto::{
    codec::{
        ED25519_PUBLIC_KEY_LENGTH,
        PublicKeyEncoding,
        decode_hex,
        encode_hex,
        encode_secp256k1_public_key,
    },
    key::{Key, PrivateKey, SignatureScheme},
};
use zeroize::Zeroizing;

use crate::{
    Error,
    backend::{KeyValueStore, SledStore, WriteBatch},
    report::{KeyOutcome, StoreReport},
};

/// A store of private keys indexed by their public key.
///
/// Entries are keyed by the lower-case hexadecimal text of the public key and hold the raw private
/// key bytes. Public keys of ECDSA entries are re-encoded to the store's [`PublicKeyEncoding`]
/// before use, so that a key stored with one encoding is found with the other.
///
/// The store does not check that a private key belongs to its public key.
#[derive(Debug)]
pub struct KeyStore<S: KeyValueStore = SledStore> {
    store: S,
    encoding: PublicKeyEncoding,
}

impl KeyStore<SledStore> {
    /// Opens a [`KeyStore`] backed by the [`SledStore`] at `path`.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::StoreIo`] if the database can not be opened.
    pub fn open(path: impl AsRef<Path>, encoding: PublicKeyEncoding) -> Result<Self, Error> {
        Ok(Self::new(SledStore::open(path)?, encoding))
    }
}

impl<S: KeyValueStore> KeyStore<S> {
    /// Creates a new [`KeyStore`] on top of `store`.
    pub fn new(store: S, encoding: PublicKeyEncoding) -> Self {
        Self { store, encoding }
    }

    /// Returns the encoding used for the public keys of ECDSA entries.
    pub fn encoding(&self) -> PublicKeyEncoding {
        self.encoding
    }

    /// Returns the storage key for `public_key`.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::Decode`] if
    /// * `public_key` is not valid hexadecimal text,
    /// * `public_key` is not a secp256k1 point for [`SignatureScheme::Ecdsa`],
    /// * or `public_key` is not 32 bytes long for [`SignatureScheme::EdDsa`].
    pub fn normalize_public_key(
        &self,
        scheme: SignatureScheme,
        public_key: &str,
    ) -> Result<String, Error> {
        let bytes = decode_hex(public_key)?;
        let bytes = match scheme {
            SignatureScheme::Ecdsa => encode_secp256k1_public_key(&bytes, self.encoding)?,
            SignatureScheme::EdDsa => {
                if bytes.len() != ED25519_PUBLIC_KEY_LENGTH {
                    return Err(walletsign_crypto::Error::InvalidLength {
                        context: "ed25519 public key",
                        expected: ED25519_PUBLIC_KEY_LENGTH,
                        actual: bytes.len(),
                    }
                    .into());
                }
                bytes
            }
        };
        Ok(encode_hex(bytes))
    }

    /// Returns the private key stored for `public_key`.
    ///
    /// # Errors
    ///
    /// Returns an error if
    /// * `public_key` can not be decoded ([`Error::Decode`]),
    /// * no private key is stored for `public_key` ([`Error::KeyNotFound`]),
    /// * or the storage engine fails ([`Error::StoreIo`]).
    pub fn get_private_key(
        &self,
        scheme: SignatureScheme,
        public_key: &str,
    ) -> Result<PrivateKey, Error> {
        let public_key = self.normalize_public_key(scheme, public_key)?;
        match self.store.get(public_key.as_bytes()) {
            Ok(Some(private_key)) => {
                debug!("Found {scheme} private key for public key {public_key}");
                Ok(PrivateKey::new(private_key.to_vec()))
            }
            Ok(None) => {
                warn!("No {scheme} private key stored for public key {public_key}");
                Err(Error::KeyNotFound { public_key })
            }
            Err(error) => {
                error!(
                    "Looking up {scheme} private key for public key {public_key} failed: {error}"
                );
                Err(error)
            }
        }
    }

    /// Decodes `key` into its storage key and raw private key bytes.
    fn prepare(&self, key: &Key) -> Result<(String, Zeroizing<Vec<u8>>), Error> {
        let public_key = self.normalize_public_key(key.scheme, &key.public_key)?;
        let private_key = Zeroizing::new(decode_hex(&key.private_key)?);
        Ok((public_key, private_key))
    }

    /// Stores `keys` one after the other.
    ///
    /// Storing stops at the first key that can not be decoded or written, leaving all earlier
    /// keys stored and all later keys untouched. Storing a key whose public key is already
    /// present replaces the private key. The store is flushed afterwards.
    ///
    /// Returns a [`StoreReport`] with one [`KeyOutcome`] per key in `keys`.
    pub fn store_keys(&self, keys: &[Key]) -> StoreReport {
        let mut report = StoreReport::default();
        let mut failed = false;

        for key in keys {
            if failed {
                report.push(KeyOutcome::Skipped);
                continue;
            }
            let result = self.prepare(key).and_then(|(public_key, private_key)| {
                self.store.put(public_key.as_bytes(), &private_key)?;
                Ok(public_key)
            });
            match result {
                Ok(public_key) => {
                    debug!("Stored {} private key for public key {public_key}", key.scheme);
                    report.push(KeyOutcome::Stored);
                }
                Err(error) => {
                    error!(
                        "Storing {} key for public key {} failed: {error}",
                        key.scheme, key.public_key
                    );
                    report.push(KeyOutcome::Failed(error));
                    failed = true;
                }
            }
        }

        if let Err(error) = self.store.flush() {
            error!("Flushing the key store failed: {error}");
            report.set_flush_failure(error);
        }
        if failed {
            warn!(
                "Stored {} of {} keys before the first failure",
                report.stored(),
                keys.len()
            );
        } else {
            info!("Stored {} keys", report.stored());
        }

        report
    }

    /// Stores all `keys` or none of them.
    ///
    /// Every key is decoded before anything is written, then all keys are written in one atomic
    /// batch and the store is flushed.
    ///
    /// Returns the number of stored keys.
    ///
    /// # Errors
    ///
    /// Returns an error if
    /// * any key can not be decoded ([`Error::Decode`]),
    /// * or the storage engine fails ([`Error::StoreIo`]).
    pub fn store_keys_atomic(&self, keys: &[Key]) -> Result<usize, Error> {
        let mut batch = WriteBatch::new();
        for (index, key) in keys.iter().enumerate() {
            let (public_key, private_key) = self.prepare(key).inspect_err(|error| {
                error!(
                    "Key {index} ({} public key {}) can not be stored: {error}",
                    key.scheme, key.public_key
                );
            })?;
            batch.insert(public_key.into_bytes(), private_key);
        }

        let count = batch.len();
        self.store.apply_batch(batch).inspect_err(|error| {
            error!("Storing a batch of {count} keys failed: {error}");
        })?;
        self.store.flush()?;
        info!("Stored {count} keys atomically");

        Ok(count)
    }

    /// Removes the private key stored for `public_key`.
    ///
    /// Returns whether a private key has been removed.
    ///
    /// # Errors
    ///
    /// Returns an error if
    /// * `public_key` can not be decoded ([`Error::Decode`]),
    /// * or the storage engine fails ([`Error::StoreIo`]).
    pub fn delete_key(&self, scheme: SignatureScheme, public_key: &str) -> Result<bool, Error> {
        let public_key = self.normalize_public_key(scheme, public_key)?;
        let removed = self.store.delete(public_key.as_bytes())?;
        self.store.flush()?;
        if removed {
            info!("Deleted {scheme} private key for public key {public_key}");
        } else {
            warn!("No {scheme} private key to delete for public key {public_key}");
        }

        Ok(removed)
    }
}
