//! Remote signing with HSM-backed keys of a cloud key management service.
//!
//! A [`KmsClient`] authenticates with service account credentials and talks to the REST API of
//! the key management service. It signs digests with keys whose private key material never
//! leaves the HSM and provisions key rings and signing keys.
//!
//! [`KmsSigningKey`] exposes a remote key as a
//! [`RawSigningKey`][`walletsign_crypto::signer::traits::RawSigningKey`].

mod client;
mod credentials;
mod error;
mod key_name;
mod retry;
mod signer;

pub use client::{DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_SECONDS, KeyAlgorithm, KmsClient, KmsOptions};
pub use credentials::{CLOUD_KMS_SCOPE, ServiceAccountCredentials};
pub use error::{ApiErrorMessage, Error};
pub use key_name::{CryptoKeyName, validate_id};
pub use retry::{DEFAULT_BACKOFF, DEFAULT_MAX_ATTEMPTS, RetryPolicy};
pub use signer::KmsSigningKey;
