//! Signing of wallet transactions with locally stored or HSM-backed keys.
//!
//! A [`SigningRouter`] signs [`SigningRequest`]s either with private keys from the embedded key
//! store or, for ECDSA, with a single key that never leaves the HSM of a key management service.
//!
//! # Examples
//!
//! ```
//! use walletsign::{Backend, SigningRequest, SigningRouter, verify};
//! use walletsign_crypto::{codec::PublicKeyEncoding, key::SignatureScheme};
//! use walletsign_keystore::{KeyStore, SledStore};
//!
//! # fn main() -> testresult::TestResult {
//! let keystore = KeyStore::new(SledStore::temporary()?, PublicKeyEncoding::Uncompressed);
//! let router = SigningRouter::new(keystore, Backend::Software);
//!
//! let key = router.generate(SignatureScheme::EdDsa)?;
//! let request = SigningRequest::new(SignatureScheme::EdDsa, key.public_key.clone(), "0x".into());
//! let signature = router.sign(&request)?;
//! assert!(verify(SignatureScheme::EdDsa, &key.public_key, "0x", &signature)?);
//! # Ok(())
//! # }
//! ```

pub mod cli;
mod error;
pub mod router;

pub use error::Error;
pub use router::{Backend, SigningRequest, SigningRouter, kms_client, verify};
