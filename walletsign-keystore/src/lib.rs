//! Persistent storage of private keys indexed by public key.
//!
//! A [`KeyStore`] maps the public key of a key pair to its raw private key.
//! It sits on top of a [`KeyValueStore`], which is implemented for [`sled`] databases by
//! [`SledStore`].
//!
//! # Examples
//!
//! ```
//! use walletsign_crypto::{
//!     codec::PublicKeyEncoding,
//!     key::{Key, SignatureScheme, create_ecdsa_key_pair},
//! };
//! use walletsign_keystore::{KeyStore, SledStore};
//!
//! # fn main() -> testresult::TestResult {
//! let keystore = KeyStore::new(SledStore::temporary()?, PublicKeyEncoding::Uncompressed);
//! let pair = create_ecdsa_key_pair()?;
//! let compressed = pair.compressed_public_key.clone();
//!
//! assert!(keystore.store_keys(&[Key::from(pair)]).is_complete());
//! let private_key = keystore.get_private_key(SignatureScheme::Ecdsa, &compressed)?;
//! assert_eq!(private_key.expose_bytes().len(), 32);
//! # Ok(())
//! # }
//! ```

pub mod backend;
mod error;
mod keystore;
pub mod report;

pub use backend::{KeyValueStore, SledStore, WriteBatch};
pub use error::Error;
pub use keystore::KeyStore;
pub use report::{KeyOutcome, StoreReport};
