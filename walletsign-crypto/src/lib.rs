//! Key encoding, key generation and software signing for walletsign.
//!
//! Two signature schemes are supported:
//!
//! - ECDSA over secp256k1, signing 32-byte digests with deterministic (RFC 6979) nonces and
//!   producing 65-byte `r ‖ s ‖ recovery id` signatures.
//! - EdDSA over ed25519, signing raw messages and producing 64-byte signatures.
//!
//! All textual key, digest and signature material is hexadecimal (see [`codec`]).
//! Signing backends share the [`RawSigningKey`][`signer::traits::RawSigningKey`] capability, which
//! is implemented in software here and remotely by other crates.
//!
//! # Examples
//!
//! ```
//! use walletsign_crypto::{
//!     key::create_ecdsa_key_pair,
//!     signer::{sign_ecdsa, verify_ecdsa},
//! };
//!
//! # fn main() -> testresult::TestResult {
//! let pair = create_ecdsa_key_pair()?;
//! let digest = "3e4f9a460233ec33862da1ac3dabf5b32db01400fba166cdec40ad6dc735b4ab";
//! let signature = sign_ecdsa(&pair.private_key, digest)?;
//!
//! assert!(verify_ecdsa(&pair.compressed_public_key, digest, &signature)?);
//! # Ok(())
//! # }
//! ```

pub mod codec;
mod error;
pub mod key;
pub mod signer;

pub use error::Error;
