//! Conversion between hexadecimal text and raw key, digest and signature bytes.
//!
//! Hexadecimal text may carry an optional `0x` (or `0X`) prefix and may use upper- or lower-case
//! digits. Encoded output is always lower-case and unprefixed.

use secp256k1::PublicKey;
use serde::{Deserialize, Serialize};

use crate::Error;

/// The length of a digest signed by ECDSA and remote signers.
pub const DIGEST_LENGTH: usize = 32;

/// The length of a compressed secp256k1 public key.
pub const COMPRESSED_PUBLIC_KEY_LENGTH: usize = 33;

/// The length of an uncompressed secp256k1 public key.
pub const UNCOMPRESSED_PUBLIC_KEY_LENGTH: usize = 65;

/// The length of an ed25519 public key.
pub const ED25519_PUBLIC_KEY_LENGTH: usize = 32;

/// The byte encoding of a secp256k1 public key.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Eq,
    Hash,
    PartialEq,
    Serialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
pub enum PublicKeyEncoding {
    /// The 33-byte SEC1 encoding (`0x02`/`0x03` prefix followed by X).
    Compressed,

    /// The 65-byte SEC1 encoding (`0x04` prefix followed by X and Y).
    #[default]
    Uncompressed,
}

/// Decodes hexadecimal `text` into bytes.
///
/// An empty string decodes to an empty byte vector.
///
/// # Errors
///
/// Returns an [`Error::Decode`] if `text` has an odd length or contains non-hexadecimal
/// characters.
///
/// # Examples
///
/// ```
/// use walletsign_crypto::codec::decode_hex;
///
/// # fn main() -> testresult::TestResult {
/// assert_eq!(decode_hex("0x00ff")?, vec![0, 255]);
/// assert_eq!(decode_hex("00FF")?, vec![0, 255]);
/// assert!(decode_hex("0xzz").is_err());
/// # Ok(())
/// # }
/// ```
pub fn decode_hex(text: &str) -> Result<Vec<u8>, Error> {
    let text = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    Ok(hex::decode(text)?)
}

/// Encodes `bytes` as lower-case hexadecimal text without prefix.
pub fn encode_hex(bytes: impl AsRef<[u8]>) -> String {
    hex::encode(bytes)
}

/// Decodes hexadecimal `text` into a digest of exactly [`DIGEST_LENGTH`] bytes.
///
/// # Errors
///
/// Returns an error if
/// * `text` is not valid hexadecimal text,
/// * or the decoded data is not exactly [`DIGEST_LENGTH`] bytes long.
pub fn decode_digest(text: &str) -> Result<[u8; DIGEST_LENGTH], Error> {
    let bytes = decode_hex(text)?;
    <[u8; DIGEST_LENGTH]>::try_from(bytes.as_slice()).map_err(|_| Error::InvalidLength {
        context: "digest",
        expected: DIGEST_LENGTH,
        actual: bytes.len(),
    })
}

/// Re-encodes a secp256k1 public key into `encoding`.
///
/// `public_key` may use either encoding.
///
/// # Errors
///
/// Returns an [`Error::InvalidPublicKey`] if `public_key` is not a valid point on the curve.
///
/// # Examples
///
/// ```
/// use walletsign_crypto::codec::{PublicKeyEncoding, decode_hex, encode_secp256k1_public_key};
///
/// # fn main() -> testresult::TestResult {
/// let compressed =
///     decode_hex("028846b3ce4376e8d58c83c1c6420a784caa675d7f26c496f499585d09891af8fc")?;
/// let uncompressed = encode_secp256k1_public_key(&compressed, PublicKeyEncoding::Uncompressed)?;
///
/// assert_eq!(uncompressed.len(), 65);
/// assert_eq!(
///     encode_secp256k1_public_key(&uncompressed, PublicKeyEncoding::Compressed)?,
///     compressed
/// );
/// # Ok(())
/// # }
/// ```
pub fn encode_secp256k1_public_key(
    public_key: &[u8],
    encoding: PublicKeyEncoding,
) -> Result<Vec<u8>, Error> {
    let public_key = parse_secp256k1_public_key(public_key)?;
    Ok(serialize_secp256k1_public_key(&public_key, encoding))
}

/// Parses a secp256k1 public key in either encoding.
pub(crate) fn parse_secp256k1_public_key(public_key: &[u8]) -> Result<PublicKey, Error> {
    PublicKey::from_slice(public_key).map_err(|error| Error::InvalidPublicKey {
        context: format!(
            "{} bytes do not encode a secp256k1 point: {error}",
            public_key.len()
        ),
    })
}

/// Serializes a secp256k1 public key using `encoding`.
pub(crate) fn serialize_secp256k1_public_key(
    public_key: &PublicKey,
    encoding: PublicKeyEncoding,
) -> Vec<u8> {
    match encoding {
        PublicKeyEncoding::Compressed => public_key.serialize().to_vec(),
        PublicKeyEncoding::Uncompressed => public_key.serialize_uncompressed().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rstest::rstest;
    use testresult::TestResult;

    use super::*;

    const COMPRESSED: &str = "028846b3ce4376e8d58c83c1c6420a784caa675d7f26c496f499585d09891af8fc";
    const UNCOMPRESSED: &str = "048846b3ce4376e8d58c83c1c6420a784caa675d7f26c496f499585d09891af8fc9167a4b658b57b28211783cdee651caa8b5341b753fa39c995317670123f12d8";

    #[rstest]
    #[case("", Some(vec![]))]
    #[case("0x", Some(vec![]))]
    #[case("0X0a0B", Some(vec![10, 11]))]
    #[case("deadBEEF", Some(vec![0xde, 0xad, 0xbe, 0xef]))]
    #[case("abc", None)]
    #[case("0xgg", None)]
    #[case("0x0x00", None)]
    fn hex_decoding(#[case] input: &str, #[case] expected: Option<Vec<u8>>) -> TestResult {
        match expected {
            Some(expected) => assert_eq!(decode_hex(input)?, expected),
            None => assert!(matches!(decode_hex(input), Err(Error::Decode(_)))),
        }
        Ok(())
    }

    #[test]
    fn hex_encoding_is_lower_case_without_prefix() {
        assert_eq!(encode_hex([0xde, 0xad, 0x0f]), "dead0f");
    }

    #[rstest]
    #[case("0x3e4f9a460233ec33862da1ac3dabf5b32db01400fba166cdec40ad6dc735b4ab")]
    #[case("3e4f9a460233ec33862da1ac3dabf5b32db01400fba166cdec40ad6dc735b4ab")]
    fn digest_decoding(#[case] input: &str) -> TestResult {
        let digest = decode_digest(input)?;
        assert_eq!(digest[0], 0x3e);
        assert_eq!(digest[31], 0xab);
        Ok(())
    }

    #[rstest]
    #[case("00", 1)]
    #[case("", 0)]
    #[case("3e4f9a460233ec33862da1ac3dabf5b32db01400fba166cdec40ad6dc735b4ab00", 33)]
    fn digest_with_wrong_length_is_rejected(#[case] input: &str, #[case] length: usize) {
        let error = decode_digest(input).unwrap_err();
        assert!(error.is_decode());
        assert!(matches!(
            error,
            Error::InvalidLength { actual, expected: DIGEST_LENGTH, .. } if actual == length
        ));
    }

    #[rstest]
    #[case(COMPRESSED, PublicKeyEncoding::Uncompressed, UNCOMPRESSED)]
    #[case(COMPRESSED, PublicKeyEncoding::Compressed, COMPRESSED)]
    #[case(UNCOMPRESSED, PublicKeyEncoding::Compressed, COMPRESSED)]
    #[case(UNCOMPRESSED, PublicKeyEncoding::Uncompressed, UNCOMPRESSED)]
    fn public_key_reencoding(
        #[case] input: &str,
        #[case] encoding: PublicKeyEncoding,
        #[case] expected: &str,
    ) -> TestResult {
        let encoded = encode_secp256k1_public_key(&decode_hex(input)?, encoding)?;
        assert_eq!(encode_hex(encoded), expected);
        Ok(())
    }

    #[test]
    fn public_key_not_on_curve_is_rejected() -> TestResult {
        let mut bytes = decode_hex(COMPRESSED)?;
        bytes[0] = 0x05;
        assert!(matches!(
            encode_secp256k1_public_key(&bytes, PublicKeyEncoding::Compressed),
            Err(Error::InvalidPublicKey { .. })
        ));
        Ok(())
    }

    #[rstest]
    #[case("compressed", PublicKeyEncoding::Compressed)]
    #[case("Uncompressed", PublicKeyEncoding::Uncompressed)]
    fn public_key_encoding_from_str(
        #[case] input: &str,
        #[case] expected: PublicKeyEncoding,
    ) -> TestResult {
        assert_eq!(PublicKeyEncoding::from_str(input)?, expected);
        assert_eq!(expected.to_string(), input.to_lowercase());
        Ok(())
    }
}
