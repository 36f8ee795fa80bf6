//! Service account credentials and OAuth 2.0 token assertions.

use std::{
    fmt::{Debug, Formatter},
    fs::read_to_string,
    path::Path,
};

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, Utc};
use log::debug;
use rsa::{
    RsaPrivateKey,
    pkcs1v15::SigningKey,
    pkcs8::DecodePrivateKey,
    signature::{SignatureEncoding, Signer},
};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use url::Url;
use zeroize::Zeroizing;

use crate::Error;

/// The OAuth 2.0 scope granting access to the key management service.
pub const CLOUD_KMS_SCOPE: &str = "https://www.googleapis.com/auth/cloudkms";

/// The lifetime of a token assertion in seconds.
const ASSERTION_LIFETIME: i64 = 3600;

/// The on-disk representation of service account credentials.
#[derive(Deserialize)]
struct CredentialsFile {
    client_email: String,
    private_key: Zeroizing<String>,
    #[serde(default)]
    private_key_id: Option<String>,
    token_uri: Url,
}

#[derive(Serialize)]
struct AssertionHeader<'a> {
    alg: &'static str,
    typ: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    kid: Option<&'a str>,
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

/// Credentials of a service account that is allowed to use the key management service.
///
/// The credentials are read from the JSON key file of the service account.
/// Their RSA private key is only used to sign token assertions and is never exposed.
pub struct ServiceAccountCredentials {
    client_email: String,
    private_key_id: Option<String>,
    token_uri: Url,
    signing_key: SigningKey<Sha256>,
}

impl ServiceAccountCredentials {
    /// Reads [`ServiceAccountCredentials`] from the JSON key file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if
    /// * the file can not be read,
    /// * the file is not a valid service account key file,
    /// * or the private key is not a PKCS#8 PEM encoded RSA key.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let contents = read_to_string(path)
            .map(Zeroizing::new)
            .map_err(|source| Error::CredentialsFile {
                path: path.to_path_buf(),
                source,
            })?;
        let credentials = Self::from_json(&contents)?;
        debug!(
            "Read credentials of service account {} from {}",
            credentials.client_email,
            path.display()
        );

        Ok(credentials)
    }

    /// Creates [`ServiceAccountCredentials`] from the contents of a JSON key file.
    ///
    /// # Errors
    ///
    /// Returns an error if
    /// * `json` is not a valid service account key file,
    /// * or the private key is not a PKCS#8 PEM encoded RSA key.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let file: CredentialsFile = serde_json::from_str(json)?;
        let private_key = RsaPrivateKey::from_pkcs8_pem(&file.private_key)?;

        Ok(Self {
            client_email: file.client_email,
            private_key_id: file.private_key_id,
            token_uri: file.token_uri,
            signing_key: SigningKey::<Sha256>::new(private_key),
        })
    }

    /// Returns the e-mail address identifying the service account.
    pub fn client_email(&self) -> &str {
        &self.client_email
    }

    /// Returns the URL of the token endpoint.
    pub fn token_uri(&self) -> &Url {
        &self.token_uri
    }

    /// Creates a signed token assertion (an RS256 JSON Web Token) for `scope`, issued at `now`.
    ///
    /// The assertion is exchanged for an access token at the token endpoint.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::TokenAssertion`] if signing fails.
    pub fn assertion(&self, scope: &str, now: DateTime<Utc>) -> Result<Zeroizing<String>, Error> {
        let issued_at = now.timestamp();
        let header = AssertionHeader {
            alg: "RS256",
            typ: "JWT",
            kid: self.private_key_id.as_deref(),
        };
        let claims = AssertionClaims {
            iss: &self.client_email,
            scope,
            aud: self.token_uri.as_str(),
            iat: issued_at,
            exp: issued_at + ASSERTION_LIFETIME,
        };

        let signing_input = format!(
            "{}.{}",
            Base64UrlUnpadded::encode_string(&serde_json::to_vec(&header)?),
            Base64UrlUnpadded::encode_string(&serde_json::to_vec(&claims)?),
        );
        let signature = self.signing_key.try_sign(signing_input.as_bytes())?;

        Ok(Zeroizing::new(format!(
            "{signing_input}.{}",
            Base64UrlUnpadded::encode_string(&signature.to_bytes())
        )))
    }
}

impl Debug for ServiceAccountCredentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountCredentials")
            .field("client_email", &self.client_email)
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri.as_str())
            .field("signing_key", &"[REDACTED]")
            .finish()
    }
}
