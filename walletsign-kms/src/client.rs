//! A client for the REST API of the key management service.

use std::{
    fmt::{Debug, Formatter},
    path::Path,
    sync::{Mutex, PoisonError},
    time::Duration,
};

use base64ct::{Base64, Encoding};
use chrono::{DateTime, TimeDelta, Utc};
use log::{debug, error, info};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use ureq::{Agent, AgentBuilder};
use url::Url;
use walletsign_crypto::codec::DIGEST_LENGTH;
use zeroize::Zeroizing;

use crate::{
    Error,
    credentials::{CLOUD_KMS_SCOPE, ServiceAccountCredentials},
    key_name::{CryptoKeyName, validate_id},
    retry::RetryPolicy,
};

/// The default REST endpoint of the key management service.
pub const DEFAULT_ENDPOINT: &str = "https://cloudkms.googleapis.com/v1/";

/// The default timeout of requests in seconds.
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

/// Access tokens are renewed this long before they expire.
const TOKEN_EXPIRY_MARGIN: TimeDelta = TimeDelta::seconds(60);

/// The grant type of the OAuth 2.0 JWT bearer flow.
const JWT_BEARER_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// The algorithm of a key created with [`KmsClient::create_crypto_key`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    PartialEq,
    strum::Display,
    strum::EnumIter,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum KeyAlgorithm {
    /// ECDSA over secp256k1 with SHA-256 digests.
    #[default]
    #[strum(to_string = "ecdsa", serialize = "secp256k1")]
    EcdsaSecp256k1,

    /// RSA with 4096 bit keys and raw PKCS#1 v1.5 signatures.
    #[strum(to_string = "rsa", serialize = "rsa4096")]
    Rsa4096,
}

impl KeyAlgorithm {
    /// Returns the name of the key version algorithm in the API.
    pub fn api_name(&self) -> &'static str {
        match self {
            Self::EcdsaSecp256k1 => "EC_SIGN_SECP256K1_SHA256",
            Self::Rsa4096 => "RSA_SIGN_RAW_PKCS1_4096",
        }
    }
}

/// Options for connecting to the key management service.
#[derive(Clone, Debug)]
pub struct KmsOptions {
    /// The base URL of the REST API.
    pub endpoint: Url,
    /// The timeout for establishing a connection and for reading and writing a request.
    pub timeout: Duration,
    /// The retry policy for signing requests.
    pub retry: RetryPolicy,
}

impl KmsOptions {
    /// Creates [`KmsOptions`] for `endpoint` with the default timeout and retry policy.
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
            retry: RetryPolicy::default(),
        }
    }
}

/// A cached OAuth 2.0 access token.
struct AccessToken {
    token: Zeroizing<String>,
    expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// Returns whether the token can still be used at `now`.
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now + TOKEN_EXPIRY_MARGIN < self.expires_at
    }
}

impl Debug for AccessToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Zeroizing<String>,
    expires_in: i64,
}

#[derive(Serialize)]
struct Digest {
    sha256: String,
}

#[derive(Serialize)]
struct AsymmetricSignRequest {
    digest: Digest,
}

#[derive(Deserialize)]
struct AsymmetricSignResponse {
    signature: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CryptoKeyVersionTemplate {
    algorithm: &'static str,
    protection_level: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CryptoKeyRequest {
    purpose: &'static str,
    version_template: CryptoKeyVersionTemplate,
}

#[derive(Deserialize)]
struct CreatedResource {
    name: String,
}

/// An authenticated client for the key management service.
///
/// Private key material of HSM-backed keys never leaves the service: the client only ever sends
/// digests and receives signatures.
pub struct KmsClient {
    agent: Agent,
    credentials: ServiceAccountCredentials,
    options: KmsOptions,
    token: Mutex<Option<AccessToken>>,
}

impl KmsClient {
    /// Creates a [`KmsClient`] using the service account credentials file at `credentials_path`.
    ///
    /// No request is sent until the client is used.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials can not be read (see
    /// [`ServiceAccountCredentials::from_file`]).
    pub fn connect(credentials_path: impl AsRef<Path>, options: KmsOptions) -> Result<Self, Error> {
        let credentials_path = credentials_path.as_ref();
        let credentials = ServiceAccountCredentials::from_file(credentials_path).inspect_err(
            |error| {
                error!(
                    "Loading KMS credentials from {} failed: {error}",
                    credentials_path.display()
                )
            },
        )?;

        Ok(Self::new(credentials, options))
    }

    /// Creates a new [`KmsClient`] from `credentials`.
    pub fn new(credentials: ServiceAccountCredentials, options: KmsOptions) -> Self {
        info!(
            "KMS client for {} configured with endpoint {}, timeout {} s and {} attempts",
            credentials.client_email(),
            options.endpoint,
            options.timeout.as_secs(),
            options.retry.max_attempts
        );
        let agent = AgentBuilder::new()
            .timeout_connect(options.timeout)
            .timeout_read(options.timeout)
            .timeout_write(options.timeout)
            .build();

        Self {
            agent,
            credentials,
            options,
            token: Mutex::new(None),
        }
    }

    /// Returns the options of the client.
    pub fn options(&self) -> &KmsOptions {
        &self.options
    }

    /// Returns the URL of `path` below the endpoint.
    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.options.endpoint.as_str().trim_end_matches('/'),
            path
        )
    }

    /// Returns a valid access token, requesting a new one if the cached one is about to expire.
    fn access_token(&self) -> Result<Zeroizing<String>, Error> {
        let mut cached = self.token.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Utc::now();
        if let Some(token) = cached.as_ref().filter(|token| token.is_fresh(now)) {
            return Ok(token.token.clone());
        }

        let assertion = self.credentials.assertion(CLOUD_KMS_SCOPE, now)?;
        let response: TokenResponse = self
            .agent
            .post(self.credentials.token_uri().as_str())
            .send_form(&[
                ("grant_type", JWT_BEARER_GRANT_TYPE),
                ("assertion", assertion.as_str()),
            ])
            .map_err(|error| Error::from_ureq("requesting an access token", error))?
            .into_json()
            .map_err(|error| Error::InvalidResponse {
                context: "requesting an access token",
                reason: error.to_string(),
            })?;
        debug!(
            "Received access token for {} valid for {} s",
            self.credentials.client_email(),
            response.expires_in
        );

        let token = response.access_token.clone();
        *cached = Some(AccessToken {
            token: response.access_token,
            expires_at: now + TimeDelta::try_seconds(response.expires_in).unwrap_or_default(),
        });

        Ok(token)
    }

    /// Sends `body` to `path` and decodes the JSON response.
    fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        context: &'static str,
        path: &str,
        query: &[(&str, &str)],
        body: &B,
    ) -> Result<R, Error> {
        let token = self.access_token()?;
        let mut request = self
            .agent
            .post(&self.url(path))
            .set("Authorization", &format!("Bearer {}", token.as_str()));
        for (name, value) in query {
            request = request.query(name, value);
        }

        request
            .send_json(body)
            .map_err(|error| Error::from_ureq(context, error))?
            .into_json()
            .map_err(|error| Error::InvalidResponse {
                context,
                reason: error.to_string(),
            })
    }

    /// Signs a SHA-256 `digest` with the HSM-backed key version `key_name`.
    ///
    /// Returns the signature as produced by the service (DER encoded for ECDSA keys).
    /// Transport errors and temporary server errors are retried according to the
    /// [`RetryPolicy`] of the client.
    ///
    /// # Errors
    ///
    /// Returns an error if
    /// * no access token can be obtained,
    /// * the service rejects the request,
    /// * or the response does not contain a valid signature.
    pub fn asymmetric_sign(
        &self,
        key_name: &CryptoKeyName,
        digest: &[u8; DIGEST_LENGTH],
    ) -> Result<Vec<u8>, Error> {
        let request = AsymmetricSignRequest {
            digest: Digest {
                sha256: Base64::encode_string(digest),
            },
        };
        let path = format!("{key_name}:asymmetricSign");

        let response: AsymmetricSignResponse = self
            .options
            .retry
            .run("asymmetric signing", || {
                self.post("signing a digest", &path, &[], &request)
            })
            .inspect_err(|error| error!("Signing with {key_name} failed: {error}"))?;
        let signature =
            Base64::decode_vec(&response.signature).map_err(|error| Error::InvalidResponse {
                context: "signing a digest",
                reason: format!("the signature is not valid base64: {error}"),
            })?;
        debug!("Signed digest with {key_name}");

        Ok(signature)
    }

    /// Creates the key ring `key_ring` in `project` and `location`.
    ///
    /// Returns the id of the created key ring.
    ///
    /// # Errors
    ///
    /// Returns an error if
    /// * any of the ids is invalid,
    /// * or the service rejects the request (e.g. because the key ring exists).
    pub fn create_key_ring(
        &self,
        project: &str,
        location: &str,
        key_ring: &str,
    ) -> Result<String, Error> {
        for id in [project, location, key_ring] {
            validate_id(id)?;
        }

        let created: CreatedResource = self
            .post(
                "creating a key ring",
                &format!("projects/{project}/locations/{location}/keyRings"),
                &[("keyRingId", key_ring)],
                &serde_json::json!({}),
            )
            .inspect_err(|error| error!("Creating key ring {key_ring} failed: {error}"))?;
        info!("Created key ring {}", created.name);

        Ok(key_ring.to_string())
    }

    /// Creates the HSM-protected signing key `key_id` using `algorithm` in an existing key ring.
    ///
    /// Returns the name of the created key.
    ///
    /// # Errors
    ///
    /// Returns an error if
    /// * any of the ids is invalid,
    /// * the service rejects the request,
    /// * or the service returns an invalid key name.
    pub fn create_crypto_key(
        &self,
        project: &str,
        location: &str,
        key_ring: &str,
        key_id: &str,
        algorithm: KeyAlgorithm,
    ) -> Result<CryptoKeyName, Error> {
        for id in [project, location, key_ring, key_id] {
            validate_id(id)?;
        }
        let request = CryptoKeyRequest {
            purpose: "ASYMMETRIC_SIGN",
            version_template: CryptoKeyVersionTemplate {
                algorithm: algorithm.api_name(),
                protection_level: "HSM",
            },
        };

        let created: CreatedResource = self
            .post(
                "creating a key",
                &format!("projects/{project}/locations/{location}/keyRings/{key_ring}/cryptoKeys"),
                &[("cryptoKeyId", key_id)],
                &request,
            )
            .inspect_err(|error| error!("Creating {algorithm} key {key_id} failed: {error}"))?;
        let name = CryptoKeyName::new(created.name)?;
        info!("Created {algorithm} key {name}");

        Ok(name)
    }
}

impl Debug for KmsClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KmsClient")
            .field("credentials", &self.credentials)
            .field("options", &self.options)
            .finish()
    }
}
