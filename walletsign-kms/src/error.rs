//! Error handling.

use std::{fmt::Display, path::PathBuf};

use serde::Deserialize;

/// HTTP status codes of responses that are worth retrying.
const RETRYABLE_STATUS_CODES: [u16; 5] = [429, 500, 502, 503, 504];

/// The `error` object in the body of a failed API response.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetails,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetails {
    message: String,
}

/// An error message returned by the key management service or its token endpoint.
#[derive(Debug)]
pub struct ApiErrorMessage {
    /// The HTTP status code of the response.
    pub status_code: u16,
    /// The message in the response body.
    pub message: String,
}

impl ApiErrorMessage {
    /// Creates an [`ApiErrorMessage`] from a failed response.
    ///
    /// Falls back to a generic message if the body does not carry an error message.
    pub(crate) fn from_response(status_code: u16, response: ureq::Response) -> Self {
        let message = response
            .into_string()
            .ok()
            .and_then(|body| {
                serde_json::from_str::<ApiErrorBody>(&body)
                    .map(|body| body.error.message)
                    .ok()
                    .or_else(|| (!body.trim().is_empty()).then(|| body.trim().to_string()))
            })
            .unwrap_or_else(|| "Deserialization error (no message in body)".to_string());

        Self {
            status_code,
            message,
        }
    }
}

impl Display for ApiErrorMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (status code {})", self.message, self.status_code)
    }
}

/// An error that may occur when using the key management service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The credentials file can not be read.
    #[error("Unable to read credentials file {path}:\n{source}")]
    CredentialsFile {
        /// The path of the credentials file.
        path: PathBuf,
        /// The source error.
        source: std::io::Error,
    },

    /// The credentials are not valid service account credentials.
    #[error("Invalid service account credentials:\n{0}")]
    CredentialsFormat(#[from] serde_json::Error),

    /// The private key of the credentials can not be decoded.
    #[error("Invalid service account private key:\n{0}")]
    PrivateKey(#[from] rsa::pkcs8::Error),

    /// Signing the token request failed.
    #[error("Signing the access token request failed:\n{0}")]
    TokenAssertion(#[from] rsa::signature::Error),

    /// A resource name or identifier is invalid.
    #[error("Invalid resource name {name:?}: {reason}")]
    InvalidResourceName {
        /// The offending name.
        name: String,
        /// The reason for the name being invalid.
        reason: &'static str,
    },

    /// A request could not be delivered.
    #[error("Transport error while {context}:\n{source}")]
    Transport {
        /// The context in which the error occurred.
        ///
        /// This is meant to complete the sentence "Transport error while ".
        context: &'static str,
        /// The source error.
        source: Box<ureq::Transport>,
    },

    /// The service responded with an error status.
    #[error("Request failed while {context}: {message}")]
    Api {
        /// The context in which the error occurred.
        ///
        /// This is meant to complete the sentence "Request failed while ".
        context: &'static str,
        /// The status code and message of the response.
        message: ApiErrorMessage,
    },

    /// A response body can not be decoded.
    #[error("Invalid response while {context}: {reason}")]
    InvalidResponse {
        /// The context in which the error occurred.
        ///
        /// This is meant to complete the sentence "Invalid response while ".
        context: &'static str,
        /// The reason for the response being invalid.
        reason: String,
    },
}

impl Error {
    /// Creates an [`Error`] from a failed request.
    pub(crate) fn from_ureq(context: &'static str, error: ureq::Error) -> Self {
        match error {
            ureq::Error::Status(status_code, response) => Self::Api {
                context,
                message: ApiErrorMessage::from_response(status_code, response),
            },
            ureq::Error::Transport(transport) => Self::Transport {
                context,
                source: Box::new(transport),
            },
        }
    }

    /// Returns whether repeating the failed request may succeed.
    ///
    /// This is the case for transport errors, rate limiting and temporary server errors.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::Api { message, .. } => RETRYABLE_STATUS_CODES.contains(&message.status_code),
            _ => false,
        }
    }
}
