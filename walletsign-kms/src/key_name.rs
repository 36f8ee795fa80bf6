//! Names of key management resources.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// The maximum length of a resource identifier.
const MAX_ID_LENGTH: usize = 63;

/// Validates a single resource identifier (e.g. a key ring or key id).
///
/// Identifiers are non-empty, at most 63 characters long and consist of ASCII letters, digits,
/// `-` and `_`.
///
/// # Errors
///
/// Returns an [`Error::InvalidResourceName`] if `id` is not a valid identifier.
pub fn validate_id(id: &str) -> Result<(), Error> {
    let reason = if id.is_empty() {
        "identifiers must not be empty"
    } else if id.len() > MAX_ID_LENGTH {
        "identifiers must not be longer than 63 characters"
    } else if !id
        .chars()
        .all(|char| char.is_ascii_alphanumeric() || char == '-' || char == '_')
    {
        "identifiers may only contain ASCII letters, digits, '-' and '_'"
    } else {
        return Ok(());
    };

    Err(Error::InvalidResourceName {
        name: id.to_string(),
        reason,
    })
}

/// The name of an asymmetric signing key (or one of its versions).
///
/// A name has the form
/// `projects/{project}/locations/{location}/keyRings/{key_ring}/cryptoKeys/{key}`, optionally
/// followed by `/cryptoKeyVersions/{version}`.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(into = "String", try_from = "String")]
pub struct CryptoKeyName {
    name: String,
    project: usize,
    location: usize,
    key_ring: usize,
    crypto_key: usize,
    version: Option<usize>,
}

impl CryptoKeyName {
    /// Creates a new [`CryptoKeyName`] from its components.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::InvalidResourceName`] if any component is not a valid identifier.
    pub fn from_parts(
        project: &str,
        location: &str,
        key_ring: &str,
        crypto_key: &str,
    ) -> Result<Self, Error> {
        Self::new(format!(
            "projects/{project}/locations/{location}/keyRings/{key_ring}/cryptoKeys/{crypto_key}"
        ))
    }

    /// Creates a new [`CryptoKeyName`] from a full resource name.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::InvalidResourceName`] if
    /// * `name` does not follow the resource name layout,
    /// * a component is not a valid identifier,
    /// * or the key version is not a decimal number.
    ///
    /// # Examples
    ///
    /// ```
    /// use walletsign_kms::CryptoKeyName;
    ///
    /// assert!(CryptoKeyName::new("projects/p/locations/global/keyRings/r/cryptoKeys/k".into()).is_ok());
    /// assert!(
    ///     CryptoKeyName::new(
    ///         "projects/p/locations/global/keyRings/r/cryptoKeys/k/cryptoKeyVersions/1".into()
    ///     )
    ///     .is_ok()
    /// );
    ///
    /// // collections must be named correctly
    /// assert!(CryptoKeyName::new("projects/p/locations/global/rings/r/cryptoKeys/k".into()).is_err());
    /// // components must not be empty
    /// assert!(CryptoKeyName::new("projects//locations/global/keyRings/r/cryptoKeys/k".into()).is_err());
    /// // versions are numeric
    /// assert!(
    ///     CryptoKeyName::new(
    ///         "projects/p/locations/global/keyRings/r/cryptoKeys/k/cryptoKeyVersions/latest".into()
    ///     )
    ///     .is_err()
    /// );
    /// ```
    pub fn new(name: String) -> Result<Self, Error> {
        let invalid = |reason| Error::InvalidResourceName {
            name: name.clone(),
            reason,
        };
        let segments: Vec<&str> = name.split('/').collect();
        let collections = [
            "projects",
            "locations",
            "keyRings",
            "cryptoKeys",
            "cryptoKeyVersions",
        ];
        if segments.len() != 8 && segments.len() != 10 {
            return Err(invalid(
                "expected projects/{project}/locations/{location}/keyRings/{key_ring}/cryptoKeys/{key}[/cryptoKeyVersions/{version}]",
            ));
        }
        for (pair, collection) in segments.chunks(2).zip(collections) {
            if pair[0] != collection {
                return Err(invalid("unexpected resource collection"));
            }
            validate_id(pair[1]).map_err(|_| invalid("a component is not a valid identifier"))?;
        }
        if segments
            .get(9)
            .is_some_and(|version| !version.chars().all(|char| char.is_ascii_digit()))
        {
            return Err(invalid("key versions must be decimal numbers"));
        }

        // byte offsets of the identifiers
        let mut offsets = Vec::with_capacity(5);
        let mut offset = 0;
        for (index, segment) in segments.iter().enumerate() {
            if index % 2 == 1 {
                offsets.push(offset);
            }
            offset += segment.len() + 1;
        }

        Ok(Self {
            project: offsets[0],
            location: offsets[1],
            key_ring: offsets[2],
            crypto_key: offsets[3],
            version: offsets.get(4).copied(),
            name,
        })
    }

    /// Returns the identifier starting at byte `offset`.
    fn component(&self, offset: usize) -> &str {
        let rest = &self.name[offset..];
        rest.split('/').next().unwrap_or(rest)
    }

    /// Returns the project id.
    pub fn project(&self) -> &str {
        self.component(self.project)
    }

    /// Returns the location id.
    pub fn location(&self) -> &str {
        self.component(self.location)
    }

    /// Returns the key ring id.
    pub fn key_ring(&self) -> &str {
        self.component(self.key_ring)
    }

    /// Returns the key id.
    pub fn crypto_key(&self) -> &str {
        self.component(self.crypto_key)
    }

    /// Returns the key version, if the name refers to a specific version.
    pub fn version(&self) -> Option<&str> {
        self.version.map(|offset| self.component(offset))
    }
}

impl AsRef<str> for CryptoKeyName {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

impl Display for CryptoKeyName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

impl From<CryptoKeyName> for String {
    fn from(value: CryptoKeyName) -> Self {
        value.name
    }
}

impl FromStr for CryptoKeyName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl TryFrom<String> for CryptoKeyName {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
