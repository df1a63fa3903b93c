//! Content digests in `algorithm:hex` form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};

use crate::error::{ReferenceError, Result};
use crate::grammar;

/// Algorithms with a fixed, known encoded length.
const REGISTERED: &[(&str, usize)] = &[("sha256", 64), ("sha384", 96), ("sha512", 128)];

/// A content digest of the form `algorithm:hex`.
///
/// The encoded part is lowercase hex and at least 128 bits long. Digests
/// using a registered algorithm must also carry exactly that algorithm's
/// length.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Digest {
    value: String,
    separator: usize,
}

impl Digest {
    /// Parse and validate a digest string.
    pub fn parse(s: &str) -> Result<Self> {
        let (algorithm, encoded) = s.split_once(':').ok_or(ReferenceError::DigestInvalidFormat)?;
        if !grammar::is_digest_algorithm(algorithm) || !grammar::is_digest_hex(encoded) {
            return Err(ReferenceError::DigestInvalidFormat);
        }
        if let Some(expected) = registered_length(algorithm) {
            if encoded.len() != expected {
                return Err(ReferenceError::DigestInvalidFormat);
            }
        }
        Ok(Self {
            value: s.to_string(),
            separator: algorithm.len(),
        })
    }

    /// Compute the canonical `sha256` digest of `data`.
    pub fn sha256_of(data: &[u8]) -> Self {
        let encoded = hex::encode(Sha256::digest(data));
        Self {
            value: format!("sha256:{encoded}"),
            separator: "sha256".len(),
        }
    }

    /// Wrap a bare 64-character identifier as a `sha256` digest.
    pub fn from_identifier(id: &str) -> Result<Self> {
        if !grammar::is_identifier(id) {
            return Err(ReferenceError::DigestInvalidFormat);
        }
        Ok(Self {
            value: format!("sha256:{id}"),
            separator: "sha256".len(),
        })
    }

    /// The algorithm portion, e.g. `sha256`.
    pub fn algorithm(&self) -> &str {
        &self.value[..self.separator]
    }

    /// The hex-encoded portion after the `:`.
    pub fn encoded(&self) -> &str {
        &self.value[self.separator + 1..]
    }

    /// Returns `true` if the algorithm is one with a known encoded length.
    pub fn is_registered(&self) -> bool {
        registered_length(self.algorithm()).is_some()
    }

    /// Verify that `data` hashes to this digest.
    ///
    /// Only `sha256` can be checked; any other algorithm reports `false`.
    pub fn verify(&self, data: &[u8]) -> bool {
        self.algorithm() == "sha256" && *self == Self::sha256_of(data)
    }

    /// Full `algorithm:hex` string.
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

fn registered_length(algorithm: &str) -> Option<usize> {
    REGISTERED
        .iter()
        .find(|(name, _)| *name == algorithm)
        .map(|(_, len)| *len)
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.value)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl FromStr for Digest {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Digest {
    type Error = ReferenceError;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<Digest> for String {
    fn from(digest: Digest) -> Self {
        digest.value
    }
}
