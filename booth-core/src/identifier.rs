// SPDX-License-Identifier: MIT OR Apache-2.0

//! Document and revision identifiers and the source generating fresh ones.
use std::fmt;
use std::str::FromStr;

use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Number of random bytes in a generated identifier.
pub const IDENTIFIER_LEN: usize = 16;

/// Supplies fresh, unique and opaque identifiers on demand.
///
/// Implementations are shared between many documents and must be safe to call concurrently. No
/// two calls may ever return the same value for the lifetime of the process.
pub trait IdentifierSource: Send + Sync {
    fn next_id(&self) -> String;
}

/// Identifier source drawing random bytes from the thread-local CSPRNG, hex-encoded.
#[derive(Clone, Debug, Default)]
pub struct RandomIdentifiers;

impl RandomIdentifiers {
    pub fn new() -> Self {
        Self
    }
}

impl IdentifierSource for RandomIdentifiers {
    fn next_id(&self) -> String {
        let mut bytes = [0u8; IDENTIFIER_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        hex::encode(bytes)
    }
}

/// Stable identifier of a document.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Opaque version token identifying one snapshot of a document.
///
/// Revisions are not counters, they only need to be unique within the lifetime of one document.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevisionId(String);

impl RevisionId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Draws a fresh revision id from the given source.
    pub fn generate(source: &dyn IdentifierSource) -> Self {
        Self(source.next_id())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

macro_rules! impl_string_id {
    ($name:ident) => {
        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($name)).field(&self.0).finish()
            }
        }

        impl FromStr for $name {
            type Err = std::convert::Infallible;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                Ok(Self(value.to_owned()))
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

impl_string_id!(DocumentId);
impl_string_id!(RevisionId);
