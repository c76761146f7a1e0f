//! Resource pointers: the `with` half of a capability.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CapabilityParseError;

/// The hier part that means "all resources" for `my` and `as` pointers.
pub const WILDCARD: &str = "*";

/// Schemes with delegation meaning of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReservedScheme {
    /// `my:<scheme>` claims ownership of the issuer's resources.
    My,
    /// `as:<did>:<scheme>` re-delegates an ownership claim of `<did>`.
    As,
    /// `prf:<index>` or `prf:*` re-delegates everything a proof grants.
    Prf,
}

impl ReservedScheme {
    /// The scheme string, in lowercase.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ReservedScheme::My => "my",
            ReservedScheme::As => "as",
            ReservedScheme::Prf => "prf",
        }
    }
}

/// A `<scheme>:<hierPart>` resource reference.
///
/// The scheme compares case-insensitively, the hier part exactly.
#[derive(Debug, Clone)]
pub struct ResourcePointer {
    /// The URI scheme, e.g. `mailto`.
    pub scheme: String,
    /// Everything after the first `:`.
    pub hier_part: String,
}

impl ResourcePointer {
    /// Create a pointer from its parts.
    pub fn new(scheme: impl Into<String>, hier_part: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            hier_part: hier_part.into(),
        }
    }

    /// `my:<scheme>`, or `my:*` with [`WILDCARD`].
    pub fn my(scheme: impl Into<String>) -> Self {
        Self::new(ReservedScheme::My.as_str(), scheme)
    }

    /// `as:<did>:<scheme>`.
    pub fn as_owner(owner: impl fmt::Display, scheme: impl fmt::Display) -> Self {
        Self::new(ReservedScheme::As.as_str(), format!("{owner}:{scheme}"))
    }

    /// `prf:<index>`.
    pub fn prf(index: usize) -> Self {
        Self::new(ReservedScheme::Prf.as_str(), index.to_string())
    }

    /// `prf:*`.
    pub fn prf_all() -> Self {
        Self::new(ReservedScheme::Prf.as_str(), WILDCARD)
    }

    /// The reserved scheme this pointer uses, if any.
    #[must_use]
    pub fn reserved_scheme(&self) -> Option<ReservedScheme> {
        [ReservedScheme::My, ReservedScheme::As, ReservedScheme::Prf]
            .into_iter()
            .find(|reserved| self.scheme.eq_ignore_ascii_case(reserved.as_str()))
    }

    /// Is the hier part the wildcard `*`?
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.hier_part == WILDCARD
    }
}

impl PartialEq for ResourcePointer {
    fn eq(&self, other: &Self) -> bool {
        self.scheme.to_lowercase() == other.scheme.to_lowercase()
            && self.hier_part == other.hier_part
    }
}

impl Eq for ResourcePointer {}

impl fmt::Display for ResourcePointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.scheme, self.hier_part)
    }
}

impl FromStr for ResourcePointer {
    type Err = CapabilityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((scheme, hier_part)) if !scheme.is_empty() && !hier_part.is_empty() => {
                Ok(Self::new(scheme, hier_part))
            }
            _ => Err(CapabilityParseError::Resource(s.to_string())),
        }
    }
}

impl Serialize for ResourcePointer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ResourcePointer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
