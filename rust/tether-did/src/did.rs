//! Issuer and audience identifiers.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

const PREFIX: &str = "did:";

/// A DID as it appears in a token's `iss` or `aud` field.
///
/// Only the `did:<method>:<identifier>` shape is checked; method-specific
/// validation belongs to the [`Plugins`](crate::Plugins) that resolve it.
/// Equality is byte-for-byte, so `did:web:Example.com` and
/// `did:web:example.com` address different principals.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Did(String);

/// Split `did:<method>:<identifier>` into its two non-empty parts.
fn split(did: &str) -> Option<(&str, &str)> {
    let (method, identifier) = did.strip_prefix(PREFIX)?.split_once(':')?;
    (!method.is_empty() && !identifier.is_empty()).then_some((method, identifier))
}

impl Did {
    #[cfg_attr(not(feature = "ed25519"), allow(dead_code))]
    pub(crate) fn from_raw(did: String) -> Self {
        Did(did)
    }

    /// The full string, `did:` prefix included.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `key` for `did:key:z6Mk...`; plugins are looked up by this.
    #[must_use]
    pub fn method(&self) -> &str {
        split(&self.0).map(|(method, _)| method).unwrap_or_default()
    }

    /// The method-specific part; for `did:key` the multibase public key.
    #[must_use]
    pub fn identifier(&self) -> &str {
        split(&self.0).map(|(_, identifier)| identifier).unwrap_or_default()
    }
}

impl AsRef<str> for Did {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Did({})", self.0)
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The input was not `did:<method>:<identifier>`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a DID: {0:?}")]
pub struct DidParseError(pub String);

impl FromStr for Did {
    type Err = DidParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        split(s)
            .map(|_| Did(s.to_string()))
            .ok_or_else(|| DidParseError(s.to_string()))
    }
}

impl TryFrom<&str> for Did {
    type Error = DidParseError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl Serialize for Did {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Did {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer)?
            .parse()
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_parses_method_and_identifier() {
        let did: Did = "did:key:z6MkhaXgBZDvotDkL5257faiztiGiC2QtKLGpbnnEGta2doK"
            .parse()
            .unwrap();
        assert_eq!(did.method(), "key");
        assert_eq!(
            did.identifier(),
            "z6MkhaXgBZDvotDkL5257faiztiGiC2QtKLGpbnnEGta2doK"
        );

        let web: Did = "did:web:example.com:user:alice".parse().unwrap();
        assert_eq!(web.method(), "web");
        assert_eq!(web.identifier(), "example.com:user:alice");
    }

    #[test]
    fn it_rejects_malformed_dids() {
        assert!("key:z6Mk".parse::<Did>().is_err());
        assert!("did:key".parse::<Did>().is_err());
        assert!("did::z6Mk".parse::<Did>().is_err());
        assert!("did:key:".parse::<Did>().is_err());
    }

    #[test]
    fn it_round_trips_through_serde() {
        let did: Did = "did:web:example.com".parse().unwrap();
        let json = serde_json::to_string(&did).unwrap();
        assert_eq!(json, "\"did:web:example.com\"");
        let back: Did = serde_json::from_str(&json).unwrap();
        assert_eq!(back, did);
        assert!(serde_json::from_str::<Did>("\"nope\"").is_err());
    }
}
