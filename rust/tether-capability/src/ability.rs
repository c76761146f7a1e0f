//! Abilities: what a capability allows on its resource.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CapabilityParseError;

/// The encoded form of [`Ability::Superuser`].
pub const SUPERUSER: &str = "*";

/// Separator between an ability's namespace and segments.
pub const SEPARATOR: char = '/';

/// An ability, either the maximal `*` or a namespaced path like
/// `msg/SEND` or `crud/write/append`.
///
/// Equality ignores case on the namespace and on the joined segments, so
/// `msg/send` and `MSG/SEND` are the same ability.
#[derive(Debug, Clone)]
pub enum Ability {
    /// The maximum ability; delegates and matches everything.
    Superuser,

    /// A namespaced ability.
    Namespaced {
        /// The namespace, e.g. `msg`.
        namespace: String,
        /// The ordered, non-empty segments, e.g. `["SEND"]`.
        segments: Vec<String>,
    },
}

impl Ability {
    /// Create a namespaced ability.
    pub fn new<I, S>(namespace: impl Into<String>, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ability::Namespaced {
            namespace: namespace.into(),
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Is this the superuser ability?
    #[must_use]
    pub fn is_superuser(&self) -> bool {
        matches!(self, Ability::Superuser)
    }

    /// The namespace, or `None` for the superuser ability.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        match self {
            Ability::Superuser => None,
            Ability::Namespaced { namespace, .. } => Some(namespace),
        }
    }

    /// The segments, empty for the superuser ability.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        match self {
            Ability::Superuser => &[],
            Ability::Namespaced { segments, .. } => segments,
        }
    }

    /// Segments joined with [`SEPARATOR`].
    #[must_use]
    pub fn joined_segments(&self) -> String {
        self.segments().join("/")
    }
}

impl PartialEq for Ability {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Ability::Superuser, Ability::Superuser) => true,
            (
                Ability::Namespaced {
                    namespace: left, ..
                },
                Ability::Namespaced {
                    namespace: right, ..
                },
            ) => {
                left.to_lowercase() == right.to_lowercase()
                    && self.joined_segments().to_lowercase()
                        == other.joined_segments().to_lowercase()
            }
            _ => false,
        }
    }
}

impl Eq for Ability {}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ability::Superuser => f.write_str(SUPERUSER),
            Ability::Namespaced {
                namespace,
                segments,
            } => write!(f, "{namespace}{SEPARATOR}{}", segments.join("/")),
        }
    }
}

impl FromStr for Ability {
    type Err = CapabilityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == SUPERUSER {
            return Ok(Ability::Superuser);
        }

        let mut parts = s.split(SEPARATOR);
        let namespace = parts.next().unwrap_or_default();
        let segments: Vec<String> = parts.map(str::to_string).collect();

        if namespace.is_empty() || segments.is_empty() || segments.iter().any(String::is_empty) {
            return Err(CapabilityParseError::Ability(s.to_string()));
        }

        Ok(Ability::Namespaced {
            namespace: namespace.to_string(),
            segments,
        })
    }
}

impl Serialize for Ability {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Ability {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
