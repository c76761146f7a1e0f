//! Token format versions (`ucv`).

use std::{fmt, str::FromStr};

use nom::{
    IResult,
    character::complete::{char, u64 as number},
    combinator::all_consuming,
    sequence::tuple,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::UcanError;

/// A `major.minor.patch` token format version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    /// Major component.
    pub major: u64,
    /// Minor component.
    pub minor: u64,
    /// Patch component.
    pub patch: u64,
}

impl Version {
    /// The version written by [`TokenBuilder`](crate::TokenBuilder).
    pub const CURRENT: Version = Version::new(0, 8, 1);

    /// Create a version.
    #[must_use]
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// `0.3.x`, the flat `rsc`/`ptc` layout.
    #[must_use]
    pub fn is_legacy(&self) -> bool {
        self.major == 0 && self.minor == 3
    }

    /// `>= 0.8.0, < 1.0.0`, the `att` layout.
    #[must_use]
    pub fn is_current(&self) -> bool {
        *self >= Version::new(0, 8, 0) && *self < Version::new(1, 0, 0)
    }
}

fn parse_version(input: &str) -> IResult<&str, Version> {
    let (rest, (major, _, minor, _, patch)) =
        tuple((number, char('.'), number, char('.'), number))(input)?;
    Ok((rest, Version::new(major, minor, patch)))
}

impl FromStr for Version {
    type Err = UcanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        all_consuming(parse_version)(s)
            .map(|(_, version)| version)
            .map_err(|_| UcanError::InvalidVersion(s.to_string()))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
