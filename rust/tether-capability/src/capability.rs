//! A capability pairs a resource with an ability.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{ability::Ability, error::CapabilityParseError, resource::ResourcePointer};

/// A `{ with, can }` capability, as it appears in a token's `att` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capability {
    /// The resource the ability applies to.
    pub with: ResourcePointer,
    /// What the holder may do with the resource.
    pub can: Ability,
}

impl Capability {
    /// Pair a resource with an ability.
    pub fn new(with: ResourcePointer, can: Ability) -> Self {
        Self { with, can }
    }

    /// Parse both halves from their string forms.
    ///
    /// # Errors
    ///
    /// Fails if either half is malformed.
    pub fn parse(with: &str, can: &str) -> Result<Self, CapabilityParseError> {
        Ok(Self {
            with: with.parse()?,
            can: can.parse()?,
        })
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.can, self.with)
    }
}
