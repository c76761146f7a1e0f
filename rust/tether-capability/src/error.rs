//! Error type for capability parsing.

use thiserror::Error;

/// A resource pointer or ability string could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityParseError {
    /// A resource pointer lacks the `<scheme>:<hierPart>` shape.
    #[error("invalid resource pointer {0:?}: expected <scheme>:<hierPart>")]
    Resource(String),

    /// An ability is neither `*` nor `<namespace>/<segment>...`.
    #[error("invalid ability {0:?}: expected * or <namespace>/<segment>")]
    Ability(String),
}
