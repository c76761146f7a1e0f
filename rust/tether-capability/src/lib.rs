//! Capabilities carried by tether tokens.
//!
//! A [`Capability`] pairs a [`ResourcePointer`] (`with`) with an [`Ability`]
//! (`can`). Three resource schemes are reserved and interpreted by the
//! delegation engine rather than by applications: `my` (ownership claims),
//! `as` (re-delegated ownership) and `prf` (re-delegation of everything a
//! proof grants). See [`ReservedScheme`].
//!
//! Whether one capability covers another is decided by a
//! [`DelegationSemantics`] implementation supplied by the caller.

#![warn(missing_docs)]

pub mod ability;
pub mod capability;
pub mod error;
pub mod resource;
pub mod semantics;

pub use ability::Ability;
pub use capability::Capability;
pub use error::CapabilityParseError;
pub use resource::{ReservedScheme, ResourcePointer};
pub use semantics::{DelegationSemantics, EqualCanDelegate, PathSemantics};
