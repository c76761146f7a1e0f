//! Capability-chain authorization tokens.
//!
//! A token is a signed statement from an issuer to an audience granting a
//! list of capabilities, optionally backed by earlier tokens (proofs)
//! embedded in it. This crate:
//!
//! - parses and validates tokens ([`validate`], [`validate_proofs`]),
//!   including legacy layouts ([`compat`]);
//! - enumerates how each capability traces back to a root issuer
//!   ([`delegation_chains`]);
//! - checks a token against required capabilities ([`verify`]);
//! - indexes tokens and their chains for reuse ([`Store`]);
//! - builds and signs new tokens ([`TokenBuilder`]).
//!
//! DIDs, key pairs and signature plugins come from `tether-did`; the
//! capability model and delegation semantics from `tether-capability`.

#![warn(missing_docs)]

pub mod builder;
pub mod chain;
pub mod codec;
pub mod compat;
pub mod error;
mod sealed;
pub mod store;
pub mod time;
pub mod token;
pub mod validate;
pub mod verify;
pub mod version;

pub use builder::TokenBuilder;
pub use chain::{
    DelegationChain, OwnershipScope, capability_can_be_delegated, delegation_chains, not_revoked,
    ownership_can_be_delegated,
};
pub use error::{ErrorKind, UcanError};
pub use sealed::Unset;
pub use store::Store;
pub use time::TimeRange;
pub use token::{Fact, Header, Payload, Token};
pub use validate::{
    ValidateOptions, ValidateProofsOptions, is_expired, is_too_early, validate, validate_proofs,
};
pub use verify::{RequiredCapability, Verification, VerifyOptions, verify};
pub use version::Version;
