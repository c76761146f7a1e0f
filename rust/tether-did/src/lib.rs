//! Identities for tether tokens.
//!
//! This crate provides the [`Did`] type, the [`Principal`] and [`Keypair`]
//! traits used to issue tokens, and the [`Plugins`] registry the validator
//! uses to check issuer algorithms and signatures.
//!
//! Implementations:
//! - **Ed25519** `did:key` (enabled by the `ed25519` feature, on by default)

#![warn(missing_docs)]

pub mod did;
pub mod error;
pub mod plugins;
pub mod principal;

#[cfg(feature = "ed25519")]
pub mod ed25519;

pub use did::{Did, DidParseError};
pub use error::{KeyError, PluginError};
pub use plugins::{KeyPlugin, MethodPlugin, Plugins};
pub use principal::{Keypair, Principal};

#[cfg(feature = "ed25519")]
pub use ed25519::{Ed25519Keypair, Ed25519Plugin};
