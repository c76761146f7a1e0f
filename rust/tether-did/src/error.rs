//! Error types for DID resolution and key handling.

use thiserror::Error;

use crate::did::Did;

/// Errors raised by the [`Plugins`](crate::Plugins) registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PluginError {
    /// No registered plugin handles this DID.
    #[error("DID not supported by any registered plugin: {0}")]
    UnsupportedDid(Did),

    /// The `did:key` identifier is not base58btc multibase.
    #[error("malformed did:key: {0}")]
    MalformedDidKey(Did),

    /// A method plugin failed while verifying.
    #[error("plugin failure: {0}")]
    Failed(String),
}

/// Errors from importing or generating key material.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// The seed bytes have the wrong length (expected 32).
    #[error("expected 32 seed bytes, got {0}")]
    InvalidSeedLength(usize),

    /// Random number generation failed.
    #[error("RNG error: {0}")]
    Rng(String),
}
