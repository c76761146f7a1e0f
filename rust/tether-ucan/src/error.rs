//! Error types for token validation, delegation and verification.
//!
//! Every failure is a [`UcanError`]. Errors fall into three classes, exposed
//! through [`UcanError::kind`]:
//!
//! - [`ErrorKind::Structural`]: the bytes are not a token at all.
//! - [`ErrorKind::Policy`]: a well-formed token or proof is not acceptable.
//!   Inside the delegation engine these are stream elements, so one bad
//!   branch never hides a sound one.
//! - [`ErrorKind::Usage`]: the caller asked for something impossible.

use tether_capability::CapabilityParseError;
use tether_did::{Did, PluginError};
use thiserror::Error;

use crate::version::Version;

/// Classification of a [`UcanError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed encoding, JSON, schema or version.
    Structural,
    /// The token parsed but fails a validation or delegation rule.
    Policy,
    /// Invalid arguments or builder misuse.
    Usage,
}

/// Errors produced while handling tokens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UcanError {
    /// The encoded token does not have exactly three segments.
    #[error("expected 3 dot-separated segments, found {0}")]
    MalformedEncoding(usize),

    /// A segment is not base64url.
    #[error("invalid base64url in {segment}: {message}")]
    Base64 {
        /// Which segment failed (`header`, `payload` or `signature`).
        segment: &'static str,
        /// Decoder message.
        message: String,
    },

    /// Header or payload does not match a known schema.
    #[error("invalid {segment}: {message}")]
    Schema {
        /// Which segment failed.
        segment: &'static str,
        /// Parser message.
        message: String,
    },

    /// A version string is not `major.minor.patch`.
    #[error("invalid version {0:?}")]
    InvalidVersion(String),

    /// The token declares a version this crate cannot read.
    #[error("unsupported token version {0}")]
    UnsupportedVersion(String),

    /// A capability string is malformed.
    #[error(transparent)]
    Capability(#[from] CapabilityParseError),

    /// The issuer's key type does not match the declared `alg`.
    #[error("issuer {issuer} cannot sign with {alg}")]
    IssuerAlgMismatch {
        /// Token issuer.
        issuer: Did,
        /// Declared algorithm.
        alg: String,
    },

    /// The signature does not verify against the issuer.
    #[error("invalid signature from {0}")]
    SignatureInvalid(Did),

    /// The plugin registry could not handle the issuer.
    #[error(transparent)]
    Plugin(#[from] PluginError),

    /// `exp <= now`.
    #[error("token expired at {exp} (now {now})")]
    Expired {
        /// Expiration.
        exp: u64,
        /// Time of the check.
        now: u64,
    },

    /// `nbf > now`.
    #[error("token not valid before {nbf} (now {now})")]
    TooEarly {
        /// Not-before.
        nbf: u64,
        /// Time of the check.
        now: u64,
    },

    /// A proof is addressed to someone other than the token's issuer.
    #[error("proof audience {proof_audience} is not the token issuer {issuer}")]
    ProofAddressing {
        /// The child token's issuer.
        issuer: Did,
        /// The proof's audience.
        proof_audience: Did,
    },

    /// The token's validity window does not fit within its proof's.
    #[error("token window {token} is not within proof window {proof}")]
    TimeBounds {
        /// Token `nbf..exp`.
        token: String,
        /// Proof `nbf..exp`.
        proof: String,
    },

    /// A proof uses a newer version than the token.
    #[error("proof version {proof} is newer than token version {token}")]
    VersionNotMonotonic {
        /// Child token version.
        token: Version,
        /// Proof version.
        proof: Version,
    },

    /// The token was reported revoked.
    #[error("token from {issuer} to {audience} is revoked")]
    Revoked {
        /// Revoked token's issuer.
        issuer: Did,
        /// Revoked token's audience.
        audience: Did,
    },

    /// An `as:` hier part is not `<did>:<scheme>`.
    #[error("malformed ownership reference as:{0}")]
    MalformedOwnership(String),

    /// A `prf:` hier part is neither `*` nor an index.
    #[error("malformed proof reference prf:{0}")]
    MalformedProofReference(String),

    /// The token is addressed to someone else.
    #[error("token audience {actual} does not match {expected}")]
    AudienceMismatch {
        /// Audience the verifier expected.
        expected: Did,
        /// Audience in the token.
        actual: Did,
    },

    /// The facts check rejected the token.
    #[error("token facts rejected")]
    FactsRejected,

    /// Invalid arguments to an entry point.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The supplied chain does not back the capability being delegated.
    #[error("capability {0} is not delegated by the supplied proof")]
    NotDelegated(String),

    /// The supplied proof is not addressed to the builder's issuer.
    #[error("proof audience {proof_audience} is not the issuer {issuer}")]
    ProofNotForIssuer {
        /// The builder's issuer.
        issuer: Did,
        /// The proof's audience.
        proof_audience: Did,
    },

    /// The store holds no chain for the requested capability.
    #[error("no stored proof for {capability} rooted at {root_issuer}")]
    NoProofInStore {
        /// The requested capability.
        capability: String,
        /// The requested root issuer.
        root_issuer: Did,
    },

    /// Signing failed.
    #[error("signing failed: {0}")]
    Signing(String),

    /// No random nonce could be generated.
    #[error("nonce generation failed: {0}")]
    Nonce(String),
}

impl UcanError {
    /// The class of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            UcanError::MalformedEncoding(_)
            | UcanError::Base64 { .. }
            | UcanError::Schema { .. }
            | UcanError::InvalidVersion(_)
            | UcanError::UnsupportedVersion(_)
            | UcanError::Capability(_) => ErrorKind::Structural,

            UcanError::IssuerAlgMismatch { .. }
            | UcanError::SignatureInvalid(_)
            | UcanError::Plugin(_)
            | UcanError::Expired { .. }
            | UcanError::TooEarly { .. }
            | UcanError::ProofAddressing { .. }
            | UcanError::TimeBounds { .. }
            | UcanError::VersionNotMonotonic { .. }
            | UcanError::Revoked { .. }
            | UcanError::MalformedOwnership(_)
            | UcanError::MalformedProofReference(_)
            | UcanError::AudienceMismatch { .. }
            | UcanError::FactsRejected => ErrorKind::Policy,

            UcanError::InvalidArgument(_)
            | UcanError::NotDelegated(_)
            | UcanError::ProofNotForIssuer { .. }
            | UcanError::NoProofInStore { .. }
            | UcanError::Signing(_)
            | UcanError::Nonce(_) => ErrorKind::Usage,
        }
    }
}

impl From<signature::Error> for UcanError {
    fn from(error: signature::Error) -> Self {
        UcanError::Signing(error.to_string())
    }
}
