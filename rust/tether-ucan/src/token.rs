//! The token model.
//!
//! A [`Token`] is immutable once constructed: it keeps the exact bytes its
//! signature covers next to the parsed [`Header`] and [`Payload`], and only
//! exposes them through getters so the two can never drift apart.

use serde::{Deserialize, Serialize};
use tether_capability::Capability;
use tether_did::Did;

use crate::{codec, time::TimeRange, version::Version};

/// The JWT `typ` of every token.
pub const TOKEN_TYPE: &str = "JWT";

/// A fact record from a token's `fct` list.
pub type Fact = serde_json::Map<String, serde_json::Value>;

/// Token header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Signature algorithm, e.g. `EdDSA`.
    pub alg: String,
    /// Always [`TOKEN_TYPE`].
    pub typ: String,
    /// Format version.
    pub ucv: Version,
}

impl Header {
    /// A header for the given algorithm and version.
    pub fn new(alg: impl Into<String>, ucv: Version) -> Self {
        Self {
            alg: alg.into(),
            typ: TOKEN_TYPE.to_string(),
            ucv,
        }
    }
}

/// Token payload.
///
/// `prf` holds proofs in their encoded form. Resolved proofs are produced on
/// demand by [`validate_proofs`](crate::validate_proofs).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    /// Issuer.
    pub iss: Did,
    /// Audience.
    pub aud: Did,
    /// Expiration, unix seconds.
    pub exp: u64,
    /// Not valid before, unix seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<u64>,
    /// Nonce.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nnc: Option<String>,
    /// Attenuation: the capabilities granted or claimed.
    pub att: Vec<Capability>,
    /// Facts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fct: Option<Vec<Fact>>,
    /// Encoded proofs.
    #[serde(default)]
    pub prf: Vec<String>,
}

/// A signed token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    header: Header,
    payload: Payload,
    signed_data: String,
    signature: Vec<u8>,
}

impl Token {
    pub(crate) fn from_parts(
        header: Header,
        payload: Payload,
        signed_data: String,
        signature: Vec<u8>,
    ) -> Self {
        Self {
            header,
            payload,
            signed_data,
            signature,
        }
    }

    /// Getter for the header.
    #[must_use]
    pub const fn header(&self) -> &Header {
        &self.header
    }

    /// Getter for the payload.
    #[must_use]
    pub const fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Getter for the `iss` field.
    #[must_use]
    pub const fn issuer(&self) -> &Did {
        &self.payload.iss
    }

    /// Getter for the `aud` field.
    #[must_use]
    pub const fn audience(&self) -> &Did {
        &self.payload.aud
    }

    /// Getter for the `exp` field.
    #[must_use]
    pub const fn expires_at(&self) -> u64 {
        self.payload.exp
    }

    /// Getter for the `nbf` field.
    #[must_use]
    pub const fn not_before(&self) -> Option<u64> {
        self.payload.nbf
    }

    /// Getter for the `nnc` field.
    #[must_use]
    pub fn nonce(&self) -> Option<&str> {
        self.payload.nnc.as_deref()
    }

    /// Getter for the `att` field.
    #[must_use]
    pub fn attenuation(&self) -> &[Capability] {
        &self.payload.att
    }

    /// Getter for the `fct` field. Empty when facts are absent.
    #[must_use]
    pub fn facts(&self) -> &[Fact] {
        self.payload.fct.as_deref().unwrap_or_default()
    }

    /// Getter for the `prf` field.
    #[must_use]
    pub fn proofs(&self) -> &[String] {
        &self.payload.prf
    }

    /// Getter for the `ucv` header field.
    #[must_use]
    pub const fn version(&self) -> Version {
        self.header.ucv
    }

    /// Getter for the `alg` header field.
    #[must_use]
    pub fn algorithm(&self) -> &str {
        &self.header.alg
    }

    /// `header.payload` exactly as signed.
    #[must_use]
    pub fn signed_data(&self) -> &str {
        &self.signed_data
    }

    /// Raw signature bytes.
    #[must_use]
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// The validity window `[nbf, exp]`.
    #[must_use]
    pub fn time_range(&self) -> TimeRange {
        TimeRange::new(self.payload.nbf, Some(self.payload.exp))
    }

    /// Canonical `header.payload.signature` encoding.
    #[must_use]
    pub fn encode(&self) -> String {
        codec::encode(self)
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encode())
    }
}
