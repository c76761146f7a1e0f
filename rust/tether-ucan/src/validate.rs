//! Token and proof validation.

use futures::stream::{LocalBoxStream, StreamExt};
use tether_did::Plugins;

use crate::{codec, error::UcanError, time, token::Token};

/// Checks [`validate`] performs after parsing. All on by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidateOptions {
    /// The issuer's key type must match the header `alg`.
    pub check_issuer: bool,
    /// The signature must verify against the issuer.
    pub check_signature: bool,
    /// Reject when `exp <= now`.
    pub check_is_expired: bool,
    /// Reject when `nbf > now`.
    pub check_is_too_early: bool,
    /// Time to check against instead of the clock.
    pub now: Option<u64>,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            check_issuer: true,
            check_signature: true,
            check_is_expired: true,
            check_is_too_early: true,
            now: None,
        }
    }
}

impl ValidateOptions {
    /// The configured time, or the clock.
    #[must_use]
    pub fn current_time(&self) -> u64 {
        self.now.unwrap_or_else(time::now)
    }
}

/// Checks [`validate_proofs`] performs on each proof. All on by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidateProofsOptions {
    /// Applied to each proof itself.
    pub validate: ValidateOptions,
    /// The proof's audience must be the token's issuer.
    pub check_addressing: bool,
    /// The token's window must overlap the proof's.
    pub check_time_bounds_subset: bool,
    /// The proof's version must not be newer than the token's.
    pub check_version_monotonic: bool,
}

impl Default for ValidateProofsOptions {
    fn default() -> Self {
        Self {
            validate: ValidateOptions::default(),
            check_addressing: true,
            check_time_bounds_subset: true,
            check_version_monotonic: true,
        }
    }
}

/// Has `token` expired at `now`?
#[must_use]
pub fn is_expired(token: &Token, now: u64) -> bool {
    token.expires_at() <= now
}

/// Is `token` not yet active at `now`?
#[must_use]
pub fn is_too_early(token: &Token, now: u64) -> bool {
    token.not_before().is_some_and(|nbf| nbf > now)
}

/// Parse `encoded` and check it according to `options`.
///
/// # Errors
///
/// Structural errors when the token cannot be parsed; policy errors when a
/// check fails.
pub async fn validate(
    plugins: &Plugins,
    encoded: &str,
    options: &ValidateOptions,
) -> Result<Token, UcanError> {
    let token = codec::decode(encoded)?;

    if options.check_issuer && !plugins.verify_issuer_alg(token.issuer(), token.algorithm())? {
        return Err(UcanError::IssuerAlgMismatch {
            issuer: token.issuer().clone(),
            alg: token.algorithm().to_string(),
        });
    }

    if options.check_signature
        && !plugins
            .verify_signature(
                token.issuer(),
                token.signed_data().as_bytes(),
                token.signature(),
            )
            .await?
    {
        return Err(UcanError::SignatureInvalid(token.issuer().clone()));
    }

    let now = options.current_time();
    if options.check_is_expired && is_expired(&token, now) {
        return Err(UcanError::Expired {
            exp: token.expires_at(),
            now,
        });
    }
    if options.check_is_too_early && is_too_early(&token, now) {
        return Err(UcanError::TooEarly {
            nbf: token.not_before().unwrap_or_default(),
            now,
        });
    }

    Ok(token)
}

async fn validate_proof(
    plugins: &Plugins,
    token: &Token,
    encoded: &str,
    options: &ValidateProofsOptions,
) -> Result<Token, UcanError> {
    let proof = validate(plugins, encoded, &options.validate).await?;

    if options.check_addressing && token.issuer() != proof.audience() {
        return Err(UcanError::ProofAddressing {
            issuer: token.issuer().clone(),
            proof_audience: proof.audience().clone(),
        });
    }

    if options.check_time_bounds_subset && !token.time_range().overlaps(&proof.time_range()) {
        return Err(UcanError::TimeBounds {
            token: token.time_range().to_string(),
            proof: proof.time_range().to_string(),
        });
    }

    if options.check_version_monotonic && proof.version() > token.version() {
        return Err(UcanError::VersionNotMonotonic {
            token: token.version(),
            proof: proof.version(),
        });
    }

    Ok(proof)
}

/// Validate each of `token`'s proofs, in declared order.
///
/// Every proof produces exactly one element; a failing proof never stops
/// the others from being checked.
pub fn validate_proofs<'a>(
    plugins: &'a Plugins,
    token: &'a Token,
    options: ValidateProofsOptions,
) -> LocalBoxStream<'a, Result<Token, UcanError>> {
    async_stream::stream! {
        for encoded in token.proofs() {
            let result = validate_proof(plugins, token, encoded, &options).await;
            if let Err(error) = &result {
                tracing::debug!(issuer = %token.issuer(), %error, "rejected proof");
            }
            yield result;
        }
    }
    .boxed_local()
}
