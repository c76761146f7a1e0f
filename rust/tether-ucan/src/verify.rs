//! Checking a token against required capabilities.
//!
//! [`verify`] validates the token, confirms it is addressed to the expected
//! audience, then pulls delegation chains until every
//! [`RequiredCapability`] is matched. It stops pulling the moment nothing
//! remains, so branches after that point are never validated and errors
//! they would have produced are never reported.

use std::sync::Arc;

use futures::StreamExt;
use nonempty::NonEmpty;
use tether_capability::{Capability, DelegationSemantics, EqualCanDelegate};
use tether_did::{Did, Plugins};

use crate::{
    chain::{DelegationChain, capability_can_be_delegated, delegation_chains, not_revoked},
    error::UcanError,
    token::{Fact, Token},
    validate::{ValidateOptions, validate},
};

/// A capability the token must grant, rooted at a given issuer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredCapability {
    /// The capability.
    pub capability: Capability,
    /// Who must have originally asserted it.
    pub root_issuer: Did,
}

impl RequiredCapability {
    /// Require `capability` rooted at `root_issuer`.
    pub fn new(capability: Capability, root_issuer: Did) -> Self {
        Self {
            capability,
            root_issuer,
        }
    }
}

/// A satisfied requirement and the chain that satisfied it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    /// The required capability.
    pub capability: Capability,
    /// Its root issuer.
    pub root_issuer: Did,
    /// Evidence.
    pub proof: DelegationChain,
}

fn accept_all_facts(_facts: &[Fact]) -> bool {
    true
}

/// Arguments to [`verify`].
pub struct VerifyOptions<'a> {
    audience: Did,
    required: NonEmpty<RequiredCapability>,
    validate: ValidateOptions,
    semantics: &'a dyn DelegationSemantics,
    is_revoked: &'a dyn Fn(&Token) -> bool,
    check_facts: &'a dyn Fn(&[Fact]) -> bool,
}

impl<'a> VerifyOptions<'a> {
    /// Expect tokens for `audience` granting every capability in `required`.
    ///
    /// Defaults: [`EqualCanDelegate`] semantics, nothing revoked, all facts
    /// accepted.
    ///
    /// # Errors
    ///
    /// [`UcanError::InvalidArgument`] when `required` is empty.
    pub fn new(audience: Did, required: Vec<RequiredCapability>) -> Result<Self, UcanError> {
        let required = NonEmpty::from_vec(required).ok_or_else(|| {
            UcanError::InvalidArgument("at least one required capability is needed".into())
        })?;
        Ok(Self {
            audience,
            required,
            validate: ValidateOptions::default(),
            semantics: &EqualCanDelegate,
            is_revoked: &not_revoked,
            check_facts: &accept_all_facts,
        })
    }

    /// Use `semantics` to match capabilities.
    #[must_use]
    pub fn semantics(mut self, semantics: &'a dyn DelegationSemantics) -> Self {
        self.semantics = semantics;
        self
    }

    /// Treat tokens for which `is_revoked` holds as revoked.
    #[must_use]
    pub fn is_revoked(mut self, is_revoked: &'a dyn Fn(&Token) -> bool) -> Self {
        self.is_revoked = is_revoked;
        self
    }

    /// Reject tokens whose facts fail `check_facts`.
    #[must_use]
    pub fn check_facts(mut self, check_facts: &'a dyn Fn(&[Fact]) -> bool) -> Self {
        self.check_facts = check_facts;
        self
    }

    /// Override the checks applied to the top-level token.
    #[must_use]
    pub fn validate_options(mut self, validate: ValidateOptions) -> Self {
        self.validate = validate;
        self
    }

    /// The expected audience.
    #[must_use]
    pub fn audience(&self) -> &Did {
        &self.audience
    }

    /// The required capabilities.
    #[must_use]
    pub fn required(&self) -> &NonEmpty<RequiredCapability> {
        &self.required
    }
}

impl std::fmt::Debug for VerifyOptions<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerifyOptions")
            .field("audience", &self.audience)
            .field("required", &self.required)
            .field("validate", &self.validate)
            .finish_non_exhaustive()
    }
}

/// Verify that `encoded` grants every required capability.
///
/// A facts rejection is reported as [`UcanError::FactsRejected`] before any
/// chain is computed.
///
/// # Errors
///
/// Every error observed before the search ended unsatisfied. The list is
/// empty when no chain matched and nothing failed.
pub async fn verify(
    plugins: &Plugins,
    encoded: &str,
    options: &VerifyOptions<'_>,
) -> Result<Vec<Verification>, Vec<UcanError>> {
    let token = validate(plugins, encoded, &options.validate)
        .await
        .map_err(|error| vec![error])?;

    if token.audience() != &options.audience {
        return Err(vec![UcanError::AudienceMismatch {
            expected: options.audience.clone(),
            actual: token.audience().clone(),
        }]);
    }

    if !(options.check_facts)(token.facts()) {
        return Err(vec![UcanError::FactsRejected]);
    }

    let mut remaining: Vec<&RequiredCapability> = options.required.iter().collect();
    let mut verifications = Vec::with_capacity(remaining.len());
    let mut errors = Vec::new();

    let mut chains = delegation_chains(
        plugins,
        options.semantics,
        Arc::new(token),
        options.is_revoked,
    );
    while let Some(result) = chains.next().await {
        let chain = match result {
            Ok(chain) => chain,
            Err(error) => {
                tracing::debug!(%error, "delegation branch failed");
                errors.push(error);
                continue;
            }
        };

        remaining.retain(|required| {
            let satisfied =
                capability_can_be_delegated(options.semantics, &required.capability, &chain)
                    && chain.root_issuer() == &required.root_issuer;
            if satisfied {
                verifications.push(Verification {
                    capability: required.capability.clone(),
                    root_issuer: required.root_issuer.clone(),
                    proof: chain.clone(),
                });
            }
            !satisfied
        });

        if remaining.is_empty() {
            return Ok(verifications);
        }
    }

    tracing::debug!(
        unsatisfied = remaining.len(),
        errors = errors.len(),
        "verification failed"
    );
    Err(errors)
}
