//! The delegation chain engine.
//!
//! [`delegation_chains`] enumerates every way a token's capabilities and
//! ownership claims trace back to a root issuer. It walks the embedded proof
//! tree lazily: nothing past the element a consumer asks for is validated or
//! recursed into, so a verifier can stop as soon as it is satisfied.
//!
//! Elements come out in a fixed order:
//!
//! 1. capabilities the token's issuer introduces itself (parenthood), in
//!    `att` order;
//! 2. capabilities delegated through proofs, proof by proof in `prf` order,
//!    and within a proof in `att` order, depth first.
//!
//! Problems with a single proof or capability become `Err` elements and the
//! walk carries on. A capability that no proof backs is simply absent.

use std::sync::Arc;

use futures::stream::{LocalBoxStream, StreamExt};
use tether_capability::{
    Ability, Capability, DelegationSemantics, ReservedScheme, ResourcePointer,
    resource::WILDCARD,
};
use tether_did::{Did, Plugins};

use crate::{
    error::UcanError,
    time::TimeRange,
    token::Token,
    validate::{ValidateProofsOptions, validate_proofs},
};

/// What an ownership claim covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnershipScope {
    /// Everything the owner could issue.
    Superuser,
    /// Resources of one scheme, up to one ability.
    Scoped {
        /// Resource scheme, e.g. `mailto`.
        scheme: String,
        /// Ability bound.
        ability: Ability,
    },
}

impl OwnershipScope {
    /// `*` is [`OwnershipScope::Superuser`]; anything else is scoped to that
    /// scheme.
    pub fn new(scheme: &str, ability: &Ability) -> Self {
        if scheme == WILDCARD {
            OwnershipScope::Superuser
        } else {
            OwnershipScope::Scoped {
                scheme: scheme.to_string(),
                ability: ability.clone(),
            }
        }
    }
}

/// Evidence that a token grants a capability or an ownership claim.
///
/// `chain_step` links to the proof's chain this one was derived from; it is
/// `None` where the token's own issuer introduced the grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DelegationChain {
    /// `token` grants `capability`.
    DelegatedCapability {
        /// The granted capability.
        capability: Capability,
        /// The granting token.
        token: Arc<Token>,
        /// The chain this was delegated from.
        chain_step: Option<Box<DelegationChain>>,
    },

    /// `token`'s issuer holds ownership over `owner_did` within `scope`.
    DelegatedOwnership {
        /// Whose resources are owned.
        owner_did: Did,
        /// What the claim covers.
        scope: OwnershipScope,
        /// The granting token.
        token: Arc<Token>,
        /// The chain this was delegated from.
        chain_step: Option<Box<DelegationChain>>,
    },
}

impl DelegationChain {
    /// The token at this link.
    #[must_use]
    pub fn token(&self) -> &Arc<Token> {
        match self {
            DelegationChain::DelegatedCapability { token, .. }
            | DelegationChain::DelegatedOwnership { token, .. } => token,
        }
    }

    /// The next link towards the root.
    #[must_use]
    pub fn chain_step(&self) -> Option<&DelegationChain> {
        match self {
            DelegationChain::DelegatedCapability { chain_step, .. }
            | DelegationChain::DelegatedOwnership { chain_step, .. } => chain_step.as_deref(),
        }
    }

    /// The DID that originally asserted this grant.
    ///
    /// For an ownership chain this is the owner. Otherwise it is the issuer
    /// of the last token on the chain.
    #[must_use]
    pub fn root_issuer(&self) -> &Did {
        match self {
            DelegationChain::DelegatedOwnership { owner_did, .. } => owner_did,
            DelegationChain::DelegatedCapability {
                chain_step: Some(step),
                ..
            } => step.root_issuer(),
            DelegationChain::DelegatedCapability {
                token,
                chain_step: None,
                ..
            } => token.issuer(),
        }
    }

    /// The window in which every token on the chain is valid.
    #[must_use]
    pub fn time_range(&self) -> TimeRange {
        let own = self.token().time_range();
        match self.chain_step() {
            Some(step) => own.intersect(step.time_range()),
            None => own,
        }
    }
}

/// Does `chain` back `capability`?
///
/// A capability chain must cover both the resource and the ability. An
/// ownership chain must be superuser, or scoped to the capability's scheme
/// with an ability that covers it.
pub fn capability_can_be_delegated(
    semantics: &dyn DelegationSemantics,
    capability: &Capability,
    chain: &DelegationChain,
) -> bool {
    match chain {
        DelegationChain::DelegatedCapability {
            capability: parent, ..
        } => {
            semantics.can_delegate_resource(&parent.with, &capability.with)
                && semantics.can_delegate_ability(&parent.can, &capability.can)
        }
        DelegationChain::DelegatedOwnership { scope, .. } => match scope {
            OwnershipScope::Superuser => true,
            OwnershipScope::Scoped { scheme, ability } => {
                scheme.to_lowercase() == capability.with.scheme.to_lowercase()
                    && semantics.can_delegate_ability(ability, &capability.can)
            }
        },
    }
}

/// Does `chain` back an ownership claim over `owner_did` within `scope`?
///
/// Only ownership chains for the same owner qualify. A superuser chain
/// covers any scope; a scoped chain never covers superuser, and otherwise
/// needs the same scheme and an ability that covers the requested one.
pub fn ownership_can_be_delegated(
    semantics: &dyn DelegationSemantics,
    owner_did: &Did,
    scope: &OwnershipScope,
    chain: &DelegationChain,
) -> bool {
    let DelegationChain::DelegatedOwnership {
        owner_did: parent_owner,
        scope: parent_scope,
        ..
    } = chain
    else {
        return false;
    };
    if owner_did != parent_owner {
        return false;
    }
    match (parent_scope, scope) {
        (OwnershipScope::Superuser, _) => true,
        (_, OwnershipScope::Superuser) => false,
        (
            OwnershipScope::Scoped {
                scheme: parent_scheme,
                ability: parent_ability,
            },
            OwnershipScope::Scoped { scheme, ability },
        ) => {
            parent_scheme.to_lowercase() == scheme.to_lowercase()
                && semantics.can_delegate_ability(parent_ability, ability)
        }
    }
}

/// A revocation check that never revokes.
pub fn not_revoked(_token: &Token) -> bool {
    false
}

/// Which proof a `prf:` capability re-delegates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProofSelector {
    All,
    Index(usize),
}

impl ProofSelector {
    fn parse(hier_part: &str) -> Result<Self, UcanError> {
        if hier_part == WILDCARD {
            return Ok(ProofSelector::All);
        }
        hier_part
            .parse()
            .map(ProofSelector::Index)
            .map_err(|_| UcanError::MalformedProofReference(hier_part.to_string()))
    }

    fn selects(&self, proof_index: usize) -> bool {
        match self {
            ProofSelector::All => true,
            ProofSelector::Index(index) => *index == proof_index,
        }
    }
}

/// Split `as:` hier parts on the last colon: `<owner did>:<scheme>`.
fn parse_ownership(resource: &ResourcePointer) -> Result<(Did, String), UcanError> {
    let malformed = || UcanError::MalformedOwnership(resource.hier_part.clone());
    let (owner, scheme) = resource.hier_part.rsplit_once(':').ok_or_else(malformed)?;
    if scheme.is_empty() {
        return Err(malformed());
    }
    let owner: Did = owner.parse().map_err(|_| malformed())?;
    Ok((owner, scheme.to_string()))
}

fn parenthood(token: &Arc<Token>, capability: &Capability) -> Option<DelegationChain> {
    match capability.with.reserved_scheme() {
        Some(ReservedScheme::My) => Some(DelegationChain::DelegatedOwnership {
            owner_did: token.issuer().clone(),
            scope: OwnershipScope::new(&capability.with.hier_part, &capability.can),
            token: token.clone(),
            chain_step: None,
        }),
        Some(ReservedScheme::As | ReservedScheme::Prf) => None,
        None => Some(DelegationChain::DelegatedCapability {
            capability: capability.clone(),
            token: token.clone(),
            chain_step: None,
        }),
    }
}

/// Lazily enumerate every [`DelegationChain`] `token` supports.
///
/// When `is_revoked(token)` holds, the stream yields a single
/// [`UcanError::Revoked`] and ends. The same check is applied to every proof
/// on the way down. Proofs are validated with [`ValidateProofsOptions`]
/// defaults.
pub fn delegation_chains<'a>(
    plugins: &'a Plugins,
    semantics: &'a dyn DelegationSemantics,
    token: Arc<Token>,
    is_revoked: &'a dyn Fn(&Token) -> bool,
) -> LocalBoxStream<'a, Result<DelegationChain, UcanError>> {
    async_stream::stream! {
        if is_revoked(token.as_ref()) {
            yield Err(UcanError::Revoked {
                issuer: token.issuer().clone(),
                audience: token.audience().clone(),
            });
            return;
        }

        for capability in token.attenuation() {
            if let Some(chain) = parenthood(&token, capability) {
                yield Ok(chain);
            }
        }

        let mut proofs = validate_proofs(plugins, &token, ValidateProofsOptions::default()).enumerate();
        while let Some((proof_index, proof)) = proofs.next().await {
            let proof = match proof {
                Ok(proof) => Arc::new(proof),
                Err(error) => {
                    yield Err(error);
                    continue;
                }
            };

            for capability in token.attenuation() {
                match capability.with.reserved_scheme() {
                    Some(ReservedScheme::My) => {}

                    Some(ReservedScheme::As) => {
                        let (owner_did, scheme) = match parse_ownership(&capability.with) {
                            Ok(parsed) => parsed,
                            Err(error) => {
                                yield Err(error);
                                continue;
                            }
                        };
                        let scope = OwnershipScope::new(&scheme, &capability.can);

                        let mut inner = delegation_chains(plugins, semantics, proof.clone(), is_revoked);
                        while let Some(result) = inner.next().await {
                            match result {
                                Err(error) => yield Err(error),
                                Ok(chain) => {
                                    if ownership_can_be_delegated(semantics, &owner_did, &scope, &chain) {
                                        yield Ok(DelegationChain::DelegatedOwnership {
                                            owner_did: owner_did.clone(),
                                            scope: scope.clone(),
                                            token: token.clone(),
                                            chain_step: Some(Box::new(chain)),
                                        });
                                    }
                                }
                            }
                        }
                    }

                    Some(ReservedScheme::Prf) => {
                        let selector = match ProofSelector::parse(&capability.with.hier_part) {
                            Ok(selector) => selector,
                            Err(error) => {
                                yield Err(error);
                                continue;
                            }
                        };
                        if !selector.selects(proof_index) {
                            continue;
                        }

                        let mut inner = delegation_chains(plugins, semantics, proof.clone(), is_revoked);
                        while let Some(result) = inner.next().await {
                            match result {
                                Err(error) => yield Err(error),
                                Ok(chain) => {
                                    let granted = match &chain {
                                        DelegationChain::DelegatedCapability { capability, .. } => capability.clone(),
                                        DelegationChain::DelegatedOwnership { .. } => continue,
                                    };
                                    yield Ok(DelegationChain::DelegatedCapability {
                                        capability: granted,
                                        token: token.clone(),
                                        chain_step: Some(Box::new(chain)),
                                    });
                                }
                            }
                        }
                    }

                    None => {
                        let mut inner = delegation_chains(plugins, semantics, proof.clone(), is_revoked);
                        while let Some(result) = inner.next().await {
                            match result {
                                Err(error) => yield Err(error),
                                Ok(chain) => {
                                    if capability_can_be_delegated(semantics, capability, &chain) {
                                        yield Ok(DelegationChain::DelegatedCapability {
                                            capability: capability.clone(),
                                            token: token.clone(),
                                            chain_step: Some(Box::new(chain)),
                                        });
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    }
    .boxed_local()
}
