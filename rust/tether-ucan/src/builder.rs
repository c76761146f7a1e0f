//! Assembling and signing tokens.
//!
//! The issuer, audience and expiration must be set before a token can be
//! built; the type parameters of [`TokenBuilder`] track which ones are.

use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use tether_capability::{Capability, DelegationSemantics};
use tether_did::{Did, Keypair};

use crate::{
    chain::{DelegationChain, capability_can_be_delegated},
    codec,
    error::UcanError,
    sealed::{DidOrUnset, ExpirationOrUnset, IssuerOrUnset, Unset},
    store::Store,
    time,
    token::{Fact, Header, Payload, Token},
    version::Version,
};

/// Random bytes in a nonce from [`TokenBuilder::with_random_nonce`].
const NONCE_LENGTH: usize = 16;

/// Typestate builder for [`Token`]s.
///
/// ```no_run
/// # async fn example(alice: tether_did::Ed25519Keypair, bob: tether_did::Did) -> Result<(), tether_ucan::UcanError> {
/// use tether_capability::Capability;
/// use tether_ucan::TokenBuilder;
///
/// let token = TokenBuilder::new()
///     .issued_by(alice)
///     .to_audience(bob)
///     .with_lifetime_in_seconds(3600)
///     .claim_capability(Capability::parse("mailto:alice@example.com", "msg/SEND")?)
///     .build()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct TokenBuilder<
    K: IssuerOrUnset = Unset,
    A: DidOrUnset = Unset,
    E: ExpirationOrUnset = Unset,
> {
    issuer: K,
    audience: A,
    expiration: E,
    not_before: Option<u64>,
    facts: Vec<Fact>,
    nonce: Option<String>,
    capabilities: Vec<Capability>,
    proofs: Vec<Arc<Token>>,
}

impl Default for TokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenBuilder {
    /// An empty builder.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            issuer: Unset,
            audience: Unset,
            expiration: Unset,
            not_before: None,
            facts: Vec::new(),
            nonce: None,
            capabilities: Vec::new(),
            proofs: Vec::new(),
        }
    }
}

impl<K: IssuerOrUnset, A: DidOrUnset, E: ExpirationOrUnset> TokenBuilder<K, A, E> {
    /// Set the issuer, which also signs the token.
    pub fn issued_by<I: Keypair>(self, issuer: I) -> TokenBuilder<I, A, E> {
        TokenBuilder {
            issuer,
            audience: self.audience,
            expiration: self.expiration,
            not_before: self.not_before,
            facts: self.facts,
            nonce: self.nonce,
            capabilities: self.capabilities,
            proofs: self.proofs,
        }
    }

    /// Set the audience.
    pub fn to_audience(self, audience: Did) -> TokenBuilder<K, Did, E> {
        TokenBuilder {
            issuer: self.issuer,
            audience,
            expiration: self.expiration,
            not_before: self.not_before,
            facts: self.facts,
            nonce: self.nonce,
            capabilities: self.capabilities,
            proofs: self.proofs,
        }
    }

    /// Expire at `expiration` (unix seconds).
    pub fn with_expiration(self, expiration: u64) -> TokenBuilder<K, A, u64> {
        TokenBuilder {
            issuer: self.issuer,
            audience: self.audience,
            expiration,
            not_before: self.not_before,
            facts: self.facts,
            nonce: self.nonce,
            capabilities: self.capabilities,
            proofs: self.proofs,
        }
    }

    /// Expire `seconds` from now.
    pub fn with_lifetime_in_seconds(self, seconds: u64) -> TokenBuilder<K, A, u64> {
        self.with_expiration(time::now().saturating_add(seconds))
    }

    /// Not valid before `not_before` (unix seconds).
    #[must_use]
    pub fn with_not_before(mut self, not_before: u64) -> Self {
        self.not_before = Some(not_before);
        self
    }

    /// Add a fact.
    #[must_use]
    pub fn with_fact(mut self, fact: Fact) -> Self {
        self.facts.push(fact);
        self
    }

    /// Add several facts.
    #[must_use]
    pub fn with_facts(mut self, facts: impl IntoIterator<Item = Fact>) -> Self {
        self.facts.extend(facts);
        self
    }

    /// Set the nonce.
    #[must_use]
    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    /// Set a random base64url nonce.
    ///
    /// # Errors
    ///
    /// Fails if the platform RNG does.
    pub fn with_random_nonce(mut self) -> Result<Self, UcanError> {
        let mut bytes = [0u8; NONCE_LENGTH];
        getrandom::getrandom(&mut bytes).map_err(|error| UcanError::Nonce(error.to_string()))?;
        self.nonce = Some(URL_SAFE_NO_PAD.encode(bytes));
        Ok(self)
    }

    /// Claim a capability on the issuer's own authority.
    #[must_use]
    pub fn claim_capability(mut self, capability: Capability) -> Self {
        self.capabilities.push(capability);
        self
    }

    /// Embed `proof` without checking what it grants.
    ///
    /// Needed for `prf:` and `as:` capabilities, which refer to proofs
    /// rather than being backed by a single chain.
    #[must_use]
    pub fn with_proof(mut self, proof: impl Into<Arc<Token>>) -> Self {
        self.add_proof(&proof.into());
        self
    }

    fn add_proof(&mut self, proof: &Arc<Token>) {
        if !self.proofs.iter().any(|known| known == proof) {
            self.proofs.push(proof.clone());
        }
    }
}

impl<K: Keypair, A: DidOrUnset, E: ExpirationOrUnset> TokenBuilder<K, A, E> {
    /// Delegate `capability` on the strength of `chain`.
    ///
    /// `chain`'s token becomes a proof of the built token.
    ///
    /// # Errors
    ///
    /// Fails when `chain`'s token is not addressed to the issuer, or when it
    /// does not back `capability` under `semantics`.
    pub fn delegate_capability(
        mut self,
        capability: Capability,
        chain: &DelegationChain,
        semantics: &dyn DelegationSemantics,
    ) -> Result<Self, UcanError> {
        let issuer = self.issuer.did();
        let proof = chain.token();
        if proof.audience() != &issuer {
            return Err(UcanError::ProofNotForIssuer {
                issuer,
                proof_audience: proof.audience().clone(),
            });
        }
        if !capability_can_be_delegated(semantics, &capability, chain) {
            return Err(UcanError::NotDelegated(capability.to_string()));
        }

        self.add_proof(proof);
        self.capabilities.push(capability);
        Ok(self)
    }

    /// Delegate `capability` using the first matching chain `store` holds
    /// for the issuer, rooted at `root_issuer`.
    ///
    /// # Errors
    ///
    /// [`UcanError::NoProofInStore`] when the store has no such chain.
    pub fn delegate_capability_from_store(
        self,
        capability: Capability,
        root_issuer: &Did,
        store: &Store,
    ) -> Result<Self, UcanError> {
        let issuer = self.issuer.did();
        let Some(chain) = store
            .find_with_capability(&issuer, &capability, root_issuer)
            .next()
        else {
            return Err(UcanError::NoProofInStore {
                capability: capability.to_string(),
                root_issuer: root_issuer.clone(),
            });
        };
        self.delegate_capability(capability, &chain, store.semantics())
    }
}

impl<K: Keypair> TokenBuilder<K, Did, u64> {
    /// The payload that [`build`](Self::build) signs.
    #[must_use]
    pub fn build_payload(&self) -> Payload {
        Payload {
            iss: self.issuer.did(),
            aud: self.audience.clone(),
            exp: self.expiration,
            nbf: self.not_before,
            nnc: self.nonce.clone(),
            att: self.capabilities.clone(),
            fct: (!self.facts.is_empty()).then(|| self.facts.clone()),
            prf: self.proofs.iter().map(|proof| proof.encode()).collect(),
        }
    }

    /// Sign and return the token.
    ///
    /// # Errors
    ///
    /// Fails when the payload cannot be serialized or signing fails.
    pub async fn build(self) -> Result<Token, UcanError> {
        let header = Header::new(self.issuer.jwt_alg(), Version::CURRENT);
        let payload = self.build_payload();
        let signed_data = codec::signed_data(&header, &payload)?;
        let signature = self.issuer.sign(signed_data.as_bytes()).await?;
        Ok(Token::from_parts(header, payload, signed_data, signature))
    }
}
