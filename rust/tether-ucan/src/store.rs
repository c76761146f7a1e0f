//! An in-memory index of tokens and their delegation chains.

use std::{cell::RefCell, collections::HashMap, fmt, rc::Rc, sync::Arc};

use futures::StreamExt;
use tether_capability::{Capability, DelegationSemantics};
use tether_did::{Did, Plugins};

use crate::{
    chain::{DelegationChain, capability_can_be_delegated, delegation_chains, not_revoked},
    error::UcanError,
    token::Token,
    validate::{ValidateOptions, validate},
};

struct IndexEntry {
    encoded: String,
    token: Arc<Token>,
    chains: Vec<DelegationChain>,
}

/// Tokens indexed by audience, each with every chain it supports.
///
/// Chains are computed once, when a token is added. Entries are only ever
/// appended; adding a token that is already indexed does nothing.
pub struct Store {
    plugins: Plugins,
    semantics: Box<dyn DelegationSemantics>,
    index: RefCell<HashMap<Did, Vec<Rc<IndexEntry>>>>,
}

impl Store {
    /// An empty store.
    pub fn new(plugins: Plugins, semantics: impl DelegationSemantics + 'static) -> Self {
        Self {
            plugins,
            semantics: Box::new(semantics),
            index: RefCell::new(HashMap::new()),
        }
    }

    /// A store holding each of `tokens`.
    ///
    /// # Errors
    ///
    /// Fails on the first token that does not validate.
    pub async fn from_tokens<I, S>(
        plugins: Plugins,
        semantics: impl DelegationSemantics + 'static,
        tokens: I,
    ) -> Result<Self, UcanError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let store = Self::new(plugins, semantics);
        for encoded in tokens {
            store.add(encoded.as_ref()).await?;
        }
        Ok(store)
    }

    /// The semantics chains are matched with.
    #[must_use]
    pub fn semantics(&self) -> &dyn DelegationSemantics {
        self.semantics.as_ref()
    }

    /// Validate `encoded` and index it.
    ///
    /// # Errors
    ///
    /// Fails when the token does not validate.
    pub async fn add(&self, encoded: &str) -> Result<(), UcanError> {
        let token = validate(&self.plugins, encoded, &ValidateOptions::default()).await?;
        self.add_token(token).await;
        Ok(())
    }

    /// Index an already validated token.
    ///
    /// Chain errors are logged and skipped.
    pub async fn add_token(&self, token: Token) {
        let encoded = token.encode();
        let audience = token.audience().clone();
        if self.contains(&audience, &encoded) {
            return;
        }

        let token = Arc::new(token);
        let mut chains = Vec::new();
        let mut stream = delegation_chains(
            &self.plugins,
            self.semantics.as_ref(),
            token.clone(),
            &not_revoked,
        );
        while let Some(result) = stream.next().await {
            match result {
                Ok(chain) => chains.push(chain),
                Err(error) => {
                    tracing::warn!(issuer = %token.issuer(), %error, "skipping invalid delegation chain");
                }
            }
        }
        drop(stream);

        // Another add of the same token may have finished while chains were
        // being computed.
        if self.contains(&audience, &encoded) {
            return;
        }
        self.index
            .borrow_mut()
            .entry(audience)
            .or_default()
            .push(Rc::new(IndexEntry {
                encoded,
                token,
                chains,
            }));
    }

    fn contains(&self, audience: &Did, encoded: &str) -> bool {
        self.index
            .borrow()
            .get(audience)
            .is_some_and(|entries| entries.iter().any(|entry| entry.encoded == encoded))
    }

    fn entries(&self, audience: &Did) -> Vec<Rc<IndexEntry>> {
        self.index
            .borrow()
            .get(audience)
            .cloned()
            .unwrap_or_default()
    }

    /// Chains held by `audience` that back `capability` and are rooted at
    /// `issuer`, in insertion order.
    ///
    /// Entries present when this is called are iterated; chains are matched
    /// as the iterator advances.
    pub fn find_with_capability<'s>(
        &'s self,
        audience: &Did,
        capability: &'s Capability,
        issuer: &'s Did,
    ) -> impl Iterator<Item = DelegationChain> + use<'s> {
        let semantics = self.semantics.as_ref();
        self.entries(audience).into_iter().flat_map(move |entry| {
            (0..entry.chains.len()).filter_map(move |position| {
                let chain = &entry.chains[position];
                (capability_can_be_delegated(semantics, capability, chain)
                    && chain.root_issuer() == issuer)
                    .then(|| chain.clone())
            })
        })
    }

    /// Tokens for `audience` matching `predicate`.
    pub fn find_by_audience(
        &self,
        audience: &Did,
        predicate: impl Fn(&Token) -> bool,
    ) -> Vec<Arc<Token>> {
        self.entries(audience)
            .iter()
            .filter(|entry| predicate(entry.token.as_ref()))
            .map(|entry| entry.token.clone())
            .collect()
    }

    /// Every token for `audience`.
    #[must_use]
    pub fn get_by_audience(&self, audience: &Did) -> Vec<Arc<Token>> {
        self.find_by_audience(audience, |_| true)
    }

    /// Number of indexed tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.borrow().values().map(Vec::len).sum()
    }

    /// Whether the store holds no tokens.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("plugins", &self.plugins)
            .field("tokens", &self.len())
            .finish_non_exhaustive()
    }
}
