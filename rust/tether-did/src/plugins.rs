//! DID-to-verifier resolution through a registry of plugins.
//!
//! Token validation needs two answers about an issuer DID: whether a declared
//! JWT `alg` is acceptable for that DID's key type, and whether a signature
//! over some bytes verifies against it. [`Plugins`] answers both by matching
//! the DID against the plugins registered in it:
//!
//! - `did:key` DIDs are decoded and matched by the multicodec prefix of the
//!   embedded public key against the registered [`KeyPlugin`]s.
//! - any other DID method is looked up by name among the [`MethodPlugin`]s.
//!
//! A registry is an ordinary value that callers pass into every entry point,
//! so tests can swap verifiers freely.

use std::{collections::HashMap, fmt, sync::Arc};

use async_trait::async_trait;
use base58::FromBase58;

use crate::{did::Did, error::PluginError};

/// Verifies signatures for one key type embedded in `did:key` DIDs.
#[async_trait(?Send)]
pub trait KeyPlugin {
    /// Multicodec prefix identifying this key type (e.g. `[0xed, 0x01]`).
    fn prefix(&self) -> &[u8];

    /// The JWT `alg` value tokens signed with this key type must declare.
    fn jwt_alg(&self) -> &str;

    /// Verify `signature` over `data` with the raw `public_key` bytes.
    async fn verify_signature(&self, public_key: &[u8], data: &[u8], signature: &[u8]) -> bool;
}

/// Verifies signatures for an entire DID method (e.g. `did:pkh`).
#[async_trait(?Send)]
pub trait MethodPlugin {
    /// Whether `jwt_alg` is acceptable for `did`.
    fn check_jwt_alg(&self, did: &Did, jwt_alg: &str) -> bool;

    /// Verify `signature` over `data` for `did`.
    async fn verify_signature(
        &self,
        did: &Did,
        data: &[u8],
        signature: &[u8],
    ) -> Result<bool, PluginError>;
}

/// A registry of [`KeyPlugin`]s and [`MethodPlugin`]s.
///
/// Cloning is cheap; plugins are shared.
#[derive(Clone)]
pub struct Plugins {
    keys: Vec<Arc<dyn KeyPlugin>>,
    methods: HashMap<String, Arc<dyn MethodPlugin>>,
}

impl Plugins {
    /// A registry with no plugins. Every DID is unsupported.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            keys: Vec::new(),
            methods: HashMap::new(),
        }
    }

    /// Register a key plugin for `did:key` DIDs.
    #[must_use]
    pub fn with_key_plugin(mut self, plugin: impl KeyPlugin + 'static) -> Self {
        self.keys.push(Arc::new(plugin));
        self
    }

    /// Register a plugin for every DID with the given `method`.
    #[must_use]
    pub fn with_method_plugin(
        mut self,
        method: impl Into<String>,
        plugin: impl MethodPlugin + 'static,
    ) -> Self {
        self.methods.insert(method.into(), Arc::new(plugin));
        self
    }

    /// Check whether `jwt_alg` is the algorithm expected for `did`'s key type.
    ///
    /// # Errors
    ///
    /// Fails when no registered plugin handles `did`.
    pub fn verify_issuer_alg(&self, did: &Did, jwt_alg: &str) -> Result<bool, PluginError> {
        if did.method() == "key" {
            let (plugin, _) = self.resolve_key(did)?;
            return Ok(plugin.jwt_alg() == jwt_alg);
        }
        let plugin = self.resolve_method(did)?;
        Ok(plugin.check_jwt_alg(did, jwt_alg))
    }

    /// Verify `signature` over `data` against `did`.
    ///
    /// # Errors
    ///
    /// Fails when no registered plugin handles `did`, or the DID cannot be
    /// decoded. An invalid signature is `Ok(false)`, not an error.
    pub async fn verify_signature(
        &self,
        did: &Did,
        data: &[u8],
        signature: &[u8],
    ) -> Result<bool, PluginError> {
        if did.method() == "key" {
            let (plugin, public_key) = self.resolve_key(did)?;
            return Ok(plugin
                .verify_signature(&public_key, data, signature)
                .await);
        }
        let plugin = self.resolve_method(did)?;
        plugin.verify_signature(did, data, signature).await
    }

    fn resolve_key(&self, did: &Did) -> Result<(&Arc<dyn KeyPlugin>, Vec<u8>), PluginError> {
        let encoded = did
            .identifier()
            .strip_prefix('z')
            .ok_or_else(|| PluginError::MalformedDidKey(did.clone()))?;
        let bytes = encoded
            .from_base58()
            .map_err(|_| PluginError::MalformedDidKey(did.clone()))?;

        self.keys
            .iter()
            .find_map(|plugin| {
                bytes
                    .strip_prefix(plugin.prefix())
                    .map(|public_key| (plugin, public_key.to_vec()))
            })
            .ok_or_else(|| {
                tracing::debug!(%did, "no key plugin matches did:key prefix");
                PluginError::UnsupportedDid(did.clone())
            })
    }

    fn resolve_method(&self, did: &Did) -> Result<&Arc<dyn MethodPlugin>, PluginError> {
        self.methods.get(did.method()).ok_or_else(|| {
            tracing::debug!(%did, method = did.method(), "no method plugin registered");
            PluginError::UnsupportedDid(did.clone())
        })
    }
}

impl Default for Plugins {
    /// The registry with every key plugin compiled into this crate.
    fn default() -> Self {
        let plugins = Self::empty();
        #[cfg(feature = "ed25519")]
        let plugins = plugins.with_key_plugin(crate::ed25519::Ed25519Plugin);
        plugins
    }
}

impl fmt::Debug for Plugins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let algorithms: Vec<&str> = self.keys.iter().map(|plugin| plugin.jwt_alg()).collect();
        let methods: Vec<&String> = self.methods.keys().collect();
        f.debug_struct("Plugins")
            .field("keys", &algorithms)
            .field("methods", &methods)
            .finish()
    }
}
