//! Ed25519 `did:key` plugin and key pair.

use async_trait::async_trait;
use base58::ToBase58;
use ed25519_dalek::{Signature, SigningKey, VerifyingKey};

use crate::{
    did::Did,
    error::KeyError,
    plugins::KeyPlugin,
    principal::{Keypair, Principal},
};

/// Multicodec prefix for an ed25519 public key.
pub const ED25519_PREFIX: [u8; 2] = [0xed, 0x01];

/// JWT algorithm name for Ed25519 signatures.
pub const ED25519_JWT_ALG: &str = "EdDSA";

/// Verifies Ed25519 signatures for `did:key:z6Mk...` issuers.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Plugin;

#[async_trait(?Send)]
impl KeyPlugin for Ed25519Plugin {
    fn prefix(&self) -> &[u8] {
        &ED25519_PREFIX
    }

    fn jwt_alg(&self) -> &str {
        ED25519_JWT_ALG
    }

    async fn verify_signature(&self, public_key: &[u8], data: &[u8], signature: &[u8]) -> bool {
        let Ok(key_bytes) = <[u8; 32]>::try_from(public_key) else {
            return false;
        };
        let Ok(key) = VerifyingKey::from_bytes(&key_bytes) else {
            return false;
        };
        let Ok(signature) = Signature::from_slice(signature) else {
            return false;
        };
        use ed25519_dalek::Verifier;
        key.verify(data, &signature).is_ok()
    }
}

/// Encode an ed25519 public key as a `did:key`.
#[must_use]
pub fn did_from_public_key(key: &VerifyingKey) -> Did {
    let mut raw_bytes = Vec::with_capacity(34);
    raw_bytes.extend_from_slice(&ED25519_PREFIX);
    raw_bytes.extend_from_slice(key.as_bytes());
    Did::from_raw(format!("did:key:z{}", raw_bytes.to_base58()))
}

/// An Ed25519 signing key bound to its `did:key`.
#[derive(Debug, Clone)]
pub struct Ed25519Keypair {
    did: Did,
    signing_key: SigningKey,
}

impl Ed25519Keypair {
    /// Generate a fresh key pair from the OS random source.
    ///
    /// # Errors
    ///
    /// Returns an error if the RNG fails.
    pub fn generate() -> Result<Self, KeyError> {
        let mut seed = [0u8; 32];
        getrandom::getrandom(&mut seed).map_err(|e| KeyError::Rng(e.to_string()))?;
        Ok(SigningKey::from_bytes(&seed).into())
    }

    /// Import a key pair from a 32 byte seed.
    ///
    /// # Errors
    ///
    /// Returns an error if the seed has the wrong length.
    pub fn import(seed: &[u8]) -> Result<Self, KeyError> {
        let seed: [u8; 32] = seed
            .try_into()
            .map_err(|_| KeyError::InvalidSeedLength(seed.len()))?;
        Ok(SigningKey::from_bytes(&seed).into())
    }

    /// The public half of this key pair.
    #[must_use]
    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }
}

impl From<SigningKey> for Ed25519Keypair {
    fn from(signing_key: SigningKey) -> Self {
        let did = did_from_public_key(&signing_key.verifying_key());
        Self { did, signing_key }
    }
}

impl Principal for Ed25519Keypair {
    fn did(&self) -> Did {
        self.did.clone()
    }
}

impl Keypair for Ed25519Keypair {
    fn jwt_alg(&self) -> &str {
        ED25519_JWT_ALG
    }

    async fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, signature::Error> {
        use ed25519_dalek::Signer;
        let signature = self.signing_key.try_sign(payload)?;
        Ok(signature.to_bytes().to_vec())
    }
}

impl std::fmt::Display for Ed25519Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.did)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Plugins;
    use testresult::TestResult;

    fn test_keypair(seed: u8) -> Ed25519Keypair {
        Ed25519Keypair::import(&[seed; 32]).unwrap()
    }

    #[test]
    fn it_derives_a_did_key() {
        let keypair = test_keypair(0);
        let did = keypair.did();
        assert_eq!(did.method(), "key");
        assert!(did.as_str().starts_with("did:key:z6Mk"));
        assert_eq!(did, test_keypair(0).did());
        assert_ne!(did, test_keypair(1).did());
    }

    #[test]
    fn it_rejects_short_seeds() {
        assert_eq!(
            Ed25519Keypair::import(&[0u8; 16]).unwrap_err(),
            KeyError::InvalidSeedLength(16)
        );
    }

    #[tokio::test]
    async fn signatures_verify_through_the_registry() -> TestResult {
        let keypair = test_keypair(42);
        let plugins = Plugins::default();
        let signature = keypair.sign(b"payload").await?;

        assert!(plugins.verify_issuer_alg(&keypair.did(), ED25519_JWT_ALG)?);
        assert!(!plugins.verify_issuer_alg(&keypair.did(), "ES256")?);
        assert!(
            plugins
                .verify_signature(&keypair.did(), b"payload", &signature)
                .await?
        );
        assert!(
            !plugins
                .verify_signature(&keypair.did(), b"tampered", &signature)
                .await?
        );
        Ok(())
    }

    #[tokio::test]
    async fn cross_key_verification_fails() -> TestResult {
        let alice = test_keypair(1);
        let bob = test_keypair(2);
        let plugins = Plugins::default();
        let signature = alice.sign(b"same message").await?;

        assert!(
            !plugins
                .verify_signature(&bob.did(), b"same message", &signature)
                .await?
        );
        Ok(())
    }

    #[test]
    fn generated_keys_are_distinct() -> TestResult {
        let a = Ed25519Keypair::generate()?;
        let b = Ed25519Keypair::generate()?;
        assert_ne!(a.did(), b.did());
        Ok(())
    }
}
