#![allow(dead_code)]

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use futures::StreamExt;
use std::sync::Arc;
use tether_capability::{Capability, EqualCanDelegate};
use tether_did::{Ed25519Keypair, Keypair, Plugins, Principal};
use tether_ucan::{DelegationChain, Token, TokenBuilder, UcanError, delegation_chains, not_revoked};
use testresult::TestResult;

pub fn seeded(seed: u8) -> Ed25519Keypair {
    Ed25519Keypair::import(&[seed; 32]).unwrap()
}

pub fn alice() -> Ed25519Keypair {
    seeded(1)
}

pub fn bob() -> Ed25519Keypair {
    seeded(2)
}

pub fn mallory() -> Ed25519Keypair {
    seeded(3)
}

pub fn dave() -> Ed25519Keypair {
    seeded(4)
}

pub fn email() -> Capability {
    Capability::parse("mailto:alice@example.com", "msg/SEND").unwrap()
}

/// A one-hour token from `issuer` to `audience` claiming `capabilities` and
/// embedding `proofs` as-is.
pub async fn issue(
    issuer: &Ed25519Keypair,
    audience: &impl Principal,
    capabilities: Vec<Capability>,
    proofs: &[&Token],
) -> TestResult<Token> {
    let mut builder = TokenBuilder::new()
        .issued_by(issuer.clone())
        .to_audience(audience.did())
        .with_lifetime_in_seconds(3600)
        .with_random_nonce()?;
    for capability in capabilities {
        builder = builder.claim_capability(capability);
    }
    for proof in proofs {
        builder = builder.with_proof((*proof).clone());
    }
    Ok(builder.build().await?)
}

/// Sign arbitrary header and payload JSON.
pub async fn sign_raw(
    issuer: &Ed25519Keypair,
    header: serde_json::Value,
    payload: serde_json::Value,
) -> TestResult<String> {
    let signed = format!(
        "{}.{}",
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?),
        URL_SAFE_NO_PAD.encode(serde_json::to_vec(&payload)?)
    );
    let signature = issuer.sign(signed.as_bytes()).await?;
    Ok(format!("{signed}.{}", URL_SAFE_NO_PAD.encode(signature)))
}

/// Every element `delegation_chains` yields for `token` with default
/// semantics and nothing revoked.
pub async fn all_chains(token: &Token) -> Vec<Result<DelegationChain, UcanError>> {
    let plugins = Plugins::default();
    delegation_chains(
        &plugins,
        &EqualCanDelegate,
        Arc::new(token.clone()),
        &not_revoked,
    )
    .collect()
    .await
}
