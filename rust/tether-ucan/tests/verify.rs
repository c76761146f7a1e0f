mod common;

use std::{cell::Cell, sync::Arc};

use common::{alice, bob, dave, email, issue, mallory};
use futures::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::json;
use tether_capability::{Ability, Capability, EqualCanDelegate, PathSemantics, ResourcePointer};
use tether_did::{Plugins, Principal};
use tether_ucan::{
    DelegationChain, Fact, RequiredCapability, Token, TokenBuilder, UcanError, VerifyOptions,
    delegation_chains, not_revoked, verify,
};
use testresult::TestResult;

fn require_email_from_alice() -> Vec<RequiredCapability> {
    vec![RequiredCapability::new(email(), alice().did())]
}

#[test_log::test(tokio::test)]
async fn prf_wildcard_redelegates_everything_a_proof_grants() -> TestResult {
    let to_bob = issue(&alice(), &bob(), vec![email()], &[]).await?;
    let everything = Capability::new(ResourcePointer::prf_all(), "ucan/DELEGATE".parse()?);
    let to_mallory = issue(&bob(), &mallory(), vec![everything], &[&to_bob]).await?;

    let options = VerifyOptions::new(mallory().did(), require_email_from_alice())?;
    let verifications = verify(&Plugins::default(), &to_mallory.encode(), &options)
        .await
        .map_err(|errors| format!("{errors:?}"))?;

    assert_eq!(verifications.len(), 1);
    assert_eq!(verifications[0].capability, email());
    assert_eq!(verifications[0].root_issuer, alice().did());
    assert_eq!(verifications[0].proof.token().as_ref(), &to_mallory);
    Ok(())
}

#[test_log::test(tokio::test)]
async fn ownership_chains_verify_concrete_capabilities() -> TestResult {
    let plugins = Plugins::default();
    let owned = Capability::new(ResourcePointer::my("*"), Ability::Superuser);
    let to_bob = issue(&alice(), &bob(), vec![owned], &[]).await?;

    let as_alice = Capability::new(
        ResourcePointer::as_owner(alice().did(), "*"),
        Ability::Superuser,
    );
    let to_mallory = issue(&bob(), &mallory(), vec![as_alice], &[&to_bob]).await?;

    let ownership = delegation_chains(
        &plugins,
        &EqualCanDelegate,
        Arc::new(to_mallory),
        &not_revoked,
    )
    .next()
    .await
    .ok_or("no ownership chain")??;
    assert!(matches!(ownership, DelegationChain::DelegatedOwnership { .. }));

    let to_dave = TokenBuilder::new()
        .issued_by(mallory())
        .to_audience(dave().did())
        .with_lifetime_in_seconds(3600)
        .delegate_capability(email(), &ownership, &EqualCanDelegate)?
        .build()
        .await?;

    let options = VerifyOptions::new(dave().did(), require_email_from_alice())?;
    let verifications = verify(&plugins, &to_dave.encode(), &options)
        .await
        .map_err(|errors| format!("{errors:?}"))?;
    assert_eq!(verifications[0].root_issuer, alice().did());
    Ok(())
}

#[tokio::test]
async fn verification_stops_once_satisfied() -> TestResult {
    let to_bob = issue(&alice(), &bob(), vec![email()], &[]).await?;
    let misaddressed = issue(&alice(), &mallory(), vec![email()], &[]).await?;
    let to_mallory = issue(&bob(), &mallory(), vec![email()], &[&to_bob, &misaddressed]).await?;

    let checks = Cell::new(0);
    let counting = |_: &Token| {
        checks.set(checks.get() + 1);
        false
    };
    let options =
        VerifyOptions::new(mallory().did(), require_email_from_alice())?.is_revoked(&counting);

    let verifications = verify(&Plugins::default(), &to_mallory.encode(), &options)
        .await
        .map_err(|errors| format!("{errors:?}"))?;
    assert_eq!(verifications.len(), 1);
    // The top-level token and the first proof; the misaddressed proof is
    // never reached.
    assert_eq!(checks.get(), 2);
    Ok(())
}

#[tokio::test]
async fn unsatisfied_requirements_report_errors_seen() -> TestResult {
    let misaddressed = issue(&alice(), &mallory(), vec![email()], &[]).await?;
    let to_mallory = issue(&bob(), &mallory(), vec![email()], &[&misaddressed]).await?;

    let options = VerifyOptions::new(mallory().did(), require_email_from_alice())?;
    let errors = verify(&Plugins::default(), &to_mallory.encode(), &options)
        .await
        .err()
        .ok_or("verification should fail")?;
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], UcanError::ProofAddressing { .. }));

    // Nothing wrong, just nothing granted.
    let unrelated = issue(&bob(), &mallory(), vec![email()], &[]).await?;
    let errors = verify(&Plugins::default(), &unrelated.encode(), &options)
        .await
        .err()
        .ok_or("verification should fail")?;
    assert!(errors.is_empty());
    Ok(())
}

#[tokio::test]
async fn it_rejects_tokens_for_other_audiences() -> TestResult {
    let to_bob = issue(&alice(), &bob(), vec![email()], &[]).await?;
    let options = VerifyOptions::new(mallory().did(), require_email_from_alice())?;

    let errors = verify(&Plugins::default(), &to_bob.encode(), &options)
        .await
        .err()
        .ok_or("verification should fail")?;
    assert_eq!(
        errors,
        vec![UcanError::AudienceMismatch {
            expected: mallory().did(),
            actual: bob().did(),
        }]
    );
    Ok(())
}

#[tokio::test]
async fn facts_are_checked_before_any_chain() -> TestResult {
    let mut fact = Fact::new();
    fact.insert("purpose".into(), json!("newsletter"));
    let to_bob = TokenBuilder::new()
        .issued_by(alice())
        .to_audience(bob().did())
        .with_lifetime_in_seconds(3600)
        .with_fact(fact)
        .claim_capability(email())
        .build()
        .await?;

    let checks = Cell::new(0);
    let counting = |_: &Token| {
        checks.set(checks.get() + 1);
        false
    };
    let newsletter = json!("newsletter");
    let only_newsletters = |facts: &[Fact]| {
        facts
            .iter()
            .all(|fact| fact.get("purpose") == Some(&newsletter))
    };
    let reject_all = |_: &[Fact]| false;

    let accepted = VerifyOptions::new(bob().did(), require_email_from_alice())?
        .check_facts(&only_newsletters);
    assert!(verify(&Plugins::default(), &to_bob.encode(), &accepted).await.is_ok());

    let rejected = VerifyOptions::new(bob().did(), require_email_from_alice())?
        .check_facts(&reject_all)
        .is_revoked(&counting);
    assert_eq!(
        verify(&Plugins::default(), &to_bob.encode(), &rejected).await,
        Err(vec![UcanError::FactsRejected])
    );
    assert_eq!(checks.get(), 0);
    Ok(())
}

#[tokio::test]
async fn custom_semantics_allow_narrowing() -> TestResult {
    let semantics = PathSemantics::new("wnfs", "wnfs", ["CREATE", "REVISE", "OVERWRITE"]);
    let public = Capability::parse("wnfs://alice.example/public", "wnfs/OVERWRITE")?;
    let photos = Capability::parse("wnfs://alice.example/public/photos", "wnfs/CREATE")?;

    let to_bob = issue(&alice(), &bob(), vec![public], &[]).await?;
    let to_mallory = TokenBuilder::new()
        .issued_by(bob())
        .to_audience(mallory().did())
        .with_lifetime_in_seconds(3600)
        .claim_capability(photos.clone())
        .with_proof(to_bob)
        .build()
        .await?;

    let required = vec![RequiredCapability::new(photos, alice().did())];
    let strict = VerifyOptions::new(mallory().did(), required.clone())?;
    assert!(verify(&Plugins::default(), &to_mallory.encode(), &strict).await.is_err());

    let narrowing = VerifyOptions::new(mallory().did(), required)?.semantics(&semantics);
    assert!(verify(&Plugins::default(), &to_mallory.encode(), &narrowing).await.is_ok());
    Ok(())
}
