mod common;

use common::{alice, bob, issue, mallory, sign_raw};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tether_capability::Capability;
use tether_did::{Plugins, Principal};
use tether_ucan::{
    RequiredCapability, UcanError, ValidateOptions, Version, VerifyOptions, time, validate, verify,
};
use testresult::TestResult;

fn legacy_header(version: &str) -> Value {
    json!({ "alg": "EdDSA", "typ": "JWT", "uav": version })
}

fn mailto_send() -> TestResult<Capability> {
    Ok(Capability::parse("mailto:alice@example.com", "mailto/SEND")?)
}

#[test_log::test(tokio::test)]
async fn legacy_tokens_validate_in_the_current_shape() -> TestResult {
    let encoded = sign_raw(
        &alice(),
        legacy_header("0.3.1"),
        json!({
            "iss": alice().did(),
            "aud": bob().did(),
            "exp": time::now() + 3600,
            "rsc": { "mailto": "alice@example.com" },
            "ptc": "SEND",
            "prf": null,
        }),
    )
    .await?;

    let token = validate(&Plugins::default(), &encoded, &ValidateOptions::default()).await?;
    assert_eq!(token.version(), Version::new(0, 3, 1));
    assert_eq!(token.attenuation(), &[mailto_send()?]);
    assert!(token.proofs().is_empty());
    // The original bytes are kept so the signature still verifies.
    assert_eq!(token.encode(), encoded);
    Ok(())
}

#[tokio::test]
async fn current_tokens_can_build_on_legacy_proofs() -> TestResult {
    let legacy = sign_raw(
        &alice(),
        legacy_header("0.3.1"),
        json!({
            "iss": alice().did(),
            "aud": bob().did(),
            "exp": time::now() + 3600,
            "rsc": { "mailto": "alice@example.com" },
            "ptc": "SEND",
        }),
    )
    .await?;
    let plugins = Plugins::default();
    let legacy = validate(&plugins, &legacy, &ValidateOptions::default()).await?;

    let to_mallory = issue(&bob(), &mallory(), vec![mailto_send()?], &[&legacy]).await?;
    let options = VerifyOptions::new(
        mallory().did(),
        vec![RequiredCapability::new(mailto_send()?, alice().did())],
    )?;
    let verifications = verify(&plugins, &to_mallory.encode(), &options)
        .await
        .map_err(|errors| format!("{errors:?}"))?;
    assert_eq!(verifications.len(), 1);
    Ok(())
}

#[tokio::test]
async fn legacy_tokens_cannot_rest_on_newer_proofs() -> TestResult {
    let to_bob = issue(&alice(), &bob(), vec![mailto_send()?], &[]).await?;
    let legacy = sign_raw(
        &bob(),
        legacy_header("0.3.1"),
        json!({
            "iss": bob().did(),
            "aud": mallory().did(),
            "exp": time::now() + 3600,
            "rsc": { "mailto": "alice@example.com" },
            "ptc": "SEND",
            "prf": to_bob.encode(),
        }),
    )
    .await?;
    let legacy = validate(&Plugins::default(), &legacy, &ValidateOptions::default()).await?;

    let results = common::all_chains(&legacy).await;
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert_eq!(
        results[1],
        Err(UcanError::VersionNotMonotonic {
            token: Version::new(0, 3, 1),
            proof: Version::CURRENT,
        })
    );
    Ok(())
}

#[tokio::test]
async fn it_rejects_unsupported_versions() -> TestResult {
    let payload = json!({
        "iss": alice().did(),
        "aud": bob().did(),
        "exp": time::now() + 3600,
        "att": [],
        "prf": [],
    });
    let plugins = Plugins::default();

    for version in ["0.5.0", "1.0.0"] {
        let header = json!({ "alg": "EdDSA", "typ": "JWT", "ucv": version });
        let encoded = sign_raw(&alice(), header, payload.clone()).await?;
        assert_eq!(
            validate(&plugins, &encoded, &ValidateOptions::default()).await,
            Err(UcanError::UnsupportedVersion(version.to_string()))
        );
    }

    let header = json!({ "alg": "EdDSA", "typ": "JWT", "ucv": "0.8" });
    let encoded = sign_raw(&alice(), header, payload).await?;
    assert_eq!(
        validate(&plugins, &encoded, &ValidateOptions::default()).await,
        Err(UcanError::InvalidVersion("0.8".into()))
    );
    Ok(())
}

#[tokio::test]
async fn signed_tokens_of_another_type_do_not_validate() -> TestResult {
    let header = json!({ "alg": "EdDSA", "typ": "NOT-A-JWT", "ucv": "0.8.1" });
    let payload = json!({
        "iss": alice().did(),
        "aud": bob().did(),
        "exp": time::now() + 3600,
        "att": [],
        "prf": [],
    });
    let encoded = sign_raw(&alice(), header, payload).await?;

    assert!(matches!(
        validate(&Plugins::default(), &encoded, &ValidateOptions::default()).await,
        Err(UcanError::Schema { segment: "header", .. })
    ));
    Ok(())
}
