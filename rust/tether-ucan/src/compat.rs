//! Reading tokens written in older layouts.
//!
//! The version is taken from the header's `ucv`, or `uav` in `0.3.x` tokens.
//! `0.3.x` payloads carry one flat `rsc`/`ptc` pair instead of an `att` list
//! and at most one proof; they are rewritten into the current layout here.
//! Versions `>= 0.8.0, < 1.0.0` are read as-is. Anything else is rejected.

use serde::Deserialize;
use serde_json::Value;
use tether_capability::{Ability, Capability, ResourcePointer, resource::WILDCARD};
use tether_did::Did;

use crate::{
    error::UcanError,
    token::{Fact, Header, Payload, TOKEN_TYPE},
    version::Version,
};

#[derive(Deserialize)]
struct LegacyHeader {
    alg: String,
    typ: String,
}

#[derive(Deserialize)]
struct LegacyPayload {
    iss: Did,
    aud: Did,
    exp: u64,
    #[serde(default)]
    nbf: Option<u64>,
    #[serde(default)]
    nnc: Option<String>,
    rsc: Value,
    ptc: String,
    #[serde(default)]
    fct: Option<Vec<Fact>>,
    #[serde(default)]
    prf: Option<String>,
}

fn schema_error(segment: &'static str) -> impl Fn(serde_json::Error) -> UcanError {
    move |error| UcanError::Schema {
        segment,
        message: error.to_string(),
    }
}

fn check_type(typ: &str) -> Result<(), UcanError> {
    if typ == TOKEN_TYPE {
        Ok(())
    } else {
        Err(UcanError::Schema {
            segment: "header",
            message: format!("unexpected typ {typ:?}, expected {TOKEN_TYPE:?}"),
        })
    }
}

fn declared_version(header: &Value) -> Result<Version, UcanError> {
    header
        .get("ucv")
        .or_else(|| header.get("uav"))
        .and_then(Value::as_str)
        .ok_or_else(|| UcanError::Schema {
            segment: "header",
            message: "missing version (ucv)".into(),
        })?
        .parse()
}

/// `rsc: "*"` is ownership of everything; `rsc: { <type>: <value> }` is the
/// resource `<type>:<value>` with the ability `<type>/<ptc>`.
fn legacy_capability(rsc: &Value, ptc: &str) -> Result<Capability, UcanError> {
    match rsc {
        Value::String(wildcard) if wildcard == WILDCARD => Ok(Capability::new(
            ResourcePointer::my(WILDCARD),
            Ability::Superuser,
        )),
        Value::Object(resource) if resource.len() == 1 => {
            let Some((kind, Value::String(value))) = resource.iter().next() else {
                return Err(UcanError::Schema {
                    segment: "payload",
                    message: format!("resource value must be a string: {rsc}"),
                });
            };
            Ok(Capability::new(
                ResourcePointer::new(kind, value),
                format!("{kind}/{ptc}").parse()?,
            ))
        }
        _ => Err(UcanError::Schema {
            segment: "payload",
            message: format!("unrecognized rsc: {rsc}"),
        }),
    }
}

fn upgrade_legacy(
    version: Version,
    header: Value,
    payload: Value,
) -> Result<(Header, Payload), UcanError> {
    let LegacyHeader { alg, typ } =
        serde_json::from_value(header).map_err(schema_error("header"))?;
    check_type(&typ)?;
    let legacy: LegacyPayload =
        serde_json::from_value(payload).map_err(schema_error("payload"))?;

    let capability = legacy_capability(&legacy.rsc, &legacy.ptc)?;

    Ok((
        Header {
            alg,
            typ,
            ucv: version,
        },
        Payload {
            iss: legacy.iss,
            aud: legacy.aud,
            exp: legacy.exp,
            nbf: legacy.nbf,
            nnc: legacy.nnc,
            att: vec![capability],
            fct: legacy.fct,
            prf: legacy.prf.into_iter().collect(),
        },
    ))
}

/// Parse raw header and payload JSON into the current schema.
///
/// # Errors
///
/// Fails when the version is missing, malformed or unsupported, or when the
/// JSON does not match the schema for that version.
pub fn upgrade(header: Value, payload: Value) -> Result<(Header, Payload), UcanError> {
    let version = declared_version(&header)?;

    if version.is_legacy() {
        tracing::debug!(%version, "reading legacy token layout");
        return upgrade_legacy(version, header, payload);
    }
    if !version.is_current() {
        return Err(UcanError::UnsupportedVersion(version.to_string()));
    }

    let header: Header = serde_json::from_value(header).map_err(schema_error("header"))?;
    check_type(&header.typ)?;
    Ok((
        header,
        serde_json::from_value(payload).map_err(schema_error("payload"))?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use testresult::TestResult;

    const ALICE: &str = "did:web:alice.example";
    const BOB: &str = "did:web:bob.example";

    fn legacy_header() -> Value {
        json!({ "alg": "EdDSA", "typ": "JWT", "uav": "0.3.1" })
    }

    #[test]
    fn it_rewrites_flat_resources_into_att() -> TestResult {
        let (header, payload) = upgrade(
            legacy_header(),
            json!({
                "iss": ALICE, "aud": BOB, "exp": 100,
                "rsc": { "mailto": "alice@example.com" }, "ptc": "SEND",
                "prf": "proof.token.here",
            }),
        )?;

        assert_eq!(header.ucv, Version::new(0, 3, 1));
        assert_eq!(
            payload.att,
            vec![Capability::parse("mailto:alice@example.com", "mailto/SEND")?]
        );
        assert_eq!(payload.prf, vec!["proof.token.here".to_string()]);
        assert_eq!(payload.nbf, None);
        Ok(())
    }

    #[test]
    fn it_rewrites_wildcard_resources_into_ownership() -> TestResult {
        let (_, payload) = upgrade(
            legacy_header(),
            json!({ "iss": ALICE, "aud": BOB, "exp": 100, "rsc": "*", "ptc": "SUPER_USER" }),
        )?;

        assert_eq!(payload.att, vec![Capability::parse("my:*", "*")?]);
        assert!(payload.prf.is_empty());
        Ok(())
    }

    #[test]
    fn it_reads_current_tokens_as_is() -> TestResult {
        let (header, payload) = upgrade(
            json!({ "alg": "EdDSA", "typ": "JWT", "ucv": "0.9.0" }),
            json!({
                "iss": ALICE, "aud": BOB, "exp": 100, "nbf": 5,
                "att": [{ "with": "mailto:alice@example.com", "can": "msg/SEND" }],
                "prf": [],
            }),
        )?;
        assert_eq!(header.ucv, Version::new(0, 9, 0));
        assert_eq!(payload.nbf, Some(5));
        Ok(())
    }

    #[test]
    fn it_rejects_unknown_versions() {
        for version in ["0.5.0", "1.0.0", "0.2.9"] {
            let result = upgrade(
                json!({ "alg": "EdDSA", "typ": "JWT", "ucv": version }),
                json!({}),
            );
            assert_eq!(result, Err(UcanError::UnsupportedVersion(version.into())));
        }
        assert!(matches!(
            upgrade(json!({ "alg": "EdDSA", "typ": "JWT" }), json!({})),
            Err(UcanError::Schema { segment: "header", .. })
        ));
    }

    #[test]
    fn it_rejects_other_token_types() {
        let payload = json!({ "iss": ALICE, "aud": BOB, "exp": 100, "att": [], "prf": [] });
        assert!(matches!(
            upgrade(
                json!({ "alg": "EdDSA", "typ": "NOT-A-JWT", "ucv": "0.8.1" }),
                payload
            ),
            Err(UcanError::Schema { segment: "header", .. })
        ));

        let legacy_payload = json!({
            "iss": ALICE, "aud": BOB, "exp": 100,
            "rsc": { "mailto": "alice@example.com" }, "ptc": "SEND",
        });
        assert!(matches!(
            upgrade(
                json!({ "alg": "EdDSA", "typ": "jwt", "uav": "0.3.1" }),
                legacy_payload
            ),
            Err(UcanError::Schema { segment: "header", .. })
        ));
    }
}
