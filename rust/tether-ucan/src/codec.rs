//! `header.payload.signature` wire format.
//!
//! Each segment is base64url without padding. Header and payload are JSON;
//! they are read through [`compat`](crate::compat) so legacy layouts decode
//! into the current [`Header`] and [`Payload`].

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::Serialize;

use crate::{
    compat,
    error::UcanError,
    token::{Header, Payload, Token},
};

fn decode_segment(segment: &'static str, encoded: &str) -> Result<Vec<u8>, UcanError> {
    URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|error| UcanError::Base64 {
            segment,
            message: error.to_string(),
        })
}

fn decode_json(segment: &'static str, encoded: &str) -> Result<serde_json::Value, UcanError> {
    let bytes = decode_segment(segment, encoded)?;
    serde_json::from_slice(&bytes).map_err(|error| UcanError::Schema {
        segment,
        message: error.to_string(),
    })
}

fn encode_json<T: Serialize>(segment: &'static str, value: &T) -> Result<String, UcanError> {
    let bytes = serde_json::to_vec(value).map_err(|error| UcanError::Schema {
        segment,
        message: error.to_string(),
    })?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// The `header.payload` string a signature covers.
///
/// # Errors
///
/// Fails if either part cannot be serialized.
pub fn signed_data(header: &Header, payload: &Payload) -> Result<String, UcanError> {
    Ok(format!(
        "{}.{}",
        encode_json("header", header)?,
        encode_json("payload", payload)?
    ))
}

/// Parse an encoded token without checking its signature or time bounds.
///
/// # Errors
///
/// Fails on anything but three base64url segments whose header and payload
/// match a supported schema.
pub fn decode(encoded: &str) -> Result<Token, UcanError> {
    let segments: Vec<&str> = encoded.split('.').collect();
    let [header, payload, signature] = segments[..] else {
        return Err(UcanError::MalformedEncoding(segments.len()));
    };

    let (parsed_header, parsed_payload) =
        compat::upgrade(decode_json("header", header)?, decode_json("payload", payload)?)?;
    let signature = decode_segment("signature", signature)?;

    Ok(Token::from_parts(
        parsed_header,
        parsed_payload,
        format!("{header}.{payload}"),
        signature,
    ))
}

/// Canonical encoding of `token`.
#[must_use]
pub fn encode(token: &Token) -> String {
    format!(
        "{}.{}",
        token.signed_data(),
        URL_SAFE_NO_PAD.encode(token.signature())
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::Version;
    use pretty_assertions::assert_eq;
    use tether_capability::Capability;
    use testresult::TestResult;

    fn payload() -> TestResult<Payload> {
        Ok(Payload {
            iss: "did:web:alice.example".parse()?,
            aud: "did:web:bob.example".parse()?,
            exp: 2_000_000_000,
            nbf: None,
            nnc: Some("abc".into()),
            att: vec![Capability::parse("mailto:alice@example.com", "msg/SEND")?],
            fct: None,
            prf: vec![],
        })
    }

    #[test]
    fn it_decodes_what_it_encodes() -> TestResult {
        let header = Header::new("EdDSA", Version::CURRENT);
        let payload = payload()?;
        let signed = signed_data(&header, &payload)?;
        let token = Token::from_parts(header.clone(), payload.clone(), signed, vec![1, 2, 3]);

        let decoded = decode(&token.encode())?;
        assert_eq!(decoded, token);
        assert_eq!(decoded.encode(), token.encode());
        Ok(())
    }

    #[test]
    fn it_writes_capabilities_as_flat_strings() -> TestResult {
        let header = Header::new("EdDSA", Version::CURRENT);
        let signed = signed_data(&header, &payload()?)?;
        let (_, encoded_payload) = signed.split_once('.').ok_or("no separator")?;
        let json: serde_json::Value = serde_json::from_slice(&URL_SAFE_NO_PAD.decode(encoded_payload)?)?;

        assert_eq!(
            json["att"],
            serde_json::json!([{ "with": "mailto:alice@example.com", "can": "msg/SEND" }])
        );
        assert!(json.get("nbf").is_none());
        Ok(())
    }

    #[test]
    fn it_rejects_wrong_segment_counts() {
        assert_eq!(decode("a.b"), Err(UcanError::MalformedEncoding(2)));
        assert_eq!(decode("a.b.c.d"), Err(UcanError::MalformedEncoding(4)));
    }

    #[test]
    fn it_rejects_bad_base64_and_json() {
        assert!(matches!(
            decode("!!.e30.AA"),
            Err(UcanError::Base64 { segment: "header", .. })
        ));
        // "bm90IGpzb24" is "not json"
        assert!(matches!(
            decode("bm90IGpzb24.e30.AA"),
            Err(UcanError::Schema { segment: "header", .. })
        ));
    }
}
