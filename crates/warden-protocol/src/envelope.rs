//! Order envelope parsing
//!
//! Every inbound order is validated field by field, in a fixed sequence,
//! before any cryptography runs. Each field has two failure codes: one for
//! a missing or empty value and one for a value of the wrong type or shape.
//! The first violation aborts the parse.

use serde_json::{Map, Value};
use url::Url;

use crate::error::{ErrorCode, ProtocolError, Result};
use crate::handshake::is_valid_key_id;
use crate::slug;
use crate::version::version_gte;

/// One fully validated inbound order.
#[derive(Debug, Clone)]
pub struct OrderEnvelope {
    pub request_id: String,
    pub public_key: String,
    pub username: String,
    pub signature: String,
    pub handshake_key: String,
    pub handshake_signature: String,
    pub request_expires_at: i64,
    pub required_version: String,
    pub action_name: String,
    pub action_parameters: Map<String, Value>,
    pub base_url: String,
}

impl OrderEnvelope {
    /// Validate `body` against the deployment's version and base URL.
    pub fn from_value(body: &Value, current_version: &str, current_base_url: &str) -> Result<Self> {
        let request_id = required_string(
            body,
            "oxygenRequestId",
            ErrorCode::RequestIdNotProvided,
            ErrorCode::RequestIdNotValid,
        )?;

        let public_key = required_string(
            body,
            "publicKey",
            ErrorCode::PublicKeyNotProvided,
            ErrorCode::PublicKeyNotValid,
        )?;

        // The username may be empty (it selects the fallback account later),
        // but it must be present and a string.
        let username = match present(body, "username") {
            None => return Err(ProtocolError::new(ErrorCode::UsernameNotProvided)),
            Some(Value::String(text)) => text.clone(),
            Some(_) => return Err(ProtocolError::new(ErrorCode::UsernameNotValid)),
        };

        let signature = required_string(
            body,
            "signature",
            ErrorCode::SignatureNotProvided,
            ErrorCode::SignatureNotValid,
        )?;
        if !is_base64_text(&signature) {
            return Err(ProtocolError::new(ErrorCode::SignatureNotValid));
        }

        let handshake_key = required_string(
            body,
            "handshakeKey",
            ErrorCode::HandshakeKeyNotProvided,
            ErrorCode::HandshakeKeyNotValid,
        )?;
        if !is_valid_key_id(&handshake_key) {
            return Err(ProtocolError::new(ErrorCode::HandshakeKeyNotValid));
        }

        let handshake_signature = required_string(
            body,
            "handshakeSignature",
            ErrorCode::HandshakeSignatureNotProvided,
            ErrorCode::HandshakeSignatureNotValid,
        )?;
        if !is_base64_text(&handshake_signature) {
            return Err(ProtocolError::new(ErrorCode::HandshakeSignatureNotValid));
        }

        let request_expires_at = match present(body, "requestExpiresAt") {
            None => return Err(ProtocolError::new(ErrorCode::ExpirationNotProvided)),
            Some(Value::Number(number)) => number
                .as_i64()
                .ok_or_else(|| ProtocolError::new(ErrorCode::ExpirationNotValid))?,
            Some(_) => return Err(ProtocolError::new(ErrorCode::ExpirationNotValid)),
        };

        let required_version = required_string(
            body,
            "requiredVersion",
            ErrorCode::RequiredVersionNotProvided,
            ErrorCode::RequiredVersionNotValid,
        )?;
        if !is_major_minor(&required_version) {
            return Err(ProtocolError::new(ErrorCode::RequiredVersionNotValid));
        }
        if !version_gte(current_version, &required_version) {
            return Err(ProtocolError::new(ErrorCode::VersionTooLow)
                .with_context("requiredVersion", required_version.clone())
                .with_context("currentVersion", current_version));
        }

        let action_name = required_string(
            body,
            "actionName",
            ErrorCode::ActionNameNotProvided,
            ErrorCode::ActionNameNotValid,
        )?;

        let action_parameters = match present(body, "actionParameters") {
            None => return Err(ProtocolError::new(ErrorCode::ActionParametersNotProvided)),
            Some(Value::Object(map)) => map.clone(),
            Some(_) => return Err(ProtocolError::new(ErrorCode::ActionParametersNotValid)),
        };

        let base_url = required_string(
            body,
            "baseUrl",
            ErrorCode::BaseUrlNotProvided,
            ErrorCode::BaseUrlNotValid,
        )?;
        let parsed = Url::parse(&base_url)
            .ok()
            .filter(|url| matches!(url.scheme(), "http" | "https"))
            .ok_or_else(|| ProtocolError::new(ErrorCode::BaseUrlNotValid))?;
        let provided_slug = slug::slug_of(&parsed)
            .ok_or_else(|| ProtocolError::new(ErrorCode::BaseUrlNotValid))?;

        let current_slug = slug::url_slug(current_base_url).ok_or_else(|| {
            ProtocolError::with_message(
                ErrorCode::GeneralError,
                "Configured base URL is not valid",
            )
        })?;
        if provided_slug != current_slug {
            return Err(ProtocolError::new(ErrorCode::BaseUrlSlugMismatch)
                .with_context("providedBaseUrl", base_url.clone())
                .with_context("providedBaseUrlSlug", provided_slug)
                .with_context("currentBaseUrl", current_base_url)
                .with_context("currentBaseUrlSlug", current_slug));
        }

        Ok(Self {
            request_id,
            public_key,
            username,
            signature,
            handshake_key,
            handshake_signature,
            request_expires_at,
            required_version,
            action_name,
            action_parameters,
            base_url,
        })
    }
}

fn present<'a>(body: &'a Value, name: &str) -> Option<&'a Value> {
    body.get(name).filter(|value| !value.is_null())
}

fn required_string(
    body: &Value,
    name: &str,
    missing: ErrorCode,
    invalid: ErrorCode,
) -> Result<String> {
    match present(body, name) {
        None => Err(ProtocolError::new(missing)),
        Some(Value::String(text)) if text.is_empty() => Err(ProtocolError::new(missing)),
        Some(Value::String(text)) => Ok(text.clone()),
        Some(_) => Err(ProtocolError::new(invalid)),
    }
}

/// Base64 shape: a non-empty run of body characters, then at most two `=`.
pub fn is_base64_text(text: &str) -> bool {
    let body = text.trim_end_matches('=');
    if text.len() - body.len() > 2 || body.is_empty() {
        return false;
    }
    body.bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'/' || b == b'+')
}

fn is_major_minor(text: &str) -> bool {
    match text.split_once('.') {
        Some((major, minor)) => {
            !major.is_empty()
                && !minor.is_empty()
                && major.bytes().all(|b| b.is_ascii_digit())
                && minor.bytes().all(|b| b.is_ascii_digit())
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const VERSION: &str = "1.4";
    const BASE_URL: &str = "https://example.com/site";

    fn valid_body() -> Value {
        json!({
            "oxygenRequestId": "d41d8cd98f00b204e9800998ecf8427e",
            "publicKey": "-----BEGIN PUBLIC KEY-----\nAAAA\n-----END PUBLIC KEY-----",
            "username": "admin",
            "signature": "c2lnbmF0dXJl",
            "handshakeKey": "primary_key",
            "handshakeSignature": "aGFuZHNoYWtl",
            "requestExpiresAt": 1700000000,
            "requiredVersion": "1.2",
            "actionName": "component.enable",
            "actionParameters": {"components": ["views"]},
            "baseUrl": "http://www.example.com/site/",
        })
    }

    fn parse(body: &Value) -> Result<OrderEnvelope> {
        OrderEnvelope::from_value(body, VERSION, BASE_URL)
    }

    #[test]
    fn test_valid_body_parses() {
        let envelope = parse(&valid_body()).unwrap();
        assert_eq!(envelope.request_id, "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(envelope.action_name, "component.enable");
        assert_eq!(envelope.request_expires_at, 1700000000);
        assert_eq!(envelope.action_parameters["components"], json!(["views"]));
    }

    #[test]
    fn test_field_order_first_violation_wins() {
        // an empty body fails on the request id before anything else
        assert_eq!(parse(&json!({})).unwrap_err().code(), 10044);
    }

    #[test]
    fn test_missing_and_invalid_codes_per_field() {
        let cases: &[(&str, Value, u16)] = &[
            ("oxygenRequestId", Value::Null, 10044),
            ("oxygenRequestId", json!(17), 10045),
            ("publicKey", json!(""), 10019),
            ("publicKey", json!(false), 10025),
            ("username", Value::Null, 10016),
            ("username", json!(3), 10047),
            ("signature", Value::Null, 10020),
            ("signature", json!("not base64!"), 10026),
            ("handshakeKey", json!(""), 10035),
            ("handshakeKey", json!("Bad-Id"), 10036),
            ("handshakeSignature", Value::Null, 10037),
            ("handshakeSignature", json!("===="), 10038),
            ("requestExpiresAt", Value::Null, 10021),
            ("requestExpiresAt", json!("1700000000"), 10027),
            ("requestExpiresAt", json!(1.5), 10027),
            ("requiredVersion", json!(""), 10028),
            ("requiredVersion", json!("1"), 10029),
            ("requiredVersion", json!("1.2.3"), 10029),
            ("actionName", Value::Null, 10030),
            ("actionName", json!({}), 10031),
            ("actionParameters", Value::Null, 10032),
            ("actionParameters", json!([1, 2]), 10033),
            ("baseUrl", json!(""), 10039),
            ("baseUrl", json!("ftp://example.com/site"), 10040),
            ("baseUrl", json!("http//broken"), 10040),
        ];
        for (field, value, expected) in cases {
            let mut body = valid_body();
            body[*field] = value.clone();
            let error = parse(&body).unwrap_err();
            assert_eq!(error.code(), *expected, "field {} = {:?}", field, value);
        }
    }

    #[test]
    fn test_empty_username_is_allowed() {
        let mut body = valid_body();
        body["username"] = json!("");
        assert_eq!(parse(&body).unwrap().username, "");
    }

    #[test]
    fn test_empty_action_parameters_are_allowed() {
        let mut body = valid_body();
        body["actionParameters"] = json!({});
        assert!(parse(&body).unwrap().action_parameters.is_empty());
    }

    #[test]
    fn test_version_too_low_carries_both_versions() {
        let mut body = valid_body();
        body["requiredVersion"] = json!("2.0");
        let error = parse(&body).unwrap_err();
        assert_eq!(error.code(), 10034);
        let context = error.context().unwrap();
        assert_eq!(context["requiredVersion"], "2.0");
        assert_eq!(context["currentVersion"], VERSION);
    }

    #[test]
    fn test_slug_mismatch_carries_both_slugs() {
        let mut body = valid_body();
        body["baseUrl"] = json!("https://example.com/other");
        let error = parse(&body).unwrap_err();
        assert_eq!(error.code(), 10041);
        let context = error.context().unwrap();
        assert_eq!(context["providedBaseUrlSlug"], "example.com/other");
        assert_eq!(context["currentBaseUrlSlug"], "example.com/site");
        assert_eq!(context["providedBaseUrl"], "https://example.com/other");
        assert_eq!(context["currentBaseUrl"], BASE_URL);
    }

    #[test]
    fn test_base64_shape() {
        assert!(is_base64_text("c2lnbmF0dXJl"));
        assert!(is_base64_text("AA=="));
        assert!(!is_base64_text(""));
        assert!(!is_base64_text("AAA==="));
        assert!(!is_base64_text("A A"));
        assert!(!is_base64_text("A=B"));
    }
}
