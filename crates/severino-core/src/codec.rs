//! Registration token and clock-in payload encoding.
//!
//! The portal hands out a registration token during authentication as the
//! value of `<input name="registro">`. The token is base64 of a UTF-8 JSON
//! object whose `funcionario` field is the employee id. Clock-ins send the
//! same shape back: base64 of `{"data_hora", "key", "funcionario"}`.

use std::sync::OnceLock;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::api::PontoError;

/// Name of the input field carrying the registration token
const REGISTRO_FIELD: &str = "registro";

/// Standard alphabet; padding is emitted on encode and optional on decode.
const PORTAL_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

static INPUT_TAG: OnceLock<Regex> = OnceLock::new();
static ATTRIBUTE: OnceLock<Regex> = OnceLock::new();

fn input_tag() -> &'static Regex {
    INPUT_TAG.get_or_init(|| Regex::new(r"(?is)<input\b[^>]*>").expect("input tag pattern"))
}

fn attribute() -> &'static Regex {
    ATTRIBUTE.get_or_init(|| {
        Regex::new(r#"(?is)([a-z_:][-a-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+))"#)
            .expect("attribute pattern")
    })
}

/// Find the value of the `registro` input in an authentication page.
///
/// Attribute order and quoting style are not fixed. An empty value counts as
/// not found.
pub fn extract_registration_token(html: &str) -> Result<String, PontoError> {
    for tag in input_tag().find_iter(html) {
        let mut name = None;
        let mut value = None;

        for caps in attribute().captures_iter(tag.as_str()) {
            let attr = caps[1].to_ascii_lowercase();
            let text = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str())
                .unwrap_or_default();
            match attr.as_str() {
                "name" => name = Some(text),
                "value" => value = Some(text),
                _ => {}
            }
        }

        if name == Some(REGISTRO_FIELD) {
            if let Some(token) = value.map(str::trim).filter(|v| !v.is_empty()) {
                return Ok(token.to_string());
            }
        }
    }

    Err(PontoError::RegistrationTokenNotFound)
}

/// Decode the employee id from a registration token.
pub fn decode_employee_id(token: &str) -> Result<String, PontoError> {
    let bytes = PORTAL_BASE64
        .decode(token.trim())
        .map_err(|e| PontoError::InvalidRegistrationToken(format!("not base64: {}", e)))?;
    let text = String::from_utf8(bytes)
        .map_err(|_| PontoError::InvalidRegistrationToken("not UTF-8".to_string()))?;
    let json: Value = serde_json::from_str(&text)
        .map_err(|e| PontoError::InvalidRegistrationToken(format!("not JSON: {}", e)))?;

    // The portal has sent the id both as a string and as a number
    match json.get("funcionario") {
        Some(Value::String(id)) if !id.is_empty() => Ok(id.clone()),
        Some(Value::Number(id)) => Ok(id.to_string()),
        _ => Err(PontoError::InvalidRegistrationToken(
            "missing funcionario".to_string(),
        )),
    }
}

/// Body of the `registro` field of a clock-in. Field names are fixed by the portal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClockInPayload<'a> {
    pub data_hora: &'a str,
    pub key: &'a str,
    pub funcionario: &'a str,
}

impl<'a> ClockInPayload<'a> {
    pub fn new(timestamp: &'a str, company_key: &'a str, employee_id: &'a str) -> Self {
        Self {
            data_hora: timestamp,
            key: company_key,
            funcionario: employee_id,
        }
    }

    pub fn encode(&self) -> Result<String, PontoError> {
        let json = serde_json::to_string(self).map_err(PontoError::PayloadEncoding)?;
        Ok(PORTAL_BASE64.encode(json))
    }
}

/// base64(JSON{data_hora, key, funcionario})
pub fn encode_clock_in_token(
    timestamp: &str,
    company_key: &str,
    employee_id: &str,
) -> Result<String, PontoError> {
    ClockInPayload::new(timestamp, company_key, employee_id).encode()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn token_for(json: &str) -> String {
        PORTAL_BASE64.encode(json)
    }

    // -------------------------------------------------------------------------
    // Registration token extraction
    // -------------------------------------------------------------------------

    #[test]
    fn test_extract_token_double_quotes() {
        let html = r#"<form><input type="hidden" name="registro" value="eyJhIjoxfQ=="></form>"#;
        assert_eq!(extract_registration_token(html).unwrap(), "eyJhIjoxfQ==");
    }

    #[test]
    fn test_extract_token_value_before_name_single_quotes() {
        let html = "<INPUT value='abc123' id='r' NAME='registro' />";
        assert_eq!(extract_registration_token(html).unwrap(), "abc123");
    }

    #[test]
    fn test_extract_token_skips_other_inputs() {
        let html = r#"
            <input name="emp" value="42">
            <input
                name="registro"
                value="dG9rZW4="
            >
        "#;
        assert_eq!(extract_registration_token(html).unwrap(), "dG9rZW4=");
    }

    #[test]
    fn test_extract_token_missing() {
        let html = r#"<html><body><input name="cpf" value="123"></body></html>"#;
        assert!(matches!(
            extract_registration_token(html),
            Err(PontoError::RegistrationTokenNotFound)
        ));
    }

    #[test]
    fn test_extract_token_empty_value_is_not_found() {
        let html = r#"<input name="registro" value="">"#;
        assert!(matches!(
            extract_registration_token(html),
            Err(PontoError::RegistrationTokenNotFound)
        ));
    }

    #[test]
    fn test_extract_token_similar_name_does_not_match() {
        let html = r#"<input name="registro_old" value="zzz">"#;
        assert!(extract_registration_token(html).is_err());
    }

    // -------------------------------------------------------------------------
    // Employee id decoding
    // -------------------------------------------------------------------------

    #[test]
    fn test_decode_employee_id() {
        let token = token_for(r#"{"funcionario":"F1","key":"E1"}"#);
        assert_eq!(decode_employee_id(&token).unwrap(), "F1");
    }

    #[test]
    fn test_decode_numeric_employee_id() {
        let token = token_for(r#"{"funcionario":9876}"#);
        assert_eq!(decode_employee_id(&token).unwrap(), "9876");
    }

    #[test]
    fn test_decode_tolerates_missing_padding() {
        let token = token_for(r#"{"funcionario":"F1"}"#);
        let unpadded = token.trim_end_matches('=');
        assert_eq!(decode_employee_id(unpadded).unwrap(), "F1");
    }

    #[test]
    fn test_decode_errors_are_distinct() {
        for token in [
            "%%% not base64 %%%".to_string(),
            token_for("not json"),
            token_for(r#"{"key":"E1"}"#),
            token_for(r#"{"funcionario":""}"#),
        ] {
            assert!(matches!(
                decode_employee_id(&token),
                Err(PontoError::InvalidRegistrationToken(_))
            ));
        }
    }

    // -------------------------------------------------------------------------
    // Clock-in payload
    // -------------------------------------------------------------------------

    #[test]
    fn test_clock_in_token_wire_format() {
        let token = encode_clock_in_token("2024-01-01 00:00:00", "E1", "F1").unwrap();
        let json = String::from_utf8(PORTAL_BASE64.decode(&token).unwrap()).unwrap();
        assert_eq!(
            json,
            r#"{"data_hora":"2024-01-01 00:00:00","key":"E1","funcionario":"F1"}"#
        );
    }

    #[test]
    fn test_clock_in_token_decodes_to_employee_id() {
        let token = encode_clock_in_token("2024-01-01 00:00:00", "E1", "F1").unwrap();
        assert_eq!(decode_employee_id(&token).unwrap(), "F1");
    }
}
