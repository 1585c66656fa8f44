//! PEM envelope handling for public keys

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::error::{Result, RsaError};

/// Strip the PEM armor and decode the body to DER bytes.
///
/// Header and footer lines (anything starting with `-`) are dropped, as is
/// embedded whitespace. The remaining body must be base64 with at most two
/// trailing padding characters.
pub fn decode_public_key(pem: &str) -> Result<Vec<u8>> {
    let mut body = String::with_capacity(pem.len());
    for line in pem.lines() {
        if line.starts_with('-') {
            continue;
        }
        body.extend(line.chars().filter(|c| *c != ' ' && *c != '\r'));
    }

    let trimmed = body.trim_end_matches('=');
    if trimmed.is_empty() || body.len() - trimmed.len() > 2 {
        return Err(RsaError::KeyInvalidFormat);
    }
    let charset_ok = trimmed
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'/' || b == b'+');
    if !charset_ok {
        return Err(RsaError::KeyInvalidFormat);
    }

    BASE64
        .decode(body.as_bytes())
        .map_err(|_| RsaError::KeyParsingFailed)
}
