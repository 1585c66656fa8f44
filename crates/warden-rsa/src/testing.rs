//! Key-material builders shared by the crate tests

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::der::{RSA_ENCRYPTION_OID, TAG_BIT_STRING, TAG_INTEGER, TAG_OID, TAG_SEQUENCE};

pub(crate) fn der_length(len: usize) -> Vec<u8> {
    if len < 0x80 {
        return vec![len as u8];
    }
    let mut digits = Vec::new();
    let mut rest = len;
    while rest > 0 {
        digits.insert(0, (rest & 0xFF) as u8);
        rest >>= 8;
    }
    let mut out = vec![0x80 | digits.len() as u8];
    out.extend(digits);
    out
}

pub(crate) fn tlv(tag: u8, content: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    out.extend(der_length(content.len()));
    out.extend_from_slice(content);
    out
}

pub(crate) fn der_integer(bytes: &[u8]) -> Vec<u8> {
    let mut content = Vec::with_capacity(bytes.len() + 1);
    if bytes.first().map_or(true, |b| b & 0x80 != 0) {
        content.push(0);
    }
    content.extend_from_slice(bytes);
    tlv(TAG_INTEGER, &content)
}

/// SubjectPublicKeyInfo wrapping an RSA key with the given modulus and
/// exponent bytes.
pub(crate) fn spki(n: &[u8], e: &[u8]) -> Vec<u8> {
    let mut rsa_key = der_integer(n);
    rsa_key.extend(der_integer(e));
    let rsa_key = tlv(TAG_SEQUENCE, &rsa_key);

    let mut algorithm = tlv(TAG_OID, &RSA_ENCRYPTION_OID);
    algorithm.extend([0x05, 0x00]); // NULL parameters
    let algorithm = tlv(TAG_SEQUENCE, &algorithm);

    let mut bit_string = vec![0u8]; // no unused bits
    bit_string.extend(rsa_key);

    let mut body = algorithm;
    body.extend(tlv(TAG_BIT_STRING, &bit_string));
    tlv(TAG_SEQUENCE, &body)
}

/// PEM armor around [`spki`], wrapped at 64 columns.
pub(crate) fn spki_pem(n: &[u8], e: &[u8]) -> String {
    let encoded = BASE64.encode(spki(n, e));
    let mut pem = String::from("-----BEGIN PUBLIC KEY-----\n");
    for chunk in encoded.as_bytes().chunks(64) {
        pem.push_str(std::str::from_utf8(chunk).unwrap());
        pem.push('\n');
    }
    pem.push_str("-----END PUBLIC KEY-----\n");
    pem
}
