//! Signature verification strategies

use std::cmp::Ordering;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use subtle::ConstantTimeEq;
use warden_bigint::BigInt;

use crate::error::{Result, RsaError};
use crate::{der, emsa, pem};

/// A strategy for checking a PKCS#1 v1.5 signature against a PEM public key.
///
/// `Ok(true)` and `Ok(false)` report whether the signature matches;
/// `Err` is reserved for structural problems with the key or signature.
pub trait SignatureVerifier: Send + Sync {
    fn verify(&self, public_key: &str, data: &[u8], signature: &str) -> Result<bool>;
}

/// Verification through the in-crate big-integer arithmetic. Works on any
/// platform with no further dependencies.
pub struct PureArithmeticVerifier;

impl SignatureVerifier for PureArithmeticVerifier {
    fn verify(&self, public_key: &str, data: &[u8], signature: &str) -> Result<bool> {
        let der_bytes = pem::decode_public_key(public_key)?;
        let (modulus, exponent) = der::parse_spki(&der_bytes)?;
        let raw_signature = decode_signature(signature)?;
        rsa_match(&modulus, &exponent, data, &raw_signature)
    }
}

pub(crate) fn decode_signature(signature: &str) -> Result<Vec<u8>> {
    BASE64
        .decode(signature.as_bytes())
        .map_err(|_| RsaError::SignatureInvalid)
}

/// RSAVP1 plus EMSA comparison, RFC 8017 sections 5.2.2 and 9.2.
fn rsa_match(
    modulus: &BigInt,
    exponent: &BigInt,
    data: &[u8],
    raw_signature: &[u8],
) -> Result<bool> {
    let modulus_length = modulus.to_bytes_be().len();
    if raw_signature.len() != modulus_length {
        return Err(RsaError::SignatureSizeInvalid);
    }

    let signature = BigInt::from_bytes_be(raw_signature);
    let representative = rsavp1(&signature, exponent, modulus)?;
    let bytes = representative.to_bytes_be();
    if bytes.len() > modulus_length {
        return Err(RsaError::ModulusSizeInvalid);
    }

    let mut encoded = vec![0u8; modulus_length - bytes.len()];
    encoded.extend_from_slice(&bytes);
    let expected = emsa::encode_pkcs1_v15(data, modulus_length)?;
    Ok(bool::from(encoded.as_slice().ct_eq(expected.as_slice())))
}

fn rsavp1(signature: &BigInt, exponent: &BigInt, modulus: &BigInt) -> Result<BigInt> {
    if signature.is_negative() || signature.cmp(modulus) == Ordering::Greater {
        return Err(RsaError::SignatureRepresentativeOutOfRange);
    }
    Ok(signature.mod_pow(exponent, modulus)?)
}

/// Whether the ring-backed verifier was compiled in.
pub fn native_supported() -> bool {
    cfg!(feature = "native")
}

/// The preferred verifier for this build: ring-backed when available,
/// otherwise the pure-arithmetic fallback.
pub fn default_verifier() -> Box<dyn SignatureVerifier> {
    #[cfg(feature = "native")]
    {
        Box::new(crate::native::NativeBackedVerifier)
    }
    #[cfg(not(feature = "native"))]
    {
        Box::new(PureArithmeticVerifier)
    }
}
