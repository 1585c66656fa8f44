//! Verification through the platform crypto library

use ring::signature::{RsaPublicKeyComponents, RSA_PKCS1_1024_8192_SHA1_FOR_LEGACY_USE_ONLY};

use crate::error::{Result, RsaError};
use crate::verifier::{decode_signature, SignatureVerifier};
use crate::{der, pem};

/// Verification delegated to ring. Faster than the in-crate arithmetic but
/// bound to ring's supported modulus sizes.
pub struct NativeBackedVerifier;

impl SignatureVerifier for NativeBackedVerifier {
    fn verify(&self, public_key: &str, data: &[u8], signature: &str) -> Result<bool> {
        let der_bytes = pem::decode_public_key(public_key)?;
        let (modulus, exponent) = der::parse_spki(&der_bytes)?;
        let raw_signature = decode_signature(signature)?;

        if raw_signature.len() != modulus.to_bytes_be().len() {
            return Err(RsaError::SignatureSizeInvalid);
        }
        // ring only accepts 1024 through 8192 bit moduli; anything else is a
        // backend limitation, not a bad signature
        let bits = modulus.bit_length();
        if !(1024..=8192).contains(&bits) {
            return Err(RsaError::NativeVerifyError);
        }

        let components = RsaPublicKeyComponents {
            n: modulus.to_bytes_be(),
            e: exponent.to_bytes_be(),
        };
        let outcome = components.verify(
            &RSA_PKCS1_1024_8192_SHA1_FOR_LEGACY_USE_ONLY,
            data,
            &raw_signature,
        );
        Ok(outcome.is_ok())
    }
}
