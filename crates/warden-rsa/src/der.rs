//! Minimal DER walk for SubjectPublicKeyInfo public keys

use warden_bigint::BigInt;

use crate::error::{Result, RsaError};

/// rsaEncryption, 1.2.840.113549.1.1.1
pub(crate) const RSA_ENCRYPTION_OID: [u8; 9] = [0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x01];

pub(crate) const TAG_SEQUENCE: u8 = 0x30;
pub(crate) const TAG_OID: u8 = 0x06;
pub(crate) const TAG_BIT_STRING: u8 = 0x03;
pub(crate) const TAG_INTEGER: u8 = 0x02;

/// Forward-only reader over a DER buffer.
struct DerCursor<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> DerCursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, position: 0 }
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.position
    }

    fn take(&mut self, length: usize) -> Result<&'a [u8]> {
        if length == 0 || self.remaining() < length {
            return Err(RsaError::KeyInvalidLength);
        }
        let slice = &self.bytes[self.position..self.position + length];
        self.position += length;
        Ok(slice)
    }

    fn take_byte(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    /// Short- or long-form DER length; long-form values keep their low
    /// 32 bits.
    fn take_length(&mut self) -> Result<usize> {
        let first = self.take_byte()?;
        if first & 0x80 == 0 {
            return Ok(first as usize);
        }
        let mut value: u64 = 0;
        for byte in self.take((first & 0x7F) as usize)? {
            value = (value << 8) | *byte as u64;
        }
        Ok((value & 0xFFFF_FFFF) as usize)
    }
}

/// Walk a DER SubjectPublicKeyInfo and extract the RSA modulus and public
/// exponent. Trailing bytes after the exponent are ignored.
pub fn parse_spki(der: &[u8]) -> Result<(BigInt, BigInt)> {
    let mut cursor = DerCursor::new(der);

    if cursor.take_byte()? != TAG_SEQUENCE {
        return Err(RsaError::MissingAsn1Sequence);
    }
    if cursor.take_length()? != cursor.remaining() {
        return Err(RsaError::KeyInvalidLength);
    }

    // AlgorithmIdentifier: the OID must be rsaEncryption; parameters are
    // not inspected
    if cursor.take_byte()? != TAG_SEQUENCE {
        return Err(RsaError::MissingAsn1Sequence);
    }
    let algorithm_len = cursor.take_length()?;
    let mut algorithm = DerCursor::new(cursor.take(algorithm_len)?);
    if algorithm.take_byte()? != TAG_OID {
        return Err(RsaError::MissingAsn1Object);
    }
    let oid_len = algorithm.take_length()?;
    if algorithm.take(oid_len)? != RSA_ENCRYPTION_OID {
        return Err(RsaError::UnsupportedEncryption);
    }

    if cursor.take_byte()? != TAG_BIT_STRING {
        return Err(RsaError::MissingAsn1BitString);
    }
    cursor.take_length()?;
    cursor.take_byte()?; // unused-bits octet

    if cursor.take_byte()? != TAG_SEQUENCE {
        return Err(RsaError::MissingAsn1Sequence);
    }
    if cursor.take_length()? != cursor.remaining() {
        return Err(RsaError::KeyInvalidLength);
    }

    if cursor.take_byte()? != TAG_INTEGER {
        return Err(RsaError::MissingAsn1Integer);
    }
    let modulus_len = cursor.take_length()?;
    let raw_modulus = cursor.take(modulus_len)?;
    if raw_modulus.len() == 1 && raw_modulus[0] <= 2 {
        return Err(RsaError::ModulusSizeInvalid);
    }
    let modulus = BigInt::from_bytes_be(raw_modulus);

    if cursor.take_byte()? != TAG_INTEGER {
        return Err(RsaError::MissingAsn1Integer);
    }
    let exponent_len = cursor.take_length()?;
    let exponent = BigInt::from_bytes_be(cursor.take(exponent_len)?);

    Ok((modulus, exponent))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{der_integer, spki, tlv};

    #[test]
    fn test_parses_modulus_and_exponent() {
        let n = [0xC3u8; 129]; // long-form lengths throughout
        let e = [0x01, 0x00, 0x01];
        let (modulus, exponent) = parse_spki(&spki(&n, &e)).unwrap();
        assert_eq!(modulus.to_bytes_be(), n);
        assert_eq!(exponent.to_bytes_be(), e);
    }

    #[test]
    fn test_rejects_missing_outer_sequence() {
        let mut bytes = spki(&[0xC3; 64], &[3]);
        bytes[0] = 0x31;
        assert_eq!(parse_spki(&bytes), Err(RsaError::MissingAsn1Sequence));
    }

    #[test]
    fn test_rejects_truncated_buffer() {
        let bytes = spki(&[0xC3; 64], &[3]);
        assert_eq!(
            parse_spki(&bytes[..bytes.len() - 4]),
            Err(RsaError::KeyInvalidLength)
        );
    }

    #[test]
    fn test_rejects_foreign_algorithm() {
        // id-ecPublicKey in place of rsaEncryption
        let mut rsa_key = der_integer(&[0xC3; 64]);
        rsa_key.extend(der_integer(&[3]));
        let rsa_key = tlv(TAG_SEQUENCE, &rsa_key);
        let mut algorithm = tlv(TAG_OID, &[0x2a, 0x86, 0x48, 0xce, 0x3d, 0x02, 0x01]);
        algorithm.extend([0x05, 0x00]);
        let algorithm = tlv(TAG_SEQUENCE, &algorithm);
        let mut bit_string = vec![0u8];
        bit_string.extend(rsa_key);
        let mut body = algorithm;
        body.extend(tlv(TAG_BIT_STRING, &bit_string));
        let bytes = tlv(TAG_SEQUENCE, &body);

        assert_eq!(parse_spki(&bytes), Err(RsaError::UnsupportedEncryption));
    }

    #[test]
    fn test_rejects_missing_integer_tags() {
        let reference = spki(&[0xC3; 4], &[3]);
        // find the key SEQUENCE inside the BIT STRING and break the first
        // INTEGER tag
        let position = reference
            .windows(3)
            .rposition(|w| w == [0x30, 0x0A, 0x02])
            .unwrap();
        let mut bytes = reference.clone();
        bytes[position + 2] = 0x04;
        assert_eq!(parse_spki(&bytes), Err(RsaError::MissingAsn1Integer));
    }

    #[test]
    fn test_rejects_degenerate_modulus() {
        let bytes = spki(&[0x02], &[3]);
        assert_eq!(parse_spki(&bytes), Err(RsaError::ModulusSizeInvalid));
    }

    #[test]
    fn test_ignores_trailing_bytes_after_exponent() {
        // PKCS#1 allows nothing after the exponent, but the walk stops there
        let n = [0xC3u8; 64];
        let mut rsa_key = der_integer(&n);
        rsa_key.extend(der_integer(&[0x01, 0x00, 0x01]));
        rsa_key.extend([0xAA, 0xBB]); // stray bytes inside the key SEQUENCE
        let rsa_key = tlv(TAG_SEQUENCE, &rsa_key);
        let mut algorithm = tlv(TAG_OID, &RSA_ENCRYPTION_OID);
        algorithm.extend([0x05, 0x00]);
        let algorithm = tlv(TAG_SEQUENCE, &algorithm);
        let mut bit_string = vec![0u8];
        bit_string.extend(rsa_key);
        let mut body = algorithm;
        body.extend(tlv(TAG_BIT_STRING, &bit_string));
        let bytes = tlv(TAG_SEQUENCE, &body);

        let (modulus, _) = parse_spki(&bytes).unwrap();
        assert_eq!(modulus.to_bytes_be(), n);
    }
}
