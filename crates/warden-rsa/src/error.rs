//! Error types for RSA key parsing and signature verification

use thiserror::Error;
use warden_bigint::BigIntError;

pub type Result<T> = std::result::Result<T, RsaError>;

/// Structural failures from key parsing or the verification primitive.
///
/// A well-formed signature that simply does not match the data is reported
/// by the verifiers as `Ok(false)`, never as an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RsaError {
    /// The native backend cannot process this key at all.
    #[error("Native verification backend failed")]
    NativeVerifyError,
    #[error("Public key is not decodable")]
    KeyParsingFailed,
    #[error("Expected an ASN.1 SEQUENCE tag")]
    MissingAsn1Sequence,
    #[error("Expected an ASN.1 OBJECT IDENTIFIER tag")]
    MissingAsn1Object,
    #[error("Expected an ASN.1 BIT STRING tag")]
    MissingAsn1BitString,
    #[error("Expected an ASN.1 INTEGER tag")]
    MissingAsn1Integer,
    #[error("Key segment length does not match its contents")]
    KeyInvalidLength,
    #[error("Key algorithm is not RSA")]
    UnsupportedEncryption,
    #[error("Signature representative out of range")]
    SignatureRepresentativeOutOfRange,
    #[error("Signature is not decodable")]
    SignatureInvalid,
    #[error("Key is not in a valid PEM format")]
    KeyInvalidFormat,
    #[error("Signature length does not match the modulus")]
    SignatureSizeInvalid,
    #[error("Modulus size is not valid")]
    ModulusSizeInvalid,
    #[error("Encoded message length is not valid")]
    EncodedSizeInvalid,
}

impl RsaError {
    /// Stable numeric code carried on the wire.
    pub fn code(&self) -> u16 {
        match self {
            RsaError::NativeVerifyError => 10001,
            RsaError::KeyParsingFailed => 10002,
            RsaError::MissingAsn1Sequence => 10003,
            RsaError::MissingAsn1Object => 10004,
            RsaError::MissingAsn1BitString => 10005,
            RsaError::MissingAsn1Integer => 10006,
            RsaError::KeyInvalidLength => 10007,
            RsaError::UnsupportedEncryption => 10008,
            RsaError::SignatureRepresentativeOutOfRange => 10009,
            RsaError::SignatureInvalid => 10010,
            RsaError::KeyInvalidFormat => 10011,
            RsaError::SignatureSizeInvalid => 10012,
            RsaError::ModulusSizeInvalid => 10013,
            RsaError::EncodedSizeInvalid => 10014,
        }
    }
}

impl From<BigIntError> for RsaError {
    // arithmetic can only blow up on a degenerate modulus
    fn from(_: BigIntError) -> Self {
        RsaError::ModulusSizeInvalid
    }
}
