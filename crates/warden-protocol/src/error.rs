//! Error taxonomy with stable numeric codes
//!
//! Every failure the control plane can observe is one of these codes. The
//! numeric values and symbolic names are part of the wire contract and must
//! never be renumbered.

use serde_json::{Map, Value};
use thiserror::Error;
use warden_rsa::RsaError;

pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Stable protocol error codes.
///
/// The discriminant is the wire `errorCode`; [`ErrorCode::name`] is the wire
/// `errorType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    GeneralError = 10000,
    OpensslVerifyError = 10001,
    KeyParsingFailed = 10002,
    MissingAsn1Sequence = 10003,
    MissingAsn1Object = 10004,
    MissingAsn1BitString = 10005,
    MissingAsn1Integer = 10006,
    KeyInvalidLength = 10007,
    UnsupportedEncryption = 10008,
    SignatureRepresentativeOutOfRange = 10009,
    SignatureInvalid = 10010,
    KeyInvalidFormat = 10011,
    SignatureSizeInvalid = 10012,
    ModulusSizeInvalid = 10013,
    EncodedSizeInvalid = 10014,
    ActionNotFound = 10015,
    UsernameNotProvided = 10016,
    NonceExpired = 10017,
    NonceAlreadyUsed = 10018,
    PublicKeyNotProvided = 10019,
    SignatureNotProvided = 10020,
    ExpirationNotProvided = 10021,
    HandshakeVerifyTestFailed = 10022,
    HandshakeVerifyFailed = 10023,
    ActionArgumentEmpty = 10024,
    PublicKeyNotValid = 10025,
    SignatureNotValid = 10026,
    ExpirationNotValid = 10027,
    RequiredVersionNotProvided = 10028,
    RequiredVersionNotValid = 10029,
    ActionNameNotProvided = 10030,
    ActionNameNotValid = 10031,
    ActionParametersNotProvided = 10032,
    ActionParametersNotValid = 10033,
    VersionTooLow = 10034,
    HandshakeKeyNotProvided = 10035,
    HandshakeKeyNotValid = 10036,
    HandshakeSignatureNotProvided = 10037,
    HandshakeSignatureNotValid = 10038,
    BaseUrlNotProvided = 10039,
    BaseUrlNotValid = 10040,
    BaseUrlSlugMismatch = 10041,
    HandshakeLocalKeyNotFound = 10042,
    HandshakeLocalVerifyFailed = 10043,
    RequestIdNotProvided = 10044,
    RequestIdNotValid = 10045,
    FatalError = 10046,
    UsernameNotValid = 10047,
    UserUidNotProvided = 10048,
    UserUidNotValid = 10049,
    PinnedKeyMissing = 10050,
    LoginUserNotFound = 10051,
}

impl ErrorCode {
    /// The numeric wire code.
    pub fn code(self) -> u16 {
        self as u16
    }

    /// The symbolic wire name for the `errorType` field.
    pub fn name(self) -> &'static str {
        match self {
            ErrorCode::GeneralError => "GENERAL_ERROR",
            ErrorCode::OpensslVerifyError => "RSA_KEY_OPENSSL_VERIFY_ERROR",
            ErrorCode::KeyParsingFailed => "RSA_KEY_PARSING_FAILED",
            ErrorCode::MissingAsn1Sequence => "RSA_KEY_MISSING_ASN1_SEQUENCE",
            ErrorCode::MissingAsn1Object => "RSA_KEY_MISSING_ASN1_OBJECT",
            ErrorCode::MissingAsn1BitString => "RSA_KEY_MISSING_ASN1_BITSTRING",
            ErrorCode::MissingAsn1Integer => "RSA_KEY_MISSING_ASN1_INTEGER",
            ErrorCode::KeyInvalidLength => "RSA_KEY_INVALID_LENGTH",
            ErrorCode::UnsupportedEncryption => "RSA_KEY_UNSUPPORTED_ENCRYPTION",
            ErrorCode::SignatureRepresentativeOutOfRange => {
                "RSA_KEY_SIGNATURE_REPRESENTATIVE_OUT_OF_RANGE"
            }
            ErrorCode::SignatureInvalid => "RSA_KEY_SIGNATURE_INVALID",
            ErrorCode::KeyInvalidFormat => "RSA_KEY_INVALID_FORMAT",
            ErrorCode::SignatureSizeInvalid => "RSA_KEY_SIGNATURE_SIZE_INVALID",
            ErrorCode::ModulusSizeInvalid => "RSA_KEY_MODULUS_SIZE_INVALID",
            ErrorCode::EncodedSizeInvalid => "RSA_KEY_ENCODED_SIZE_INVALID",
            ErrorCode::ActionNotFound => "ACTION_NOT_FOUND",
            ErrorCode::UsernameNotProvided => "PROTOCOL_USERNAME_NOT_PROVIDED",
            ErrorCode::NonceExpired => "NONCE_EXPIRED",
            ErrorCode::NonceAlreadyUsed => "NONCE_ALREADY_USED",
            ErrorCode::PublicKeyNotProvided => "PROTOCOL_PUBLIC_KEY_NOT_PROVIDED",
            ErrorCode::SignatureNotProvided => "PROTOCOL_SIGNATURE_NOT_PROVIDED",
            ErrorCode::ExpirationNotProvided => "PROTOCOL_EXPIRATION_NOT_PROVIDED",
            ErrorCode::HandshakeVerifyTestFailed => "HANDSHAKE_VERIFY_TEST_FAILED",
            ErrorCode::HandshakeVerifyFailed => "HANDSHAKE_VERIFY_FAILED",
            ErrorCode::ActionArgumentEmpty => "ACTION_ARGUMENT_EMPTY",
            ErrorCode::PublicKeyNotValid => "PROTOCOL_PUBLIC_KEY_NOT_VALID",
            ErrorCode::SignatureNotValid => "PROTOCOL_SIGNATURE_NOT_VALID",
            ErrorCode::ExpirationNotValid => "PROTOCOL_EXPIRATION_NOT_VALID",
            ErrorCode::RequiredVersionNotProvided => "PROTOCOL_REQUIRED_VERSION_NOT_PROVIDED",
            ErrorCode::RequiredVersionNotValid => "PROTOCOL_REQUIRED_VERSION_NOT_VALID",
            ErrorCode::ActionNameNotProvided => "PROTOCOL_ACTION_NAME_NOT_PROVIDED",
            ErrorCode::ActionNameNotValid => "PROTOCOL_ACTION_NAME_NOT_VALID",
            ErrorCode::ActionParametersNotProvided => "PROTOCOL_ACTION_PARAMETERS_NOT_PROVIDED",
            ErrorCode::ActionParametersNotValid => "PROTOCOL_ACTION_PARAMETERS_NOT_VALID",
            ErrorCode::VersionTooLow => "PROTOCOL_VERSION_TOO_LOW",
            ErrorCode::HandshakeKeyNotProvided => "PROTOCOL_HANDSHAKE_KEY_NOT_PROVIDED",
            ErrorCode::HandshakeKeyNotValid => "PROTOCOL_HANDSHAKE_KEY_NOT_VALID",
            ErrorCode::HandshakeSignatureNotProvided => "PROTOCOL_HANDSHAKE_SIGNATURE_NOT_PROVIDED",
            ErrorCode::HandshakeSignatureNotValid => "PROTOCOL_HANDSHAKE_SIGNATURE_NOT_VALID",
            ErrorCode::BaseUrlNotProvided => "PROTOCOL_BASE_URL_NOT_PROVIDED",
            ErrorCode::BaseUrlNotValid => "PROTOCOL_BASE_URL_NOT_VALID",
            ErrorCode::BaseUrlSlugMismatch => "PROTOCOL_BASE_URL_SLUG_MISMATCHES",
            ErrorCode::HandshakeLocalKeyNotFound => "HANDSHAKE_LOCAL_KEY_NOT_FOUND",
            ErrorCode::HandshakeLocalVerifyFailed => "HANDSHAKE_LOCAL_VERIFY_FAILED",
            ErrorCode::RequestIdNotProvided => "PROTOCOL_REQUEST_ID_NOT_PROVIDED",
            ErrorCode::RequestIdNotValid => "PROTOCOL_REQUEST_ID_NOT_VALID",
            ErrorCode::FatalError => "FATAL_ERROR",
            ErrorCode::UsernameNotValid => "PROTOCOL_USERNAME_NOT_VALID",
            ErrorCode::UserUidNotProvided => "PROTOCOL_USER_UID_NOT_PROVIDED",
            ErrorCode::UserUidNotValid => "PROTOCOL_USER_UID_NOT_VALID",
            ErrorCode::PinnedKeyMissing => "HANDSHAKE_PINNED_KEY_MISSING",
            ErrorCode::LoginUserNotFound => "LOGIN_USER_NOT_FOUND",
        }
    }
}

/// A protocol-visible failure: stable code, human message, optional
/// structured context and an optional underlying cause.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ProtocolError {
    code: ErrorCode,
    message: String,
    context: Option<Map<String, Value>>,
    previous: Option<Box<ProtocolError>>,
}

impl ProtocolError {
    /// An error with the default `Error [<code>]: <NAME>` message.
    pub fn new(code: ErrorCode) -> Self {
        Self {
            code,
            message: format!("Error [{}]: {}", code.code(), code.name()),
            context: None,
            previous: None,
        }
    }

    /// An error with an explicit message.
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: None,
            previous: None,
        }
    }

    /// Attach one context entry; chainable.
    pub fn with_context(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.context
            .get_or_insert_with(Map::new)
            .insert(key.to_string(), value.into());
        self
    }

    /// Attach the error that caused this one.
    pub fn with_previous(mut self, previous: ProtocolError) -> Self {
        self.previous = Some(Box::new(previous));
        self
    }

    pub fn code(&self) -> u16 {
        self.code.code()
    }

    pub fn error_code(&self) -> ErrorCode {
        self.code
    }

    /// Symbolic name for the wire `errorType` field.
    pub fn error_type(&self) -> &'static str {
        self.code.name()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn context(&self) -> Option<&Map<String, Value>> {
        self.context.as_ref()
    }

    pub fn previous(&self) -> Option<&ProtocolError> {
        self.previous.as_deref()
    }
}

impl From<RsaError> for ProtocolError {
    fn from(error: RsaError) -> Self {
        let code = match error {
            RsaError::NativeVerifyError => ErrorCode::OpensslVerifyError,
            RsaError::KeyParsingFailed => ErrorCode::KeyParsingFailed,
            RsaError::MissingAsn1Sequence => ErrorCode::MissingAsn1Sequence,
            RsaError::MissingAsn1Object => ErrorCode::MissingAsn1Object,
            RsaError::MissingAsn1BitString => ErrorCode::MissingAsn1BitString,
            RsaError::MissingAsn1Integer => ErrorCode::MissingAsn1Integer,
            RsaError::KeyInvalidLength => ErrorCode::KeyInvalidLength,
            RsaError::UnsupportedEncryption => ErrorCode::UnsupportedEncryption,
            RsaError::SignatureRepresentativeOutOfRange => {
                ErrorCode::SignatureRepresentativeOutOfRange
            }
            RsaError::SignatureInvalid => ErrorCode::SignatureInvalid,
            RsaError::KeyInvalidFormat => ErrorCode::KeyInvalidFormat,
            RsaError::SignatureSizeInvalid => ErrorCode::SignatureSizeInvalid,
            RsaError::ModulusSizeInvalid => ErrorCode::ModulusSizeInvalid,
            RsaError::EncodedSizeInvalid => ErrorCode::EncodedSizeInvalid,
        };
        ProtocolError::with_message(code, error.to_string())
    }
}
