//! Warden RSA - PKCS#1 v1.5 signature verification over PEM public keys
//!
//! Keys arrive as PEM-armored SubjectPublicKeyInfo blocks and signatures as
//! base64 strings. Verification runs either through the in-crate big-integer
//! arithmetic ([`PureArithmeticVerifier`]) or, behind the `native` feature,
//! through ring ([`NativeBackedVerifier`]).

pub mod der;
pub mod emsa;
pub mod error;
#[cfg(feature = "native")]
pub mod native;
pub mod pem;
pub mod verifier;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{Result, RsaError};
#[cfg(feature = "native")]
pub use native::NativeBackedVerifier;
pub use verifier::{default_verifier, native_supported, PureArithmeticVerifier, SignatureVerifier};
