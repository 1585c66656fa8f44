//! Warden BigInt - Sign-magnitude arbitrary-precision integers
//!
//! This crate provides the arithmetic engine backing RSA signature
//! verification: a sign-magnitude integer over 31-bit limbs with modular
//! exponentiation, pluggable reduction strategies, and modular inverses.

pub mod bigint;
pub mod error;
mod limbs;
pub mod modular;

pub use bigint::BigInt;
pub use error::{BigIntError, Result};
pub use modular::Reduction;
