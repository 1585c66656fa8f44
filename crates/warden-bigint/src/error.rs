//! Error types for the big-integer engine

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BigIntError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BigIntError {
    #[error("Division by zero")]
    DivisionByZero,

    #[error("No modular inverse exists")]
    NoModularInverse,

    #[error("Montgomery reduction requires an odd modulus")]
    EvenModulus,

    #[error("Invalid digit {digit:?} for base {base}")]
    InvalidDigit { digit: char, base: u32 },
}
