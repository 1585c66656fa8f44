#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use warden_bigint::BigInt;

#[derive(Arbitrary, Debug)]
struct Operands {
    a: Vec<u8>,
    b: Vec<u8>,
    negate_a: bool,
    negate_b: bool,
}

fuzz_target!(|operands: Operands| {
    // Keep magnitudes in the range the verifier actually handles.
    if operands.a.len() > 96 || operands.b.len() > 96 {
        return;
    }

    let mut a = BigInt::from_bytes_be(&operands.a);
    if operands.negate_a {
        a = a.neg();
    }
    let mut b = BigInt::from_bytes_be(&operands.b);
    if operands.negate_b {
        b = b.neg();
    }

    // Additive inverse and commutativity.
    assert_eq!(a.add(&b).sub(&b), a);
    assert_eq!(a.mul(&b), b.mul(&a));

    // Euclidean division reconstructs the dividend with 0 <= r < |b|.
    if !b.is_zero() {
        if let Ok((quotient, remainder)) = a.div_rem(&b) {
            assert_eq!(quotient.mul(&b).add(&remainder), a);
            assert!(!remainder.is_negative());
        }
    }

    // Text round trips.
    let decimal = a.to_decimal();
    assert_eq!(BigInt::from_decimal(&decimal).unwrap(), a);
});
