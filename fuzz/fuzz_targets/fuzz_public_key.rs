#![no_main]

use libfuzzer_sys::fuzz_target;
use warden_bigint::BigInt;
use warden_rsa::der::parse_spki;
use warden_rsa::pem::decode_public_key;

fuzz_target!(|data: &[u8]| {
    // Raw DER walk over arbitrary bytes must never panic.
    if let Ok((modulus, exponent)) = parse_spki(data) {
        assert!(!modulus.is_negative());
        assert!(!exponent.is_negative());
        // Accepted integers survive a byte round trip.
        let encoded = modulus.to_bytes_be();
        assert_eq!(BigInt::from_bytes_be(&encoded), modulus);
    }

    // Same bytes through the PEM layer first.
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(der) = decode_public_key(text) {
            let _ = parse_spki(&der);
        }
    }
});
