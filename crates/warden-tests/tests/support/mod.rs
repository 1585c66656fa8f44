//! Shared fixtures: deterministic RSA keys, signing and order builders
//!
//! Key generation happens only here. The production crates verify
//! signatures; producing them is strictly a test concern.

#![allow(dead_code)]

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use num_bigint::{BigInt, BigUint};
use num_integer::Integer;
use num_traits::{One, Zero};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde_json::{json, Value};
use sha1::{Digest, Sha1};

use warden_kernel::{builtin_registry, DispatchKernel, KernelConfig, NullHostPlatform, UserRecord};
use warden_protocol::{HandshakeKeyring, MemoryNonceLedger, MemoryStateStore};
use warden_rsa::PureArithmeticVerifier;

/// Slug of the deployment every fixture order is addressed to.
pub const LOCAL_SLUG: &str = "localhost";

/// Keyring id the fixture handshake key is registered under.
pub const HANDSHAKE_KEY_ID: &str = "dashboard";

/// Wire test logging into the capture-aware writer; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A 1024-bit RSA keypair derived deterministically from a seed.
pub struct TestKeyPair {
    pub public_pem: String,
    modulus: BigUint,
    private_exponent: BigUint,
}

impl TestKeyPair {
    pub fn generate(seed: u64) -> Self {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let public_exponent = BigUint::from(65_537u32);
        loop {
            let p = random_prime(&mut rng, 512);
            let q = random_prime(&mut rng, 512);
            if p == q {
                continue;
            }
            let modulus = &p * &q;
            if modulus.bits() != 1024 {
                continue;
            }
            let phi = (&p - 1u32) * (&q - 1u32);
            match mod_inverse(&public_exponent, &phi) {
                Some(private_exponent) => {
                    return Self {
                        public_pem: spki_pem(&modulus, &public_exponent),
                        modulus,
                        private_exponent,
                    }
                }
                None => continue,
            }
        }
    }

    pub fn modulus_size(&self) -> usize {
        ((self.modulus.bits() + 7) / 8) as usize
    }

    pub fn modulus_bytes(&self) -> Vec<u8> {
        self.modulus.to_bytes_be()
    }

    /// PKCS#1 v1.5 SHA-1 signature over `message`, base64-encoded.
    pub fn sign(&self, message: &[u8]) -> String {
        let encoded = emsa_pkcs1_v15(message, self.modulus_size());
        let representative = BigUint::from_bytes_be(&encoded);
        let signature = representative.modpow(&self.private_exponent, &self.modulus);
        let mut raw = signature.to_bytes_be();
        while raw.len() < self.modulus_size() {
            raw.insert(0, 0);
        }
        BASE64.encode(raw)
    }
}

fn random_below(rng: &mut ChaCha20Rng, bound: &BigUint) -> BigUint {
    let len = ((bound.bits() + 7) / 8) as usize;
    let mut buf = vec![0u8; len + 8];
    rng.fill(&mut buf[..]);
    BigUint::from_bytes_be(&buf) % bound
}

fn is_probable_prime(candidate: &BigUint, rng: &mut ChaCha20Rng) -> bool {
    const SMALL_PRIMES: [u32; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];
    for small in SMALL_PRIMES {
        let small = BigUint::from(small);
        if candidate == &small {
            return true;
        }
        if (candidate % &small).is_zero() {
            return false;
        }
    }

    let one = BigUint::one();
    let two = &one + &one;
    let minus_one = candidate - &one;
    let mut odd = minus_one.clone();
    let mut rounds = 0u32;
    while odd.is_even() {
        odd >>= 1u32;
        rounds += 1;
    }

    'witness: for _ in 0..16 {
        let base = &two + random_below(rng, &(&minus_one - &two));
        let mut acc = base.modpow(&odd, candidate);
        if acc == one || acc == minus_one {
            continue;
        }
        for _ in 1..rounds {
            acc = acc.modpow(&two, candidate);
            if acc == minus_one {
                continue 'witness;
            }
        }
        return false;
    }
    true
}

fn random_prime(rng: &mut ChaCha20Rng, bits: u64) -> BigUint {
    loop {
        let mut bytes = vec![0u8; (bits / 8) as usize];
        rng.fill(&mut bytes[..]);
        // Top two bits set so the product of two primes fills all 1024 bits;
        // low bit set so the candidate is odd.
        bytes[0] |= 0xC0;
        let last = bytes.len() - 1;
        bytes[last] |= 0x01;
        let candidate = BigUint::from_bytes_be(&bytes);
        if is_probable_prime(&candidate, rng) {
            return candidate;
        }
    }
}

fn mod_inverse(value: &BigUint, modulus: &BigUint) -> Option<BigUint> {
    let value = BigInt::from(value.clone());
    let modulus = BigInt::from(modulus.clone());
    let extended = value.extended_gcd(&modulus);
    if !extended.gcd.is_one() {
        return None;
    }
    let inverse = ((extended.x % &modulus) + &modulus) % &modulus;
    inverse.to_biguint()
}

fn der_length(len: usize) -> Vec<u8> {
    if len < 0x80 {
        return vec![len as u8];
    }
    let bytes: Vec<u8> = len
        .to_be_bytes()
        .iter()
        .copied()
        .skip_while(|byte| *byte == 0)
        .collect();
    let mut out = vec![0x80 | bytes.len() as u8];
    out.extend(bytes);
    out
}

fn tlv(tag: u8, body: &[u8]) -> Vec<u8> {
    let mut out = vec![tag];
    out.extend(der_length(body.len()));
    out.extend_from_slice(body);
    out
}

fn der_integer(value: &BigUint) -> Vec<u8> {
    let bytes = value.to_bytes_be();
    let mut body = Vec::with_capacity(bytes.len() + 1);
    if bytes[0] & 0x80 != 0 {
        body.push(0x00);
    }
    body.extend_from_slice(&bytes);
    tlv(0x02, &body)
}

/// RSA SubjectPublicKeyInfo document, PEM-armored.
pub fn spki_pem(modulus: &BigUint, exponent: &BigUint) -> String {
    let rsa_key = {
        let mut body = der_integer(modulus);
        body.extend(der_integer(exponent));
        tlv(0x30, &body)
    };
    let algorithm = {
        let mut body = tlv(0x06, &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x01, 0x01]);
        body.extend(tlv(0x05, &[]));
        tlv(0x30, &body)
    };
    let bit_string = {
        let mut body = vec![0x00];
        body.extend(rsa_key);
        tlv(0x03, &body)
    };
    let mut document = algorithm;
    document.extend(bit_string);
    let der = tlv(0x30, &document);

    let encoded = BASE64.encode(der);
    let mut pem = String::from("-----BEGIN PUBLIC KEY-----\n");
    for chunk in encoded.as_bytes().chunks(64) {
        pem.push_str(std::str::from_utf8(chunk).unwrap());
        pem.push('\n');
    }
    pem.push_str("-----END PUBLIC KEY-----\n");
    pem
}

const SHA1_DIGEST_INFO: [u8; 15] = [
    0x30, 0x21, 0x30, 0x09, 0x06, 0x05, 0x2b, 0x0e, 0x03, 0x02, 0x1a, 0x05, 0x00, 0x04, 0x14,
];

fn emsa_pkcs1_v15(message: &[u8], encoded_size: usize) -> Vec<u8> {
    let digest = Sha1::digest(message);
    let mut info = SHA1_DIGEST_INFO.to_vec();
    info.extend_from_slice(&digest);
    let mut encoded = vec![0x00, 0x01];
    encoded.extend(std::iter::repeat(0xFFu8).take(encoded_size - info.len() - 3));
    encoded.push(0x00);
    encoded.extend_from_slice(&info);
    encoded
}

/// A fully signed order: `identity` proves itself over
/// `"{requestId}_{requestExpiresAt}"`, `handshake` proves knowledge of the
/// deployment by signing its slug.
pub fn signed_order(
    identity: &TestKeyPair,
    handshake: &TestKeyPair,
    request_id: &str,
    expires_at: i64,
    action: &str,
    parameters: Value,
) -> Value {
    json!({
        "oxygenRequestId": request_id,
        "publicKey": identity.public_pem,
        "username": "",
        "signature": identity.sign(format!("{}_{}", request_id, expires_at).as_bytes()),
        "handshakeKey": HANDSHAKE_KEY_ID,
        "handshakeSignature": handshake.sign(LOCAL_SLUG.as_bytes()),
        "requestExpiresAt": expires_at,
        "requiredVersion": "1.0",
        "actionName": action,
        "actionParameters": parameters,
        "baseUrl": "http://localhost"
    })
}

/// A kernel wired with in-memory stores, the pure verifier and fresh keys.
pub struct Deployment {
    pub kernel: DispatchKernel,
    pub state: Arc<MemoryStateStore>,
    pub nonces: Arc<MemoryNonceLedger>,
    pub identity: TestKeyPair,
    pub handshake: TestKeyPair,
}

impl Deployment {
    pub fn new() -> Self {
        Self::with_config(KernelConfig::default(), Vec::new())
    }

    pub fn with_config(config: KernelConfig, users: Vec<UserRecord>) -> Self {
        let identity = TestKeyPair::generate(11);
        let handshake = TestKeyPair::generate(12);
        let state = Arc::new(MemoryStateStore::new());
        let nonces = Arc::new(MemoryNonceLedger::new());
        let mut keyring = HandshakeKeyring::new();
        keyring.insert(HANDSHAKE_KEY_ID, handshake.public_pem.clone());
        let kernel = DispatchKernel::new(
            config,
            Arc::new(PureArithmeticVerifier),
            state.clone(),
            nonces.clone(),
            keyring,
            builtin_registry(),
            Box::new(NullHostPlatform::with_users(users)),
        )
        .unwrap();
        Self {
            kernel,
            state,
            nonces,
            identity,
            handshake,
        }
    }

    /// A signed order from this deployment's own fixture keys.
    pub fn order(&self, request_id: &str, expires_at: i64, action: &str, parameters: Value) -> Value {
        signed_order(
            &self.identity,
            &self.handshake,
            request_id,
            expires_at,
            action,
            parameters,
        )
    }
}
