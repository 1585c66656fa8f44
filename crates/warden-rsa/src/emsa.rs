//! EMSA-PKCS1-v1_5 message encoding with SHA-1

use sha1::{Digest, Sha1};

use crate::error::{Result, RsaError};

/// DigestInfo header for SHA-1, per RFC 8017 section 9.2 notes.
const SHA1_DIGEST_INFO: [u8; 15] = [
    0x30, 0x21, 0x30, 0x09, 0x06, 0x05, 0x2b, 0x0e, 0x03, 0x02, 0x1a, 0x05, 0x00, 0x04, 0x14,
];

/// Encode a message into an `em_length`-byte block: `00 01 PS 00 T` with
/// `PS` all `FF` and `T` the SHA-1 DigestInfo.
pub fn encode_pkcs1_v15(message: &[u8], em_length: usize) -> Result<Vec<u8>> {
    let digest = Sha1::digest(message);
    let t_len = SHA1_DIGEST_INFO.len() + digest.len();
    if em_length < t_len + 11 {
        return Err(RsaError::EncodedSizeInvalid);
    }

    let mut em = Vec::with_capacity(em_length);
    em.push(0x00);
    em.push(0x01);
    em.resize(em_length - t_len - 1, 0xFF);
    em.push(0x00);
    em.extend_from_slice(&SHA1_DIGEST_INFO);
    em.extend_from_slice(&digest);
    Ok(em)
}
