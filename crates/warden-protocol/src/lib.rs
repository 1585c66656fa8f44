//! Warden Protocol - envelope validation, error taxonomy, nonces and handshake
//!
//! Everything between raw request JSON and a dispatchable order: field
//! validation with stable per-field error codes, the single-use nonce ledger,
//! durable key state with first-use pinning, and the two-proof handshake.

pub mod envelope;
pub mod error;
pub mod handshake;
pub mod nonce;
pub mod slug;
pub mod state;
pub mod version;

pub use envelope::{is_base64_text, OrderEnvelope};
pub use error::{ErrorCode, ProtocolError, Result};
pub use handshake::{
    is_valid_key_id, HandshakeKeyring, HandshakeVerifier, PINNED_KEY_STATE,
};
pub use nonce::{MemoryNonceLedger, NonceLedger};
pub use slug::url_slug;
pub use state::{FileStateStore, MemoryStateStore, StateStore};
pub use version::version_gte;
