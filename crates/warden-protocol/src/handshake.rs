//! Key pinning and the two-proof handshake
//!
//! Trust bootstraps in two steps. While no client key is pinned, an order
//! must prove possession of its own candidate key (a self-consistency check)
//! and present a second signature that verifies against one of the locally
//! pre-distributed handshake keys (the actual trust anchor). Once a key is
//! pinned, only the pinned key is ever checked again; the candidate key in
//! later orders carries no authority.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};
use warden_rsa::SignatureVerifier;

use crate::envelope::OrderEnvelope;
use crate::error::{ErrorCode, ProtocolError, Result};
use crate::nonce::NonceLedger;
use crate::slug::url_slug;
use crate::state::StateStore;

/// State name under which the pinned control-plane key is stored.
pub const PINNED_KEY_STATE: &str = "remote_public_key";

/// Shape of a handshake key id and of keyring file stems.
pub fn is_valid_key_id(text: &str) -> bool {
    !text.is_empty()
        && text
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
}

/// Locally pre-distributed handshake keys, id to PEM.
#[derive(Debug, Clone, Default)]
pub struct HandshakeKeyring {
    keys: HashMap<String, String>,
}

impl HandshakeKeyring {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `<id>.pem` in `dir`. Files whose stem is not a valid key
    /// id are skipped, as are unreadable files.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let mut keyring = Self::new();
        let entries = std::fs::read_dir(dir).map_err(|e| {
            ProtocolError::with_message(
                ErrorCode::GeneralError,
                format!("Cannot read handshake key directory {}: {}", dir.display(), e),
            )
        })?;

        for entry in entries {
            let path = match entry {
                Ok(entry) => entry.path(),
                Err(e) => {
                    warn!("Skipping unreadable directory entry: {}", e);
                    continue;
                }
            };
            if path.extension().and_then(|e| e.to_str()) != Some("pem") {
                continue;
            }
            let stem = match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) if is_valid_key_id(stem) => stem.to_string(),
                _ => {
                    warn!("Skipping handshake key with invalid id: {:?}", path);
                    continue;
                }
            };
            match std::fs::read_to_string(&path) {
                Ok(pem) => {
                    debug!("Loaded handshake key {}", stem);
                    keyring.keys.insert(stem, pem);
                }
                Err(e) => warn!("Skipping unreadable handshake key {:?}: {}", path, e),
            }
        }
        Ok(keyring)
    }

    pub fn insert(&mut self, id: impl Into<String>, pem: impl Into<String>) {
        self.keys.insert(id.into(), pem.into());
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.keys.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Verifies inbound orders against the pinned key, the local keyring and
/// the nonce ledger.
pub struct HandshakeVerifier {
    verifier: Arc<dyn SignatureVerifier>,
    state: Arc<dyn StateStore>,
    nonces: Arc<dyn NonceLedger>,
    keyring: HandshakeKeyring,
    local_slug: String,
}

impl HandshakeVerifier {
    pub fn new(
        verifier: Arc<dyn SignatureVerifier>,
        state: Arc<dyn StateStore>,
        nonces: Arc<dyn NonceLedger>,
        keyring: HandshakeKeyring,
        base_url: &str,
    ) -> Result<Self> {
        let local_slug = url_slug(base_url).ok_or_else(|| {
            ProtocolError::with_message(ErrorCode::GeneralError, "Configured base URL is not valid")
        })?;
        Ok(Self {
            verifier,
            state,
            nonces,
            keyring,
            local_slug,
        })
    }

    /// Run both proofs for `envelope`, then claim its nonce and, on the
    /// pinning transition, persist the candidate key.
    ///
    /// Structural key or signature problems surface as their own RSA codes;
    /// only a clean "does not verify" maps to a handshake failure.
    pub fn verify_order(&self, envelope: &OrderEnvelope, now: i64) -> Result<()> {
        let message = format!("{}_{}", envelope.request_id, envelope.request_expires_at);
        let pinned = self.state.get(PINNED_KEY_STATE);

        match &pinned {
            Some(pinned_key) => {
                if !self
                    .verifier
                    .verify(pinned_key, message.as_bytes(), &envelope.signature)?
                {
                    warn!("Order signature does not verify against the pinned key");
                    return Err(ProtocolError::new(ErrorCode::HandshakeVerifyFailed));
                }
            }
            None => {
                if !self
                    .verifier
                    .verify(&envelope.public_key, message.as_bytes(), &envelope.signature)?
                {
                    warn!("Candidate key fails its own self-consistency proof");
                    return Err(ProtocolError::new(ErrorCode::HandshakeVerifyTestFailed));
                }
            }
        }

        let local_pem = self.keyring.get(&envelope.handshake_key).ok_or_else(|| {
            warn!("No local handshake key {}", envelope.handshake_key);
            ProtocolError::new(ErrorCode::HandshakeLocalKeyNotFound)
                .with_context("handshakeKey", envelope.handshake_key.clone())
        })?;
        if !self.verifier.verify(
            local_pem,
            self.local_slug.as_bytes(),
            &envelope.handshake_signature,
        )? {
            warn!(
                "Handshake signature does not verify against local key {}",
                envelope.handshake_key
            );
            return Err(ProtocolError::new(ErrorCode::HandshakeLocalVerifyFailed));
        }

        self.nonces
            .claim(&envelope.request_id, envelope.request_expires_at, now)?;

        if pinned.is_none() {
            debug!("Pinning control-plane key");
            self.state.set(PINNED_KEY_STATE, &envelope.public_key)?;
        }
        Ok(())
    }
}
