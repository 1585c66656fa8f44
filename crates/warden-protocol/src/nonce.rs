//! Single-use nonce ledger
//!
//! Request ids double as nonces: each signed order carries an id and an
//! expiry, and the id may be spent exactly once. The claim is one atomic
//! insert-if-absent so two concurrent orders with the same id cannot both
//! pass.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Mutex;

use tracing::warn;

use crate::error::{ErrorCode, ProtocolError, Result};

/// Records spent nonces.
pub trait NonceLedger: Send + Sync {
    /// Claim `value` until `expires_at`. Expiry is checked before occupancy:
    /// a stale nonce reports [`ErrorCode::NonceExpired`] even when it was
    /// never used.
    fn claim(&self, value: &str, expires_at: i64, now: i64) -> Result<()>;

    /// Drop entries whose expiry has passed.
    fn purge_expired(&self, now: i64);
}

/// In-memory ledger for embedding and tests.
#[derive(Default)]
pub struct MemoryNonceLedger {
    entries: Mutex<HashMap<String, i64>>,
}

impl MemoryNonceLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NonceLedger for MemoryNonceLedger {
    fn claim(&self, value: &str, expires_at: i64, now: i64) -> Result<()> {
        if expires_at < now {
            warn!("Rejecting expired nonce {}", value);
            return Err(ProtocolError::new(ErrorCode::NonceExpired));
        }
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| ProtocolError::with_message(ErrorCode::GeneralError, e.to_string()))?;
        match entries.entry(value.to_string()) {
            Entry::Occupied(_) => {
                warn!("Rejecting replayed nonce {}", value);
                Err(ProtocolError::new(ErrorCode::NonceAlreadyUsed))
            }
            Entry::Vacant(slot) => {
                slot.insert(expires_at);
                Ok(())
            }
        }
    }

    fn purge_expired(&self, now: i64) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.retain(|_, expires_at| *expires_at >= now);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_then_replay() {
        let ledger = MemoryNonceLedger::new();
        assert!(ledger.claim("abc", 100, 50).is_ok());
        let error = ledger.claim("abc", 100, 50).unwrap_err();
        assert_eq!(error.code(), 10018);
    }

    #[test]
    fn test_expired_nonce() {
        let ledger = MemoryNonceLedger::new();
        let error = ledger.claim("abc", 100, 200).unwrap_err();
        assert_eq!(error.code(), 10017);
    }

    #[test]
    fn test_expiry_outranks_occupancy() {
        let ledger = MemoryNonceLedger::new();
        ledger.claim("abc", 100, 50).unwrap();
        // replay after the nonce has also expired
        let error = ledger.claim("abc", 100, 200).unwrap_err();
        assert_eq!(error.code(), 10017);
    }

    #[test]
    fn test_purge_frees_only_stale_entries() {
        let ledger = MemoryNonceLedger::new();
        ledger.claim("old", 100, 50).unwrap();
        ledger.claim("live", 500, 50).unwrap();

        ledger.purge_expired(200);
        // purged id is claimable again with a fresh expiry
        assert!(ledger.claim("old", 500, 200).is_ok());
        assert_eq!(ledger.claim("live", 500, 200).unwrap_err().code(), 10018);
    }
}
