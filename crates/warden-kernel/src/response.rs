//! Response envelopes
//!
//! Every order gets exactly one envelope back, success or failure. The
//! response id is the request id passed through rot13 so that request and
//! response can be correlated in logs without echoing the id verbatim.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use warden_protocol::ProtocolError;

/// Rotate ASCII letters by 13 positions, leaving everything else alone.
/// Applying it twice gives back the input.
pub fn rot13(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'a'..='z' => (((c as u8 - b'a' + 13) % 26) + b'a') as char,
            'A'..='Z' => (((c as u8 - b'A' + 13) % 26) + b'A') as char,
            other => other,
        })
        .collect()
}

/// One non-fatal diagnostic raised while an order ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub level: String,
    pub message: String,
}

/// Collector for diagnostics that should reach the remote without failing
/// the order.
#[derive(Debug, Default)]
pub struct ErrorLog {
    entries: Vec<LogEntry>,
}

impl ErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, level: impl Into<String>, message: impl Into<String>) {
        self.entries.push(LogEntry {
            level: level.into(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<LogEntry> {
        self.entries
    }
}

/// Wire form of a dispatch error. `context` and `previous` carry internal
/// detail and are withheld from unauthenticated callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireException {
    pub error_code: u16,
    pub error_type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<Box<WireException>>,
}

impl WireException {
    pub fn from_error(error: &ProtocolError, verbose: bool) -> Self {
        Self {
            error_code: error.code(),
            error_type: error.error_type().to_string(),
            message: error.message().to_string(),
            context: if verbose { error.context().cloned() } else { None },
            previous: if verbose {
                error
                    .previous()
                    .map(|previous| Box::new(Self::from_error(previous, verbose)))
            } else {
                None
            },
        }
    }
}

/// The one JSON document sent back for an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub oxygen_response_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception: Option<WireException>,
    pub error_log: Vec<LogEntry>,
}

impl ResponseEnvelope {
    pub fn success(request_id: &str, result: Value, log: ErrorLog) -> Self {
        Self {
            oxygen_response_id: rot13(request_id),
            action_result: Some(result),
            exception: None,
            error_log: log.into_entries(),
        }
    }

    pub fn failure(request_id: &str, error: &ProtocolError, verbose: bool, log: ErrorLog) -> Self {
        Self {
            oxygen_response_id: rot13(request_id),
            action_result: None,
            exception: Some(WireException::from_error(error, verbose)),
            error_log: log.into_entries(),
        }
    }
}
