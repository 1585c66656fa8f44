//! Order dispatch
//!
//! The kernel takes one raw order at a time through parsing, envelope
//! validation, handshake and action execution, and turns whatever happened
//! into exactly one response envelope. Errors never escape as values; they
//! come back as error envelopes, and panics are caught last so even a bug in
//! an action produces a well-formed response.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::{json, Map, Value};
use tracing::{debug, error, warn};
use warden_protocol::{
    is_base64_text, ErrorCode, FileStateStore, HandshakeKeyring, HandshakeVerifier,
    MemoryNonceLedger, MemoryStateStore, NonceLedger, OrderEnvelope, ProtocolError, StateStore,
    PINNED_KEY_STATE,
};
use warden_rsa::SignatureVerifier;

use crate::action::{bind_parameters, ActionRegistry};
use crate::actions::builtin_registry;
use crate::config::KernelConfig;
use crate::error::Result;
use crate::host::HostPlatform;
use crate::response::{ErrorLog, ResponseEnvelope};

/// Everything an order passes through, wired together once at startup.
pub struct DispatchKernel {
    config: KernelConfig,
    verifier: Arc<dyn SignatureVerifier>,
    state: Arc<dyn StateStore>,
    nonces: Arc<dyn NonceLedger>,
    handshake: HandshakeVerifier,
    registry: ActionRegistry,
    host: Box<dyn HostPlatform>,
}

/// What a single order left behind, before it is shaped into an envelope.
struct OrderOutcome {
    request_id: String,
    authenticated: bool,
    result: warden_protocol::Result<Value>,
    error_log: ErrorLog,
}

impl DispatchKernel {
    pub fn new(
        config: KernelConfig,
        verifier: Arc<dyn SignatureVerifier>,
        state: Arc<dyn StateStore>,
        nonces: Arc<dyn NonceLedger>,
        keyring: HandshakeKeyring,
        registry: ActionRegistry,
        host: Box<dyn HostPlatform>,
    ) -> Result<Self> {
        let handshake = HandshakeVerifier::new(
            Arc::clone(&verifier),
            Arc::clone(&state),
            Arc::clone(&nonces),
            keyring,
            &config.base_url,
        )?;
        Ok(Self {
            config,
            verifier,
            state,
            nonces,
            handshake,
            registry,
            host,
        })
    }

    /// Assemble a kernel from configuration alone: default signature backend,
    /// keyring loaded from disk when configured, file-backed or in-memory
    /// state, and the built-in action set.
    pub fn from_config(config: KernelConfig, host: Box<dyn HostPlatform>) -> Result<Self> {
        let verifier: Arc<dyn SignatureVerifier> = Arc::from(warden_rsa::default_verifier());
        let keyring = match &config.handshake_keys_dir {
            Some(dir) => HandshakeKeyring::load_dir(dir)?,
            None => HandshakeKeyring::new(),
        };
        let state: Arc<dyn StateStore> = match &config.state_file {
            Some(path) => Arc::new(FileStateStore::open(path)?),
            None => Arc::new(MemoryStateStore::new()),
        };
        let nonces: Arc<dyn NonceLedger> = Arc::new(MemoryNonceLedger::new());
        Self::new(
            config,
            verifier,
            state,
            nonces,
            keyring,
            builtin_registry(),
            host,
        )
    }

    /// Dispatch one signed order. Always returns an envelope; `now` is the
    /// caller's clock in unix seconds.
    pub fn handle(&self, raw_body: &str, now: i64) -> ResponseEnvelope {
        match catch_unwind(AssertUnwindSafe(|| self.run_order(raw_body, now))) {
            Ok(outcome) => self.respond(outcome),
            Err(panic) => {
                let message = panic_message(panic);
                error!("Order aborted by panic: {}", message);
                let mut log = ErrorLog::new();
                log.push("critical", message.clone());
                let fatal = ProtocolError::with_message(ErrorCode::FatalError, message);
                let request_id = raw_request_id(raw_body);
                ResponseEnvelope::failure(&request_id, &fatal, self.config.verbose_errors, log)
            }
        }
    }

    fn run_order(&self, raw_body: &str, now: i64) -> OrderOutcome {
        let mut request_id = String::new();
        let mut authenticated = false;
        let result = self.execute_order(raw_body, now, &mut request_id, &mut authenticated);
        OrderOutcome {
            request_id,
            authenticated,
            result,
            error_log: ErrorLog::new(),
        }
    }

    fn execute_order(
        &self,
        raw_body: &str,
        now: i64,
        request_id: &mut String,
        authenticated: &mut bool,
    ) -> warden_protocol::Result<Value> {
        let body: Value = serde_json::from_str(raw_body).map_err(|e| {
            ProtocolError::with_message(
                ErrorCode::GeneralError,
                format!("Request body is not valid JSON: {}", e),
            )
        })?;
        if !body.is_object() {
            return Err(ProtocolError::with_message(
                ErrorCode::GeneralError,
                "Request body must be a JSON object",
            ));
        }
        // Capture the id before validation so even a rejected order gets a
        // correlatable response.
        if let Some(id) = body.get("oxygenRequestId").and_then(Value::as_str) {
            *request_id = id.to_string();
        }

        let envelope =
            OrderEnvelope::from_value(&body, &self.config.current_version, &self.config.base_url)?;
        self.handshake.verify_order(&envelope, now)?;
        *authenticated = true;
        debug!(
            "Order {} authenticated for action {}",
            envelope.request_id, envelope.action_name
        );

        let action = self.registry.get(&envelope.action_name)?;
        let arguments = bind_parameters(action, &envelope.action_parameters)?;
        action.execute(&arguments, self.host.as_ref())
    }

    fn respond(&self, outcome: OrderOutcome) -> ResponseEnvelope {
        let verbose = outcome.authenticated || self.config.verbose_errors;
        match outcome.result {
            Ok(value) => ResponseEnvelope::success(&outcome.request_id, value, outcome.error_log),
            Err(failure) => {
                warn!("Order failed with code {}: {}", failure.code(), failure);
                ResponseEnvelope::failure(&outcome.request_id, &failure, verbose, outcome.error_log)
            }
        }
    }

    /// Dispatch an unsigned-body login order carried in query-style
    /// parameters. Returns `None` when the query is not addressed to the
    /// kernel at all.
    pub fn handle_login(&self, query: &Value, now: i64) -> Option<ResponseEnvelope> {
        let params = query.as_object()?;
        if !params.contains_key("oxygenRequestId") {
            return None;
        }
        let request_id = params
            .get("oxygenRequestId")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            let mut authenticated = false;
            let result = self.run_login(params, now, &mut authenticated);
            (result, authenticated)
        }));
        match outcome {
            Ok((Ok(None), _)) => None,
            Ok((Ok(Some(result)), _)) => {
                Some(ResponseEnvelope::success(&request_id, result, ErrorLog::new()))
            }
            Ok((Err(failure), authenticated)) => {
                warn!("Login order failed with code {}: {}", failure.code(), failure);
                let verbose = authenticated || self.config.verbose_errors;
                Some(ResponseEnvelope::failure(
                    &request_id,
                    &failure,
                    verbose,
                    ErrorLog::new(),
                ))
            }
            Err(panic) => {
                let message = panic_message(panic);
                error!("Login order aborted by panic: {}", message);
                let mut log = ErrorLog::new();
                log.push("critical", message.clone());
                let fatal = ProtocolError::with_message(ErrorCode::FatalError, message);
                Some(ResponseEnvelope::failure(
                    &request_id,
                    &fatal,
                    self.config.verbose_errors,
                    log,
                ))
            }
        }
    }

    /// `Ok(None)` means the query carries a request id but asks for some
    /// other public action, so it is not a login order after all.
    fn run_login(
        &self,
        params: &Map<String, Value>,
        now: i64,
        authenticated: &mut bool,
    ) -> warden_protocol::Result<Option<Value>> {
        let request_id = match params.get("oxygenRequestId") {
            Some(Value::String(id)) => id,
            _ => return Err(ProtocolError::new(ErrorCode::RequestIdNotValid)),
        };
        if request_id.is_empty() {
            return Err(ProtocolError::new(ErrorCode::RequestIdNotProvided));
        }

        let action_name = match params.get("actionName") {
            None => return Err(ProtocolError::new(ErrorCode::ActionNameNotProvided)),
            Some(Value::String(name)) => name,
            Some(_) => return Err(ProtocolError::new(ErrorCode::ActionNameNotValid)),
        };
        if action_name != "site.login" {
            return Ok(None);
        }

        let expires_at = match params.get("requestExpiresAt") {
            None => return Err(ProtocolError::new(ErrorCode::ExpirationNotProvided)),
            Some(value) => {
                parse_expiration(value).ok_or_else(|| {
                    ProtocolError::new(ErrorCode::ExpirationNotValid)
                })?
            }
        };

        let signature = match params.get("signature") {
            None => return Err(ProtocolError::new(ErrorCode::SignatureNotProvided)),
            Some(Value::String(text)) if is_base64_text(text) => text,
            Some(_) => return Err(ProtocolError::new(ErrorCode::SignatureNotValid)),
        };

        let username = match params.get("username") {
            None => return Err(ProtocolError::new(ErrorCode::UsernameNotProvided)),
            Some(Value::String(name)) => name,
            Some(_) => return Err(ProtocolError::new(ErrorCode::UsernameNotValid)),
        };

        let user_uid = match params.get("userUid") {
            None => return Err(ProtocolError::new(ErrorCode::UserUidNotProvided)),
            Some(Value::String(uid)) if is_valid_user_uid(uid) => uid,
            Some(_) => return Err(ProtocolError::new(ErrorCode::UserUidNotValid)),
        };

        let pinned = self
            .state
            .get(PINNED_KEY_STATE)
            .ok_or_else(|| ProtocolError::new(ErrorCode::PinnedKeyMissing))?;

        let message = format!("{}|{}|{}|{}", request_id, expires_at, user_uid, username);
        if !self.verifier.verify(&pinned, message.as_bytes(), signature)? {
            return Err(ProtocolError::new(ErrorCode::HandshakeVerifyFailed));
        }
        *authenticated = true;

        self.nonces.claim(request_id, expires_at, now)?;

        // Empty username selects the fallback administrative account.
        let user = if username.is_empty() {
            self.host.find_user_by_id(1)?
        } else {
            self.host.find_user_by_name(username)?
        };
        let user = user.ok_or_else(|| {
            ProtocolError::new(ErrorCode::LoginUserNotFound)
                .with_context("username", username.as_str())
        })?;
        debug!("Login order {} resolved to user {}", request_id, user.id);

        Ok(Some(json!({ "userId": user.id, "username": user.name })))
    }
}

/// The dashboard's user handle: `U` followed by ten digits.
fn is_valid_user_uid(text: &str) -> bool {
    let bytes = text.as_bytes();
    bytes.len() == 11 && bytes[0] == b'U' && bytes[1..].iter().all(u8::is_ascii_digit)
}

/// Expiration may arrive as a JSON integer or as a string that survives an
/// integer round trip unchanged ("007" and "7.5" do not).
fn parse_expiration(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text
            .parse::<i64>()
            .ok()
            .filter(|parsed| parsed.to_string() == *text),
        _ => None,
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(text) = panic.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = panic.downcast_ref::<String>() {
        text.clone()
    } else {
        "unhandled panic".to_string()
    }
}

/// Best-effort id recovery for the panic path, where no envelope survived.
fn raw_request_id(raw_body: &str) -> String {
    serde_json::from_str::<Value>(raw_body)
        .ok()
        .and_then(|body| {
            body.get("oxygenRequestId")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_default()
}
