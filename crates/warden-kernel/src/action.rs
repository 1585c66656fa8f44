//! Action registry and parameter binding

use std::collections::HashMap;
use std::fmt;

use serde_json::{Map, Value};
use warden_protocol::{ErrorCode, ProtocolError, Result};

use crate::host::HostPlatform;

/// Declared parameter of an action.
#[derive(Debug, Clone)]
pub struct ParameterSpec {
    pub name: &'static str,
    pub required: bool,
    pub default: Option<Value>,
}

impl ParameterSpec {
    pub fn required(name: &'static str) -> Self {
        Self {
            name,
            required: true,
            default: None,
        }
    }

    pub fn optional(name: &'static str, default: Value) -> Self {
        Self {
            name,
            required: false,
            default: Some(default),
        }
    }
}

/// One dispatchable operation.
pub trait Action: Send + Sync {
    fn name(&self) -> &'static str;

    /// Declared parameters, bound by the kernel before [`Action::execute`].
    fn parameters(&self) -> Vec<ParameterSpec>;

    /// Run with fully bound arguments: every declared parameter is present,
    /// either from the order or from its default.
    fn execute(&self, arguments: &Map<String, Value>, host: &dyn HostPlatform) -> Result<Value>;
}

impl fmt::Debug for dyn Action + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action").field("name", &self.name()).finish()
    }
}

/// Name-keyed action lookup.
#[derive(Default)]
pub struct ActionRegistry {
    actions: HashMap<String, Box<dyn Action>>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, action: Box<dyn Action>) {
        self.actions.insert(action.name().to_string(), action);
    }

    pub fn get(&self, name: &str) -> Result<&dyn Action> {
        self.actions.get(name).map(Box::as_ref).ok_or_else(|| {
            ProtocolError::new(ErrorCode::ActionNotFound).with_context("action", name)
        })
    }

    /// Registered action names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.actions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Resolve the order's parameters against the action's declaration. Missing
/// required parameters abort; missing optional ones take their default.
pub fn bind_parameters(
    action: &dyn Action,
    provided: &Map<String, Value>,
) -> Result<Map<String, Value>> {
    let mut bound = Map::new();
    for spec in action.parameters() {
        match provided.get(spec.name).filter(|value| !value.is_null()) {
            Some(value) => {
                bound.insert(spec.name.to_string(), value.clone());
            }
            None if spec.required => {
                return Err(ProtocolError::new(ErrorCode::ActionArgumentEmpty)
                    .with_context("parameter", spec.name)
                    .with_context("action", action.name()));
            }
            None => {
                if let Some(default) = spec.default {
                    bound.insert(spec.name.to_string(), default);
                }
            }
        }
    }
    Ok(bound)
}
