//! Built-in actions
//!
//! Each action lives in its own file; [`builtin_registry`] wires them all
//! into a registry the kernel can dispatch against.

mod disable;
mod enable;
mod install;

pub use disable::DisableComponents;
pub use enable::EnableComponents;
pub use install::InstallFromUrl;

use serde_json::{Map, Value};
use warden_protocol::{ErrorCode, ProtocolError, Result};

use crate::action::ActionRegistry;

/// Registry holding every built-in action.
pub fn builtin_registry() -> ActionRegistry {
    let mut registry = ActionRegistry::new();
    registry.register(Box::new(EnableComponents));
    registry.register(Box::new(DisableComponents));
    registry.register(Box::new(InstallFromUrl));
    registry
}

fn argument_type_error(action: &str, parameter: &str, expected: &str) -> ProtocolError {
    ProtocolError::with_message(
        ErrorCode::GeneralError,
        format!("Parameter '{}' of action '{}' must be {}", parameter, action, expected),
    )
    .with_context("action", action)
    .with_context("parameter", parameter)
}

/// Bound argument as a list of strings.
fn string_list(arguments: &Map<String, Value>, name: &str, action: &str) -> Result<Vec<String>> {
    let items = arguments
        .get(name)
        .and_then(Value::as_array)
        .ok_or_else(|| argument_type_error(action, name, "an array of strings"))?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| argument_type_error(action, name, "an array of strings"))
        })
        .collect()
}

/// Bound argument as a string.
fn string_arg(arguments: &Map<String, Value>, name: &str, action: &str) -> Result<String> {
    arguments
        .get(name)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| argument_type_error(action, name, "a string"))
}

/// Bound argument as a boolean.
fn bool_arg(arguments: &Map<String, Value>, name: &str, action: &str) -> Result<bool> {
    arguments
        .get(name)
        .and_then(Value::as_bool)
        .ok_or_else(|| argument_type_error(action, name, "a boolean"))
}
