//! Disable host components

use serde_json::{Map, Value};
use warden_protocol::Result;

use crate::action::{Action, ParameterSpec};
use crate::host::HostPlatform;

use super::{bool_arg, string_list};

/// `component.disable`: switch the named components off, optionally taking
/// their dependents down with them.
pub struct DisableComponents;

impl Action for DisableComponents {
    fn name(&self) -> &'static str {
        "component.disable"
    }

    fn parameters(&self) -> Vec<ParameterSpec> {
        vec![
            ParameterSpec::required("components"),
            ParameterSpec::optional("disableDependents", Value::Bool(false)),
        ]
    }

    fn execute(&self, arguments: &Map<String, Value>, host: &dyn HostPlatform) -> Result<Value> {
        let components = string_list(arguments, "components", self.name())?;
        let cascade = bool_arg(arguments, "disableDependents", self.name())?;
        host.disable_components(&components, cascade)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::bind_parameters;
    use crate::host::NullHostPlatform;
    use serde_json::json;

    #[test]
    fn test_disable_defaults_to_no_cascade() {
        let host = NullHostPlatform::new();
        let provided = json!({ "components": ["cron"] });
        let bound = bind_parameters(&DisableComponents, provided.as_object().unwrap()).unwrap();
        DisableComponents.execute(&bound, &host).unwrap();
        assert_eq!(host.calls(), vec!["disable_components(cron,false)"]);
    }

    #[test]
    fn test_disable_forwards_cascade_flag() {
        let host = NullHostPlatform::new();
        let provided = json!({ "components": ["cron"], "disableDependents": true });
        let bound = bind_parameters(&DisableComponents, provided.as_object().unwrap()).unwrap();
        DisableComponents.execute(&bound, &host).unwrap();
        assert_eq!(host.calls(), vec!["disable_components(cron,true)"]);
    }
}
