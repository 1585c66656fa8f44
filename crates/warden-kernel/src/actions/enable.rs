//! Enable host components

use serde_json::{Map, Value};
use warden_protocol::Result;

use crate::action::{Action, ParameterSpec};
use crate::host::HostPlatform;

use super::{bool_arg, string_list};

/// `component.enable`: switch the named components on.
pub struct EnableComponents;

impl Action for EnableComponents {
    fn name(&self) -> &'static str {
        "component.enable"
    }

    fn parameters(&self) -> Vec<ParameterSpec> {
        vec![
            ParameterSpec::required("components"),
            ParameterSpec::optional("enableDependencies", Value::Bool(false)),
        ]
    }

    fn execute(&self, arguments: &Map<String, Value>, host: &dyn HostPlatform) -> Result<Value> {
        let components = string_list(arguments, "components", self.name())?;
        // Part of the wire contract but not forwarded: the host owns
        // dependency resolution when enabling.
        bool_arg(arguments, "enableDependencies", self.name())?;
        host.enable_components(&components)
    }
}
