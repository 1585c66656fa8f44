//! Install a project from a URL

use serde_json::{json, Map, Value};
use warden_protocol::Result;

use crate::action::{Action, ParameterSpec};
use crate::host::HostPlatform;

use super::string_arg;

/// `project.installFromUrl`: fetch an archive from a URL and install it as a
/// project on the host. The host's progress report comes back under
/// `context`.
pub struct InstallFromUrl;

impl Action for InstallFromUrl {
    fn name(&self) -> &'static str {
        "project.installFromUrl"
    }

    fn parameters(&self) -> Vec<ParameterSpec> {
        vec![ParameterSpec::required("url")]
    }

    fn execute(&self, arguments: &Map<String, Value>, host: &dyn HostPlatform) -> Result<Value> {
        let url = string_arg(arguments, "url", self.name())?;
        let context = host.install_from_url(&url)?;
        Ok(json!({ "context": context }))
    }
}
