//! The seam to the managed host platform
//!
//! Actions never touch the host directly; they go through this trait so the
//! kernel can be embedded against any platform, and tested against none.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use warden_protocol::Result;

/// An account on the managed host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: u64,
    pub name: String,
}

/// Operations the kernel may ask of the host it administers.
pub trait HostPlatform: Send + Sync {
    /// Enable the named components.
    fn enable_components(&self, names: &[String]) -> Result<Value>;

    /// Disable the named components, optionally cascading to dependents.
    fn disable_components(&self, names: &[String], cascade: bool) -> Result<Value>;

    /// Download and install a project from a URL.
    fn install_from_url(&self, url: &str) -> Result<Value>;

    fn find_user_by_id(&self, id: u64) -> Result<Option<UserRecord>>;

    fn find_user_by_name(&self, name: &str) -> Result<Option<UserRecord>>;

    /// Run a parameterized query against the host's store. Parameters are
    /// bound, never spliced into the statement.
    fn query(&self, statement: &str, params: &[Value]) -> Result<Value>;
}

/// Host double that records every call and serves a fixed user table.
#[derive(Default)]
pub struct NullHostPlatform {
    calls: Mutex<Vec<String>>,
    users: Vec<UserRecord>,
}

impl NullHostPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: Vec<UserRecord>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            users,
        }
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    fn record(&self, call: String) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

impl HostPlatform for NullHostPlatform {
    fn enable_components(&self, names: &[String]) -> Result<Value> {
        self.record(format!("enable_components({})", names.join(",")));
        Ok(json!({ "enabled": names }))
    }

    fn disable_components(&self, names: &[String], cascade: bool) -> Result<Value> {
        self.record(format!("disable_components({},{})", names.join(","), cascade));
        Ok(json!({ "disabled": names }))
    }

    fn install_from_url(&self, url: &str) -> Result<Value> {
        self.record(format!("install_from_url({})", url));
        Ok(json!({ "installed": url }))
    }

    fn find_user_by_id(&self, id: u64) -> Result<Option<UserRecord>> {
        self.record(format!("find_user_by_id({})", id));
        Ok(self.users.iter().find(|user| user.id == id).cloned())
    }

    fn find_user_by_name(&self, name: &str) -> Result<Option<UserRecord>> {
        self.record(format!("find_user_by_name({})", name));
        Ok(self.users.iter().find(|user| user.name == name).cloned())
    }

    fn query(&self, statement: &str, params: &[Value]) -> Result<Value> {
        self.record(format!("query({},{} params)", statement, params.len()));
        Ok(json!([]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_host_records_calls() {
        let host = NullHostPlatform::new();
        host.enable_components(&["views".to_string(), "cron".to_string()])
            .unwrap();
        host.disable_components(&["cron".to_string()], true).unwrap();
        assert_eq!(
            host.calls(),
            vec!["enable_components(views,cron)", "disable_components(cron,true)"]
        );
    }

    #[test]
    fn test_null_host_serves_users() {
        let host = NullHostPlatform::with_users(vec![UserRecord {
            id: 1,
            name: "admin".to_string(),
        }]);
        assert_eq!(host.find_user_by_id(1).unwrap().unwrap().name, "admin");
        assert_eq!(host.find_user_by_name("nobody").unwrap(), None);
    }
}
