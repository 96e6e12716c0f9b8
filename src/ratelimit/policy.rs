//! Throttling policies and their configuration.
//!
//! A policy names an attempt budget: how many attempts a caller gets, over
//! what window, under which namespace, and what to tell them once the budget
//! is spent. Policies are loaded from YAML:
//!
//! ```yaml
//! policies:
//!   admin_login:
//!     namespace: auth
//!     max_attempts: 5
//!     window_ms: 900000
//!     message: "Too many login attempts. Try again in {retry_after} seconds."
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

use super::limiter::{DEFAULT_MAX_ATTEMPTS, DEFAULT_WINDOW_MS};
use crate::error::{GuardError, Result};

const LOGIN_MESSAGE: &str = "Too many login attempts. Try again in {retry_after} seconds.";
const ALERT_MESSAGE: &str = "Rate limit exceeded. Max {max_attempts} alerts per hour.";

/// A single attempt budget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    /// Namespace the attempts are counted under. Policies sharing a
    /// namespace share a budget.
    pub namespace: String,
    /// Attempts allowed per window
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Window length in milliseconds
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
    /// Denial message template. `{retry_after}` and `{max_attempts}` are
    /// substituted when rendered.
    #[serde(default = "default_message")]
    pub message: String,
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_window_ms() -> u64 {
    DEFAULT_WINDOW_MS
}

fn default_message() -> String {
    "Too many attempts. Try again in {retry_after} seconds.".to_string()
}

impl Policy {
    pub fn new(namespace: &str, max_attempts: u32, window_ms: u64, message: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            max_attempts,
            window_ms,
            message: message.to_string(),
        }
    }

    /// Render the denial message for a caller that must wait `retry_after` seconds.
    pub fn render_message(&self, retry_after: u64) -> String {
        self.message
            .replace("{retry_after}", &retry_after.to_string())
            .replace("{max_attempts}", &self.max_attempts.to_string())
    }

    fn validate(&self, name: &str) -> Result<()> {
        let invalid = |reason: &str| GuardError::InvalidPolicy {
            name: name.to_string(),
            reason: reason.to_string(),
        };

        if self.namespace.trim().is_empty() {
            return Err(invalid("namespace must not be empty"));
        }
        if self.max_attempts == 0 {
            return Err(invalid("max_attempts must be positive"));
        }
        if self.window_ms == 0 {
            return Err(invalid("window_ms must be positive"));
        }
        Ok(())
    }
}

/// All configured policies, indexed by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicySet {
    #[serde(default)]
    pub policies: HashMap<String, Policy>,
}

impl Default for PolicySet {
    /// The budgets used by the login and alert endpoints.
    fn default() -> Self {
        let login = Policy::new("auth", 5, 15 * 60 * 1000, LOGIN_MESSAGE);

        let mut policies = HashMap::new();
        policies.insert("admin_login".to_string(), login.clone());
        policies.insert("dashboard_login".to_string(), login);
        policies.insert(
            "alert_delivery".to_string(),
            Policy::new("alerts", 10, 60 * 60 * 1000, ALERT_MESSAGE),
        );

        Self { policies }
    }
}

impl PolicySet {
    /// Load policies from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading throttling policies");

        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse and validate policies from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let set: PolicySet = serde_yaml::from_str(yaml)
            .map_err(|e| GuardError::Config(format!("Failed to parse policies: {}", e)))?;
        set.validate()?;
        Ok(set)
    }

    /// Reject policies that could never admit or never expire.
    pub fn validate(&self) -> Result<()> {
        if self.policies.is_empty() {
            return Err(GuardError::Config("no policies configured".to_string()));
        }
        for (name, policy) in &self.policies {
            policy.validate(name)?;
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Policy> {
        self.policies.get(name)
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_share_login_namespace() {
        let set = PolicySet::default();
        set.validate().unwrap();

        let admin = set.get("admin_login").unwrap();
        let dashboard = set.get("dashboard_login").unwrap();
        assert_eq!(admin.namespace, "auth");
        assert_eq!(admin, dashboard);
        assert_eq!(admin.max_attempts, 5);
        assert_eq!(admin.window_ms, 900_000);

        let alerts = set.get("alert_delivery").unwrap();
        assert_eq!(alerts.namespace, "alerts");
        assert_eq!(alerts.max_attempts, 10);
        assert_eq!(alerts.window_ms, 3_600_000);
    }

    #[test]
    fn test_render_message() {
        let set = PolicySet::default();
        assert_eq!(
            set.get("admin_login").unwrap().render_message(873),
            "Too many login attempts. Try again in 873 seconds."
        );
        assert_eq!(
            set.get("alert_delivery").unwrap().render_message(12),
            "Rate limit exceeded. Max 10 alerts per hour."
        );
    }

    #[test]
    fn test_parse_policies() {
        let yaml = r#"
policies:
  admin_login:
    namespace: auth
    max_attempts: 3
    window_ms: 60000
    message: "Slow down, {retry_after}s left"
  password_reset:
    namespace: reset
"#;
        let set = PolicySet::from_yaml(yaml).unwrap();
        assert_eq!(set.len(), 2);

        let admin = set.get("admin_login").unwrap();
        assert_eq!(admin.max_attempts, 3);
        assert_eq!(admin.window_ms, 60_000);
        assert_eq!(admin.render_message(5), "Slow down, 5s left");

        // Omitted fields fall back to the defaults
        let reset = set.get("password_reset").unwrap();
        assert_eq!(reset.max_attempts, DEFAULT_MAX_ATTEMPTS);
        assert_eq!(reset.window_ms, DEFAULT_WINDOW_MS);
    }

    #[test]
    fn test_rejects_zero_attempts() {
        let yaml = r#"
policies:
  broken:
    namespace: auth
    max_attempts: 0
"#;
        let err = PolicySet::from_yaml(yaml).unwrap_err();
        assert!(matches!(err, GuardError::InvalidPolicy { ref name, .. } if name == "broken"));
    }

    #[test]
    fn test_rejects_zero_window_and_blank_namespace() {
        let yaml = r#"
policies:
  broken:
    namespace: auth
    window_ms: 0
"#;
        assert!(matches!(
            PolicySet::from_yaml(yaml),
            Err(GuardError::InvalidPolicy { .. })
        ));

        let yaml = r#"
policies:
  broken:
    namespace: "  "
"#;
        assert!(matches!(
            PolicySet::from_yaml(yaml),
            Err(GuardError::InvalidPolicy { .. })
        ));
    }

    #[test]
    fn test_rejects_empty_and_malformed() {
        assert!(matches!(
            PolicySet::from_yaml("policies: {}"),
            Err(GuardError::Config(_))
        ));
        assert!(matches!(
            PolicySet::from_yaml("policies: [1, 2"),
            Err(GuardError::Config(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policies.yaml");
        std::fs::write(
            &path,
            "policies:\n  admin_login:\n    namespace: auth\n    max_attempts: 7\n",
        )
        .unwrap();

        let set = PolicySet::from_file(&path).unwrap();
        assert_eq!(set.get("admin_login").unwrap().max_attempts, 7);

        let missing = PolicySet::from_file(dir.path().join("missing.yaml"));
        assert!(matches!(missing, Err(GuardError::Io(_))));
    }
}
