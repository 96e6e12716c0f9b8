//! Configuration management for Authguard.
//!
//! Settings are layered: built-in defaults, then an optional YAML file, then
//! `AUTHGUARD__*` environment variables (e.g. `AUTHGUARD__SERVER__GRPC_ADDR`).

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use crate::error::Result;

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "AUTHGUARD";

/// Main configuration for the Authguard service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthGuardConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Rate limiter configuration
    #[serde(default)]
    pub limiter: LimiterConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// gRPC server address
    #[serde(default = "default_grpc_addr")]
    pub grpc_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            grpc_addr: default_grpc_addr(),
        }
    }
}

fn default_grpc_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8081))
}

/// Rate limiter configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimiterConfig {
    /// How often expired records are swept, in seconds
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// Path to a policies file. Built-in policies are used when unset.
    #[serde(default)]
    pub policies_path: Option<String>,

    /// Policies reload interval in seconds. Zero disables reloading.
    #[serde(default = "default_reload_interval")]
    pub policy_reload_interval_secs: u64,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_sweep_interval(),
            policies_path: None,
            policy_reload_interval_secs: default_reload_interval(),
        }
    }
}

impl LimiterConfig {
    pub fn sweep_interval(&self) -> Duration {
        // A zero period would make the ticker panic.
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }

    pub fn policy_reload_interval(&self) -> Option<Duration> {
        match self.policy_reload_interval_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

fn default_sweep_interval() -> u64 {
    15 * 60
}

fn default_reload_interval() -> u64 {
    60
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AuthGuardConfig {
    /// Load configuration from an optional file plus the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Load configuration from a file path, without environment overrides.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .build()?
            .try_deserialize()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GuardError;

    #[test]
    fn test_defaults() {
        let config = AuthGuardConfig::default();
        assert_eq!(
            config.server.grpc_addr,
            "127.0.0.1:8081".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(config.limiter.sweep_interval(), Duration::from_secs(900));
        assert_eq!(config.limiter.policies_path, None);
        assert_eq!(
            config.limiter.policy_reload_interval(),
            Some(Duration::from_secs(60))
        );
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_from_file_partial() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("authguard.yaml");
        std::fs::write(
            &path,
            r#"
server:
  grpc_addr: "0.0.0.0:9000"
limiter:
  policies_path: /etc/authguard/policies.yaml
  policy_reload_interval_secs: 0
logging:
  format: json
"#,
        )
        .unwrap();

        let config = AuthGuardConfig::from_file(&path).unwrap();
        assert_eq!(
            config.server.grpc_addr,
            "0.0.0.0:9000".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(
            config.limiter.policies_path.as_deref(),
            Some("/etc/authguard/policies.yaml")
        );
        assert_eq!(config.limiter.policy_reload_interval(), None);
        assert_eq!(config.limiter.sweep_interval_secs, 900);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_zero_sweep_interval_is_clamped() {
        let limiter = LimiterConfig {
            sweep_interval_secs: 0,
            ..LimiterConfig::default()
        };
        assert_eq!(limiter.sweep_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = AuthGuardConfig::load(Some(&dir.path().join("nope.yaml")));
        assert!(matches!(result, Err(GuardError::Config(_))));
    }
}
