//! Configuration module
//!
//! Connection settings come from three layers, highest first: command-line
//! flags (or their environment variables), the named context in the TOML
//! config file, then built-in defaults.
//!
//! ```toml
//! [contexts.on-prem]
//! endpoint = "http://ml-pipeline-ui.kubeflow"
//! namespace = "kubeflow-user-example-com"
//! experiment = "demo"
//! username = "user@example.com"
//! label_utc_offset = "+09:00"
//! ```

use chrono::FixedOffset;
use kfdeploy_client::ConnectParams;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Config file used when none is given explicitly
pub const DEFAULT_CONFIG_PATH: &str = "kfdeploy.toml";

const DEFAULT_NAMESPACE: &str = "kubeflow";
const DEFAULT_LABEL_UTC_OFFSET: &str = "+09:00";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Contents of the config file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Connection profiles keyed by cluster context name
    #[serde(default)]
    pub contexts: HashMap<String, ContextProfile>,
}

/// Settings for one cluster context
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContextProfile {
    pub endpoint: Option<String>,
    pub namespace: Option<String>,
    pub experiment: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Offset used for run labels, e.g. "+09:00"
    pub label_utc_offset: Option<String>,
    pub poll_interval_seconds: Option<u64>,
    pub request_timeout_seconds: Option<u64>,
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub endpoint: Option<String>,
    pub namespace: Option<String>,
    pub experiment: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Fully merged settings for one invocation
#[derive(Debug, Clone)]
pub struct ResolvedContext {
    pub name: String,
    pub endpoint: String,
    pub namespace: String,
    pub experiment: Option<String>,
    pub credentials: Option<(String, String)>,
    pub label_offset: FixedOffset,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
}

impl Config {
    /// Load the config file
    ///
    /// An explicit path must exist. Without one, `kfdeploy.toml` in the
    /// working directory is used if present, otherwise an empty config.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => load_config(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_PATH);
                if default.exists() {
                    load_config(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Merge the named context with command-line overrides
    ///
    /// A context missing from the file is allowed as long as the overrides
    /// supply an endpoint.
    pub fn resolve(&self, context: &str, overrides: &Overrides) -> Result<ResolvedContext, ConfigError> {
        let profile = self.contexts.get(context).cloned().unwrap_or_default();

        let endpoint = overrides
            .endpoint
            .clone()
            .or(profile.endpoint)
            .ok_or_else(|| {
                ConfigError::ValidationError(format!(
                    "no endpoint for context '{}': add it to the config file or pass --endpoint",
                    context
                ))
            })?;

        let namespace = overrides
            .namespace
            .clone()
            .or(profile.namespace)
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());

        let username = overrides.username.clone().or(profile.username);
        let password = overrides.password.clone().or(profile.password);
        let credentials = match (username, password) {
            (Some(user), Some(pass)) => Some((user, pass)),
            (None, None) => None,
            (Some(_), None) => {
                return Err(ConfigError::ValidationError(
                    "username given without a password".to_string(),
                ));
            }
            (None, Some(_)) => {
                return Err(ConfigError::ValidationError(
                    "password given without a username".to_string(),
                ));
            }
        };

        let offset_text = profile
            .label_utc_offset
            .unwrap_or_else(|| DEFAULT_LABEL_UTC_OFFSET.to_string());
        let label_offset = parse_utc_offset(&offset_text)?;

        let resolved = ResolvedContext {
            name: context.to_string(),
            endpoint,
            namespace,
            experiment: overrides.experiment.clone().or(profile.experiment),
            credentials,
            label_offset,
            poll_interval: Duration::from_secs(
                profile
                    .poll_interval_seconds
                    .unwrap_or(DEFAULT_POLL_INTERVAL_SECS),
            ),
            request_timeout: Duration::from_secs(
                profile
                    .request_timeout_seconds
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
        };

        resolved.validate()?;
        Ok(resolved)
    }
}

impl ResolvedContext {
    /// Validates the merged settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(ConfigError::ValidationError(
                "endpoint must start with http:// or https://".to_string(),
            ));
        }

        if self.namespace.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "namespace cannot be empty".to_string(),
            ));
        }

        if self.poll_interval.is_zero() {
            return Err(ConfigError::ValidationError(
                "poll_interval_seconds must be greater than 0".to_string(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "request_timeout_seconds must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Connector input for this context
    pub fn connect_params(&self) -> ConnectParams {
        let params = ConnectParams::new(&self.endpoint, &self.namespace)
            .with_context(&self.name)
            .with_request_timeout(self.request_timeout);

        match &self.credentials {
            Some((user, pass)) => params.with_credentials(user, pass),
            None => params,
        }
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let text = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;

    load_config_from_str(&text)
}

/// Load configuration from TOML text
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Parse "+HH:MM", "-HH:MM", "+HH" or "Z"
pub fn parse_utc_offset(text: &str) -> Result<FixedOffset, ConfigError> {
    let invalid = || ConfigError::ValidationError(format!("invalid UTC offset '{}'", text));

    let text = text.trim();
    if text.eq_ignore_ascii_case("z") || text.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }

    let (sign, rest) = match text.chars().next() {
        Some('+') => (1, &text[1..]),
        Some('-') => (-1, &text[1..]),
        _ => return Err(invalid()),
    };

    let (hours, minutes) = match rest.split_once(':') {
        Some((h, m)) => (h, m),
        None => (rest, "0"),
    };
    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if hours > 23 || !(0..60).contains(&minutes) {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}
