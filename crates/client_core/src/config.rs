use std::{collections::HashMap, fs, time::Duration};

use anyhow::{bail, Context};
use url::Url;

/// Base url used by the `Local` endpoint during development.
pub const LOCAL_BASE_URL: &str = "http://127.0.0.1:8000";

/// Quiet interval before the suggestion list is recomputed.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Where the prediction service lives. Injected at session start; the core
/// never sniffs its environment to pick an endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceEndpoint {
    /// Local development service on [`LOCAL_BASE_URL`].
    Local,
    /// Any other deployment.
    Remote { base_url: String },
}

impl ServiceEndpoint {
    /// Parses and normalizes a base url, collapsing the well-known local
    /// address onto the `Local` variant.
    pub fn from_url(raw: &str) -> anyhow::Result<Self> {
        let parsed = Url::parse(raw).with_context(|| format!("invalid server url '{raw}'"))?;
        match parsed.scheme() {
            "http" | "https" => {}
            other => bail!("unsupported server url scheme '{other}'"),
        }

        let base_url = raw.trim_end_matches('/').to_string();
        if base_url == LOCAL_BASE_URL {
            return Ok(Self::Local);
        }
        Ok(Self::Remote { base_url })
    }

    pub fn base_url(&self) -> &str {
        match self {
            Self::Local => LOCAL_BASE_URL,
            Self::Remote { base_url } => base_url,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoint: ServiceEndpoint,
    pub debounce: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: ServiceEndpoint::Local,
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

/// Builds the session configuration from defaults, an optional `checker.toml`
/// in the working directory, then environment variable overrides.
pub fn load_settings() -> ClientConfig {
    let mut config = ClientConfig::default();

    if let Ok(raw) = fs::read_to_string("checker.toml") {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            if let Some(v) = file_cfg.get("server_url") {
                if let Ok(endpoint) = ServiceEndpoint::from_url(v) {
                    config.endpoint = endpoint;
                }
            }
            if let Some(v) = file_cfg.get("debounce_ms") {
                if let Ok(ms) = v.parse::<u64>() {
                    config.debounce = Duration::from_millis(ms);
                }
            }
        }
    }

    if let Ok(v) = std::env::var("CHECKER_SERVER_URL") {
        if let Ok(endpoint) = ServiceEndpoint::from_url(&v) {
            config.endpoint = endpoint;
        }
    }
    if let Ok(v) = std::env::var("CHECKER_DEBOUNCE_MS") {
        if let Ok(ms) = v.parse::<u64>() {
            config.debounce = Duration::from_millis(ms);
        }
    }

    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_targets_local_endpoint() {
        let config = ClientConfig::default();
        assert_eq!(config.endpoint, ServiceEndpoint::Local);
        assert_eq!(config.endpoint.base_url(), LOCAL_BASE_URL);
        assert_eq!(config.debounce, DEFAULT_DEBOUNCE);
    }

    #[test]
    fn from_url_normalizes_trailing_slash() {
        let endpoint = ServiceEndpoint::from_url("https://ensemble.example.org/").expect("parse");
        assert_eq!(
            endpoint,
            ServiceEndpoint::Remote {
                base_url: "https://ensemble.example.org".to_string()
            }
        );
    }

    #[test]
    fn from_url_collapses_local_address() {
        let endpoint = ServiceEndpoint::from_url("http://127.0.0.1:8000/").expect("parse");
        assert_eq!(endpoint, ServiceEndpoint::Local);
    }

    #[test]
    fn from_url_rejects_non_http_schemes() {
        assert!(ServiceEndpoint::from_url("ftp://ensemble.example.org").is_err());
        assert!(ServiceEndpoint::from_url("not a url").is_err());
    }

    #[test]
    fn env_overrides_take_precedence_over_defaults() {
        std::env::set_var("CHECKER_SERVER_URL", "https://ensemble.example.org");
        std::env::set_var("CHECKER_DEBOUNCE_MS", "150");

        let config = load_settings();
        assert_eq!(
            config.endpoint,
            ServiceEndpoint::Remote {
                base_url: "https://ensemble.example.org".to_string()
            }
        );
        assert_eq!(config.debounce, Duration::from_millis(150));

        std::env::remove_var("CHECKER_SERVER_URL");
        std::env::remove_var("CHECKER_DEBOUNCE_MS");
    }
}
