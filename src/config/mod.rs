//! Configuration system (layered: defaults < TOML file < env).

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ChatError;
use crate::mcp::MCPEndpoint;
use crate::provider::google::DEFAULT_BASE_URL;
use crate::util::retry::RetryPolicy;

pub const DEFAULT_PRIMARY_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_FALLBACK_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_MCP_URL: &str = "http://127.0.0.1:3001/mcp";

/// Everything the service needs at startup.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    pub gemini: GeminiConfig,
    pub mcp: McpConfig,
    pub retry: RetryConfig,
    pub server: ServerConfig,
}

#[derive(Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    /// Empty string disables the fallback.
    pub fallback_model: String,
    pub request_timeout_secs: u64,
    pub temperature: Option<f64>,
    pub max_output_tokens: Option<u32>,
}

// The API key never reaches logs.
impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| ".."))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("fallback_model", &self.fallback_model)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .finish()
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_PRIMARY_MODEL.to_string(),
            fallback_model: DEFAULT_FALLBACK_MODEL.to_string(),
            request_timeout_secs: 60,
            temperature: None,
            max_output_tokens: None,
        }
    }
}

impl GeminiConfig {
    pub fn fallback(&self) -> Option<String> {
        let model = self.fallback_model.trim();
        (!model.is_empty()).then(|| model.to_string())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Tool server location. A command takes precedence over a URL.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct McpConfig {
    pub url: String,
    pub command: Option<String>,
    pub args: Vec<String>,
}

impl Default for McpConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_MCP_URL.to_string(),
            command: None,
            args: Vec::new(),
        }
    }
}

impl McpConfig {
    pub fn endpoint(&self) -> MCPEndpoint {
        match &self.command {
            Some(command) => MCPEndpoint::stdio(command.clone(), self.args.clone()),
            None => MCPEndpoint::http(self.url.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    pub delays_ms: Vec<u64>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            delays_ms: vec![500, 1000, 2000, 4000],
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::from_millis(&self.delays_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ChatError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ChatError::Configuration(format!("invalid listen address: {e}")))
    }
}

impl ServiceConfig {
    /// Parse a TOML document; omitted keys keep their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self, ChatError> {
        toml::from_str(raw).map_err(|e| ChatError::Configuration(format!("invalid config file: {e}")))
    }

    pub fn from_file(path: &Path) -> Result<Self, ChatError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ChatError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Defaults, then the optional file, then the process environment
    /// (including a `.env` file when present).
    pub fn load(path: Option<&Path>) -> Result<Self, ChatError> {
        let _ = dotenvy::dotenv();
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay environment variables read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ChatError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("GEMINI_API_KEY").or_else(|| lookup("GOOGLE_API_KEY")) {
            self.gemini.api_key = Some(key);
        }
        if let Some(url) = lookup("GEMINI_BASE_URL") {
            self.gemini.base_url = url;
        }
        if let Some(model) = lookup("GEMINI_MODEL") {
            self.gemini.model = model;
        }
        if let Some(model) = lookup("GEMINI_FALLBACK_MODEL") {
            self.gemini.fallback_model = model;
        }
        if let Some(url) = lookup("MCP_SERVER_URL") {
            self.mcp.url = url;
        }
        if let Some(command_line) = lookup("MCP_SERVER_COMMAND") {
            let mut words = command_line.split_whitespace().map(str::to_string);
            if let Some(command) = words.next() {
                self.mcp.command = Some(command);
                self.mcp.args = words.collect();
            }
        }
        if let Some(host) = lookup("HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| ChatError::Configuration(format!("PORT is not a port number: {port}")))?;
        }
        if let Some(delays) = lookup("RETRY_DELAYS_MS") {
            self.retry.delays_ms = parse_delays(&delays)?;
        }
        Ok(())
    }

    /// Fail fast on settings the service cannot start without.
    pub fn validate(&self) -> Result<(), ChatError> {
        match &self.gemini.api_key {
            Some(key) if !key.trim().is_empty() => {}
            _ => {
                return Err(ChatError::Configuration(
                    "GEMINI_API_KEY (or GOOGLE_API_KEY) must be set".into(),
                ))
            }
        }
        if self.gemini.model.trim().is_empty() {
            return Err(ChatError::Configuration("GEMINI_MODEL must not be empty".into()));
        }
        self.server.socket_addr()?;
        Ok(())
    }
}

fn parse_delays(raw: &str) -> Result<Vec<u64>, ChatError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse().map_err(|_| {
                ChatError::Configuration(format!("RETRY_DELAYS_MS has a non-numeric entry: {part}"))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn google_api_key_is_accepted_when_gemini_key_is_absent() {
        let mut config = ServiceConfig::default();
        config.apply_env(env(&[("GOOGLE_API_KEY", "g-key")])).unwrap();
        assert_eq!(config.gemini.api_key.as_deref(), Some("g-key"));

        config
            .apply_env(env(&[("GOOGLE_API_KEY", "g-key"), ("GEMINI_API_KEY", "gem-key")]))
            .unwrap();
        assert_eq!(config.gemini.api_key.as_deref(), Some("gem-key"));
    }

    #[test]
    fn empty_fallback_model_disables_fallback() {
        let mut config = ServiceConfig::default();
        assert_eq!(config.gemini.fallback().as_deref(), Some(DEFAULT_FALLBACK_MODEL));
        config.apply_env(env(&[("GEMINI_FALLBACK_MODEL", "")])).unwrap();
        assert_eq!(config.gemini.fallback(), None);
    }

    #[test]
    fn mcp_command_overrides_url() {
        let mut config = ServiceConfig::default();
        assert_eq!(config.mcp.endpoint(), MCPEndpoint::http(DEFAULT_MCP_URL));

        config
            .apply_env(env(&[("MCP_SERVER_COMMAND", "node dist/server.js --stdio")]))
            .unwrap();
        assert_eq!(
            config.mcp.endpoint(),
            MCPEndpoint::stdio("node", vec!["dist/server.js".into(), "--stdio".into()])
        );
    }

    #[test]
    fn retry_delays_parse_from_comma_list() {
        let mut config = ServiceConfig::default();
        config.apply_env(env(&[("RETRY_DELAYS_MS", "100, 200,400")])).unwrap();
        assert_eq!(config.retry.policy(), RetryPolicy::from_millis(&[100, 200, 400]));

        let err = config
            .apply_env(env(&[("RETRY_DELAYS_MS", "100,soon")]))
            .unwrap_err();
        assert!(matches!(err, ChatError::Configuration(_)));
    }

    #[test]
    fn bad_port_is_a_configuration_error() {
        let mut config = ServiceConfig::default();
        let err = config.apply_env(env(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ChatError::Configuration(_)));
    }

    #[test]
    fn missing_api_key_fails_validation() {
        let err = ServiceConfig::default().validate().unwrap_err();
        assert!(matches!(err, ChatError::Configuration(message) if message.contains("GEMINI_API_KEY")));
    }

    #[test]
    fn debug_output_hides_the_api_key() {
        let mut config = ServiceConfig::default();
        config.gemini.api_key = Some("super-secret".into());
        assert!(!format!("{config:?}").contains("super-secret"));
    }
}
