//! Configuration management for the MCP server.
//!
//! This module provides a centralized configuration structure populated
//! from environment variables (and a `.env` file, if present) on top of
//! defaults.

use super::transport::TransportConfig;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Default base URL of the remote API.
pub const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

/// Default per-request timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Main configuration structure for the MCP server.
///
/// This struct contains all configurable aspects of the server, organized
/// by domain for clarity and maintainability.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,

    /// Remote API client configuration.
    pub graph: GraphConfig,

    /// Which endpoints are exposed as tools.
    pub tools: ToolsConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "graph-mcp-server".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Configuration for the remote API client.
#[derive(Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    /// Base URL every resolved tool path is appended to.
    pub base_url: String,

    /// Bearer token sent with every request.
    pub access_token: Option<String>,

    /// Per-request timeout, in seconds.
    pub timeout_secs: u64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GRAPH_BASE_URL.to_string(),
            access_token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Custom Debug implementation to redact secrets from logs.
impl std::fmt::Debug for GraphConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphConfig")
            .field("base_url", &self.base_url)
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Configuration for tool binding.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Only bind endpoints whose method is GET.
    pub read_only: bool,

    /// Bind work-scoped endpoints (directory, Teams).
    pub org_mode: bool,

    /// Case-insensitive regex; only matching tool names are bound.
    pub enabled_tools: Option<String>,
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables are expected to be prefixed with `MCP_`.
    /// For example: `MCP_SERVER_NAME`, `MCP_LOG_LEVEL`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(name) = std::env::var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        if let Ok(level) = std::env::var("MCP_LOG_LEVEL") {
            config.logging.level = level;
        }

        // Load transport configuration from environment
        config.transport = TransportConfig::from_env();

        if let Ok(base_url) = std::env::var("MCP_GRAPH_BASE_URL") {
            config.graph.base_url = base_url;
        }

        if let Ok(token) = std::env::var("MCP_ACCESS_TOKEN") {
            config.graph.access_token = Some(token);
            info!("Access token loaded from environment");
        } else {
            warn!("MCP_ACCESS_TOKEN not set - requests will be sent unauthenticated");
        }

        if let Ok(timeout) = std::env::var("MCP_HTTP_TIMEOUT_SECS") {
            match timeout.parse() {
                Ok(secs) => config.graph.timeout_secs = secs,
                Err(_) => warn!(
                    "Invalid MCP_HTTP_TIMEOUT_SECS '{}', using {}s",
                    timeout, DEFAULT_TIMEOUT_SECS
                ),
            }
        }

        if let Ok(value) = std::env::var("MCP_READ_ONLY") {
            config.tools.read_only = parse_bool(&value);
        }

        if let Ok(value) = std::env::var("MCP_ORG_MODE") {
            config.tools.org_mode = parse_bool(&value);
        }

        if let Ok(pattern) = std::env::var("MCP_ENABLED_TOOLS") {
            if !pattern.trim().is_empty() {
                info!("Tool filter enabled: {}", pattern);
                config.tools.enabled_tools = Some(pattern);
            }
        }

        config
    }
}

/// Parse a boolean flag; `true`, `1` and `yes` are truthy.
fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to ensure env var tests run serially
    static ENV_TEST_LOCK: Mutex<()> = Mutex::new(());

    const TOOL_VARS: &[&str] = &["MCP_READ_ONLY", "MCP_ORG_MODE", "MCP_ENABLED_TOOLS"];

    fn clear(vars: &[&str]) {
        for var in vars {
            unsafe {
                std::env::remove_var(var);
            }
        }
    }

    #[test]
    fn test_graph_from_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("MCP_ACCESS_TOKEN", "token_12345");
            std::env::set_var("MCP_GRAPH_BASE_URL", "https://graph.microsoft.com/beta");
            std::env::set_var("MCP_HTTP_TIMEOUT_SECS", "5");
        }
        let config = Config::from_env();
        assert_eq!(config.graph.access_token.as_deref(), Some("token_12345"));
        assert_eq!(config.graph.base_url, "https://graph.microsoft.com/beta");
        assert_eq!(config.graph.timeout_secs, 5);
        clear(&["MCP_ACCESS_TOKEN", "MCP_GRAPH_BASE_URL", "MCP_HTTP_TIMEOUT_SECS"]);
    }

    #[test]
    fn test_invalid_timeout_keeps_default() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("MCP_HTTP_TIMEOUT_SECS", "soon");
        }
        let config = Config::from_env();
        assert_eq!(config.graph.timeout_secs, DEFAULT_TIMEOUT_SECS);
        clear(&["MCP_HTTP_TIMEOUT_SECS"]);
    }

    #[test]
    fn test_tools_from_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("MCP_READ_ONLY", "YES");
            std::env::set_var("MCP_ORG_MODE", "1");
            std::env::set_var("MCP_ENABLED_TOOLS", "mail|calendar");
        }
        let config = Config::from_env();
        assert!(config.tools.read_only);
        assert!(config.tools.org_mode);
        assert_eq!(config.tools.enabled_tools.as_deref(), Some("mail|calendar"));
        clear(TOOL_VARS);
    }

    #[test]
    fn test_tools_default() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        clear(TOOL_VARS);
        unsafe {
            std::env::set_var("MCP_ENABLED_TOOLS", "  ");
        }
        let config = Config::from_env();
        assert!(!config.tools.read_only);
        assert!(!config.tools.org_mode);
        assert!(config.tools.enabled_tools.is_none());
        clear(TOOL_VARS);
    }

    #[test]
    fn test_token_redacted_in_debug() {
        let graph = GraphConfig {
            access_token: Some("super_secret_token".to_string()),
            ..GraphConfig::default()
        };
        let debug_str = format!("{:?}", graph);
        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("super_secret_token"));
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true"));
        assert!(parse_bool(" Yes "));
        assert!(parse_bool("1"));
        assert!(!parse_bool("0"));
        assert!(!parse_bool("off"));
    }
}
