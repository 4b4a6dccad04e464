//! Configuration types for the HTTP service

use description_bot_core::catalog::LeanIxConfig;
use description_bot_core::generation::OpenAiConfig;
use description_bot_core::OrchestratorSettings;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::time::Duration;

use crate::errors::ConfigError;

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Webhook processing settings
    pub webhook: WebhookConfig,

    /// Inbound request admission settings
    pub security: SecurityConfig,

    /// Text generation service settings
    pub generation: GenerationConfig,

    /// Catalog (LeanIX) settings
    pub catalog: CatalogConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl ServiceConfig {
    /// Check that the configuration can serve requests.
    ///
    /// Outbound credentials and URLs are only required while the bot is
    /// active; an inactive bot never calls out.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.webhook.validate()?;
        self.security.validate()?;

        if self.webhook.active {
            self.generation.validate()?;
            self.catalog.validate()?;
        }

        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,

    /// Maximum request size in bytes
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            shutdown_timeout_seconds: 30,
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}

impl ServerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Missing {
                key: "server.host".to_string(),
            });
        }

        if self.max_body_size == 0 {
            return Err(ConfigError::Invalid {
                message: "server.max_body_size must be greater than zero".to_string(),
            });
        }

        Ok(())
    }
}

/// Webhook processing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Webhook endpoint path
    pub endpoint_path: String,

    /// Generate and post descriptions; when off, events are only acknowledged
    pub active: bool,

    /// Text placed directly before the fact sheet name in the prompt
    pub prompt_template: String,

    /// Fact sheet types to act on
    #[serde(deserialize_with = "deserialize_string_list")]
    pub allowed_fact_sheet_types: Vec<String>,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            endpoint_path: "/webhook".to_string(),
            active: true,
            prompt_template: "Erstelle eine Beschreibung für die Applikation namens ".to_string(),
            allowed_fact_sheet_types: vec!["Application".to_string()],
        }
    }
}

impl WebhookConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.endpoint_path.starts_with('/') {
            return Err(ConfigError::Invalid {
                message: format!(
                    "webhook.endpoint_path must start with '/': {}",
                    self.endpoint_path
                ),
            });
        }

        if self.prompt_template.trim().is_empty() {
            return Err(ConfigError::Missing {
                key: "webhook.prompt_template".to_string(),
            });
        }

        Ok(())
    }

    /// Settings handed to the orchestrator.
    pub fn orchestrator_settings(&self) -> OrchestratorSettings {
        OrchestratorSettings::new(
            self.active,
            self.prompt_template.clone(),
            self.allowed_fact_sheet_types
                .iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
        )
    }
}

/// Inbound request admission configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// HTTP Basic user name expected from the catalog
    pub username: String,

    /// HTTP Basic password expected from the catalog
    pub password: String,

    /// Exact `User-Agent` values that are admitted
    #[serde(deserialize_with = "deserialize_string_list")]
    pub allowed_user_agents: Vec<String>,

    /// Header carrying the webhook origin
    pub origin_header: String,

    /// Substring the origin header value must contain
    pub origin_marker: String,

    /// Global request rate limit
    pub rate_limit: RateLimitConfig,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            allowed_user_agents: Vec::new(),
            origin_header: "X-Webhooks-Event".to_string(),
            origin_marker: "leanix.net".to_string(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .field("allowed_user_agents", &self.allowed_user_agents)
            .field("origin_header", &self.origin_header)
            .field("origin_marker", &self.origin_marker)
            .field("rate_limit", &self.rate_limit)
            .finish()
    }
}

impl SecurityConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.username.is_empty() {
            return Err(ConfigError::Missing {
                key: "security.username".to_string(),
            });
        }

        if self.password.is_empty() {
            return Err(ConfigError::Missing {
                key: "security.password".to_string(),
            });
        }

        if axum::http::HeaderName::from_bytes(self.origin_header.as_bytes()).is_err() {
            return Err(ConfigError::Invalid {
                message: format!(
                    "security.origin_header is not a valid header name: {}",
                    self.origin_header
                ),
            });
        }

        self.rate_limit.validate()
    }
}

/// Fixed-window rate limit shared by all callers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Requests admitted per window
    pub max_requests: u32,

    /// Window length in seconds
    pub window_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window_seconds: 60,
        }
    }
}

impl RateLimitConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_requests == 0 || self.window_seconds == 0 {
            return Err(ConfigError::Invalid {
                message: "security.rate_limit requires a non-zero quota and window".to_string(),
            });
        }
        Ok(())
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_seconds)
    }
}

/// Text generation service configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// API key
    pub api_key: String,

    /// Model identifier
    pub model: String,

    /// Maximum completion length in tokens
    pub max_tokens: u32,

    /// API base URL
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        let defaults = OpenAiConfig::default();
        Self {
            api_key: String::new(),
            model: defaults.model,
            max_tokens: defaults.max_tokens,
            base_url: defaults.base_url,
            timeout_seconds: defaults.timeout.as_secs(),
        }
    }
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("api_key", &"<REDACTED>")
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("base_url", &self.base_url)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl GenerationConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.is_empty() {
            return Err(ConfigError::Missing {
                key: "generation.api_key".to_string(),
            });
        }

        if self.model.is_empty() {
            return Err(ConfigError::Missing {
                key: "generation.model".to_string(),
            });
        }

        if self.max_tokens == 0 {
            return Err(ConfigError::Invalid {
                message: "generation.max_tokens must be greater than zero".to_string(),
            });
        }

        validate_url("generation.base_url", &self.base_url)
    }

    pub fn to_openai_config(&self) -> OpenAiConfig {
        OpenAiConfig {
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(self.timeout_seconds),
        }
    }
}

/// Catalog configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Technical user API token
    pub api_token: String,

    /// OAuth2 token endpoint
    pub auth_url: String,

    /// GraphQL endpoint
    pub request_url: String,

    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            auth_url: String::new(),
            request_url: String::new(),
            timeout_seconds: 30,
        }
    }
}

impl fmt::Debug for CatalogConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogConfig")
            .field("api_token", &"<REDACTED>")
            .field("auth_url", &self.auth_url)
            .field("request_url", &self.request_url)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl CatalogConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.api_token.is_empty() {
            return Err(ConfigError::Missing {
                key: "catalog.api_token".to_string(),
            });
        }

        validate_url("catalog.auth_url", &self.auth_url)?;
        validate_url("catalog.request_url", &self.request_url)
    }

    pub fn to_leanix_config(&self) -> LeanIxConfig {
        LeanIxConfig {
            auth_url: self.auth_url.clone(),
            api_token: self.api_token.clone(),
            request_url: self.request_url.clone(),
            timeout: Duration::from_secs(self.timeout_seconds),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Logging level
    pub level: String,

    /// Enable JSON structured logging
    pub json_format: bool,

    /// Debug mode; raises the log level to `debug`
    pub debug: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            debug: false,
        }
    }
}

impl LoggingConfig {
    /// Level used for the crates of this workspace.
    pub fn effective_level(&self) -> &str {
        if self.debug {
            "debug"
        } else {
            &self.level
        }
    }
}

/// Either a list or a single comma separated string.
///
/// Environment variables can only carry strings, so
/// `DESCRIPTION_BOT__SECURITY__ALLOWED_USER_AGENTS="UA/1.0, Other/2.0"` must
/// produce the same list as the YAML sequence form.
#[derive(Deserialize)]
#[serde(untagged)]
enum StringList {
    Sequence(Vec<String>),
    Delimited(String),
}

/// Deserialize a string list, trimming entries and dropping empty ones.
pub fn deserialize_string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = match StringList::deserialize(deserializer)? {
        StringList::Sequence(items) => items,
        StringList::Delimited(text) => text.split(',').map(str::to_string).collect(),
    };

    Ok(entries
        .into_iter()
        .map(|entry| entry.trim().to_string())
        .filter(|entry| !entry.is_empty())
        .collect())
}

fn validate_url(key: &str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Missing {
            key: key.to_string(),
        });
    }

    let parsed = url::Url::parse(value).map_err(|e| ConfigError::Invalid {
        message: format!("{} is not a valid URL: {}", key, e),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::Invalid {
            message: format!("{} must use http or https, got '{}'", key, other),
        }),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
