//! Configuration for imcite-core
//!
//! Centralized configuration for the HTTP client, upstream endpoints, the
//! shared request gate, retry behavior and statement building. Every section
//! has defaults, so partial JSON or TOML documents are accepted.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Pipeline-wide configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// HTTP client settings
    pub http: HttpConfig,
    /// Base URLs of the upstream services
    pub endpoints: EndpointConfig,
    /// Shared request gate
    pub throttle: ThrottleConfig,
    /// Retry policy for transient failures
    pub retry: RetryConfig,
    /// Statement building settings
    pub statements: StatementConfig,
}

/// HTTP client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// `tool` parameter sent to NCBI E-utilities
    pub tool: String,
    /// Contact address sent to NCBI E-utilities
    pub email: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("imcite/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 30,
            tool: "imcite".to_string(),
            email: None,
        }
    }
}

/// Upstream service endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// NCBI E-utilities base (efetch, esummary)
    pub eutils_base: String,
    /// NCBI PMC ID converter
    pub idconv_base: String,
    /// DOI resolver used for content negotiation
    pub doi_base: String,
    /// SPARQL endpoint of the knowledge graph
    pub sparql_endpoint: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            eutils_base: "https://eutils.ncbi.nlm.nih.gov/entrez/eutils".to_string(),
            idconv_base: "https://www.ncbi.nlm.nih.gov/pmc/utils/idconv/v1.0".to_string(),
            doi_base: "https://doi.org".to_string(),
            sparql_endpoint: "https://query.wikidata.org/sparql".to_string(),
        }
    }
}

/// Request gate configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Sustained request rate across all upstreams
    pub requests_per_second: u32,
    /// Requests allowed in a burst
    pub burst: u32,
    /// Requests in flight at once, across the whole batch
    pub max_concurrent_requests: u32,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            // NCBI allows 3 requests/second without an API key
            requests_per_second: 3,
            burst: 3,
            max_concurrent_requests: 4,
        }
    }
}

/// Retry policy for transient failures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay before the first retry in milliseconds
    pub base_delay_ms: u64,
    /// Upper bound on any single delay in milliseconds
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
            max_delay_ms: 8_000,
        }
    }
}

/// Statement building configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatementConfig {
    /// Title language when the record's language is unknown or unmapped
    pub default_language: String,
    /// Look up the journal item by ISSN for "published in"
    pub resolve_journals: bool,
}

impl Default for StatementConfig {
    fn default() -> Self {
        Self {
            default_language: "en".to_string(),
            resolve_journals: true,
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load configuration from a JSON string
    pub fn from_json(json_str: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json_str).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load and validate a `.toml` or `.json` file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;

        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml(&contents)?,
            Some("json") => Self::from_json(&contents)?,
            other => {
                return Err(ConfigError::Parse(format!(
                    "unsupported config format: {}",
                    other.unwrap_or("<none>")
                )))
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.user_agent.trim().is_empty() {
            return Err(ConfigError::MissingField("http.user_agent".to_string()));
        }

        if self.http.timeout_secs == 0 {
            return Err(ConfigError::OutOfRange(
                "http.timeout_secs must be positive".to_string(),
            ));
        }

        for (name, value) in [
            ("endpoints.eutils_base", &self.endpoints.eutils_base),
            ("endpoints.idconv_base", &self.endpoints.idconv_base),
            ("endpoints.doi_base", &self.endpoints.doi_base),
            ("endpoints.sparql_endpoint", &self.endpoints.sparql_endpoint),
        ] {
            Url::parse(value)
                .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", name, e)))?;
        }

        if self.throttle.requests_per_second == 0 {
            return Err(ConfigError::OutOfRange(
                "throttle.requests_per_second must be positive".to_string(),
            ));
        }

        if self.throttle.burst == 0 {
            return Err(ConfigError::OutOfRange(
                "throttle.burst must be positive".to_string(),
            ));
        }

        if self.throttle.max_concurrent_requests == 0 {
            return Err(ConfigError::OutOfRange(
                "throttle.max_concurrent_requests must be positive".to_string(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(ConfigError::OutOfRange(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }

        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(ConfigError::OutOfRange(
                "retry.base_delay_ms must not exceed retry.max_delay_ms".to_string(),
            ));
        }

        if self.statements.default_language.trim().is_empty() {
            return Err(ConfigError::MissingField(
                "statements.default_language".to_string(),
            ));
        }

        Ok(())
    }
}

/// Configuration loading and validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Value is out of valid range
    #[error("Value out of range: {0}")]
    OutOfRange(String),
    /// Required field is missing or blank
    #[error("Missing field: {0}")]
    MissingField(String),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("IO error: {0}")]
    Io(String),
}
