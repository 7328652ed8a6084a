//! Source configuration
//!
//! A [`SourceConfig`] describes one SPARQL endpoint: where it lives, how
//! queries are sent and what every query is prefixed with. It can be built
//! in code or loaded from YAML:
//!
//! ```yaml
//! endpoint: https://lindas.admin.ch/query
//! graph: https://lindas.admin.ch/foen/nfi
//! queryOperation: postUrlencoded
//! timeoutSecs: 30
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Prefix sent in front of every query unless configured otherwise
pub const DEFAULT_QUERY_PREFIX: &str = "#pragma describe.strategy cbd\n";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// YAML could not be parsed
    #[error("Invalid configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A required field is missing or empty
    #[error("Missing configuration value: {0}")]
    Missing(&'static str),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// How a query is transported to the endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum QueryOperation {
    /// `GET ?query=...`
    Get,
    /// `POST` with a form-encoded `query=` body
    #[default]
    PostUrlencoded,
    /// `POST` with the query as `application/sparql-query` body
    PostDirect,
}

/// SPARQL endpoint configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SourceConfig {
    /// Query endpoint URL
    pub endpoint: String,
    /// Named graph the data lives in (None = default graph)
    pub graph: Option<String>,
    /// Basic auth user
    pub user: Option<String>,
    /// Basic auth password
    pub password: Option<String>,
    /// Transport used for queries
    pub query_operation: QueryOperation,
    /// Text prepended to every query
    pub query_prefix: String,
    /// Request timeout in seconds (None = no timeout)
    pub timeout_secs: Option<u64>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            graph: None,
            user: None,
            password: None,
            query_operation: QueryOperation::default(),
            query_prefix: DEFAULT_QUERY_PREFIX.to_string(),
            timeout_secs: None,
        }
    }
}

impl SourceConfig {
    /// Configuration for `endpoint` with every other field at its default
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    pub fn with_graph(mut self, graph: impl Into<String>) -> Self {
        self.graph = Some(graph.into());
        self
    }

    /// Load a configuration from YAML
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        let config: SourceConfig = serde_yaml::from_str(yaml)?;
        if config.endpoint.trim().is_empty() {
            return Err(ConfigError::Missing("endpoint"));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SourceConfig::new("http://localhost/query");
        assert_eq!(config.query_operation, QueryOperation::PostUrlencoded);
        assert_eq!(config.query_prefix, DEFAULT_QUERY_PREFIX);
        assert!(config.graph.is_none());
        assert!(config.timeout_secs.is_none());
    }

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
endpoint: https://lindas.admin.ch/query
graph: https://lindas.admin.ch/foen/nfi
queryOperation: get
queryPrefix: ""
timeoutSecs: 30
"#;
        let config = SourceConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.endpoint, "https://lindas.admin.ch/query");
        assert_eq!(config.graph.as_deref(), Some("https://lindas.admin.ch/foen/nfi"));
        assert_eq!(config.query_operation, QueryOperation::Get);
        assert_eq!(config.query_prefix, "");
        assert_eq!(config.timeout_secs, Some(30));
    }

    #[test]
    fn test_from_yaml_requires_endpoint() {
        assert!(matches!(
            SourceConfig::from_yaml_str("graph: http://example.org/g"),
            Err(ConfigError::Missing("endpoint"))
        ));
        assert!(matches!(
            SourceConfig::from_yaml_str("queryOperation: sideways\nendpoint: x"),
            Err(ConfigError::Yaml(_))
        ));
    }
}
