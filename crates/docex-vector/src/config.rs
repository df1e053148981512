//! Connection and provisioning configuration.

use std::fmt;
use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::error::{VectorError, VectorResult};
use crate::index::MetricType;
use crate::schema::{DEFAULT_DIMENSION, MAX_DIMENSION};

/// Default collection name.
pub const DEFAULT_COLLECTION: &str = "support_docs_v1";

/// Milvus connection configuration.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct MilvusConfig {
    /// Milvus server host.
    #[cfg_attr(
        feature = "config",
        arg(long = "milvus-host", env = "MILVUS_HOST", default_value = "localhost")
    )]
    #[serde(default = "default_host")]
    pub host: String,

    /// Milvus server port.
    #[cfg_attr(
        feature = "config",
        arg(long = "milvus-port", env = "MILVUS_PORT", default_value_t = 19530)
    )]
    #[serde(default = "default_port")]
    pub port: u16,

    /// Port of the HTTP endpoint serving `/healthz` and `/metrics`.
    #[cfg_attr(
        feature = "config",
        arg(long = "milvus-metrics-port", env = "MILVUS_METRICS_PORT", default_value_t = 9091)
    )]
    #[serde(default = "default_metrics_port")]
    pub metrics_port: u16,

    /// Local name bound to the connection.
    #[cfg_attr(
        feature = "config",
        arg(long = "milvus-alias", env = "MILVUS_ALIAS", default_value = "default")
    )]
    #[serde(default = "default_alias")]
    pub alias: String,

    /// Bearer token, either `user:password` or an API key.
    #[cfg_attr(
        feature = "config",
        arg(long = "milvus-token", env = "MILVUS_TOKEN", hide_env_values = true)
    )]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Database name; the server default is used when unset.
    #[cfg_attr(feature = "config", arg(long = "milvus-database", env = "MILVUS_DATABASE"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    /// Request timeout in seconds.
    #[cfg_attr(
        feature = "config",
        arg(long = "milvus-timeout-secs", env = "MILVUS_TIMEOUT_SECS", default_value_t = 30)
    )]
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl MilvusConfig {
    /// Creates a configuration for the given host with default port and alias.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// Sets the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the metrics port.
    pub fn with_metrics_port(mut self, metrics_port: u16) -> Self {
        self.metrics_port = metrics_port;
        self
    }

    /// Sets the alias.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    /// Sets the bearer token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sets the credentials as a `user:password` token.
    pub fn with_credentials(self, username: &str, password: &str) -> Self {
        self.with_token(format!("{username}:{password}"))
    }

    /// Sets the database name.
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs();
        self
    }

    /// Base URL of the server's HTTP endpoint.
    pub fn endpoint(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Base URL of the server's metrics endpoint.
    pub fn metrics_endpoint(&self) -> String {
        format!("http://{}:{}", self.host, self.metrics_port)
    }

    /// Request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> VectorResult<()> {
        if self.host.trim().is_empty() {
            return Err(VectorError::invalid_config("host cannot be empty"));
        }
        if self.port == 0 {
            return Err(VectorError::invalid_config("port must be non-zero"));
        }
        if self.metrics_port == 0 {
            return Err(VectorError::invalid_config("metrics port must be non-zero"));
        }
        if self.alias.trim().is_empty() {
            return Err(VectorError::invalid_config("alias cannot be empty"));
        }
        if self.timeout_secs == 0 {
            return Err(VectorError::invalid_config("timeout must be at least one second"));
        }
        Ok(())
    }
}

impl Default for MilvusConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            metrics_port: default_metrics_port(),
            alias: default_alias(),
            token: None,
            database: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl fmt::Debug for MilvusConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MilvusConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("metrics_port", &self.metrics_port)
            .field("alias", &self.alias)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("database", &self.database)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// What to provision once connected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct ProvisionConfig {
    /// Collection name.
    #[cfg_attr(
        feature = "config",
        arg(long = "collection", env = "DOCEX_COLLECTION", default_value = DEFAULT_COLLECTION)
    )]
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Embedding dimension; must match the embedding model.
    #[cfg_attr(
        feature = "config",
        arg(long = "dimension", env = "DOCEX_DIMENSION", default_value_t = DEFAULT_DIMENSION)
    )]
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Distance metric of the HNSW index.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "metric",
            env = "DOCEX_METRIC",
            value_enum,
            ignore_case = true,
            default_value_t = MetricType::L2
        )
    )]
    #[serde(default)]
    pub metric: MetricType,

    /// Number of placeholder rows inserted into an empty collection.
    #[cfg_attr(
        feature = "config",
        arg(long = "sample-count", env = "DOCEX_SAMPLE_COUNT", default_value_t = 5)
    )]
    #[serde(default = "default_sample_count")]
    pub sample_count: usize,

    /// Drop and recreate the collection if it already exists.
    #[cfg_attr(feature = "config", arg(long = "drop-existing", env = "DOCEX_DROP_EXISTING"))]
    #[serde(default)]
    pub drop_existing: bool,
}

impl ProvisionConfig {
    /// Creates a configuration for the given collection with defaults.
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            ..Self::default()
        }
    }

    /// Sets the embedding dimension.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    /// Sets the index metric.
    pub fn with_metric(mut self, metric: MetricType) -> Self {
        self.metric = metric;
        self
    }

    /// Sets the sample row count.
    pub fn with_sample_count(mut self, sample_count: usize) -> Self {
        self.sample_count = sample_count;
        self
    }

    /// Opts in to dropping an existing collection.
    pub fn with_drop_existing(mut self, drop_existing: bool) -> Self {
        self.drop_existing = drop_existing;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> VectorResult<()> {
        validate_collection_name(&self.collection)?;
        if self.dimension == 0 || self.dimension > MAX_DIMENSION {
            return Err(VectorError::invalid_config(format!(
                "dimension must be within 1..={MAX_DIMENSION}, got {}",
                self.dimension
            )));
        }
        Ok(())
    }
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            collection: default_collection(),
            dimension: default_dimension(),
            metric: MetricType::default(),
            sample_count: default_sample_count(),
            drop_existing: false,
        }
    }
}

/// Milvus naming rule: a letter or underscore, then letters, digits or underscores.
fn validate_collection_name(name: &str) -> VectorResult<()> {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err(VectorError::invalid_config("collection name cannot be empty"));
    };
    if name.chars().count() > 255 {
        return Err(VectorError::invalid_config(
            "collection name cannot exceed 255 characters",
        ));
    }
    if !(first.is_ascii_alphabetic() || first == '_') {
        return Err(VectorError::invalid_config(format!(
            "collection name '{name}' must start with a letter or underscore"
        )));
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(VectorError::invalid_config(format!(
            "collection name '{name}' may only contain letters, digits and underscores"
        )));
    }
    Ok(())
}

fn default_host() -> String {
    "localhost".to_owned()
}

const fn default_port() -> u16 {
    19530
}

const fn default_metrics_port() -> u16 {
    9091
}

fn default_alias() -> String {
    "default".to_owned()
}

const fn default_timeout_secs() -> u64 {
    30
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_owned()
}

const fn default_dimension() -> usize {
    DEFAULT_DIMENSION
}

const fn default_sample_count() -> usize {
    5
}
