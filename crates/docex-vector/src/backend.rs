//! Backend abstraction over a vector database server.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::chunk::DocumentChunk;
use crate::config::MilvusConfig;
use crate::error::VectorResult;
use crate::index::{IndexInfo, IndexParams};
use crate::schema::CollectionSchema;

/// What the liveness check learned about the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    /// Endpoint the check reached.
    pub endpoint: String,
    /// Server version, when the transport exposes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Operations the provisioning layer needs from a vector database.
///
/// Every call is a single attempt; implementations do not retry.
#[async_trait]
pub trait VectorBackend: Send + Sync {
    /// Liveness check.
    async fn server_info(&self) -> VectorResult<ServerInfo>;

    /// Names of all collections.
    async fn list_collections(&self) -> VectorResult<Vec<String>>;

    /// Checks if a collection exists.
    async fn has_collection(&self, name: &str) -> VectorResult<bool>;

    /// Creates a collection; fails if one with the same name exists.
    async fn create_collection(&self, name: &str, schema: &CollectionSchema) -> VectorResult<()>;

    /// Drops a collection.
    async fn drop_collection(&self, name: &str) -> VectorResult<()>;

    /// Reads back the schema of an existing collection.
    async fn describe_collection(&self, name: &str) -> VectorResult<CollectionSchema>;

    /// Indexes defined on a collection.
    async fn list_indexes(&self, collection: &str) -> VectorResult<Vec<IndexInfo>>;

    /// Builds an index.
    async fn create_index(&self, collection: &str, params: &IndexParams) -> VectorResult<()>;

    /// Inserts records and returns how many the server accepted.
    async fn insert(&self, collection: &str, records: &[DocumentChunk]) -> VectorResult<usize>;

    /// Seals pending inserts so they count towards the row count.
    async fn flush(&self, collection: &str) -> VectorResult<()>;

    /// Number of persisted rows.
    async fn row_count(&self, collection: &str) -> VectorResult<u64>;
}

/// Opens backend sessions for the connection manager.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Opens a session; fails when the server cannot be reached.
    async fn connect(&self, config: &MilvusConfig) -> VectorResult<Arc<dyn VectorBackend>>;
}
