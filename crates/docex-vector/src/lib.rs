#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Tracing target for connection lifecycle events.
///
/// Use this target for logging connect, disconnect and liveness checks.
pub const TRACING_TARGET_CONNECTION: &str = "docex_vector::connection";

/// Tracing target for collection creation, loading and dropping.
pub const TRACING_TARGET_COLLECTIONS: &str = "docex_vector::collections";

/// Tracing target for index operations.
pub const TRACING_TARGET_INDEX: &str = "docex_vector::index";

/// Tracing target for record insertion and flushing.
pub const TRACING_TARGET_INGEST: &str = "docex_vector::ingest";

/// Tracing target for raw Milvus REST calls.
pub const TRACING_TARGET_MILVUS: &str = "docex_vector::milvus";

pub mod memory;
pub mod milvus;

mod backend;
mod chunk;
mod config;
mod connection;
mod error;
mod index;
mod provision;
mod report;
mod sample;
mod schema;

pub use backend::{Connector, ServerInfo, VectorBackend};
pub use chunk::DocumentChunk;
pub use config::{DEFAULT_COLLECTION, MilvusConfig, ProvisionConfig};
pub use connection::{ConnectStatus, Connection, ConnectionManager};
pub use error::{ErrorCategory, VectorError, VectorResult};
pub use index::{HNSW_EF_CONSTRUCTION, HNSW_M, IndexInfo, IndexParams, IndexType, MetricType};
pub use provision::{
    CollectionHandle, CollectionStatus, IndexStatus, ProvisionSummary, Provisioner,
    SampleDataStatus,
};
pub use report::{CollectionReport, FieldReport};
pub use sample::{SAMPLE_CATEGORIES, SAMPLE_FILE_NAMES, sample_chunks, sample_chunks_with_rng};
pub use schema::{
    COLLECTION_DESCRIPTION, CollectionSchema, DEFAULT_DIMENSION, DataType, FieldSchema,
    MAX_DIMENSION, define_schema, field,
};
