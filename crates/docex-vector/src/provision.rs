//! Collection provisioning pipeline.
//!
//! Each step is idempotent and can be re-run on its own:
//!
//! ```text
//! absent ──ensure_collection──▶ created ──ensure_index──▶ indexed ──ensure_sample_data──▶ populated
//! ```
//!
//! A failed step leaves earlier steps in place; running the pipeline again
//! picks up where it stopped.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::backend::VectorBackend;
use crate::config::ProvisionConfig;
use crate::connection::Connection;
use crate::error::{VectorError, VectorResult};
use crate::index::{IndexParams, MetricType};
use crate::report::CollectionReport;
use crate::sample::sample_chunks;
use crate::schema::{CollectionSchema, define_schema, field};
use crate::{TRACING_TARGET_COLLECTIONS, TRACING_TARGET_INDEX, TRACING_TARGET_INGEST};

/// How [`Provisioner::ensure_collection`] obtained the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionStatus {
    /// Created fresh.
    Created,
    /// Already existed and was left unchanged.
    Loaded,
    /// Already existed and was dropped and created again.
    Recreated,
}

/// Outcome of [`Provisioner::ensure_index`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexStatus {
    /// A new index was built.
    Created,
    /// The vector field was already indexed.
    AlreadyExists,
}

/// Outcome of [`Provisioner::ensure_sample_data`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum SampleDataStatus {
    /// The collection was empty and rows were inserted and flushed.
    Inserted { count: usize },
    /// The collection already held rows.
    AlreadyPopulated { rows: u64 },
}

/// A collection known to exist on the server.
#[derive(Debug, Clone)]
pub struct CollectionHandle {
    name: String,
    schema: CollectionSchema,
    status: CollectionStatus,
}

impl CollectionHandle {
    /// Collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Schema of the collection as it exists on the server.
    pub fn schema(&self) -> &CollectionSchema {
        &self.schema
    }

    /// Embedding dimension of the collection.
    pub fn dimension(&self) -> Option<usize> {
        self.schema.dimension()
    }

    /// How the handle was obtained.
    pub fn status(&self) -> CollectionStatus {
        self.status
    }
}

/// Everything [`Provisioner::provision`] did.
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionSummary {
    /// Collection step outcome.
    pub collection: CollectionStatus,
    /// Index step outcome.
    pub index: IndexStatus,
    /// Sample data step outcome.
    pub sample_data: SampleDataStatus,
    /// Final collection state.
    pub report: CollectionReport,
}

/// Schema and ingestion manager over one backend session.
#[derive(Clone)]
pub struct Provisioner {
    backend: Arc<dyn VectorBackend>,
}

impl Provisioner {
    /// Creates a provisioner over a backend.
    pub fn new(backend: Arc<dyn VectorBackend>) -> Self {
        Self { backend }
    }

    /// Creates a provisioner over an open connection.
    pub fn from_connection(connection: &Connection) -> Self {
        Self::new(connection.backend())
    }

    /// Returns a handle to `name`, creating the collection if needed.
    ///
    /// An existing collection is returned unchanged unless `drop_existing`
    /// is set, in which case it is dropped and created again from
    /// [`define_schema`].
    #[tracing::instrument(skip(self), target = TRACING_TARGET_COLLECTIONS)]
    pub async fn ensure_collection(
        &self,
        name: &str,
        dimension: usize,
        drop_existing: bool,
    ) -> VectorResult<CollectionHandle> {
        let schema = define_schema(dimension);
        schema.validate()?;

        let mut status = CollectionStatus::Created;
        if self.backend.has_collection(name).await? {
            if !drop_existing {
                let schema = self.backend.describe_collection(name).await?;
                if let Some(existing) = schema.dimension()
                    && existing != dimension
                {
                    tracing::warn!(
                        target: TRACING_TARGET_COLLECTIONS,
                        collection = %name,
                        requested = dimension,
                        existing,
                        "Existing collection has a different dimension, keeping it"
                    );
                }

                tracing::info!(
                    target: TRACING_TARGET_COLLECTIONS,
                    collection = %name,
                    "Collection already exists, loading it"
                );
                return Ok(CollectionHandle {
                    name: name.to_owned(),
                    schema,
                    status: CollectionStatus::Loaded,
                });
            }

            tracing::warn!(
                target: TRACING_TARGET_COLLECTIONS,
                collection = %name,
                "Collection already exists, dropping it"
            );
            self.backend.drop_collection(name).await?;
            status = CollectionStatus::Recreated;
        }

        self.backend.create_collection(name, &schema).await?;

        tracing::info!(
            target: TRACING_TARGET_COLLECTIONS,
            collection = %name,
            dimension,
            "Collection created"
        );

        Ok(CollectionHandle {
            name: name.to_owned(),
            schema,
            status,
        })
    }

    /// Builds the HNSW index on `embedding` unless one already exists.
    #[tracing::instrument(skip_all, target = TRACING_TARGET_INDEX, fields(collection = %collection.name))]
    pub async fn ensure_index(
        &self,
        collection: &CollectionHandle,
        metric: MetricType,
    ) -> VectorResult<IndexStatus> {
        let indexes = self.backend.list_indexes(&collection.name).await?;
        if let Some(existing) = indexes.iter().find(|i| i.field_name == field::EMBEDDING) {
            tracing::info!(
                target: TRACING_TARGET_INDEX,
                index = %existing.index_name,
                index_type = %existing.index_type,
                metric = %existing.metric_type,
                "Index already exists, skipping creation"
            );
            return Ok(IndexStatus::AlreadyExists);
        }

        let params = IndexParams::hnsw(field::EMBEDDING, metric);
        self.backend
            .create_index(&collection.name, &params)
            .await
            .map_err(|e| match e {
                VectorError::Index { .. } => e,
                other => VectorError::index(&collection.name, other.to_string()),
            })?;

        tracing::info!(
            target: TRACING_TARGET_INDEX,
            metric = %metric,
            m = params.params.get("M").map(String::as_str).unwrap_or_default(),
            ef_construction = params.params.get("efConstruction").map(String::as_str).unwrap_or_default(),
            "HNSW index created"
        );

        Ok(IndexStatus::Created)
    }

    /// Inserts and flushes `count` placeholder rows into an empty collection.
    #[tracing::instrument(skip_all, target = TRACING_TARGET_INGEST, fields(collection = %collection.name))]
    pub async fn ensure_sample_data(
        &self,
        collection: &CollectionHandle,
        count: usize,
    ) -> VectorResult<SampleDataStatus> {
        let rows = self.backend.row_count(&collection.name).await?;
        if rows > 0 {
            tracing::info!(
                target: TRACING_TARGET_INGEST,
                rows,
                "Collection already contains entities"
            );
            return Ok(SampleDataStatus::AlreadyPopulated { rows });
        }

        let dimension = collection
            .dimension()
            .ok_or_else(|| VectorError::invalid_schema("collection has no vector field"))?;

        let records = sample_chunks(count, dimension);
        for record in &records {
            collection.schema.validate_record(record)?;
        }

        if records.is_empty() {
            return Ok(SampleDataStatus::Inserted { count: 0 });
        }

        let inserted = self.backend.insert(&collection.name, &records).await?;
        tracing::info!(target: TRACING_TARGET_INGEST, inserted, "Inserted sample entities");

        self.backend.flush(&collection.name).await?;
        tracing::info!(target: TRACING_TARGET_INGEST, "Data flushed");

        Ok(SampleDataStatus::Inserted { count: inserted })
    }

    /// Reads the current state of the collection.
    pub async fn report(&self, collection: &CollectionHandle) -> VectorResult<CollectionReport> {
        let row_count = self.backend.row_count(&collection.name).await?;
        let indexes = self.backend.list_indexes(&collection.name).await?;
        Ok(CollectionReport::new(
            &collection.name,
            row_count,
            &collection.schema,
            indexes,
        ))
    }

    /// Runs the whole pipeline: collection, index, sample data, report.
    pub async fn provision(&self, config: &ProvisionConfig) -> VectorResult<ProvisionSummary> {
        config.validate()?;

        let handle = self
            .ensure_collection(&config.collection, config.dimension, config.drop_existing)
            .await?;
        let index = self.ensure_index(&handle, config.metric).await?;
        let sample_data = self
            .ensure_sample_data(&handle, config.sample_count)
            .await?;
        let report = self.report(&handle).await?;

        Ok(ProvisionSummary {
            collection: handle.status(),
            index,
            sample_data,
            report,
        })
    }
}

impl fmt::Debug for Provisioner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provisioner").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::config::{DEFAULT_COLLECTION, MilvusConfig};
    use crate::connection::ConnectionManager;
    use crate::memory::InMemoryServer;

    fn provisioner(server: &InMemoryServer) -> Provisioner {
        Provisioner::new(Arc::new(server.backend("memory")))
    }

    #[tokio::test]
    async fn ensure_collection_twice_returns_same_collection() {
        let server = InMemoryServer::new();
        let provisioner = provisioner(&server);

        let first = provisioner
            .ensure_collection("support_docs_v1", 768, false)
            .await
            .unwrap();
        let second = provisioner
            .ensure_collection("support_docs_v1", 768, false)
            .await
            .unwrap();

        assert_eq!(first.status(), CollectionStatus::Created);
        assert_eq!(second.status(), CollectionStatus::Loaded);
        assert_eq!(first.name(), second.name());
        assert_eq!(first.schema(), second.schema());
        assert_eq!(
            provisioner.backend.list_collections().await.unwrap(),
            ["support_docs_v1"]
        );
    }

    #[tokio::test]
    async fn existing_collection_keeps_its_rows() {
        let server = InMemoryServer::new();
        let provisioner = provisioner(&server);
        let handle = provisioner.ensure_collection("c", 8, false).await.unwrap();
        provisioner.ensure_sample_data(&handle, 3).await.unwrap();

        let again = provisioner.ensure_collection("c", 8, false).await.unwrap();
        assert_eq!(provisioner.report(&again).await.unwrap().row_count, 3);
    }

    #[tokio::test]
    async fn drop_existing_recreates_empty_collection() {
        let server = InMemoryServer::new();
        let provisioner = provisioner(&server);
        let handle = provisioner.ensure_collection("c", 8, false).await.unwrap();
        provisioner.ensure_index(&handle, MetricType::L2).await.unwrap();
        provisioner.ensure_sample_data(&handle, 2).await.unwrap();

        let recreated = provisioner.ensure_collection("c", 16, true).await.unwrap();
        assert_eq!(recreated.status(), CollectionStatus::Recreated);
        assert_eq!(recreated.dimension(), Some(16));

        let report = provisioner.report(&recreated).await.unwrap();
        assert_eq!(report.row_count, 0);
        assert!(report.indexes.is_empty());
    }

    #[tokio::test]
    async fn invalid_dimension_keeps_existing_collection() {
        let server = InMemoryServer::new();
        let provisioner = provisioner(&server);
        let handle = provisioner.ensure_collection("c", 8, false).await.unwrap();
        provisioner.ensure_sample_data(&handle, 3).await.unwrap();

        let err = provisioner.ensure_collection("c", 0, true).await.unwrap_err();
        assert!(matches!(err, VectorError::InvalidSchema(_)));

        assert!(provisioner.backend.has_collection("c").await.unwrap());
        assert_eq!(server.rows("c").len(), 3);
        assert_eq!(provisioner.report(&handle).await.unwrap().row_count, 3);
    }

    #[tokio::test]
    async fn loaded_collection_keeps_server_dimension() {
        let server = InMemoryServer::new();
        let provisioner = provisioner(&server);
        provisioner.ensure_collection("c", 8, false).await.unwrap();

        let handle = provisioner.ensure_collection("c", 768, false).await.unwrap();
        assert_eq!(handle.dimension(), Some(8));

        provisioner.ensure_sample_data(&handle, 2).await.unwrap();
        assert!(server.rows("c").iter().all(|r| r.embedding.len() == 8));
    }

    #[tokio::test]
    async fn ensure_index_twice_creates_one_index() {
        let server = InMemoryServer::new();
        let provisioner = provisioner(&server);
        let handle = provisioner.ensure_collection("c", 8, false).await.unwrap();

        assert_eq!(
            provisioner.ensure_index(&handle, MetricType::IP).await.unwrap(),
            IndexStatus::Created
        );
        assert_eq!(
            provisioner.ensure_index(&handle, MetricType::L2).await.unwrap(),
            IndexStatus::AlreadyExists
        );

        let indexes = provisioner.backend.list_indexes("c").await.unwrap();
        assert_eq!(indexes.len(), 1);
        assert_eq!(indexes[0].metric_type, "IP");
    }

    #[tokio::test]
    async fn sample_data_yields_five_distinct_rows() {
        let server = InMemoryServer::new();
        let provisioner = provisioner(&server);
        let handle = provisioner.ensure_collection("c", 768, false).await.unwrap();

        let status = provisioner.ensure_sample_data(&handle, 5).await.unwrap();
        assert_eq!(status, SampleDataStatus::Inserted { count: 5 });
        assert_eq!(provisioner.report(&handle).await.unwrap().row_count, 5);

        let rows = server.rows("c");
        let ids: HashSet<_> = rows.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids.len(), 5);
        assert!(rows.iter().all(|r| r.embedding.len() == 768));
    }

    #[tokio::test]
    async fn sample_data_skips_populated_collection() {
        let server = InMemoryServer::new();
        let provisioner = provisioner(&server);
        let handle = provisioner.ensure_collection("c", 4, false).await.unwrap();
        provisioner.ensure_sample_data(&handle, 5).await.unwrap();

        assert_eq!(
            provisioner.ensure_sample_data(&handle, 5).await.unwrap(),
            SampleDataStatus::AlreadyPopulated { rows: 5 }
        );
        assert_eq!(server.rows("c").len(), 5);
    }

    #[tokio::test]
    async fn server_failure_surfaces_as_error() {
        let server = InMemoryServer::new();
        let provisioner = provisioner(&server);
        let handle = provisioner.ensure_collection("c", 4, false).await.unwrap();

        server.set_available(false);
        let err = provisioner.ensure_index(&handle, MetricType::L2).await.unwrap_err();
        assert!(matches!(err, VectorError::Connection(_)));
    }

    #[tokio::test]
    async fn invalid_config_stops_pipeline() {
        let server = InMemoryServer::new();
        let err = provisioner(&server)
            .provision(&ProvisionConfig::new("bad-name"))
            .await
            .unwrap_err();
        assert!(matches!(err, VectorError::InvalidConfig(_)));
        assert!(server.rows("bad-name").is_empty());
    }

    #[tokio::test]
    async fn end_to_end_on_fresh_server() {
        let server = InMemoryServer::new();
        let manager = ConnectionManager::new(server.connector());
        let config = MilvusConfig::default();
        manager.connect(&config).await.unwrap();
        assert!(manager.verify(&config.alias).await);
        assert!(manager.list_collections(&config.alias).await.is_empty());

        let connection = manager.connection(&config.alias).await.unwrap();
        let summary = Provisioner::from_connection(&connection)
            .provision(&ProvisionConfig::default())
            .await
            .unwrap();

        assert_eq!(summary.collection, CollectionStatus::Created);
        assert_eq!(summary.index, IndexStatus::Created);
        assert_eq!(summary.sample_data, SampleDataStatus::Inserted { count: 5 });

        let report = &summary.report;
        assert_eq!(report.collection, DEFAULT_COLLECTION);
        assert_eq!(report.row_count, 5);
        assert_eq!(report.indexes.len(), 1);
        assert_eq!(report.indexes[0].field_name, "embedding");
        assert_eq!(report.indexes[0].index_type, "HNSW");
        assert_eq!(report.indexes[0].metric_type, "L2");
        assert_eq!(
            manager.list_collections(&config.alias).await,
            [DEFAULT_COLLECTION]
        );

        let rerun = Provisioner::from_connection(&connection)
            .provision(&ProvisionConfig::default())
            .await
            .unwrap();
        assert_eq!(rerun.collection, CollectionStatus::Loaded);
        assert_eq!(rerun.index, IndexStatus::AlreadyExists);
        assert_eq!(
            rerun.sample_data,
            SampleDataStatus::AlreadyPopulated { rows: 5 }
        );
    }
}
