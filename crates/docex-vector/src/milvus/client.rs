//! Milvus RESTful API v2 client.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde::de::{DeserializeOwned, IgnoredAny};

use super::wire::{
    CollectionDescription, CollectionRequest, CollectionStats, CreateCollectionRequest,
    CreateIndexRequest, DatabaseRequest, Envelope, HasCollection, IndexDescription,
    IndexRequest, InsertRequest, InsertResult, build_version,
};
use crate::TRACING_TARGET_MILVUS;
use crate::backend::{Connector, ServerInfo, VectorBackend};
use crate::chunk::DocumentChunk;
use crate::config::MilvusConfig;
use crate::error::{VectorError, VectorResult};
use crate::index::{IndexInfo, IndexParams};
use crate::schema::CollectionSchema;

/// Route prefix of the v2 API.
const API_PREFIX: &str = "v2/vectordb";

/// Server error code for a missing collection.
const CODE_COLLECTION_NOT_FOUND: i64 = 100;

struct MilvusRestInner {
    http: Client,
    endpoint: String,
    metrics_endpoint: String,
    token: Option<String>,
    database: Option<String>,
}

/// Session against a Milvus server over its RESTful API.
///
/// Cheap to clone; clones share the underlying HTTP connection pool.
#[derive(Clone)]
pub struct MilvusRestBackend {
    inner: Arc<MilvusRestInner>,
}

impl fmt::Debug for MilvusRestBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MilvusRestBackend")
            .field("endpoint", &self.inner.endpoint)
            .field("database", &self.inner.database)
            .finish_non_exhaustive()
    }
}

impl MilvusRestBackend {
    /// Builds the HTTP client without contacting the server.
    pub fn new(config: &MilvusConfig) -> VectorResult<Self> {
        config.validate()?;

        tracing::debug!(
            target: TRACING_TARGET_MILVUS,
            endpoint = %config.endpoint(),
            timeout_secs = config.timeout_secs,
            "Creating Milvus REST client"
        );

        let http = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("docex/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(MilvusRestInner {
                http,
                endpoint: config.endpoint(),
                metrics_endpoint: config.metrics_endpoint(),
                token: config.token.clone(),
                database: config.database.clone(),
            }),
        })
    }

    /// Builds the client and checks that the server answers.
    pub async fn connect(config: &MilvusConfig) -> VectorResult<Self> {
        let backend = Self::new(config)?;
        backend
            .list_collections()
            .await
            .map_err(|e| VectorError::connection(format!("{}: {e}", backend.endpoint())))?;

        tracing::info!(
            target: TRACING_TARGET_MILVUS,
            endpoint = %backend.endpoint(),
            "Milvus REST client connected"
        );
        Ok(backend)
    }

    /// Base URL of the server.
    pub fn endpoint(&self) -> &str {
        &self.inner.endpoint
    }

    /// Reads the server version from the `milvus_build_info` metric.
    pub async fn server_version(&self) -> VectorResult<Option<String>> {
        let url = format!("{}/metrics", self.inner.metrics_endpoint);
        let metrics = self
            .inner
            .http
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(build_version(&metrics))
    }

    fn database(&self) -> Option<&str> {
        self.inner.database.as_deref()
    }

    fn collection<'a>(&'a self, name: &'a str) -> CollectionRequest<'a> {
        CollectionRequest {
            collection_name: name,
            db_name: self.database(),
        }
    }

    /// POSTs `body` to `route` and unwraps the response envelope.
    async fn call<B, T>(&self, route: &str, body: &B) -> VectorResult<Option<T>>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/{API_PREFIX}/{route}", self.inner.endpoint);
        tracing::trace!(target: TRACING_TARGET_MILVUS, %url, "Sending request");

        let mut request = self.inner.http.post(&url).json(body);
        if let Some(token) = &self.inner.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?.error_for_status()?;
        let envelope: Envelope<T> = response.json().await?;
        envelope.into_data().inspect_err(|e| {
            tracing::debug!(target: TRACING_TARGET_MILVUS, %url, error = %e, "Request rejected");
        })
    }

    /// Like [`Self::call`], failing when the response carries no payload.
    async fn call_data<B, T>(&self, route: &str, body: &B) -> VectorResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.call(route, body)
            .await?
            .ok_or_else(|| VectorError::backend(format!("{route} returned no data")))
    }

    /// Like [`Self::call`], discarding the payload.
    async fn call_unit<B>(&self, route: &str, body: &B) -> VectorResult<()>
    where
        B: Serialize + ?Sized,
    {
        self.call::<B, IgnoredAny>(route, body).await.map(|_| ())
    }
}

/// Maps the server's missing-collection code to [`VectorError::CollectionNotFound`].
fn not_found_as(name: &str) -> impl FnOnce(VectorError) -> VectorError + '_ {
    move |e| match e {
        VectorError::Server {
            code: CODE_COLLECTION_NOT_FOUND,
            ..
        } => VectorError::collection_not_found(name),
        other => other,
    }
}

#[async_trait]
impl VectorBackend for MilvusRestBackend {
    /// The version comes from the metrics endpoint. When that endpoint is
    /// unreachable, a collection listing alone serves as the liveness check.
    async fn server_info(&self) -> VectorResult<ServerInfo> {
        let version = match self.server_version().await {
            Ok(version) => version,
            Err(e) => {
                tracing::debug!(
                    target: TRACING_TARGET_MILVUS,
                    metrics_endpoint = %self.inner.metrics_endpoint,
                    error = %e,
                    "Server version unavailable, falling back to collection listing"
                );
                None
            }
        };

        self.list_collections().await?;
        Ok(ServerInfo {
            endpoint: self.inner.endpoint.clone(),
            version,
        })
    }

    async fn list_collections(&self) -> VectorResult<Vec<String>> {
        let body = DatabaseRequest {
            db_name: self.database(),
        };
        Ok(self.call("collections/list", &body).await?.unwrap_or_default())
    }

    async fn has_collection(&self, name: &str) -> VectorResult<bool> {
        let has: HasCollection = self
            .call_data("collections/has", &self.collection(name))
            .await?;
        Ok(has.has)
    }

    async fn create_collection(&self, name: &str, schema: &CollectionSchema) -> VectorResult<()> {
        schema.validate()?;
        let body = CreateCollectionRequest::new(name, self.database(), schema);
        self.call_unit("collections/create", &body).await
    }

    async fn drop_collection(&self, name: &str) -> VectorResult<()> {
        self.call_unit("collections/drop", &self.collection(name))
            .await
            .map_err(not_found_as(name))
    }

    async fn describe_collection(&self, name: &str) -> VectorResult<CollectionSchema> {
        let description: CollectionDescription = self
            .call_data("collections/describe", &self.collection(name))
            .await
            .map_err(not_found_as(name))?;
        CollectionSchema::try_from(description)
    }

    async fn list_indexes(&self, collection: &str) -> VectorResult<Vec<IndexInfo>> {
        let names: Vec<String> = self
            .call("indexes/list", &self.collection(collection))
            .await
            .map_err(not_found_as(collection))?
            .unwrap_or_default();

        let mut indexes = Vec::with_capacity(names.len());
        for index_name in &names {
            let body = IndexRequest {
                collection_name: collection,
                index_name,
                db_name: self.database(),
            };
            let described: Vec<IndexDescription> = self
                .call("indexes/describe", &body)
                .await?
                .unwrap_or_default();
            indexes.extend(described.into_iter().map(IndexInfo::from));
        }
        Ok(indexes)
    }

    async fn create_index(&self, collection: &str, params: &IndexParams) -> VectorResult<()> {
        let body = CreateIndexRequest::new(collection, self.database(), params);
        self.call_unit("indexes/create", &body)
            .await
            .map_err(|e| match e {
                VectorError::Server { code, message } => {
                    VectorError::index(collection, format!("code {code}: {message}"))
                }
                other => other,
            })
    }

    async fn insert(&self, collection: &str, records: &[DocumentChunk]) -> VectorResult<usize> {
        let body = InsertRequest {
            collection_name: collection,
            db_name: self.database(),
            data: records,
        };
        let result: InsertResult = self
            .call_data("entities/insert", &body)
            .await
            .map_err(not_found_as(collection))?;
        Ok(result.insert_count)
    }

    async fn flush(&self, collection: &str) -> VectorResult<()> {
        self.call_unit("collections/flush", &self.collection(collection))
            .await
            .map_err(not_found_as(collection))
    }

    async fn row_count(&self, collection: &str) -> VectorResult<u64> {
        let stats: CollectionStats = self
            .call_data("collections/get_stats", &self.collection(collection))
            .await
            .map_err(not_found_as(collection))?;
        Ok(stats.row_count)
    }
}

/// Opens [`MilvusRestBackend`] sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct MilvusConnector;

#[async_trait]
impl Connector for MilvusConnector {
    async fn connect(&self, config: &MilvusConfig) -> VectorResult<Arc<dyn VectorBackend>> {
        let backend = MilvusRestBackend::connect(config).await?;
        Ok(Arc::new(backend))
    }
}
