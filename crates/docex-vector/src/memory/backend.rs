//! In-memory server emulation.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::backend::{Connector, ServerInfo, VectorBackend};
use crate::chunk::DocumentChunk;
use crate::config::MilvusConfig;
use crate::error::{VectorError, VectorResult};
use crate::index::{IndexInfo, IndexParams};
use crate::schema::CollectionSchema;

/// Version reported by the emulated server.
const SERVER_VERSION: &str = "in-memory";

#[derive(Debug)]
struct StoredCollection {
    schema: CollectionSchema,
    indexes: Vec<IndexInfo>,
    rows: Vec<DocumentChunk>,
    flushed: usize,
}

#[derive(Debug)]
struct ServerState {
    collections: Mutex<BTreeMap<String, StoredCollection>>,
    available: AtomicBool,
    sessions_opened: AtomicUsize,
}

/// Shared state of an emulated server.
///
/// Clones refer to the same server, so several connections observe each
/// other's writes.
#[derive(Debug, Clone)]
pub struct InMemoryServer {
    state: Arc<ServerState>,
}

impl Default for InMemoryServer {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryServer {
    /// Creates an empty, reachable server.
    pub fn new() -> Self {
        Self {
            state: Arc::new(ServerState {
                collections: Mutex::new(BTreeMap::new()),
                available: AtomicBool::new(true),
                sessions_opened: AtomicUsize::new(0),
            }),
        }
    }

    /// Connector that opens sessions against this server.
    pub fn connector(&self) -> InMemoryConnector {
        InMemoryConnector {
            server: self.clone(),
        }
    }

    /// Backend session bound to this server, without going through a connector.
    pub fn backend(&self, endpoint: impl Into<String>) -> InMemoryBackend {
        InMemoryBackend {
            server: self.clone(),
            endpoint: endpoint.into(),
        }
    }

    /// Simulates the server going down or coming back.
    pub fn set_available(&self, available: bool) {
        self.state.available.store(available, Ordering::SeqCst);
    }

    /// Number of sessions opened through connectors.
    pub fn sessions_opened(&self) -> usize {
        self.state.sessions_opened.load(Ordering::SeqCst)
    }

    /// Rows inserted into `collection`, flushed or not.
    pub fn rows(&self, collection: &str) -> Vec<DocumentChunk> {
        self.collections()
            .get(collection)
            .map(|c| c.rows.clone())
            .unwrap_or_default()
    }

    fn collections(&self) -> MutexGuard<'_, BTreeMap<String, StoredCollection>> {
        self.state
            .collections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_available(&self) -> VectorResult<()> {
        if self.state.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(VectorError::connection("server unavailable"))
        }
    }
}

/// Opens [`InMemoryBackend`] sessions.
#[derive(Debug, Clone)]
pub struct InMemoryConnector {
    server: InMemoryServer,
}

#[async_trait]
impl Connector for InMemoryConnector {
    async fn connect(&self, config: &MilvusConfig) -> VectorResult<Arc<dyn VectorBackend>> {
        self.server.ensure_available()?;
        self.server
            .state
            .sessions_opened
            .fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(self.server.backend(config.endpoint())))
    }
}

/// A session against an [`InMemoryServer`].
#[derive(Debug, Clone)]
pub struct InMemoryBackend {
    server: InMemoryServer,
    endpoint: String,
}

impl InMemoryBackend {
    fn with_collection<T>(
        &self,
        name: &str,
        f: impl FnOnce(&mut StoredCollection) -> VectorResult<T>,
    ) -> VectorResult<T> {
        self.server.ensure_available()?;
        let mut collections = self.server.collections();
        let collection = collections
            .get_mut(name)
            .ok_or_else(|| VectorError::collection_not_found(name))?;
        f(collection)
    }
}

#[async_trait]
impl VectorBackend for InMemoryBackend {
    async fn server_info(&self) -> VectorResult<ServerInfo> {
        self.server.ensure_available()?;
        Ok(ServerInfo {
            endpoint: self.endpoint.clone(),
            version: Some(SERVER_VERSION.to_owned()),
        })
    }

    async fn list_collections(&self) -> VectorResult<Vec<String>> {
        self.server.ensure_available()?;
        Ok(self.server.collections().keys().cloned().collect())
    }

    async fn has_collection(&self, name: &str) -> VectorResult<bool> {
        self.server.ensure_available()?;
        Ok(self.server.collections().contains_key(name))
    }

    async fn create_collection(&self, name: &str, schema: &CollectionSchema) -> VectorResult<()> {
        self.server.ensure_available()?;
        schema.validate()?;

        let mut collections = self.server.collections();
        if collections.contains_key(name) {
            return Err(VectorError::backend(format!(
                "collection '{name}' already exists"
            )));
        }
        collections.insert(
            name.to_owned(),
            StoredCollection {
                schema: schema.clone(),
                indexes: Vec::new(),
                rows: Vec::new(),
                flushed: 0,
            },
        );
        Ok(())
    }

    async fn drop_collection(&self, name: &str) -> VectorResult<()> {
        self.server.ensure_available()?;
        self.server
            .collections()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| VectorError::collection_not_found(name))
    }

    async fn describe_collection(&self, name: &str) -> VectorResult<CollectionSchema> {
        self.with_collection(name, |c| Ok(c.schema.clone()))
    }

    async fn list_indexes(&self, collection: &str) -> VectorResult<Vec<IndexInfo>> {
        self.with_collection(collection, |c| Ok(c.indexes.clone()))
    }

    async fn create_index(&self, collection: &str, params: &IndexParams) -> VectorResult<()> {
        self.with_collection(collection, |c| {
            if c.schema.field(&params.field_name).is_none() {
                return Err(VectorError::index(
                    collection,
                    format!("field '{}' does not exist", params.field_name),
                ));
            }
            if c.indexes.iter().any(|i| i.field_name == params.field_name) {
                return Err(VectorError::index(
                    collection,
                    "at most one distinct index is allowed per field",
                ));
            }
            c.indexes.push(IndexInfo::from(params));
            Ok(())
        })
    }

    async fn insert(&self, collection: &str, records: &[DocumentChunk]) -> VectorResult<usize> {
        self.with_collection(collection, |c| {
            for record in records {
                c.schema.validate_record(record)?;
            }
            c.rows.extend_from_slice(records);
            Ok(records.len())
        })
    }

    async fn flush(&self, collection: &str) -> VectorResult<()> {
        self.with_collection(collection, |c| {
            c.flushed = c.rows.len();
            Ok(())
        })
    }

    async fn row_count(&self, collection: &str) -> VectorResult<u64> {
        self.with_collection(collection, |c| Ok(c.flushed as u64))
    }
}
