//! Named connection registry.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::TRACING_TARGET_CONNECTION;
use crate::backend::{Connector, VectorBackend};
use crate::config::MilvusConfig;
use crate::error::{VectorError, VectorResult};
use crate::milvus::MilvusConnector;

/// Outcome of [`ConnectionManager::connect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectStatus {
    /// A new session was opened.
    Connected,
    /// A session with this alias already existed and was reused.
    AlreadyConnected,
}

/// An open session bound to an alias.
#[derive(Clone)]
pub struct Connection {
    alias: String,
    host: String,
    port: u16,
    backend: Arc<dyn VectorBackend>,
}

impl Connection {
    /// Alias the session is registered under.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Server host.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Server port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Backend handle for issuing requests.
    pub fn backend(&self) -> Arc<dyn VectorBackend> {
        Arc::clone(&self.backend)
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("alias", &self.alias)
            .field("host", &self.host)
            .field("port", &self.port)
            .finish_non_exhaustive()
    }
}

/// Registry of open connections keyed by alias.
///
/// Connecting is idempotent per alias; disconnecting an unknown alias is a
/// no-op. Nothing is retried.
pub struct ConnectionManager {
    connector: Arc<dyn Connector>,
    connections: RwLock<HashMap<String, Connection>>,
}

impl ConnectionManager {
    /// Creates a manager that opens sessions through `connector`.
    pub fn new(connector: impl Connector + 'static) -> Self {
        Self {
            connector: Arc::new(connector),
            connections: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a manager backed by the Milvus RESTful API.
    pub fn milvus() -> Self {
        Self::new(MilvusConnector)
    }

    /// Opens a session under `config.alias`, reusing an existing one.
    #[tracing::instrument(skip_all, target = TRACING_TARGET_CONNECTION, fields(alias = %config.alias))]
    pub async fn connect(&self, config: &MilvusConfig) -> VectorResult<ConnectStatus> {
        if self.connections.read().await.contains_key(&config.alias) {
            tracing::info!(
                target: TRACING_TARGET_CONNECTION,
                alias = %config.alias,
                "Already connected"
            );
            return Ok(ConnectStatus::AlreadyConnected);
        }

        config.validate()?;

        let backend = self.connector.connect(config).await.map_err(|e| {
            tracing::error!(
                target: TRACING_TARGET_CONNECTION,
                error = %e,
                host = %config.host,
                port = config.port,
                "Failed to connect"
            );
            match e {
                VectorError::Connection(_) | VectorError::InvalidConfig(_) => e,
                other => VectorError::connection(other.to_string()),
            }
        })?;

        let connection = Connection {
            alias: config.alias.clone(),
            host: config.host.clone(),
            port: config.port,
            backend,
        };

        let mut connections = self.connections.write().await;
        if connections.contains_key(&config.alias) {
            return Ok(ConnectStatus::AlreadyConnected);
        }
        connections.insert(config.alias.clone(), connection);

        tracing::info!(
            target: TRACING_TARGET_CONNECTION,
            host = %config.host,
            port = config.port,
            "Connected"
        );

        Ok(ConnectStatus::Connected)
    }

    /// Releases the session under `alias`; returns whether one existed.
    pub async fn disconnect(&self, alias: &str) -> bool {
        let released = self.connections.write().await.remove(alias).is_some();
        if released {
            tracing::info!(
                target: TRACING_TARGET_CONNECTION,
                alias = %alias,
                "Disconnected"
            );
        }
        released
    }

    /// Checks the server behind `alias`.
    ///
    /// Returns `false` when no session exists or the check fails.
    pub async fn verify(&self, alias: &str) -> bool {
        let Some(connection) = self.connections.read().await.get(alias).cloned() else {
            tracing::warn!(
                target: TRACING_TARGET_CONNECTION,
                alias = %alias,
                "No active connection found"
            );
            return false;
        };

        match connection.backend.server_info().await {
            Ok(info) => {
                tracing::info!(
                    target: TRACING_TARGET_CONNECTION,
                    endpoint = %info.endpoint,
                    version = info.version.as_deref().unwrap_or("unreported"),
                    "Server is responsive"
                );
                true
            }
            Err(e) => {
                tracing::error!(
                    target: TRACING_TARGET_CONNECTION,
                    error = %e,
                    alias = %alias,
                    "Connection verification failed"
                );
                false
            }
        }
    }

    /// Collection names on the server behind `alias`, empty on failure.
    pub async fn list_collections(&self, alias: &str) -> Vec<String> {
        let connection = match self.connection(alias).await {
            Ok(connection) => connection,
            Err(e) => {
                tracing::error!(target: TRACING_TARGET_CONNECTION, error = %e, "Cannot list collections");
                return Vec::new();
            }
        };

        connection
            .backend
            .list_collections()
            .await
            .unwrap_or_else(|e| {
                tracing::error!(
                    target: TRACING_TARGET_CONNECTION,
                    error = %e,
                    alias = %alias,
                    "Failed to list collections"
                );
                Vec::new()
            })
    }

    /// Returns the session under `alias`.
    pub async fn connection(&self, alias: &str) -> VectorResult<Connection> {
        self.connections
            .read()
            .await
            .get(alias)
            .cloned()
            .ok_or_else(|| VectorError::not_connected(alias))
    }

    /// Host and port of the session under `alias`.
    pub async fn connection_info(&self, alias: &str) -> Option<(String, u16)> {
        self.connections
            .read()
            .await
            .get(alias)
            .map(|c| (c.host.clone(), c.port))
    }

    /// Whether a session exists under `alias`.
    pub async fn is_connected(&self, alias: &str) -> bool {
        self.connections.read().await.contains_key(alias)
    }

    /// Registered aliases, sorted.
    pub async fn aliases(&self) -> Vec<String> {
        let mut aliases: Vec<_> = self.connections.read().await.keys().cloned().collect();
        aliases.sort();
        aliases
    }
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager").finish_non_exhaustive()
    }
}
