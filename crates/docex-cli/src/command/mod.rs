//! Subcommand implementations.
//!
//! Both subcommands open one session, verify it, do their work and release
//! the session again, also when the work fails.

mod connect;
mod provision;

use anyhow::Context;
pub use connect::connect;
use docex_vector::{Connection, ConnectionManager, MilvusConfig, VectorError};
pub use provision::provision;

use crate::TRACING_TARGET_COMMAND;
use crate::config::ConnectionArgs;

/// Steps an operator can take when the server cannot be reached.
pub fn troubleshooting_hints(config: &MilvusConfig) -> String {
    format!(
        "Troubleshooting tips:\n\
         \x20 1. Make sure the Milvus containers are running (docker compose up -d)\n\
         \x20 2. Check that Milvus is healthy: curl {}/healthz\n\
         \x20 3. Verify the host and port are correct (--milvus-host, --milvus-port)",
        config.metrics_endpoint()
    )
}

/// Connects under the configured alias and runs the liveness check.
async fn open_session(
    manager: &ConnectionManager,
    args: &ConnectionArgs,
) -> anyhow::Result<Connection> {
    let config = &args.milvus;
    tracing::info!(
        target: TRACING_TARGET_COMMAND,
        host = %config.host,
        port = config.port,
        "Connecting to Milvus"
    );

    if let Err(error) = manager.connect(config).await {
        eprintln!("{}", troubleshooting_hints(config));
        return Err(error).with_context(|| {
            format!("failed to connect to Milvus at {}:{}", config.host, config.port)
        });
    }

    if !manager.verify(&config.alias).await {
        manager.disconnect(&config.alias).await;
        return Err(VectorError::verification(format!(
            "{}:{} did not answer the liveness check",
            config.host, config.port
        )))
        .with_context(|| format!("connection verification failed for alias '{}'", config.alias));
    }

    manager
        .connection(&config.alias)
        .await
        .context("connection vanished after verification")
}
