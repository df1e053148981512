//! `docex connect`: connect, verify and list collections.

use docex_vector::ConnectionManager;

use super::open_session;
use crate::TRACING_TARGET_COMMAND;
use crate::config::ConnectArgs;

/// Runs the connection check and prints what the server holds.
pub async fn connect(args: &ConnectArgs) -> anyhow::Result<()> {
    let manager = args.connection.manager();
    let output = check(&manager, args).await;
    manager.disconnect(&args.connection.milvus.alias).await;

    println!("{}", output?);
    Ok(())
}

async fn check(manager: &ConnectionManager, args: &ConnectArgs) -> anyhow::Result<String> {
    let connection = open_session(manager, &args.connection).await?;
    let collections = manager.list_collections(connection.alias()).await;

    tracing::debug!(
        target: TRACING_TARGET_COMMAND,
        count = collections.len(),
        "Listed collections"
    );

    let mut output = format!(
        "Connected to Milvus at {}:{} (alias: {})\n",
        connection.host(),
        connection.port(),
        connection.alias()
    );
    if collections.is_empty() {
        output.push_str("No collections found (this is expected for a new setup)");
    } else {
        output.push_str(&format!("Existing collections: {}", collections.join(", ")));
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use docex_vector::memory::InMemoryServer;
    use docex_vector::{VectorBackend, define_schema};

    use super::*;
    use crate::config::{Cli, Command};

    fn memory_args() -> ConnectArgs {
        let cli = Cli::try_parse_from(["docex", "connect", "--backend", "memory"]).unwrap();
        match cli.command {
            Command::Connect(args) => args,
            Command::Provision(_) => panic!("expected connect"),
        }
    }

    #[tokio::test]
    async fn reports_empty_server() {
        let manager = ConnectionManager::new(InMemoryServer::new().connector());
        let output = check(&manager, &memory_args()).await.unwrap();

        assert!(output.starts_with("Connected to Milvus at localhost:19530 (alias: default)"));
        assert!(output.contains("No collections found"));
    }

    #[tokio::test]
    async fn lists_existing_collections() {
        let server = InMemoryServer::new();
        let backend = server.backend("memory");
        backend.create_collection("b_docs", &define_schema(4)).await.unwrap();
        backend.create_collection("a_docs", &define_schema(4)).await.unwrap();

        let manager = ConnectionManager::new(server.connector());
        let output = check(&manager, &memory_args()).await.unwrap();
        assert!(output.ends_with("Existing collections: a_docs, b_docs"));
    }

    #[tokio::test]
    async fn unreachable_server_fails() {
        let server = InMemoryServer::new();
        server.set_available(false);
        let manager = ConnectionManager::new(server.connector());

        let err = check(&manager, &memory_args()).await.unwrap_err();
        assert!(err.to_string().contains("failed to connect to Milvus"));
        assert!(!manager.is_connected("default").await);
    }

    #[tokio::test]
    async fn command_releases_session() {
        connect(&memory_args()).await.unwrap();
    }
}
