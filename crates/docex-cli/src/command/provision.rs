//! `docex provision`: ensure collection, index and sample rows, then report.

use docex_vector::{
    CollectionStatus, ConnectionManager, IndexStatus, ProvisionSummary, Provisioner,
    SampleDataStatus,
};

use super::open_session;
use crate::TRACING_TARGET_COMMAND;
use crate::config::ProvisionArgs;

/// Runs the provisioning pipeline and prints the collection report.
pub async fn provision(args: &ProvisionArgs) -> anyhow::Result<()> {
    args.provision.validate()?;

    let manager = args.connection.manager();
    let summary = run(&manager, args).await;
    manager.disconnect(&args.connection.milvus.alias).await;
    let summary = summary?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary.report)?);
    } else {
        println!("{}", summary.report);
    }
    Ok(())
}

async fn run(
    manager: &ConnectionManager,
    args: &ProvisionArgs,
) -> anyhow::Result<ProvisionSummary> {
    let connection = open_session(manager, &args.connection).await?;
    let summary = Provisioner::from_connection(&connection)
        .provision(&args.provision)
        .await
        .map_err(|e| {
            let category = e.category();
            anyhow::Error::new(e).context(format!("provisioning failed ({category})"))
        })?;

    log_summary(&summary);
    Ok(summary)
}

fn log_summary(summary: &ProvisionSummary) {
    let collection = match summary.collection {
        CollectionStatus::Created => "created",
        CollectionStatus::Loaded => "loaded",
        CollectionStatus::Recreated => "recreated",
    };
    let index = match summary.index {
        IndexStatus::Created => "created",
        IndexStatus::AlreadyExists => "already exists",
    };
    let inserted = match summary.sample_data {
        SampleDataStatus::Inserted { count } => count,
        SampleDataStatus::AlreadyPopulated { .. } => 0,
    };

    tracing::info!(
        target: TRACING_TARGET_COMMAND,
        collection = %summary.report.collection,
        collection_status = collection,
        index_status = index,
        inserted,
        rows = summary.report.row_count,
        "Provisioning completed"
    );
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use docex_vector::memory::InMemoryServer;

    use super::*;
    use crate::config::{Cli, Command};

    fn args(extra: &[&str]) -> ProvisionArgs {
        let argv = ["docex", "provision", "--backend", "memory"]
            .into_iter()
            .chain(extra.iter().copied());
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Provision(args) => args,
            Command::Connect(_) => panic!("expected provision"),
        }
    }

    #[tokio::test]
    async fn provisions_fresh_server() {
        let server = InMemoryServer::new();
        let manager = ConnectionManager::new(server.connector());

        let summary = run(&manager, &args(&[])).await.unwrap();
        assert_eq!(summary.collection, CollectionStatus::Created);
        assert_eq!(summary.report.collection, "support_docs_v1");
        assert_eq!(summary.report.row_count, 5);
        assert_eq!(server.rows("support_docs_v1").len(), 5);
    }

    #[tokio::test]
    async fn rerun_keeps_existing_rows() {
        let server = InMemoryServer::new();
        let manager = ConnectionManager::new(server.connector());
        run(&manager, &args(&[])).await.unwrap();

        let summary = run(&manager, &args(&["--sample-count", "3"])).await.unwrap();
        assert_eq!(summary.collection, CollectionStatus::Loaded);
        assert_eq!(summary.index, IndexStatus::AlreadyExists);
        assert_eq!(
            summary.sample_data,
            SampleDataStatus::AlreadyPopulated { rows: 5 }
        );
    }

    #[tokio::test]
    async fn drop_existing_rebuilds() {
        let server = InMemoryServer::new();
        let manager = ConnectionManager::new(server.connector());
        run(&manager, &args(&[])).await.unwrap();

        let summary = run(&manager, &args(&["--drop-existing", "--sample-count", "2"]))
            .await
            .unwrap();
        assert_eq!(summary.collection, CollectionStatus::Recreated);
        assert_eq!(summary.report.row_count, 2);
    }

    #[tokio::test]
    async fn invalid_collection_name_fails_before_connecting() {
        let err = provision(&args(&["--collection", "support-docs"]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("invalid configuration"));
    }

    #[tokio::test]
    async fn command_prints_json_report() {
        provision(&args(&["--json", "--dimension", "8"])).await.unwrap();
    }
}
