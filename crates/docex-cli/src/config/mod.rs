//! CLI configuration management.
//!
//! ```text
//! Cli
//! ├── connect
//! │   └── connection: ConnectionArgs   # Backend kind, Milvus host/port/alias/token
//! └── provision
//!     ├── connection: ConnectionArgs
//!     ├── provision: ProvisionConfig   # Collection, dimension, metric, samples
//!     └── --json
//! ```
//!
//! All configuration can be provided via CLI arguments or environment variables.
//! Use `--help` to see all available options.

use std::process;

use clap::{Args, Parser, Subcommand, ValueEnum};
use docex_vector::memory::InMemoryServer;
use docex_vector::{ConnectionManager, MilvusConfig, ProvisionConfig};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_STARTUP};

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "docex")]
#[command(about = "Connect to Milvus and provision the support-docs collection")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Connect, verify the server and list its collections.
    Connect(ConnectArgs),
    /// Connect, then ensure the collection, its index and sample rows.
    Provision(ProvisionArgs),
}

/// Which server implementation to talk to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Milvus over its RESTful API.
    #[default]
    Milvus,
    /// In-process server, for dry runs.
    Memory,
}

/// Options shared by every subcommand.
#[derive(Debug, Clone, Args, Serialize, Deserialize)]
pub struct ConnectionArgs {
    /// Server implementation.
    #[arg(long, env = "DOCEX_BACKEND", value_enum, default_value_t = BackendKind::Milvus)]
    pub backend: BackendKind,

    #[clap(flatten)]
    pub milvus: MilvusConfig,
}

impl ConnectionArgs {
    /// Connection manager for the selected backend.
    pub fn manager(&self) -> ConnectionManager {
        match self.backend {
            BackendKind::Milvus => ConnectionManager::milvus(),
            BackendKind::Memory => ConnectionManager::new(InMemoryServer::new().connector()),
        }
    }

    /// Logs the connection settings (no secrets).
    pub fn log(&self) {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            backend = ?self.backend,
            host = %self.milvus.host,
            port = self.milvus.port,
            metrics_port = self.milvus.metrics_port,
            alias = %self.milvus.alias,
            database = ?self.milvus.database,
            authenticated = self.milvus.token.is_some(),
            timeout_secs = self.milvus.timeout_secs,
            "Connection configuration"
        );
    }
}

/// Arguments of `docex connect`.
#[derive(Debug, Clone, Args, Serialize, Deserialize)]
pub struct ConnectArgs {
    #[clap(flatten)]
    pub connection: ConnectionArgs,
}

/// Arguments of `docex provision`.
#[derive(Debug, Clone, Args, Serialize, Deserialize)]
pub struct ProvisionArgs {
    #[clap(flatten)]
    pub connection: ConnectionArgs,

    #[clap(flatten)]
    pub provision: ProvisionConfig,

    /// Print the final report as JSON instead of text.
    #[arg(long)]
    pub json: bool,
}

impl ProvisionArgs {
    /// Logs the provisioning settings.
    pub fn log(&self) {
        self.connection.log();
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            collection = %self.provision.collection,
            dimension = self.provision.dimension,
            metric = %self.provision.metric,
            sample_count = self.provision.sample_count,
            drop_existing = self.provision.drop_existing,
            "Provisioning configuration"
        );
    }
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    /// Loads environment variables from .env file if the dotenv feature is enabled.
    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    /// No-op when dotenv feature is disabled.
    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Initializes tracing with environment-based filtering.
    ///
    /// Logs go to stderr so stdout only carries the report.
    pub fn init_tracing() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }

    /// Logs build information at debug level.
    pub fn log_build_info() {
        tracing::debug!(
            target: TRACING_TARGET_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "Build information"
        );
    }

    /// Returns a list of enabled compile-time features.
    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use docex_vector::MetricType;

    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn provision_runs_with_no_flags() {
        let cli = Cli::try_parse_from(["docex", "provision"]).unwrap();
        let Command::Provision(args) = cli.command else {
            panic!("expected provision");
        };

        assert_eq!(args.connection.backend, BackendKind::Milvus);
        assert_eq!(args.connection.milvus.host, "localhost");
        assert_eq!(args.connection.milvus.port, 19530);
        assert_eq!(args.connection.milvus.metrics_port, 9091);
        assert_eq!(args.connection.milvus.alias, "default");
        assert_eq!(args.provision.collection, "support_docs_v1");
        assert_eq!(args.provision.dimension, 768);
        assert_eq!(args.provision.metric, MetricType::L2);
        assert_eq!(args.provision.sample_count, 5);
        assert!(!args.provision.drop_existing);
        assert!(!args.json);
    }

    #[test]
    fn provision_accepts_overrides() {
        let cli = Cli::try_parse_from([
            "docex",
            "provision",
            "--backend",
            "memory",
            "--milvus-host",
            "milvus.internal",
            "--milvus-port",
            "19531",
            "--milvus-metrics-port",
            "19091",
            "--collection",
            "kb_chunks",
            "--dimension",
            "384",
            "--metric",
            "ip",
            "--sample-count",
            "10",
            "--drop-existing",
            "--json",
        ])
        .unwrap();
        let Command::Provision(args) = cli.command else {
            panic!("expected provision");
        };

        assert_eq!(args.connection.backend, BackendKind::Memory);
        assert_eq!(args.connection.milvus.host, "milvus.internal");
        assert_eq!(args.connection.milvus.port, 19531);
        assert_eq!(args.connection.milvus.metrics_port, 19091);
        assert_eq!(args.provision.collection, "kb_chunks");
        assert_eq!(args.provision.dimension, 384);
        assert_eq!(args.provision.metric, MetricType::IP);
        assert_eq!(args.provision.sample_count, 10);
        assert!(args.provision.drop_existing);
        assert!(args.json);
    }

    #[test]
    fn connect_takes_connection_options_only() {
        let cli =
            Cli::try_parse_from(["docex", "connect", "--milvus-alias", "staging"]).unwrap();
        let Command::Connect(args) = cli.command else {
            panic!("expected connect");
        };
        assert_eq!(args.connection.milvus.alias, "staging");

        assert!(Cli::try_parse_from(["docex", "connect", "--collection", "x"]).is_err());
    }

    #[test]
    fn rejects_unknown_metric() {
        assert!(Cli::try_parse_from(["docex", "provision", "--metric", "cosine"]).is_err());
    }
}
