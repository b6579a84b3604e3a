//! mfs - filesystem commands against an IPFS node's MFS

mod commands;
mod settings;

use anyhow::Context;
use clap::Parser;
use commands::Command;
use mfs_adapter::StorageAdapter;
use mfs_node::{HttpNodeClient, HttpNodeConfig, MemoryNode, NodeClient};
use settings::Settings;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "mfs")]
#[command(about = "Filesystem access to IPFS MFS with gateway URLs and IPNS publishing")]
#[command(version)]
struct Args {
    /// Configuration file (TOML); defaults to ./mfs.toml when present
    #[arg(short, long, env = "MFS_CONFIG")]
    config: Option<PathBuf>,

    /// Kubo RPC API URL
    #[arg(long, env = "IPFS_API_URL")]
    api_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = "MFS_TIMEOUT")]
    timeout: Option<u64>,

    /// Root directory inside MFS
    #[arg(long, env = "MFS_PREFIX")]
    prefix: Option<String>,

    /// Use an in-memory node (nothing persists past this command)
    #[arg(long, env = "MFS_MEMORY_NODE")]
    memory: bool,

    /// Enable debug logging
    #[arg(short, long, env = "MFS_DEBUG")]
    debug: bool,

    /// Log as JSON
    #[arg(long, env = "MFS_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    fn apply(&self, settings: &mut Settings) {
        if let Some(api_url) = &self.api_url {
            settings.api_url = api_url.clone();
        }
        if let Some(timeout) = self.timeout {
            settings.timeout_secs = timeout;
        }
        if let Some(prefix) = &self.prefix {
            settings.prefix = prefix.clone();
        }
    }
}

fn init_tracing(debug: bool, json: bool) {
    let log_level = if debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("mfs_adapter={},mfs_node={}", log_level, log_level).into()
    });

    // Logs go to stderr so `read` output stays clean
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(args.debug, args.log_json);

    let mut settings =
        Settings::load(args.config.as_deref()).context("failed to load configuration")?;
    args.apply(&mut settings);

    let node: Arc<dyn NodeClient> = if args.memory {
        tracing::warn!("Using in-memory node - data will NOT persist");
        Arc::new(MemoryNode::new())
    } else {
        tracing::debug!(api_url = %settings.api_url, "Using Kubo RPC node");
        Arc::new(HttpNodeClient::new(
            HttpNodeConfig::with_url(&settings.api_url).with_timeout(settings.timeout()),
        )?)
    };

    let adapter = StorageAdapter::new(node, &settings.prefix, settings.adapter.clone())
        .context("invalid adapter configuration")?;

    commands::run(&adapter, args.command).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_flags_override_settings() {
        let args = Args::parse_from([
            "mfs",
            "--api-url",
            "http://node:5001",
            "--prefix",
            "tenant",
            "ls",
            "--deep",
        ]);
        let mut settings = Settings::default();

        args.apply(&mut settings);

        assert_eq!(settings.api_url, "http://node:5001");
        assert_eq!(settings.prefix, "tenant");
        assert_eq!(settings.timeout_secs, 30);
        assert!(matches!(args.command, Command::Ls { deep: true, .. }));
    }
}
