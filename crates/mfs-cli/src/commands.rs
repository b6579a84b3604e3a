//! Subcommands and their execution

use anyhow::{bail, Context};
use bytes::Bytes;
use clap::{Args, Subcommand};
use futures::StreamExt;
use mfs_adapter::{ConfigOverride, StorageAdapter};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Upload a file into MFS
    Write {
        path: String,
        /// Read contents from this file
        #[arg(long, conflicts_with = "data")]
        file: Option<PathBuf>,
        /// Use this string as contents
        #[arg(long)]
        data: Option<String>,
        #[command(flatten)]
        upload: UploadArgs,
    },
    /// Print a file to stdout
    Read { path: String },
    /// List a directory
    Ls {
        #[arg(default_value = "")]
        path: String,
        /// Recurse into subdirectories
        #[arg(long)]
        deep: bool,
    },
    /// Show size and hash of an entry
    Stat { path: String },
    /// Remove a file or directory
    Rm { path: String },
    /// Create a directory and its parents
    Mkdir { path: String },
    /// Move an entry
    Mv { source: String, destination: String },
    /// Copy an entry
    Cp {
        source: String,
        destination: String,
        /// Fail instead of replacing an existing destination
        #[arg(long)]
        no_override: bool,
    },
    /// Print the ipfs:// URL of a directory or a file in it
    Url { dir: String, file: Option<String> },
    /// Resolve a gateway URL
    GatewayUrl {
        dir: String,
        file: Option<String>,
        #[command(flatten)]
        gateway: GatewayArgs,
        /// Publish on demand when an IPNS name is needed
        #[arg(long)]
        publish: bool,
    },
    /// Publish and resolve an IPNS gateway URL
    TempUrl {
        dir: String,
        file: Option<String>,
        #[command(flatten)]
        gateway: GatewayArgs,
        /// Record lifetime, e.g. 1h
        #[arg(long)]
        lifetime: Option<String>,
    },
}

/// Pipeline switches for writes
#[derive(Args, Debug, Default)]
pub struct UploadArgs {
    /// Do not pin the content
    #[arg(long)]
    no_pin: bool,
    /// Pin through this remote pinning service instead of locally
    #[arg(long, value_name = "SERVICE")]
    remote_pin: Option<String>,
    /// Only add the content, do not link it into MFS
    #[arg(long)]
    no_copy: bool,
    /// Keep an existing entry at the destination
    #[arg(long)]
    no_override: bool,
    /// Publish the content to IPNS
    #[arg(long)]
    publish: bool,
    /// Keystore entry to publish with
    #[arg(long)]
    key: Option<String>,
}

impl UploadArgs {
    fn overrides(&self) -> ConfigOverride {
        let mut overrides = ConfigOverride::new();
        if self.no_pin {
            overrides = overrides.auto_pin(false);
        }
        if let Some(service) = &self.remote_pin {
            overrides = overrides.remote_pin(service);
        }
        if self.no_copy {
            overrides = overrides.auto_copy(false);
        }
        if self.no_override {
            overrides = overrides.auto_override(false);
        }
        if self.publish {
            overrides = overrides.auto_publish(true);
        }
        if let Some(key) = &self.key {
            overrides = overrides.key(key);
        }
        overrides
    }
}

/// Gateway selection for URL commands
#[derive(Args, Debug, Default)]
pub struct GatewayArgs {
    /// ipfs or ipns
    #[arg(long)]
    service: Option<String>,
    /// path, subdomain or dnslink
    #[arg(long)]
    style: Option<String>,
    /// Gateway host
    #[arg(long)]
    gateway: Option<String>,
    /// DNSLink domain
    #[arg(long)]
    domain: Option<String>,
    /// Use the DNSLink domain as host
    #[arg(long)]
    prefer_domain: Option<bool>,
    /// IPNS name to resolve instead of publishing
    #[arg(long)]
    ipns: Option<String>,
    /// Keystore entry to publish with
    #[arg(long)]
    key: Option<String>,
}

impl GatewayArgs {
    fn overrides(&self) -> ConfigOverride {
        let mut overrides = ConfigOverride::new();
        if let Some(service) = &self.service {
            overrides = overrides.gateway_service(service);
        }
        if let Some(style) = &self.style {
            overrides = overrides.gateway_style(style);
        }
        if let Some(host) = &self.gateway {
            overrides = overrides.gateway_url(host);
        }
        if let Some(domain) = &self.domain {
            overrides = overrides.gateway_domain(domain);
        }
        if let Some(prefer) = self.prefer_domain {
            overrides = overrides.prefer_domain(prefer);
        }
        if let Some(name) = &self.ipns {
            overrides = overrides.ipns(name);
        }
        if let Some(key) = &self.key {
            overrides = overrides.key(key);
        }
        overrides
    }
}

pub async fn run(adapter: &StorageAdapter, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Write {
            path,
            file,
            data,
            upload,
        } => {
            let contents = match (file, data) {
                (Some(file), _) => Bytes::from(
                    std::fs::read(&file)
                        .with_context(|| format!("failed to read {}", file.display()))?,
                ),
                (None, Some(data)) => Bytes::from(data),
                (None, None) => bail!("either --file or --data is required"),
            };
            let attributes = adapter.write(&path, contents, &upload.overrides()).await?;
            print_json(&attributes)
        }
        Command::Read { path } => {
            let mut stream = adapter.read_stream(&path).await?;
            let mut stdout = std::io::stdout().lock();
            while let Some(chunk) = stream.next().await {
                stdout.write_all(&chunk?)?;
            }
            stdout.flush()?;
            Ok(())
        }
        Command::Ls { path, deep } => {
            for entry in adapter.list_contents(&path, deep).await? {
                print_json(&entry)?;
            }
            Ok(())
        }
        Command::Stat { path } => {
            if adapter.directory_exists(&path).await? {
                print_json(&adapter.last_modified(&path).await?)
            } else {
                print_json(&adapter.file_size(&path).await?)
            }
        }
        Command::Rm { path } => Ok(adapter.delete(&path).await?),
        Command::Mkdir { path } => Ok(adapter.create_directory(&path).await?),
        Command::Mv {
            source,
            destination,
        } => Ok(adapter.move_to(&source, &destination).await?),
        Command::Cp {
            source,
            destination,
            no_override,
        } => {
            let overrides = ConfigOverride::new().auto_override(!no_override);
            Ok(adapter.copy(&source, &destination, &overrides).await?)
        }
        Command::Url { dir, file } => {
            println!("{}", adapter.get_url(&dir, file.as_deref()).await?);
            Ok(())
        }
        Command::GatewayUrl {
            dir,
            file,
            gateway,
            publish,
        } => {
            let mut overrides = gateway.overrides();
            if publish {
                overrides = overrides.auto_publish(true);
            }
            let url = adapter
                .get_gateway_url(&dir, file.as_deref(), &overrides)
                .await?;
            println!("{}", url);
            Ok(())
        }
        Command::TempUrl {
            dir,
            file,
            gateway,
            lifetime,
        } => {
            let mut overrides = gateway.overrides();
            if let Some(lifetime) = lifetime {
                overrides = overrides.lifetime(lifetime);
            }
            let url = adapter
                .get_temporary_url(&dir, file.as_deref(), &overrides)
                .await?;
            println!("{}", url);
            Ok(())
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}
