use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};

use nntp_serverd::config::StorageProvider;
use nntp_serverd::{create_default_config, load_config, MemoryStorage, NntpServer, Storage};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Port to listen on (overrides the config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Address to bind (overrides the config file)
    #[arg(long)]
    host: Option<String>,

    /// Log file path (stdout output is always on)
    #[arg(long, default_value = "nntp-serverd.log")]
    log_file: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    nntp_serverd::logging::init_logging(&args.log_file);

    let mut config = if std::path::Path::new(&args.config).exists() {
        match load_config(&args.config) {
            Ok(config) => config,
            Err(e) => {
                error!(
                    "Failed to load existing config file '{}': {}",
                    args.config, e
                );
                error!("Please check your config file syntax and try again");
                return Err(e);
            }
        }
    } else {
        warn!(
            "Config file '{}' not found, creating default config",
            args.config
        );
        let default_config = create_default_config();
        let config_toml = toml::to_string_pretty(&default_config)?;
        std::fs::write(&args.config, &config_toml)?;
        info!("Created default config file: {}", args.config);
        default_config
    };

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host {
        config.server.host = host;
    }

    info!("Serving {} newsgroups:", config.groups.len());
    for group in &config.groups {
        info!("  - {} (id {})", group.name, group.id);
    }
    for sub in &config.subscriptions {
        info!("Feeding {} to {}:{}", sub.group, sub.host, sub.port);
    }

    let storage: Arc<dyn Storage> = match config.storage {
        StorageProvider::Memory => MemoryStorage::new(),
    };

    let server = NntpServer::bind(config, storage).await?;
    info!("NNTP server listening on {}", server.local_addr()?);

    tokio::select! {
        result = server.run() => {
            if let Err(e) = result {
                error!("Server error: {}", e);
                return Err(e);
            }
        }
        _ = signal::ctrl_c() => {
            info!("Received shutdown signal, exiting");
        }
    }

    Ok(())
}
