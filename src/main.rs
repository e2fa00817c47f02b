// src/main.rs
use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crabds::{config, server, Ds};

#[derive(Parser)]
#[command(name = "crabds")]
#[command(about = "Redis-compatible data types over sled", long_about = None)]
struct Args {
    /// Path to the JSON config file
    #[arg(short, long, default_value = config::DEFAULT_CONFIG_PATH)]
    config: String,

    /// Listen address, overrides the config file
    #[arg(short, long)]
    bind: Option<String>,

    /// Database directory, overrides the config file
    #[arg(long)]
    db_path: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let (mut cfg, created) = config::load(&args.config)?;
    if let Some(bind) = args.bind {
        cfg.bind = bind;
    }
    if let Some(db_path) = args.db_path {
        cfg.db_path = db_path;
    }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.log_level))
        .context("invalid log filter")?;
    tracing_subscriber::fmt().with_env_filter(filter).init();
    if created {
        info!("Default config created at {}", args.config);
    }

    let db = sled::open(&cfg.db_path)
        .with_context(|| format!("failed to open database at {}", cfg.db_path))?;
    info!("Opened database: {}", cfg.db_path);
    let ds = Arc::new(Ds::with_lock_stripes(db, cfg.lock_stripes));

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for ctrl-c: {}", e);
        }
    };
    server::run(&cfg.bind, Arc::clone(&ds), shutdown).await?;

    if cfg.flush_on_shutdown {
        ds.close().context("flush on shutdown failed")?;
        info!("database flushed");
    }
    Ok(())
}
