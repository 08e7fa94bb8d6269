//! Treegate gateway binary.

use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;
use treegate_authz::{AccessEngine, CacheConfig, CacheStore, MethodTable, PathResolver};
use treegate_client::{HttpAuthority, SvnlookChangedPaths};
use treegate_node::config::Config;
use treegate_node::gateway::{router, Gateway};

#[derive(Parser, Debug)]
#[command(name = "treegate-node", about = "Path-based authorization gateway")]
struct Args {
    /// Path to the YAML configuration file.
    #[arg(short, long, default_value = "treegate.yaml")]
    config: PathBuf,

    /// Override the configured listen address.
    #[arg(long)]
    listen_addr: Option<SocketAddr>,

    /// Override the configured log level.
    #[arg(long)]
    log_level: Option<String>,
}

fn init_tracing(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("treegate={level},tower_http={level}")));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = if args.config.exists() {
        Config::load(&args.config)
            .with_context(|| format!("loading {}", args.config.display()))?
    } else {
        Config::default()
    };
    if let Some(listen_addr) = args.listen_addr {
        config.listen_addr = listen_addr;
    }
    if let Some(log_level) = args.log_level {
        config.log_level = log_level;
    }

    init_tracing(&config.log_level, config.log_json);

    let cache = Arc::new(CacheStore::new(CacheConfig {
        capacity: config.cache_capacity,
        ttl: config.cache_ttl(),
    }));
    let authority = HttpAuthority::new(&config.authority_url, config.authority_timeout())
        .context("building authority client")?;
    let engine = AccessEngine::new(cache, authority);
    let changed_paths = SvnlookChangedPaths::new(&config.repository_root);

    let gateway = Gateway::new(
        engine,
        changed_paths,
        PathResolver::new(&config.root_uri),
        MethodTable::default(),
        &config.system_id,
        &config.principal_header,
    );
    let app = router(Arc::new(gateway));

    info!(
        listen = %config.listen_addr,
        authority = %config.authority_url,
        system = %config.system_id,
        root = %config.root_uri,
        cache_ttl = ?Duration::from_secs(config.cache_ttl_secs),
        "starting treegate gateway"
    );

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    axum::serve(listener, app).await?;
    Ok(())
}
