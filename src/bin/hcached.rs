//! hcached: hcache daemon.
//!
//! Serves a [`CacheService`](hcache::CacheService) over gRPC, so that
//! every client process on the host shares one response cache.

use std::time::Duration;

use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use tonic::transport::Server;
use tracing::info;

use hcache::server::CacheRpcService;
use hcache::server::config::Config;
use hcache::CacheService;

/// hcache daemon: shared HTTP response cache.
#[derive(Parser)]
#[command(name = "hcached")]
#[command(version = hcache::PKG_VERSION)]
#[command(about = "Shared HTTP response cache daemon")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// RPC listen address (overrides the config file).
    #[arg(short, long, env = "HCACHED_LISTEN")]
    listen: Option<String>,

    /// Prometheus metrics listen address; empty disables the exporter.
    #[arg(long, env = "HCACHED_METRICS_LISTEN")]
    metrics_listen: Option<String>,

    /// Evict entries not requested for this many seconds; 0 never evicts.
    #[arg(long, value_name = "SECS")]
    idle_timeout: Option<u64>,

    /// Upper bound for one upstream fetch in seconds.
    #[arg(long, value_name = "SECS")]
    fetch_timeout: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    // Load configuration, then apply command line overrides
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(listen) = args.listen {
        config.server.address = listen;
    }
    if let Some(metrics_listen) = args.metrics_listen {
        config.server.metrics_address = metrics_listen;
    }
    let mut cache_config = config.cache_config();
    if let Some(secs) = args.idle_timeout {
        cache_config = cache_config.idle_timeout(Duration::from_secs(secs));
    }
    if let Some(secs) = args.fetch_timeout {
        cache_config = cache_config.fetch_timeout(Duration::from_secs(secs));
    }

    let addr = config.listen_addr()?;
    let metrics_addr = config.metrics_addr()?;

    if let Some(metrics_addr) = metrics_addr {
        PrometheusBuilder::new()
            .with_http_listener(metrics_addr)
            .install()?;
        info!(%metrics_addr, "serving prometheus metrics");
    }

    info!(
        version = hcache::version_string(),
        %addr,
        idle_timeout_secs = cache_config.idle_timeout.as_secs(),
        fetch_timeout_secs = cache_config.fetch_timeout.as_secs(),
        "hcached starting"
    );

    let cache = CacheService::with_http(cache_config)?;
    let server = CacheRpcService::new(cache).into_server();

    Server::builder().add_service(server).serve(addr).await?;

    Ok(())
}
