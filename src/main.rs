use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use live_location::server::config::{DEFAULT_OUTBOUND_BUFFER, DEFAULT_SINK_CHANNEL};
use live_location::{LocationServer, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "live-location", version, about = "Live driver location relay")]
struct Args {
    /// Address to listen on
    #[arg(long, env = "LIVE_LOCATION_ADDR", default_value = "0.0.0.0:9000")]
    addr: SocketAddr,

    /// Redis URL for external publishing (disabled when unset)
    #[arg(long, env = "REDIS_URL")]
    redis_url: Option<String>,

    /// Channel updates are published on
    #[arg(long, env = "LIVE_LOCATION_CHANNEL", default_value = DEFAULT_SINK_CHANNEL)]
    channel: String,

    /// Pending updates before new ones are dropped
    #[arg(long, default_value_t = 1024)]
    queue_capacity: usize,

    /// Per-connection write deadline in milliseconds
    #[arg(long, default_value_t = 3000)]
    write_timeout_ms: u64,

    /// Maximum concurrent WebSocket connections (0 = unlimited)
    #[arg(long, default_value_t = 0)]
    max_connections: usize,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("live_location=info")),
        )
        .init();

    let args = Args::parse();

    let config = ServerConfig::with_addr(args.addr)
        .max_connections(args.max_connections)
        .queue_capacity(args.queue_capacity)
        .write_timeout(Duration::from_millis(args.write_timeout_ms))
        .outbound_buffer(DEFAULT_OUTBOUND_BUFFER)
        .sink_channel(args.channel.clone());

    tracing::info!(
        addr = %config.bind_addr,
        queue_capacity = config.queue_capacity,
        write_timeout_ms = args.write_timeout_ms,
        max_connections = config.max_connections,
        "Starting location relay"
    );

    let server = LocationServer::new(config.clone(), external_sink(&args, &config));
    server.run_until(shutdown_signal()).await?;

    Ok(())
}

#[cfg(feature = "redis-sink")]
fn external_sink(args: &Args, config: &ServerConfig) -> Option<live_location::relay::RedisSink> {
    let url = args.redis_url.as_deref()?;

    match live_location::relay::RedisSink::open(url, config.sink_channel.as_str()) {
        Ok(sink) => {
            tracing::info!(channel = %sink.channel(), "Publishing updates to Redis");
            Some(sink)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Redis unavailable, external publishing disabled");
            None
        }
    }
}

#[cfg(not(feature = "redis-sink"))]
fn external_sink(args: &Args, _config: &ServerConfig) -> live_location::NoopSink {
    if args.redis_url.is_some() {
        tracing::warn!("Built without redis-sink, external publishing disabled");
    }
    live_location::NoopSink
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
