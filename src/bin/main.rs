//! slaac-dns binary entry point.

use clap::Parser;
use slaac_dns::{parse_config, telemetry, Config, DnsServer, TelemetryConfig};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Authoritative DNS server synthesizing IPv6 PTR/AAAA answers from
/// hostname templates.
#[derive(Parser, Debug)]
#[command(name = "slaac-dns")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file.
    #[arg(long, default_value = "/etc/slaac-dns.conf")]
    configfile: PathBuf,

    /// Additional listen address (repeatable, augments the file).
    #[arg(long)]
    listen: Vec<IpAddr>,

    /// UDP port to serve on.
    #[arg(long, default_value_t = 53)]
    port: u16,

    /// Log one line per query.
    #[arg(long)]
    querylog: bool,

    /// Log level filter (e.g. "info", "slaac_dns=debug,warn").
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Prometheus metrics exporter address (needs the `prometheus` feature).
    #[arg(long)]
    prometheus_addr: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Load configuration
    let text = std::fs::read_to_string(&args.configfile)
        .map_err(|e| format!("cannot read {}: {e}", args.configfile.display()))?;
    let mut config: Config = parse_config(&text)?;
    config.listen_addresses.extend(args.listen);
    config.port = args.port;
    config.query_log = args.querylog;

    // Initialize telemetry
    let telemetry_config = TelemetryConfig {
        log_level: args.log_level,
        prometheus_addr: args.prometheus_addr,
    };
    telemetry::init(&telemetry_config).map_err(|e| e as Box<dyn std::error::Error>)?;

    info!(
        config_file = %args.configfile.display(),
        networks = config.networks.len(),
        port = config.port,
        "Starting slaac-dns"
    );

    // Setup graceful shutdown
    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutdown signal received");
                shutdown.cancel();
            }
        });
    }

    // Bind and run; a bind failure exits nonzero before serving anything.
    let server = DnsServer::bind(&config).await?;
    let result = server.run(shutdown).await;

    if let Err(e) = result {
        error!("DNS server error: {}", e);
        return Err(e.into());
    }

    info!("slaac-dns shutdown complete");
    Ok(())
}
