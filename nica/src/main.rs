#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use clap::Parser;
use nica_core::boundary::{LoopbackSocket, RawSocket};
use nica_core::telemetry::{init_metrics, init_tracing_with_otel, start_observability_server, Metrics, RuntimeStatus};
use nica_core::{load_from_path, Nica, PipelineDirection as Direction};
use tokio::signal;
use tracing::{error, info};

/// Flags `spec.md` §6 assigns to the offload's (out-of-scope) server
/// front-end, reused here to configure the boundary this binary drives
/// `nica_core::Nica` against; `nica-core` itself never sees them.
#[derive(Parser, Debug)]
#[command(author, version, about = "NICA smart-NIC UDP offload dataplane runtime")]
struct Cli {
    /// Path to the pipeline configuration TOML file.
    #[arg(short = 'f', long = "config", value_name = "FILE", default_value = "config/basic.toml")]
    config: PathBuf,

    /// Kernel-bypass listen port (boundary-only; not interpreted by the core).
    #[arg(short = 'p', long = "port", default_value_t = 9999)]
    port: u16,

    /// Worker thread count for the boundary's socket I/O.
    #[arg(short = 't', long = "threads", default_value_t = 1)]
    threads: u32,

    /// How long to run before exiting, in seconds. 0 means run until a
    /// shutdown signal arrives.
    #[arg(short = 's', long = "seconds", default_value_t = 0)]
    seconds: u64,

    /// Default threshold-ikernel value applied if the config omits one.
    #[arg(short = 'v', long = "threshold", default_value_t = 0)]
    threshold: u32,

    /// Kernel-bypass interface name.
    #[arg(short = 'I', long = "interface", default_value = "eth0")]
    interface: String,

    /// Route ikernel output through the custom-ring builder.
    #[arg(short = 'c', long = "use_custom_ring", default_value_t = false)]
    use_custom_ring: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = init_tracing_with_otel("info".to_string(), false, "warn".to_string()) {
        eprintln!("failed to initialize tracing: {err}");
        std::process::exit(1);
    }

    info!(interface = %cli.interface, threads = cli.threads, port = cli.port, "nica starting up");

    let config = match load_from_path(&cli.config) {
        Ok(cfg) => cfg,
        Err(err) => {
            error!(%err, path = ?cli.config, "failed to load configuration");
            std::process::exit(1);
        }
    };

    let mut nica = match Nica::new(&config) {
        Ok(n) => n,
        Err(err) => {
            error!(%err, "failed to build pipeline from configuration");
            std::process::exit(1);
        }
    };

    if cli.use_custom_ring && config.custom_rings.is_empty() {
        info!("--use_custom_ring set but no custom rings are configured; ring-tagged output will be dropped");
    }

    let status = Arc::new(ArcSwap::from_pointee(RuntimeStatus {
        host_to_net_enabled: nica.pipeline_enabled(Direction::HostToNet),
        net_to_host_enabled: nica.pipeline_enabled(Direction::NetToHost),
        ikernel_count: nica.ikernel_count(),
    }));

    let mut telemetry = None;
    if let Some(port) = config.telemetry.metrics_port {
        match init_metrics() {
            Ok((metrics, registry)) => {
                let status = status.clone();
                tokio::spawn(async move {
                    if let Err(err) = start_observability_server(port, registry, status).await {
                        error!(%err, "observability server exited with error");
                    }
                });
                telemetry = Some(metrics);
            }
            Err(err) => {
                error!(%err, "failed to initialize metrics; continuing without telemetry");
            }
        }
    }

    let host_socket = LoopbackSocket::new();
    let net_socket = LoopbackSocket::new();

    if let Err(err) = run_dataplane(&mut nica, host_socket, net_socket, cli.seconds, &status, telemetry).await {
        error!(%err, "dataplane loop exited with error");
        std::process::exit(1);
    }

    info!(
        host_to_net = ?nica.counters(Direction::HostToNet),
        net_to_host = ?nica.counters(Direction::NetToHost),
        "nica shutting down"
    );
}

/// Drives both pipeline directions against their boundary sockets one
/// tick at a time (`spec.md` §4.12 "a single step() advances the whole
/// design by one tick"), until either `seconds` elapses (0 = run until a
/// shutdown signal) or SIGTERM/SIGINT arrives.
async fn run_dataplane(
    nica: &mut Nica,
    mut host_socket: LoopbackSocket,
    mut net_socket: LoopbackSocket,
    seconds: u64,
    status: &Arc<ArcSwap<RuntimeStatus>>,
    metrics: Option<Arc<Metrics>>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;
    let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())?;
    let mut ticker = tokio::time::interval(Duration::from_millis(10));
    let deadline = if seconds > 0 { Some(tokio::time::Instant::now() + Duration::from_secs(seconds)) } else { None };

    loop {
        if let Some(deadline) = deadline {
            if tokio::time::Instant::now() >= deadline {
                info!("run duration elapsed, shutting down");
                break;
            }
        }

        tokio::select! {
            _ = sigterm.recv() => {
                info!("received SIGTERM, shutting down");
                break;
            }
            _ = sigint.recv() => {
                info!("received SIGINT, shutting down");
                break;
            }
            _ = ticker.tick() => {
                step(nica, &mut host_socket, &mut net_socket).await;

                status.store(Arc::new(RuntimeStatus {
                    host_to_net_enabled: nica.pipeline_enabled(Direction::HostToNet),
                    net_to_host_enabled: nica.pipeline_enabled(Direction::NetToHost),
                    ikernel_count: nica.ikernel_count(),
                }));

                if let Some(metrics) = &metrics {
                    metrics.sample(nica);
                }
            }
        }
    }

    Ok(())
}

/// One tick: drain whatever frames are queued on each boundary into the
/// matching pipeline direction, then push each direction's output back
/// out its own boundary socket.
async fn step(nica: &mut Nica, host_socket: &mut LoopbackSocket, net_socket: &mut LoopbackSocket) {
    while let Ok(frame) = host_socket.recv().await {
        nica.ingest(Direction::HostToNet, &frame);
    }
    while let Ok(frame) = net_socket.recv().await {
        nica.ingest(Direction::NetToHost, &frame);
    }

    for frame in nica.drain(Direction::HostToNet) {
        if let Err(err) = net_socket.send(&frame).await {
            error!(%err, "failed to send host-to-net frame");
        }
    }
    for frame in nica.drain(Direction::NetToHost) {
        if let Err(err) = host_socket.send(&frame).await {
            error!(%err, "failed to send net-to-host frame");
        }
    }
}
