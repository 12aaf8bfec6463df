//! Weir - UDP telemetry ingress gateway
//!
//! Accepts datagrams from semi-trusted agents, runs each through a
//! defense-in-depth pipeline (size cap, per-source admission, envelope
//! framing, bounded parsing, semantic validation, fair bounded
//! forwarding), and writes canonical events downstream. Designed to stay
//! alive and bounded in memory and CPU under arbitrary hostile input.
//!
//! # Usage
//!
//! ```bash
//! # Listen on the default port, canonical events to stdout
//! weir
//!
//! # Custom port and config, simulate a slow downstream
//! weir --port 5000 --config weir.toml --slow
//! ```

mod drops;
mod pipeline;
mod recv;
mod transport;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use weir_config::Config;
use weir_forward::{Sink, SlowSink, StdoutSink};

use crate::pipeline::Pipeline;
use crate::transport::UdpTransport;

/// Weir - UDP telemetry ingress gateway
#[derive(Parser, Debug)]
#[command(name = "weir")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// UDP listen port (overrides the config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Delay every sink write, to exercise queue-fill behavior
    #[arg(long)]
    slow: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let mut config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    // Bind failure is the one fatal startup error.
    let bind_address = config.server.bind_address();
    let transport = UdpTransport::bind(&bind_address, config.recv.recv_buffer_bytes)
        .with_context(|| format!("failed to bind UDP socket on {bind_address}"))?;

    tracing::info!(
        address = %bind_address,
        slow_sink = cli.slow,
        "weir gateway starting"
    );

    let sink: Box<dyn Sink> = if cli.slow {
        Box::new(SlowSink::new(
            Box::new(StdoutSink::new()),
            config.server.slow_sink_delay,
        ))
    } else {
        Box::new(StdoutSink::new())
    };

    let pipeline = Pipeline::new(&config, transport, sink);

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            shutdown_signal().await;
            tracing::info!("shutdown signal received");
            cancel.cancel();
        }
    });

    let report = pipeline.run(cancel).await;

    tracing::info!(
        received = report.received,
        forwarded = report.forwarded,
        "weir gateway stopped"
    );
    Ok(())
}

/// Initialize the tracing subscriber. Events go to stderr so canonical
/// payloads own stdout.
fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .with(filter)
        .init();

    Ok(())
}

/// Resolve when the process is asked to stop (Ctrl-C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::warn!(%error, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(error) => {
                tracing::warn!(%error, "failed to install SIGTERM handler");
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
