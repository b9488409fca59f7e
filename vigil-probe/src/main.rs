/**
 * VIGIL PROBE - Point d'entrée principal de la sonde
 *
 * ROLE: wires config, logging, the four collector tasks, the optional
 * terminal display and the HTTP endpoint around one shared snapshot store.
 *
 * LIFECYCLE: start time is captured first so the warmup ramp is anchored at
 * process start. Ctrl-C / SIGTERM stops the HTTP server gracefully, then the
 * same broadcast signal stops every collector loop.
 */

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{info, warn};
use vigil_probe::config::{resolve_config_path, ProbeConfig};
use vigil_probe::http::{build_router, AppState};
use vigil_probe::{collectors, display, logging, SnapshotStore, Warmup};

#[derive(Debug, Parser)]
#[command(name = "vigil-probe", version, about = "System health probe")]
struct Cli {
    /// Path to YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Generate default configuration file and exit
    #[arg(long)]
    generate_config: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable terminal metrics display
    #[arg(long)]
    display: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let start = Instant::now();
    dotenvy::dotenv().ok(); // Ok si .env n'existe pas

    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config);

    if cli.generate_config {
        ProbeConfig::write_default(&config_path).await?;
        println!("Generated default configuration file: {}", config_path.display());
        return Ok(());
    }

    let mut cfg = ProbeConfig::load(&config_path).await?;
    if cli.debug {
        cfg.logging.debug = true;
    }
    if cli.display {
        cfg.display.enabled = true;
    }
    cfg.validate()
        .with_context(|| format!("invalid configuration in {}", config_path.display()))?;

    logging::init_logging(&cfg.logging)?;
    if config_path.exists() {
        info!("loaded configuration from {}", config_path.display());
    } else {
        warn!("config file {} not found, using defaults", config_path.display());
    }
    log_startup(&cfg);

    // état partagé collecteurs <-> HTTP <-> affichage
    let store = SnapshotStore::new();
    let warmup = Warmup::new(cfg.warmup.enabled, cfg.warmup.duration, start);
    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let mut tasks = collectors::spawn_all(&cfg, store.clone(), warmup, &shutdown_tx);
    if cfg.display.enabled {
        info!("starting metrics display (interval: {:?})", cfg.display.interval);
        tasks.push(display::spawn_display(
            store.clone(),
            cfg.display.interval,
            shutdown_tx.subscribe(),
        ));
    }

    let app = build_router(AppState { store });
    let addr = cfg.listen_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("probe listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("shutting down collectors");
    let _ = shutdown_tx.send(());
    for task in tasks {
        if let Err(e) = task.await {
            warn!("task ended abnormally: {e}");
        }
    }
    info!("probe stopped");
    Ok(())
}

fn log_startup(cfg: &ProbeConfig) {
    let t = &cfg.thresholds;
    info!(
        "starting probe: warmup={}, duration={:?}",
        cfg.warmup.enabled, cfg.warmup.duration
    );
    info!(
        "CPU thresholds: usage={:.1}%, iowait={:.1}%, irq={:.1}%, softirq={:.1}%",
        t.max_cpu, t.max_iowait, t.max_irq, t.max_softirq
    );
    info!(
        "other thresholds: memory={:.1}%, disk={:.1}%, connections={:.0}",
        t.max_memory, t.max_disk, t.max_connections
    );
    info!("monitoring disk paths: {:?}", cfg.monitoring.disk_paths);
    info!("monitoring network interfaces: {:?}", cfg.monitoring.network_interfaces);
    info!("reading kernel counters from {}", cfg.monitoring.proc_root.display());
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
