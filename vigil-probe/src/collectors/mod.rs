//! Collector tasks
//!
//! One independent loop per resource family. On every tick a collector reads
//! its kernel source, turns counters into percentages or rates, scales its
//! maxima by the shared warmup factor and publishes into the snapshot store.
//! Collectors never talk to each other; the store is the only meeting point.

pub mod cpu;
pub mod disk;
pub mod memory;
pub mod network;

pub use cpu::{CpuCollector, CpuPercentages, CpuTracker};
pub use disk::{disk_key, sanitize_path, DiskCollector};
pub use memory::MemoryCollector;
pub use network::{bandwidth_key, BandwidthTracker, NetworkCollector};

use crate::config::ProbeConfig;
use crate::procfs::ProcFs;
use crate::state::SnapshotStore;
use crate::warmup::Warmup;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

/// A unit of sampling work run on a fixed period.
pub trait Collector: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    /// Reads, evaluates and publishes once. Never fails: read errors are
    /// logged and published as zero readings.
    fn tick(&self);
}

/// Runs `collector` every `period` until `shutdown` fires.
///
/// The first tick happens immediately so cold-start baselines are captured
/// as early as possible.
pub fn spawn_collector<C: Collector>(
    collector: Arc<C>,
    period: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(collector = collector.name(), ?period, "collector started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    collector.tick();
                    debug!(collector = collector.name(), "tick done");
                }
                _ = shutdown.recv() => {
                    info!(collector = collector.name(), "collector stopping");
                    break;
                }
            }
        }
    })
}

/// Builds the four collectors from the configuration and spawns them.
pub fn spawn_all(
    cfg: &ProbeConfig,
    store: SnapshotStore,
    warmup: Warmup,
    shutdown: &broadcast::Sender<()>,
) -> Vec<JoinHandle<()>> {
    let procfs = ProcFs::new(&cfg.monitoring.proc_root);
    let t = &cfg.thresholds;

    let cpu = Arc::new(CpuCollector::new(
        procfs.clone(),
        cpu::CpuThresholds {
            usage: t.max_cpu,
            iowait: t.max_iowait,
            irq: t.max_irq,
            softirq: t.max_softirq,
        },
        warmup,
        store.clone(),
    ));
    let memory = Arc::new(MemoryCollector::new(
        procfs.clone(),
        t.max_memory,
        warmup,
        store.clone(),
    ));
    let disk = Arc::new(DiskCollector::new(
        cfg.monitoring.disk_paths.clone(),
        t.max_disk,
        warmup,
        store.clone(),
    ));
    let network = Arc::new(NetworkCollector::new(
        procfs,
        cfg.monitoring.network_interfaces.clone(),
        t.max_connections,
        warmup,
        store,
    ));

    let i = &cfg.intervals;
    vec![
        spawn_collector(cpu, i.cpu, shutdown.subscribe()),
        spawn_collector(memory, i.memory, shutdown.subscribe()),
        spawn_collector(disk, i.disk, shutdown.subscribe()),
        spawn_collector(network, i.network, shutdown.subscribe()),
    ]
}
