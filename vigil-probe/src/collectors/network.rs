use super::Collector;
use crate::models::MetricReading;
use crate::procfs::ProcFs;
use crate::state::SnapshotStore;
use crate::warmup::Warmup;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Instant;
use tracing::warn;

pub const NETWORK_CONNECTIONS: &str = "network_connections";

pub fn bandwidth_key(iface: &str) -> String {
    format!("network_{iface}_bandwidth")
}

#[derive(Debug, Clone, Copy)]
struct BandwidthSample {
    total_bytes: u64,
    at: Instant,
}

/// Rate engine over per-interface rx+tx byte counters.
#[derive(Default)]
pub struct BandwidthTracker {
    baselines: Mutex<HashMap<String, BandwidthSample>>,
}

impl BandwidthTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes per second since the previous sample of `iface`.
    ///
    /// The first sample of an interface only records the baseline and
    /// returns zero.
    pub fn observe(&self, iface: &str, total_bytes: u64, at: Instant) -> f64 {
        let mut baselines = self.baselines.lock();
        let current = BandwidthSample { total_bytes, at };
        match baselines.insert(iface.to_string(), current) {
            None => 0.0,
            Some(prev) => byte_rate(prev.total_bytes, prev.at, total_bytes, at),
        }
    }
}

/// `(b2 - b1) / (t2 - t1)`; a non-positive interval or a counter that went
/// backwards yields zero.
pub fn byte_rate(b1: u64, t1: Instant, b2: u64, t2: Instant) -> f64 {
    let elapsed = t2.saturating_duration_since(t1).as_secs_f64();
    if elapsed <= 0.0 {
        return 0.0;
    }
    b2.saturating_sub(b1) as f64 / elapsed
}

pub struct NetworkCollector {
    procfs: ProcFs,
    interfaces: Vec<String>,
    max_connections: f64,
    tracker: BandwidthTracker,
    warmup: Warmup,
    store: SnapshotStore,
}

impl NetworkCollector {
    pub fn new(
        procfs: ProcFs,
        interfaces: Vec<String>,
        max_connections: f64,
        warmup: Warmup,
        store: SnapshotStore,
    ) -> Self {
        Self {
            procfs,
            interfaces,
            max_connections,
            tracker: BandwidthTracker::new(),
            warmup,
            store,
        }
    }

    fn publish_connections(&self) {
        let count = match self.procfs.established_connections() {
            Ok(n) => n as f64,
            Err(e) => {
                warn!("error collecting network connections: {e}");
                0.0
            }
        };
        let max = self.warmup.effective_max(self.max_connections);
        self.store
            .publish(NETWORK_CONNECTIONS, MetricReading::evaluate(count, max));
    }

    fn publish_bandwidth(&self, iface: &str) {
        let rate = match self.procfs.interface_bytes(iface) {
            Ok(total) => self.tracker.observe(iface, total, Instant::now()),
            Err(e) => {
                warn!("error collecting network bandwidth for {iface}: {e}");
                0.0
            }
        };
        // no bandwidth threshold yet
        self.store
            .publish(bandwidth_key(iface), MetricReading::unbounded(rate));
    }
}

impl Collector for NetworkCollector {
    fn name(&self) -> &'static str {
        "network"
    }

    fn tick(&self) {
        self.publish_connections();
        for iface in &self.interfaces {
            self.publish_bandwidth(iface);
        }
    }
}
