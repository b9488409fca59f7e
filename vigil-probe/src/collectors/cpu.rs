use super::Collector;
use crate::models::MetricReading;
use crate::procfs::{CpuTimes, ProcFs};
use crate::state::SnapshotStore;
use crate::warmup::Warmup;
use parking_lot::Mutex;
use tracing::warn;

pub const CPU_USAGE: &str = "cpu_usage";
pub const CPU_IOWAIT: &str = "cpu_iowait";
pub const CPU_IRQ: &str = "cpu_irq";
pub const CPU_SOFTIRQ: &str = "cpu_softirq";

/// CPU time shares over the last interval, in percent.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CpuPercentages {
    /// user + nice + system
    pub usage: f64,
    pub iowait: f64,
    pub irq: f64,
    pub softirq: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct CpuThresholds {
    pub usage: f64,
    pub iowait: f64,
    pub irq: f64,
    pub softirq: f64,
}

/// Delta engine over the aggregate `/proc/stat` counters.
#[derive(Default)]
pub struct CpuTracker {
    baseline: Mutex<Option<CpuTimes>>,
}

impl CpuTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds a new sample and returns the shares since the previous one.
    ///
    /// The first sample only captures the baseline and returns zeros.
    pub fn observe(&self, now: CpuTimes) -> CpuPercentages {
        let mut baseline = self.baseline.lock();
        let Some(prev) = baseline.replace(now) else {
            return CpuPercentages::default();
        };
        percentages_between(&prev, &now)
    }
}

/// Counter resets produce zero deltas rather than wrapping.
pub fn percentages_between(prev: &CpuTimes, now: &CpuTimes) -> CpuPercentages {
    let d = |a: u64, b: u64| b.saturating_sub(a);

    let user = d(prev.user, now.user);
    let nice = d(prev.nice, now.nice);
    let system = d(prev.system, now.system);
    let idle = d(prev.idle, now.idle);
    let iowait = d(prev.iowait, now.iowait);
    let irq = d(prev.irq, now.irq);
    let softirq = d(prev.softirq, now.softirq);
    let steal = d(prev.steal, now.steal);

    let total = user + nice + system + idle + iowait + irq + softirq + steal;
    if total == 0 {
        return CpuPercentages::default();
    }

    let pct = |v: u64| v as f64 / total as f64 * 100.0;
    CpuPercentages {
        usage: pct(user + nice + system),
        iowait: pct(iowait),
        irq: pct(irq),
        softirq: pct(softirq),
    }
}

pub struct CpuCollector {
    procfs: ProcFs,
    tracker: CpuTracker,
    thresholds: CpuThresholds,
    warmup: Warmup,
    store: SnapshotStore,
}

impl CpuCollector {
    pub fn new(
        procfs: ProcFs,
        thresholds: CpuThresholds,
        warmup: Warmup,
        store: SnapshotStore,
    ) -> Self {
        Self {
            procfs,
            tracker: CpuTracker::new(),
            thresholds,
            warmup,
            store,
        }
    }

    fn sample(&self) -> CpuPercentages {
        match self.procfs.cpu_times() {
            Ok(times) => self.tracker.observe(times),
            Err(e) => {
                warn!("error collecting CPU metrics: {e}");
                CpuPercentages::default()
            }
        }
    }
}

impl Collector for CpuCollector {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn tick(&self) {
        let pct = self.sample();
        let factor = self.warmup.factor();
        let t = &self.thresholds;

        for (key, current, max) in [
            (CPU_USAGE, pct.usage, t.usage),
            (CPU_IOWAIT, pct.iowait, t.iowait),
            (CPU_IRQ, pct.irq, t.irq),
            (CPU_SOFTIRQ, pct.softirq, t.softirq),
        ] {
            self.store
                .publish(key, MetricReading::evaluate(current, max * factor));
        }
    }
}
