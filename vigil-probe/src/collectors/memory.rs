use super::Collector;
use crate::error::ReadError;
use crate::models::MetricReading;
use crate::procfs::{MemInfo, ProcFs};
use crate::state::SnapshotStore;
use crate::warmup::Warmup;
use tracing::warn;

pub const MEMORY: &str = "memory";

/// Share of memory not available to new allocations, in percent.
pub fn memory_usage_percent(info: MemInfo) -> Result<f64, ReadError> {
    if info.total_kb == 0 {
        return Err(ReadError::ZeroMemoryTotal);
    }
    let used = info.total_kb.saturating_sub(info.available_kb);
    Ok(used as f64 / info.total_kb as f64 * 100.0)
}

pub struct MemoryCollector {
    procfs: ProcFs,
    max_memory: f64,
    warmup: Warmup,
    store: SnapshotStore,
}

impl MemoryCollector {
    pub fn new(procfs: ProcFs, max_memory: f64, warmup: Warmup, store: SnapshotStore) -> Self {
        Self {
            procfs,
            max_memory,
            warmup,
            store,
        }
    }

    fn sample(&self) -> Result<f64, ReadError> {
        memory_usage_percent(self.procfs.meminfo()?)
    }
}

impl Collector for MemoryCollector {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn tick(&self) {
        let usage = self.sample().unwrap_or_else(|e| {
            warn!("error collecting memory metric: {e}");
            0.0
        });
        let max = self.warmup.effective_max(self.max_memory);
        self.store.publish(MEMORY, MetricReading::evaluate(usage, max));
    }
}
