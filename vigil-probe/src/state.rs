use crate::models::{MetricReading, MetricsMap, Status};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Shared map of metric name to last published reading.
///
/// Each collector owns a disjoint set of keys. Cloning is cheap and every
/// clone sees the same map.
#[derive(Clone, Default)]
pub struct SnapshotStore {
    inner: Arc<RwLock<HashMap<String, MetricReading>>>,
}

/// Point-in-time copy of the store, detached from its lock.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub metrics: MetricsMap,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the reading under `key` as a whole.
    pub fn publish(&self, key: impl Into<String>, reading: MetricReading) {
        let key = key.into();
        self.inner.write().insert(key, reading);
    }

    /// Copies every entry under the read lock, then releases it.
    pub fn snapshot(&self) -> Snapshot {
        let metrics = {
            let map = self.inner.read();
            map.iter().map(|(k, v)| (k.clone(), *v)).collect()
        };
        Snapshot { metrics }
    }

    pub fn get(&self, key: &str) -> Option<MetricReading> {
        self.inner.read().get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Snapshot {
    /// KO as soon as one entry is KO; an empty snapshot is OK.
    pub fn status(&self) -> Status {
        if self.metrics.values().any(|m| m.status.is_ko()) {
            Status::Ko
        } else {
            Status::Ok
        }
    }

    pub fn current(&self, key: &str) -> f64 {
        self.metrics.get(key).map(|m| m.current).unwrap_or(0.0)
    }

    pub fn status_of(&self, key: &str) -> Status {
        self.metrics.get(key).map(|m| m.status).unwrap_or(Status::Ok)
    }

    /// Readings whose key starts with `prefix` and ends with `suffix`
    pub fn matching<'a>(
        &'a self,
        prefix: &'a str,
        suffix: &'a str,
    ) -> impl Iterator<Item = (&'a String, &'a MetricReading)> + 'a {
        self.metrics
            .iter()
            .filter(move |(k, _)| k.starts_with(prefix) && k.ends_with(suffix))
    }
}
