use super::Collector;
use crate::error::ReadError;
use crate::models::MetricReading;
use crate::state::SnapshotStore;
use crate::warmup::Warmup;
use nix::sys::statvfs::statvfs;
use tracing::{debug, warn};

/// Capacity of one mounted filesystem.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiskUsage {
    pub total_bytes: u64,
    pub available_bytes: u64,
}

impl DiskUsage {
    pub fn used_bytes(&self) -> u64 {
        self.total_bytes.saturating_sub(self.available_bytes)
    }

    pub fn percent(&self) -> f64 {
        if self.total_bytes == 0 {
            return 0.0;
        }
        self.used_bytes() as f64 / self.total_bytes as f64 * 100.0
    }
}

/// Space as seen by an unprivileged user (`f_bavail`), like `df`.
pub fn disk_usage(path: &str) -> Result<DiskUsage, ReadError> {
    let st = statvfs(path).map_err(|errno| ReadError::Statvfs {
        path: path.to_string(),
        errno,
    })?;

    let frsize = st.fragment_size() as u64;
    let usage = DiskUsage {
        total_bytes: (st.blocks() as u64).saturating_mul(frsize),
        available_bytes: (st.blocks_available() as u64).saturating_mul(frsize),
    };
    if usage.total_bytes == 0 {
        return Err(ReadError::ZeroFilesystemSize(path.to_string()));
    }
    Ok(usage)
}

/// Metric-safe name for a path: `/` is `root`, `/var/log` is `var_log`.
pub fn sanitize_path(path: &str) -> String {
    let trimmed = path.strip_prefix('/').unwrap_or(path).trim_end_matches('/');
    if trimmed.is_empty() {
        return "root".to_string();
    }
    trimmed.replace('/', "_")
}

pub fn disk_key(path: &str) -> String {
    format!("disk_{}", sanitize_path(path))
}

pub struct DiskCollector {
    paths: Vec<String>,
    max_disk: f64,
    warmup: Warmup,
    store: SnapshotStore,
}

impl DiskCollector {
    pub fn new(paths: Vec<String>, max_disk: f64, warmup: Warmup, store: SnapshotStore) -> Self {
        Self {
            paths,
            max_disk,
            warmup,
            store,
        }
    }
}

impl Collector for DiskCollector {
    fn name(&self) -> &'static str {
        "disk"
    }

    fn tick(&self) {
        // one ramp value shared by every path of this tick
        let max = self.warmup.effective_max(self.max_disk);

        for path in &self.paths {
            let percent = match disk_usage(path) {
                Ok(usage) => {
                    debug!(
                        path = %path,
                        used = usage.used_bytes(),
                        total = usage.total_bytes,
                        "disk sampled"
                    );
                    usage.percent()
                }
                Err(e) => {
                    warn!("error collecting disk metric for {path}: {e}");
                    0.0
                }
            };
            self.store
                .publish(disk_key(path), MetricReading::evaluate(percent, max));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Status;
    use std::time::{Duration, Instant};

    #[test]
    fn test_sanitize_path() {
        assert_eq!(sanitize_path("/"), "root");
        assert_eq!(sanitize_path("/var/log"), "var_log");
        assert_eq!(sanitize_path("/tmp"), "tmp");
        assert_eq!(sanitize_path("/opt/app/data"), "opt_app_data");
        assert_eq!(sanitize_path("/var/"), "var");
    }

    #[test]
    fn test_disk_key() {
        assert_eq!(disk_key("/"), "disk_root");
        assert_eq!(disk_key("/var/log"), "disk_var_log");
    }

    #[test]
    fn test_usage_percent() {
        let u = DiskUsage {
            total_bytes: 1000,
            available_bytes: 250,
        };
        assert_eq!(u.used_bytes(), 750);
        assert_eq!(u.percent(), 75.0);
    }

    #[test]
    fn test_statvfs_on_root() {
        let u = disk_usage("/").unwrap();
        assert!(u.total_bytes > 0);
        assert!((0.0..=100.0).contains(&u.percent()));
    }

    #[test]
    fn test_missing_path_is_error() {
        assert!(matches!(
            disk_usage("/nonexistent/vigil/mount"),
            Err(ReadError::Statvfs { .. })
        ));
    }

    #[test]
    fn test_collector_publishes_one_entry_per_path() {
        let dir = tempfile::tempdir().unwrap();
        let tmp = dir.path().to_string_lossy().into_owned();
        let store = SnapshotStore::new();
        let collector = DiskCollector::new(
            vec!["/".into(), tmp.clone(), "/nonexistent/vigil/mount".into()],
            100.0,
            Warmup::disabled(),
            store.clone(),
        );

        collector.tick();
        let snap = store.snapshot();
        assert_eq!(snap.metrics.len(), 3);
        assert!(snap.metrics.contains_key("disk_root"));
        assert!(snap.metrics.contains_key(&disk_key(&tmp)));

        let missing = snap.metrics["disk_nonexistent_vigil_mount"];
        assert_eq!(missing.current, 0.0);
        assert_eq!(missing.status, Status::Ok);
        // nothing exceeds 100%
        assert_eq!(snap.status(), Status::Ok);
    }

    #[test]
    fn test_every_path_shares_the_ramped_max() {
        let dir = tempfile::tempdir().unwrap();
        let tmp = dir.path().to_string_lossy().into_owned();
        let store = SnapshotStore::new();
        let start = Instant::now() - Duration::from_secs(30);
        let collector = DiskCollector::new(
            vec!["/".into(), tmp, "/nonexistent/vigil/mount".into()],
            100.0,
            Warmup::new(true, Duration::from_secs(3600), start),
            store.clone(),
        );

        collector.tick();
        let snap = store.snapshot();
        let maxima: Vec<f64> = snap.matching("disk_", "").map(|(_, m)| m.max).collect();
        assert_eq!(maxima.len(), 3);
        assert!(maxima[0] > 0.0 && maxima[0] < 100.0, "ramped max was {}", maxima[0]);
        assert!(maxima.iter().all(|&m| m == maxima[0]));
    }
}
