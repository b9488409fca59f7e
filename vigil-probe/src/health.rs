use crate::models::{MetricsMap, Status};
use crate::state::Snapshot;
use serde::Serialize;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: Status,
    pub timestamp: String,
    pub metrics: MetricsMap,
}

impl HealthReport {
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self::at(snapshot, OffsetDateTime::now_utc())
    }

    pub fn at(snapshot: Snapshot, now: OffsetDateTime) -> Self {
        Self {
            status: snapshot.status(),
            timestamp: now.format(&Rfc3339).unwrap_or_default(),
            metrics: snapshot.metrics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MetricReading;
    use crate::state::SnapshotStore;
    use time::macros::datetime;

    #[test]
    fn test_report_json_shape() {
        let store = SnapshotStore::new();
        store.publish("memory", MetricReading::evaluate(95.0, 90.0));
        store.publish("cpu_usage", MetricReading::evaluate(12.5, 80.0));

        let report = HealthReport::at(store.snapshot(), datetime!(2024-05-01 12:00:00 UTC));
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["status"], "KO");
        assert_eq!(json["timestamp"], "2024-05-01T12:00:00Z");
        assert_eq!(json["metrics"]["memory"]["status"], "KO");
        assert_eq!(json["metrics"]["memory"]["current"], 95.0);
        assert_eq!(json["metrics"]["cpu_usage"]["max"], 80.0);
    }

    #[test]
    fn test_empty_report_is_ok() {
        let report = HealthReport::from_snapshot(Snapshot::default());
        assert_eq!(report.status, Status::Ok);
        assert!(report.metrics.is_empty());
        assert!(!report.timestamp.is_empty());
    }
}
