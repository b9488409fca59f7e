//! dstat-like terminal view of the snapshot store.
//!
//! Prints one line per interval; KO values are rendered in red. The header is
//! repeated every [`HEADER_EVERY`] lines.

use crate::collectors::cpu::{CPU_IOWAIT, CPU_IRQ, CPU_SOFTIRQ, CPU_USAGE};
use crate::collectors::memory::MEMORY;
use crate::collectors::network::NETWORK_CONNECTIONS;
use crate::format::format_bandwidth;
use crate::models::Status;
use crate::state::{Snapshot, SnapshotStore};
use crossterm::style::{style, Stylize};
use std::time::Duration;
use time::macros::format_description;
use time::OffsetDateTime;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::interval;

pub const HEADER_EVERY: usize = 20;
const RULE_WIDTH: usize = 110;

pub fn header() -> String {
    let rule = "-".repeat(RULE_WIDTH);
    format!(
        "{rule}\n{:<8} | {:<6} {:<6} {:<6} {:<6} | {:<6} | {:<10} | {:<6} | {:<15}\n{rule}",
        "TIME", "CPU%", "IOWT%", "IRQ%", "SIRQ%", "MEM%", "DISK%", "CONN", "NET(B/s)"
    )
}

/// Mean usage over every `disk_*` entry
pub fn average_disk_usage(snap: &Snapshot) -> f64 {
    let (sum, count) = snap
        .matching("disk_", "")
        .fold((0.0, 0usize), |(sum, n), (_, m)| (sum + m.current, n + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Sum of every `network_*_bandwidth` entry
pub fn total_bandwidth(snap: &Snapshot) -> f64 {
    snap.matching("network_", "_bandwidth")
        .map(|(_, m)| m.current)
        .sum()
}

fn colored(value: f64, status: Status, width: usize) -> String {
    let txt = format!("{value:>width$.1}");
    match status {
        Status::Ko => style(txt).red().to_string(),
        Status::Ok => txt,
    }
}

pub fn metric_line(snap: &Snapshot, clock: &str) -> String {
    let cell = |key: &str| colored(snap.current(key), snap.status_of(key), 6);
    format!(
        "{:<8} | {} {} {} {} | {} | {:<10} | {:<6.0} | {:<15}",
        clock,
        cell(CPU_USAGE),
        cell(CPU_IOWAIT),
        cell(CPU_IRQ),
        cell(CPU_SOFTIRQ),
        cell(MEMORY),
        format!("{:.1}%", average_disk_usage(snap)),
        snap.current(NETWORK_CONNECTIONS),
        format_bandwidth(total_bandwidth(snap)),
    )
}

/// Whether the header is reprinted before data line number `lines`.
fn needs_header(lines: usize) -> bool {
    lines > 0 && lines % HEADER_EVERY == 0
}

fn clock_now() -> String {
    let fmt = format_description!("[hour]:[minute]:[second]");
    OffsetDateTime::now_local()
        .unwrap_or_else(|_| OffsetDateTime::now_utc())
        .format(&fmt)
        .unwrap_or_default()
}

/// Prints the table on stdout until `shutdown` fires.
pub fn spawn_display(
    store: SnapshotStore,
    period: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        // skip the immediate tick; collectors have not published yet
        ticker.tick().await;
        println!("{}", header());

        let mut lines = 0usize;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if needs_header(lines) {
                        println!();
                        println!("{}", header());
                    }
                    let snap = store.snapshot();
                    println!("{}", metric_line(&snap, &clock_now()));
                    lines += 1;
                }
                _ = shutdown.recv() => break,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MetricReading;

    fn store() -> SnapshotStore {
        let store = SnapshotStore::new();
        store.publish(CPU_USAGE, MetricReading::evaluate(12.34, 80.0));
        store.publish(MEMORY, MetricReading::evaluate(95.0, 90.0));
        store.publish("disk_root", MetricReading::evaluate(40.0, 95.0));
        store.publish("disk_var", MetricReading::evaluate(60.0, 95.0));
        store.publish(NETWORK_CONNECTIONS, MetricReading::evaluate(42.0, 1000.0));
        store.publish("network_eth0_bandwidth", MetricReading::unbounded(1_000.0));
        store.publish("network_lo_bandwidth", MetricReading::unbounded(500.0));
        store
    }

    #[test]
    fn test_aggregates() {
        let snap = store().snapshot();
        assert_eq!(average_disk_usage(&snap), 50.0);
        assert_eq!(total_bandwidth(&snap), 1_500.0);
        assert_eq!(average_disk_usage(&Snapshot::default()), 0.0);
    }

    #[test]
    fn test_metric_line_content() {
        let line = metric_line(&store().snapshot(), "12:00:00");
        assert!(line.starts_with("12:00:00 | "));
        assert!(line.contains("  12.3"));
        assert!(line.contains("50.0%"));
        assert!(line.contains("42"));
        assert!(line.contains("1.5k"));
        assert!(line.contains("95.0"));
    }

    #[test]
    fn test_header_repeats_every_twenty_lines() {
        assert!(!needs_header(0));
        assert!(!needs_header(1));
        assert!(needs_header(20));
        assert!(!needs_header(21));
        assert!(needs_header(40));
    }

    #[test]
    fn test_header_columns() {
        let h = header();
        assert_eq!(h.lines().count(), 3);
        assert!(h.contains("NET(B/s)"));
    }
}
