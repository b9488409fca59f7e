//! Vigil probe - resident health probe
//!
//! Samples CPU, memory, disk and network counters from the kernel, judges each
//! against a configured (warmup-ramped) maximum and serves the aggregate
//! verdict on `GET /health`.

pub mod collectors;
pub mod config;
pub mod display;
pub mod error;
pub mod format;
pub mod health;
pub mod http;
pub mod logging;
pub mod models;
pub mod procfs;
pub mod state;
pub mod warmup;

pub use error::ReadError;
pub use models::{MetricReading, Status};
pub use state::{Snapshot, SnapshotStore};
pub use warmup::Warmup;
