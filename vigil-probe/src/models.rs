use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Binary verdict of a single metric or of the whole probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "KO")]
    Ko,
}

impl Status {
    /// KO only when `current` strictly exceeds `max`; equality is OK.
    pub fn evaluate(current: f64, max: f64) -> Self {
        if current > max {
            Status::Ko
        } else {
            Status::Ok
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::Ko => "KO",
        }
    }

    pub fn is_ko(&self) -> bool {
        matches!(self, Status::Ko)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last computed value of one metric, with the (possibly ramped) maximum it
/// was judged against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricReading {
    pub current: f64,
    pub max: f64,
    pub status: Status,
}

impl MetricReading {
    pub fn evaluate(current: f64, max: f64) -> Self {
        Self {
            current,
            max,
            status: Status::evaluate(current, max),
        }
    }

    /// Reading with no enforced maximum; always OK, max recorded as 0.
    pub fn unbounded(current: f64) -> Self {
        Self {
            current,
            max: 0.0,
            status: Status::Ok,
        }
    }
}

pub type MetricsMap = BTreeMap<String, MetricReading>;
