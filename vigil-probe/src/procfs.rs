/**
 * PROCFS READERS - Lecture des compteurs exposés par le noyau
 *
 * ROLE:
 * Every kernel file the probe depends on is read through `ProcFs`, a handle
 * rooted at a configurable directory (`/proc` by default, `/host/proc` in a
 * container, a temp dir in tests). Parsing lives in free functions over `&str`
 * so it can be tested without touching the filesystem.
 *
 * FILES:
 * - stat         : aggregate `cpu` line (user nice system idle iowait irq softirq steal)
 * - meminfo      : MemTotal / MemAvailable gauges
 * - net/tcp{,6}  : connection tables, state column `st`
 * - net/dev      : per-interface rx/tx byte counters
 */

use crate::error::ReadError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// TCP state code for ESTABLISHED in `/proc/net/tcp`
pub const TCP_ESTABLISHED: &str = "01";

/// Aggregate CPU tick counters since boot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTimes {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

/// Memory gauges in kB.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemInfo {
    pub total_kb: u64,
    pub available_kb: u64,
}

#[derive(Debug, Clone)]
pub struct ProcFs {
    root: PathBuf,
}

impl Default for ProcFs {
    fn default() -> Self {
        Self::new("/proc")
    }
}

impl ProcFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    fn read(&self, relative: &str) -> Result<(PathBuf, String), ReadError> {
        let path = self.path(relative);
        match std::fs::read_to_string(&path) {
            Ok(txt) => Ok((path, txt)),
            Err(source) => Err(ReadError::Io { path, source }),
        }
    }

    pub fn cpu_times(&self) -> Result<CpuTimes, ReadError> {
        let (path, txt) = self.read("stat")?;
        parse_cpu_times(&txt).map_err(|reason| ReadError::parse(path, reason))
    }

    pub fn meminfo(&self) -> Result<MemInfo, ReadError> {
        let (path, txt) = self.read("meminfo")?;
        parse_meminfo(&txt).map_err(|reason| ReadError::parse(path, reason))
    }

    /// ESTABLISHED connections over IPv4 plus IPv6 when the table exists.
    pub fn established_connections(&self) -> Result<u64, ReadError> {
        let (_, v4) = self.read("net/tcp")?;
        let mut count = count_established(&v4);

        match self.read("net/tcp6") {
            Ok((_, v6)) => count += count_established(&v6),
            Err(e) => debug!("no IPv6 connection table: {e}"),
        }
        Ok(count)
    }

    /// rx + tx bytes for one interface from `net/dev`.
    pub fn interface_bytes(&self, iface: &str) -> Result<u64, ReadError> {
        let (path, txt) = self.read("net/dev")?;
        match parse_interface_bytes(&txt, iface) {
            Ok(Some(total)) => Ok(total),
            Ok(None) => Err(ReadError::InterfaceNotFound(iface.to_string())),
            Err(reason) => Err(ReadError::parse(path, reason)),
        }
    }
}

pub fn parse_cpu_times(stat: &str) -> Result<CpuTimes, String> {
    let line = stat
        .lines()
        .find(|l| l.split_whitespace().next() == Some("cpu"))
        .ok_or_else(|| "missing aggregate cpu line".to_string())?;

    let fields = line
        .split_whitespace()
        .skip(1)
        .take(8)
        .map(str::parse::<u64>)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("bad cpu counter: {e}"))?;

    let &[user, nice, system, idle, iowait, irq, softirq, steal] = fields.as_slice() else {
        return Err(format!("expected 8 cpu counters, found {}", fields.len()));
    };

    Ok(CpuTimes {
        user,
        nice,
        system,
        idle,
        iowait,
        irq,
        softirq,
        steal,
    })
}

pub fn parse_meminfo(meminfo: &str) -> Result<MemInfo, String> {
    let mut total = None;
    let mut available = None;

    for line in meminfo.lines() {
        let mut parts = line.split_whitespace();
        let slot = match parts.next() {
            Some("MemTotal:") => &mut total,
            Some("MemAvailable:") => &mut available,
            _ => continue,
        };
        let value = parts
            .next()
            .ok_or_else(|| format!("missing value in '{line}'"))?
            .parse::<u64>()
            .map_err(|e| format!("bad value in '{line}': {e}"))?;
        *slot = Some(value);
    }

    match (total, available) {
        (Some(total_kb), Some(available_kb)) => Ok(MemInfo {
            total_kb,
            available_kb,
        }),
        (None, _) => Err("MemTotal not found".into()),
        (_, None) => Err("MemAvailable not found".into()),
    }
}

/// Rows of a `/proc/net/tcp` table whose `st` column is ESTABLISHED.
pub fn count_established(table: &str) -> u64 {
    table
        .lines()
        .skip(1)
        .filter(|row| row.split_whitespace().nth(3) == Some(TCP_ESTABLISHED))
        .count() as u64
}

/// `Ok(None)` when the interface is not listed.
pub fn parse_interface_bytes(dev: &str, iface: &str) -> Result<Option<u64>, String> {
    for line in dev.lines().skip(2) {
        let Some((name, counters)) = line.split_once(':') else {
            continue;
        };
        if name.trim() != iface {
            continue;
        }

        let fields: Vec<&str> = counters.split_whitespace().collect();
        if fields.len() < 9 {
            return Err(format!("short counter row for {iface}"));
        }
        let rx = fields[0]
            .parse::<u64>()
            .map_err(|e| format!("bad rx bytes for {iface}: {e}"))?;
        let tx = fields[8]
            .parse::<u64>()
            .map_err(|e| format!("bad tx bytes for {iface}: {e}"))?;
        return Ok(Some(rx.saturating_add(tx)));
    }
    Ok(None)
}
