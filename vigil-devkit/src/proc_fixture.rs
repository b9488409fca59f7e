/*!
Fake procfs trees for probe tests

Writes the handful of kernel files the probe reads into a `TempDir`, using the
same column layout the kernel uses, so readers can be pointed at them through
a custom proc root.
*/

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Aggregate tick counters for the `cpu` line of `/proc/stat`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTicks {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

/// Temporary procfs root. Dropping it removes the directory.
pub struct ProcFixture {
    dir: TempDir,
}

impl ProcFixture {
    /// Empty proc root with the `net/` subdirectory already present
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir()?;
        fs::create_dir_all(dir.path().join("net"))?;
        Ok(Self { dir })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Writes raw text to a file relative to the root
    pub fn write(&self, relative: &str, contents: &str) -> Result<()> {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)?;
        Ok(())
    }

    pub fn remove(&self, relative: &str) -> Result<()> {
        fs::remove_file(self.path(relative))?;
        Ok(())
    }

    pub fn set_cpu(&self, ticks: CpuTicks) -> Result<()> {
        self.write("stat", &stat_text(ticks))
    }

    pub fn set_meminfo(&self, total_kb: u64, available_kb: u64) -> Result<()> {
        self.write("meminfo", &meminfo_text(total_kb, available_kb))
    }

    /// `interfaces` is a list of `(name, rx_bytes, tx_bytes)`
    pub fn set_net_dev(&self, interfaces: &[(&str, u64, u64)]) -> Result<()> {
        self.write("net/dev", &net_dev_text(interfaces))
    }

    /// `states` are the two-digit hex TCP states, one row each
    pub fn set_tcp(&self, states: &[&str]) -> Result<()> {
        self.write("net/tcp", &tcp_table_text(states))
    }

    pub fn set_tcp6(&self, states: &[&str]) -> Result<()> {
        self.write("net/tcp6", &tcp_table_text(states))
    }
}

pub fn stat_text(t: CpuTicks) -> String {
    format!(
        "cpu  {} {} {} {} {} {} {} {} 0 0\n\
         cpu0 {} {} {} {} {} {} {} {} 0 0\n\
         intr 123456 0 0 0\n\
         ctxt 987654\n\
         btime 1700000000\n\
         processes 4242\n\
         procs_running 2\n\
         procs_blocked 0\n",
        t.user, t.nice, t.system, t.idle, t.iowait, t.irq, t.softirq, t.steal,
        t.user, t.nice, t.system, t.idle, t.iowait, t.irq, t.softirq, t.steal,
    )
}

pub fn meminfo_text(total_kb: u64, available_kb: u64) -> String {
    format!(
        "MemTotal:       {total_kb} kB\n\
         MemFree:         {} kB\n\
         MemAvailable:   {available_kb} kB\n\
         Buffers:          102400 kB\n\
         Cached:          2048000 kB\n\
         SwapTotal:             0 kB\n",
        available_kb / 2,
    )
}

pub fn net_dev_text(interfaces: &[(&str, u64, u64)]) -> String {
    let mut out = String::from(
        "Inter-|   Receive                                                |  Transmit\n \
         face |bytes    packets errs drop fifo frame compressed multicast|bytes    packets errs drop fifo colls carrier compressed\n",
    );
    for (name, rx, tx) in interfaces {
        out.push_str(&format!(
            "{name:>6}: {rx} 1000 0 0 0 0 0 0 {tx} 900 0 0 0 0 0 0\n"
        ));
    }
    out
}

pub fn tcp_table_text(states: &[&str]) -> String {
    let mut out = String::from(
        "  sl  local_address rem_address   st tx_queue rx_queue tr tm->when retrnsmt   uid  timeout inode\n",
    );
    for (i, st) in states.iter().enumerate() {
        out.push_str(&format!(
            "{i:>4}: 0100007F:1F90 0100007F:{:04X} {st} 00000000:00000000 00:00000000 00000000  1000        0 {} 1 0000000000000000 20 4 30 10 -1\n",
            40000 + i,
            10000 + i,
        ));
    }
    out
}
