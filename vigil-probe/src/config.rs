use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;

pub const DEFAULT_CONFIG_FILE: &str = "probe-config.yaml";
pub const CONFIG_ENV_VAR: &str = "VIGIL_CONFIG";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ProbeConfig {
    pub server: ServerConf,
    pub warmup: WarmupConf,
    pub thresholds: Thresholds,
    pub monitoring: MonitoringConf,
    pub intervals: IntervalsConf,
    pub logging: LoggingConf,
    pub display: DisplayConf,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConf {
    pub listen: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct WarmupConf {
    pub enabled: bool,
    #[serde(with = "human_duration")]
    pub duration: Duration,
}

/// Configured maxima, before any warmup scaling.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Thresholds {
    pub max_cpu: f64,
    pub max_iowait: f64,
    pub max_irq: f64,
    pub max_softirq: f64,
    pub max_memory: f64,
    pub max_disk: f64,
    pub max_connections: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct MonitoringConf {
    pub disk_paths: Vec<String>,
    pub network_interfaces: Vec<String>,
    pub proc_root: PathBuf,
}

/// Tick period of each collector loop
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct IntervalsConf {
    #[serde(with = "human_duration")]
    pub cpu: Duration,
    #[serde(with = "human_duration")]
    pub memory: Duration,
    #[serde(with = "human_duration")]
    pub disk: Duration,
    #[serde(with = "human_duration")]
    pub network: Duration,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct LoggingConf {
    pub file: Option<PathBuf>,
    pub debug: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct DisplayConf {
    pub enabled: bool,
    #[serde(with = "human_duration")]
    pub interval: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            server: ServerConf::default(),
            warmup: WarmupConf::default(),
            thresholds: Thresholds::default(),
            monitoring: MonitoringConf::default(),
            intervals: IntervalsConf::default(),
            logging: LoggingConf::default(),
            display: DisplayConf::default(),
        }
    }
}

impl Default for ServerConf {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8080".into(),
        }
    }
}

impl Default for WarmupConf {
    fn default() -> Self {
        Self {
            enabled: true,
            duration: Duration::from_secs(60),
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            max_cpu: 80.0,
            max_iowait: 20.0,
            max_irq: 5.0,
            max_softirq: 10.0,
            max_memory: 90.0,
            max_disk: 95.0,
            max_connections: 1000.0,
        }
    }
}

impl Default for MonitoringConf {
    fn default() -> Self {
        Self {
            disk_paths: vec!["/".into(), "/var".into(), "/tmp".into()],
            network_interfaces: vec!["eth0".into(), "lo".into()],
            proc_root: PathBuf::from("/proc"),
        }
    }
}

impl Default for IntervalsConf {
    fn default() -> Self {
        Self {
            cpu: Duration::from_secs(2),
            memory: Duration::from_secs(2),
            disk: Duration::from_secs(5),
            network: Duration::from_secs(2),
        }
    }
}

impl Default for LoggingConf {
    fn default() -> Self {
        Self {
            file: Some(default_log_file()),
            debug: false,
        }
    }
}

impl Default for DisplayConf {
    fn default() -> Self {
        Self {
            enabled: false,
            interval: Duration::from_secs(3),
        }
    }
}

/// `probe.log` next to the running executable
fn default_log_file() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("probe.log")))
        .unwrap_or_else(|| PathBuf::from("probe.log"))
}

/// CLI flag first, then `VIGIL_CONFIG`, then `probe-config.yaml`.
pub fn resolve_config_path(cli: Option<PathBuf>) -> PathBuf {
    cli.or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

impl ProbeConfig {
    /// Loads `path` over the defaults. A missing or empty file yields the defaults.
    pub async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let txt = fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        if txt.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&txt)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    /// Writes the default configuration as YAML.
    pub async fn write_default(path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(&Self::default()).context("failed to serialize config")?;
        fs::write(path, yaml)
            .await
            .with_context(|| format!("failed to write config file {}", path.display()))?;
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.server
            .listen
            .parse()
            .with_context(|| format!("invalid listen address '{}'", self.server.listen))
    }

    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;

        let t = &self.thresholds;
        for (name, value) in [
            ("max_cpu", t.max_cpu),
            ("max_iowait", t.max_iowait),
            ("max_irq", t.max_irq),
            ("max_softirq", t.max_softirq),
            ("max_memory", t.max_memory),
            ("max_disk", t.max_disk),
            ("max_connections", t.max_connections),
        ] {
            if !value.is_finite() || value < 0.0 {
                bail!("threshold {name} must be a non-negative number, got {value}");
            }
        }

        let i = &self.intervals;
        for (name, period) in [
            ("cpu", i.cpu),
            ("memory", i.memory),
            ("disk", i.disk),
            ("network", i.network),
        ] {
            if period.is_zero() {
                bail!("interval for {name} collector must be greater than zero");
            }
        }
        if self.display.interval.is_zero() {
            bail!("display interval must be greater than zero");
        }

        for path in &self.monitoring.disk_paths {
            if !path.starts_with('/') {
                bail!("disk path '{path}' must be absolute");
            }
        }
        Ok(())
    }
}

/// Durations as human strings ("60s", "1m 30s")
mod human_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&humantime::format_duration(*d))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let txt = String::deserialize(d)?;
        humantime::parse_duration(&txt).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = ProbeConfig::default();
        assert_eq!(cfg.thresholds.max_memory, 90.0);
        assert_eq!(cfg.intervals.disk, Duration::from_secs(5));
        assert_eq!(cfg.warmup.duration, Duration::from_secs(60));
        assert_eq!(cfg.monitoring.proc_root, PathBuf::from("/proc"));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "warmup:\n  duration: 90s\nthresholds:\n  max_memory: 75\n";
        let cfg: ProbeConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.warmup.duration, Duration::from_secs(90));
        assert!(cfg.warmup.enabled);
        assert_eq!(cfg.thresholds.max_memory, 75.0);
        assert_eq!(cfg.thresholds.max_cpu, 80.0);
        assert_eq!(cfg.monitoring.disk_paths, vec!["/", "/var", "/tmp"]);
    }

    #[test]
    fn test_bad_duration_is_rejected() {
        let yaml = "intervals:\n  cpu: soon\n";
        assert!(serde_yaml::from_str::<ProbeConfig>(yaml).is_err());
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let mut cfg = ProbeConfig::default();
        cfg.intervals.network = Duration::ZERO;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_negative_threshold() {
        let mut cfg = ProbeConfig::default();
        cfg.thresholds.max_disk = -1.0;
        assert!(cfg.validate().is_err());
        cfg.thresholds.max_disk = f64::NAN;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_relative_disk_path() {
        let mut cfg = ProbeConfig::default();
        cfg.monitoring.disk_paths.push("var/log".into());
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_resolve_config_path_prefers_cli() {
        let p = resolve_config_path(Some(PathBuf::from("custom.yaml")));
        assert_eq!(p, PathBuf::from("custom.yaml"));
    }

    #[tokio::test]
    async fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = ProbeConfig::load(&dir.path().join("absent.yaml")).await.unwrap();
        assert_eq!(cfg, ProbeConfig::default());
    }

    #[tokio::test]
    async fn test_load_empty_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.yaml");
        std::fs::write(&path, "\n").unwrap();
        let cfg = ProbeConfig::load(&path).await.unwrap();
        assert_eq!(cfg, ProbeConfig::default());
    }

    #[tokio::test]
    async fn test_generated_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probe-config.yaml");
        ProbeConfig::write_default(&path).await.unwrap();

        let txt = std::fs::read_to_string(&path).unwrap();
        assert!(txt.contains("duration: 1m"));

        let cfg = ProbeConfig::load(&path).await.unwrap();
        assert_eq!(cfg, ProbeConfig::default());
    }

    #[tokio::test]
    async fn test_invalid_yaml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.yaml");
        std::fs::write(&path, "thresholds: [1, 2").unwrap();
        assert!(ProbeConfig::load(&path).await.is_err());
    }
}
