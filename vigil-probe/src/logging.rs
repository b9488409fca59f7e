use crate::config::LoggingConf;
use anyhow::Result;
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn open_log_file(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Installs the global subscriber: stderr always, plus the log file when it
/// can be opened. `RUST_LOG` overrides the level chosen from `debug`.
pub fn init_logging(cfg: &LoggingConf) -> Result<()> {
    let level = if cfg.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (file, file_err) = match cfg.file.as_deref() {
        Some(path) => match open_log_file(path) {
            Ok(f) => (Some(f), None),
            Err(e) => (None, Some((path.to_path_buf(), e))),
        },
        None => (None, None),
    };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_file(cfg.debug)
        .with_line_number(cfg.debug);
    let file_layer = file.map(|f| {
        fmt::layer()
            .with_ansi(false)
            .with_writer(Mutex::new(f))
            .with_file(cfg.debug)
            .with_line_number(cfg.debug)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()?;

    match (&cfg.file, file_err) {
        (_, Some((path, e))) => warn!(
            "failed to open log file {}: {e}. Logging to stderr only.",
            path.display()
        ),
        (Some(path), None) => info!("logging to {}", path.display()),
        (None, None) => {}
    }
    if cfg.debug {
        info!("debug logging enabled");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_log_file_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("probe.log");
        std::fs::write(&path, "first\n").unwrap();

        use std::io::Write;
        let mut f = open_log_file(&path).unwrap();
        f.write_all(b"second\n").unwrap();
        drop(f);

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }

    #[test]
    fn test_open_log_file_in_missing_dir_fails() {
        assert!(open_log_file(Path::new("/nonexistent/vigil/probe.log")).is_err());
    }
}
