use std::path::PathBuf;

/// Failure to read or parse a kernel-exposed resource on a given tick.
///
/// None of these are fatal: the collector logs them, publishes a zero
/// reading and waits for the next tick.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Parse error in {path}: {reason}")]
    Parse { path: PathBuf, reason: String },
    #[error("Interface not found: {0}")]
    InterfaceNotFound(String),
    #[error("Memory total is zero")]
    ZeroMemoryTotal,
    #[error("Filesystem at {0} reports zero size")]
    ZeroFilesystemSize(String),
    #[error("statvfs({path}) failed: {errno}")]
    Statvfs { path: String, errno: nix::errno::Errno },
}

impl ReadError {
    pub(crate) fn parse(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ReadError::Parse {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
