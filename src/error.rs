use std::path::PathBuf;

/// Local queue persistence failed to open, read, or write.
#[derive(Debug)]
pub enum StoreError {
    Open { path: PathBuf, source: rusqlite::Error },
    Io(std::io::Error),
    Sqlite(rusqlite::Error),
    Serialize(serde_json::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Open { path, source } => {
                write!(f, "Failed to open queue store {}: {source}", path.display())
            }
            StoreError::Io(err) => write!(f, "Queue store I/O error: {err}"),
            StoreError::Sqlite(err) => write!(f, "Queue store error: {err}"),
            StoreError::Serialize(err) => write!(f, "Failed to serialize queued action: {err}"),
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Sqlite(err)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialize(err)
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err)
    }
}

/// A remote document-store operation failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    NotFound(String),
    Unavailable(String),
    Denied(String),
    Invalid(String),
}

impl std::fmt::Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RemoteError::NotFound(msg) => write!(f, "Not Found: {msg}"),
            RemoteError::Unavailable(msg) => write!(f, "Unavailable: {msg}"),
            RemoteError::Denied(msg) => write!(f, "Permission Denied: {msg}"),
            RemoteError::Invalid(msg) => write!(f, "Invalid: {msg}"),
        }
    }
}
