use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexerError>;

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid corpus path: {0}")]
    InvalidPath(String),

    #[error("Document {id}: {message}")]
    Document { id: String, message: String },

    #[error("Config error: {0}")]
    Config(String),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Glob error: {0}")]
    GlobError(#[from] globset::Error),

    #[error("Watcher error: {0}")]
    Watch(String),

    #[error("Scan task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Engine has been deactivated")]
    Terminated,

    #[error("{0}")]
    Other(String),
}

impl IndexerError {
    pub fn document(id: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Document {
            id: id.into(),
            message: message.to_string(),
        }
    }

    /// True when the underlying cause is a missing file.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::IoError(err) if err.kind() == std::io::ErrorKind::NotFound)
    }
}
