use crate::error::{IndexerError, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Name of the optional per-corpus config file.
pub const CONFIG_FILE_NAME: &str = ".marker-index.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndexerConfig {
    /// Globs (relative to the corpus root) of documents that may hold markers.
    pub include: Vec<String>,
    /// Globs excluded even when matched by `include`.
    pub exclude: Vec<String>,
    pub respect_gitignore: bool,
    pub watcher: WatcherConfig,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            include: vec!["**/*.html".to_string()],
            exclude: [
                "**/.git/**",
                "**/node_modules/**",
                "**/dist/**",
                "**/build/**",
                "**/out/**",
                "**/target/**",
            ]
            .iter()
            .map(|glob| (*glob).to_string())
            .collect(),
            respect_gitignore: true,
            watcher: WatcherConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatcherConfig {
    /// Repeated events for one path inside this window collapse into one save.
    pub dedup_window_ms: u64,
    /// Used by polling backends only.
    pub poll_interval_ms: u64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            dedup_window_ms: 250,
            poll_interval_ms: 2000,
        }
    }
}

impl WatcherConfig {
    #[must_use]
    pub const fn dedup_window(&self) -> Duration {
        Duration::from_millis(self.dedup_window_ms)
    }

    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl IndexerConfig {
    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        if config.include.iter().all(|glob| glob.trim().is_empty()) {
            return Err(IndexerError::Config(
                "`include` must name at least one glob".to_string(),
            ));
        }
        Ok(config)
    }

    pub async fn load(path: &Path) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path).await?;
        Self::from_toml(&raw)
            .map_err(|e| IndexerError::Config(format!("{}: {e}", path.display())))
    }

    /// Reads `<root>/.marker-index.toml`, falling back to defaults when absent.
    pub async fn load_for_root(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE_NAME);
        match tokio::fs::metadata(&path).await {
            Ok(_) => Self::load(&path).await,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No {CONFIG_FILE_NAME} under {}; using defaults", root.display());
                Ok(Self::default())
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_file_yields_defaults() {
        assert_eq!(IndexerConfig::from_toml("").unwrap(), IndexerConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = IndexerConfig::from_toml(
            r#"
            include = ["src/**/*.component.html"]

            [watcher]
            dedup_window_ms = 50
            "#,
        )
        .unwrap();
        assert_eq!(config.include, vec!["src/**/*.component.html".to_string()]);
        assert_eq!(config.exclude, IndexerConfig::default().exclude);
        assert_eq!(config.watcher.dedup_window_ms, 50);
        assert_eq!(config.watcher.poll_interval_ms, 2000);
    }

    #[test]
    fn unknown_keys_and_empty_include_are_rejected() {
        assert!(IndexerConfig::from_toml("inclde = []").is_err());
        assert!(matches!(
            IndexerConfig::from_toml("include = []"),
            Err(IndexerError::Config(_))
        ));
    }

    #[tokio::test]
    async fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = IndexerConfig::load_for_root(dir.path()).await.unwrap();
        assert_eq!(config, IndexerConfig::default());
    }
}
