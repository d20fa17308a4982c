use anyhow::{Context as _, Result};
use marker_extractor::I18nAttributeExtractor;
use marker_indexer::{DocumentFilter, FsDocumentSource, IndexerConfig, MarkerIndex};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A corpus root with its resolved configuration.
pub struct CorpusContext {
    pub root: PathBuf,
    pub config: IndexerConfig,
    pub filter: DocumentFilter,
}

impl CorpusContext {
    pub async fn resolve(root: &Path, config_path: Option<&Path>) -> Result<Self> {
        let root = root
            .canonicalize()
            .with_context(|| format!("Corpus root {} is not accessible", root.display()))?;
        let config = match config_path {
            Some(path) => IndexerConfig::load(path).await,
            None => IndexerConfig::load_for_root(&root).await,
        }
        .context("Failed to load marker index config")?;
        let filter = DocumentFilter::from_config(&config).context("Invalid include/exclude globs")?;
        log::debug!("Resolved corpus {} with {:?}", root.display(), config);
        Ok(Self {
            root,
            config,
            filter,
        })
    }

    pub fn build_index(&self) -> Result<MarkerIndex> {
        let source = FsDocumentSource::new(&self.root, self.filter.clone())?
            .respect_gitignore(self.config.respect_gitignore);
        Ok(MarkerIndex::new(
            Arc::new(source),
            Arc::new(I18nAttributeExtractor::new()),
            self.filter.clone(),
        ))
    }
}
