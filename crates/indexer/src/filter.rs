use crate::config::IndexerConfig;
use crate::error::Result;
use crate::model::DocumentId;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::Path;

/// The eligible-file criterion shared by the scan, save notifications and the watcher.
#[derive(Debug, Clone)]
pub struct DocumentFilter {
    include: GlobSet,
    exclude: GlobSet,
}

impl DocumentFilter {
    pub fn new<S: AsRef<str>>(include: &[S], exclude: &[S]) -> Result<Self> {
        Ok(Self {
            include: compile(include)?,
            exclude: compile(exclude)?,
        })
    }

    pub fn from_config(config: &IndexerConfig) -> Result<Self> {
        Self::new(&config.include, &config.exclude)
    }

    #[must_use]
    pub fn is_eligible(&self, document: &DocumentId) -> bool {
        let path = document.as_str();
        !path.is_empty() && self.include.is_match(path) && !self.exclude.is_match(path)
    }

    /// Maps an absolute path under `root` to its eligible document id.
    #[must_use]
    pub fn document_for_path(&self, root: &Path, path: &Path) -> Option<DocumentId> {
        let relative = path.strip_prefix(root).ok()?;
        let document = DocumentId::new(relative.to_string_lossy());
        self.is_eligible(&document).then_some(document)
    }
}

impl Default for DocumentFilter {
    fn default() -> Self {
        let config = IndexerConfig::default();
        Self::from_config(&config).unwrap_or_else(|_| Self {
            include: GlobSet::empty(),
            exclude: GlobSet::empty(),
        })
    }
}

fn compile<S: AsRef<str>>(globs: &[S]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for glob in globs {
        let glob = glob.as_ref().trim();
        if glob.is_empty() {
            continue;
        }
        builder.add(GlobBuilder::new(glob).literal_separator(true).build()?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn default_filter_accepts_html_outside_vendor_dirs() {
        let filter = DocumentFilter::default();
        assert!(filter.is_eligible(&"a.html".into()));
        assert!(filter.is_eligible(&"src/app/page.html".into()));
        assert!(!filter.is_eligible(&"src/app/page.ts".into()));
        assert!(!filter.is_eligible(&"node_modules/lib/x.html".into()));
        assert!(!filter.is_eligible(&"web/dist/index.html".into()));
    }

    #[test]
    fn single_star_does_not_cross_directories() {
        let filter = DocumentFilter::new(&["src/*.html"], &[]).unwrap();
        assert!(filter.is_eligible(&"src/a.html".into()));
        assert!(!filter.is_eligible(&"src/nested/a.html".into()));
    }

    #[test]
    fn paths_outside_root_are_rejected() {
        let filter = DocumentFilter::default();
        let root = PathBuf::from("/corpus");
        assert_eq!(
            filter.document_for_path(&root, &root.join("pages/a.html")),
            Some(DocumentId::new("pages/a.html"))
        );
        assert_eq!(filter.document_for_path(&root, Path::new("/elsewhere/a.html")), None);
    }
}
