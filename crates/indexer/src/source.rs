use crate::error::{IndexerError, Result};
use crate::filter::DocumentFilter;
use crate::model::DocumentId;
use async_trait::async_trait;
use ignore::gitignore::Gitignore;
use ignore::WalkBuilder;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Where documents come from.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Every document currently in the corpus. Eligibility is applied by the caller.
    async fn list(&self) -> Result<Vec<DocumentId>>;

    async fn read(&self, document: &DocumentId) -> Result<String>;

    /// Whether a glob-eligible document belongs to the corpus. Checked before
    /// every save so that updates agree with what a fresh [`list`](Self::list)
    /// would return.
    async fn admits(&self, _document: &DocumentId) -> bool {
        true
    }
}

/// Documents on disk below a root directory.
pub struct FsDocumentSource {
    root: PathBuf,
    filter: DocumentFilter,
    respect_gitignore: bool,
}

impl FsDocumentSource {
    pub fn new(root: impl AsRef<Path>, filter: DocumentFilter) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(IndexerError::InvalidPath(format!(
                "Corpus root is not a directory: {}",
                root.display()
            )));
        }
        Ok(Self {
            root,
            filter,
            respect_gitignore: true,
        })
    }

    #[must_use]
    pub const fn respect_gitignore(mut self, respect: bool) -> Self {
        self.respect_gitignore = respect;
        self
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl DocumentSource for FsDocumentSource {
    async fn list(&self) -> Result<Vec<DocumentId>> {
        let root = self.root.clone();
        let filter = self.filter.clone();
        let respect_gitignore = self.respect_gitignore;
        Ok(tokio::task::spawn_blocking(move || walk(&root, &filter, respect_gitignore)).await?)
    }

    async fn read(&self, document: &DocumentId) -> Result<String> {
        let path = self.root.join(document.as_str());
        Ok(tokio::fs::read_to_string(&path).await?)
    }

    async fn admits(&self, document: &DocumentId) -> bool {
        let root = self.root.clone();
        let document = document.clone();
        let respect_gitignore = self.respect_gitignore;
        match tokio::task::spawn_blocking(move || !is_ignored(&root, &document, respect_gitignore))
            .await
        {
            Ok(admitted) => admitted,
            Err(err) => {
                log::warn!("Ignore-file check failed: {err}");
                true
            }
        }
    }
}

fn walk(root: &Path, filter: &DocumentFilter, respect_gitignore: bool) -> Vec<DocumentId> {
    let walker = WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(respect_gitignore)
        .git_global(respect_gitignore)
        .git_exclude(respect_gitignore)
        .require_git(false)
        .build();

    let mut documents = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                log::warn!("Skipping unreadable entry: {err}");
                continue;
            }
        };
        if !entry.file_type().is_some_and(|ft| ft.is_file()) {
            continue;
        }
        if let Some(document) = filter.document_for_path(root, entry.path()) {
            documents.push(document);
        }
    }
    documents.sort();
    documents
}

/// Applies the ignore files the walk in [`walk`] honours, closest directory
/// first: `.ignore` always, `.gitignore` when `respect_gitignore` is set.
fn is_ignored(root: &Path, document: &DocumentId, respect_gitignore: bool) -> bool {
    let path = root.join(document.as_str());
    let mut names = vec![".ignore"];
    if respect_gitignore {
        names.push(".gitignore");
    }

    for dir in path.ancestors().skip(1).take_while(|dir| dir.starts_with(root)) {
        for name in &names {
            let file = dir.join(name);
            if !file.is_file() {
                continue;
            }
            let (matcher, err) = Gitignore::new(&file);
            if let Some(err) = err {
                log::debug!("Partially parsed {}: {err}", file.display());
            }
            let matched = matcher.matched_path_or_any_parents(&path, false);
            if matched.is_ignore() {
                return true;
            }
            if matched.is_whitelist() {
                return false;
            }
        }
    }
    false
}

/// In-memory documents, e.g. unsaved editor buffers.
#[derive(Clone, Default)]
pub struct MemoryDocumentSource {
    documents: Arc<Mutex<BTreeMap<DocumentId, String>>>,
}

impl MemoryDocumentSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, document: impl Into<DocumentId>, text: impl Into<String>) {
        self.lock().insert(document.into(), text.into());
    }

    pub fn remove(&self, document: &str) -> Option<String> {
        self.lock().remove(document)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<DocumentId, String>> {
        self.documents
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl DocumentSource for MemoryDocumentSource {
    async fn list(&self) -> Result<Vec<DocumentId>> {
        Ok(self.lock().keys().cloned().collect())
    }

    async fn read(&self, document: &DocumentId) -> Result<String> {
        self.lock().get(document).cloned().ok_or_else(|| {
            IndexerError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no such document: {document}"),
            ))
        })
    }
}
