use crate::model::{DocumentId, Occurrence, OccurrenceState, TaggedOccurrence};
use crate::stats::StateSummary;
use crate::validation::validate;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Document → its occurrences, in document order. Never holds an empty entry.
pub type ByFileView = BTreeMap<DocumentId, Vec<Occurrence>>;

/// Identifier → every occurrence carrying it.
///
/// Buckets are kept sorted by owning document, then by position inside that
/// document, so the same logical content always compares equal no matter in
/// which order documents were (re)indexed.
pub type ByIdView = BTreeMap<String, Vec<TaggedOccurrence>>;

/// One published generation of the index.
///
/// Both views and the derived validated view always come from the same
/// generation. Views are shared behind `Arc` and never mutated after publish.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IndexSnapshot {
    pub generation: u64,
    pub by_file: Arc<ByFileView>,
    pub by_id: Arc<ByIdView>,
    pub validated: Arc<ByIdView>,
}

impl IndexSnapshot {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds the views in one pass over a full set of extracted documents.
    pub fn build<I>(generation: u64, documents: I) -> Self
    where
        I: IntoIterator<Item = (DocumentId, Vec<Occurrence>)>,
    {
        let by_file: ByFileView = documents
            .into_iter()
            .filter(|(_, occurrences)| !occurrences.is_empty())
            .collect();

        let mut by_id = ByIdView::new();
        for (document, occurrences) in &by_file {
            for occurrence in occurrences {
                by_id
                    .entry(occurrence.id.clone())
                    .or_default()
                    .push(TaggedOccurrence {
                        document: document.clone(),
                        occurrence: occurrence.clone(),
                    });
            }
        }

        Self::from_views(generation, by_file, by_id)
    }

    fn from_views(generation: u64, by_file: ByFileView, by_id: ByIdView) -> Self {
        let validated = validate(&by_id);
        Self {
            generation,
            by_file: Arc::new(by_file),
            by_id: Arc::new(by_id),
            validated: Arc::new(validated),
        }
    }

    /// Next generation with `document`'s occurrences replaced by `occurrences`.
    ///
    /// An empty `occurrences` removes the document from both views.
    #[must_use]
    pub fn replace_document(&self, document: &DocumentId, occurrences: Vec<Occurrence>) -> Self {
        let mut by_file = (*self.by_file).clone();
        let mut by_id = (*self.by_id).clone();

        if let Some(previous) = by_file.remove(document) {
            let mut touched: Vec<&str> = previous.iter().map(|o| o.id.as_str()).collect();
            touched.sort_unstable();
            touched.dedup();
            for id in touched {
                let now_empty = match by_id.get_mut(id) {
                    Some(bucket) => {
                        bucket.retain(|tagged| &tagged.document != document);
                        bucket.is_empty()
                    }
                    None => false,
                };
                if now_empty {
                    by_id.remove(id);
                }
            }
        }

        let mut grouped: Vec<(String, Vec<TaggedOccurrence>)> = Vec::new();
        let mut slots: HashMap<&str, usize> = HashMap::new();
        for occurrence in &occurrences {
            let slot = *slots.entry(occurrence.id.as_str()).or_insert_with(|| {
                grouped.push((occurrence.id.clone(), Vec::new()));
                grouped.len() - 1
            });
            grouped[slot].1.push(TaggedOccurrence {
                document: document.clone(),
                occurrence: occurrence.clone(),
            });
        }
        for (id, items) in grouped {
            let bucket = by_id.entry(id).or_default();
            let at = bucket.partition_point(|tagged| &tagged.document < document);
            bucket.splice(at..at, items);
        }

        if !occurrences.is_empty() {
            by_file.insert(document.clone(), occurrences);
        }

        Self::from_views(self.generation + 1, by_file, by_id)
    }

    /// Next generation without any document below `directory`. The empty
    /// directory stands for the corpus root.
    #[must_use]
    pub fn remove_directory(&self, directory: &DocumentId) -> Self {
        let by_file: ByFileView = self
            .by_file
            .iter()
            .filter(|(document, _)| !is_under(directory, document))
            .map(|(document, occurrences)| (document.clone(), occurrences.clone()))
            .collect();
        let mut by_id = (*self.by_id).clone();
        by_id.retain(|_, bucket| {
            bucket.retain(|tagged| !is_under(directory, &tagged.document));
            !bucket.is_empty()
        });
        Self::from_views(self.generation + 1, by_file, by_id)
    }

    /// Indexed documents below `directory`.
    pub fn documents_under<'a>(
        &'a self,
        directory: &'a DocumentId,
    ) -> impl Iterator<Item = &'a DocumentId> + 'a {
        self.by_file
            .keys()
            .filter(move |document| is_under(directory, document))
    }

    #[must_use]
    pub fn occurrences_in(&self, document: &str) -> &[Occurrence] {
        self.by_file.get(document).map_or(&[][..], Vec::as_slice)
    }

    #[must_use]
    pub fn occurrences_of(&self, id: &str) -> &[TaggedOccurrence] {
        self.by_id.get(id).map_or(&[][..], Vec::as_slice)
    }

    #[must_use]
    pub fn validated_of(&self, id: &str) -> &[TaggedOccurrence] {
        self.validated.get(id).map_or(&[][..], Vec::as_slice)
    }

    /// Every validated occurrence that is not `success`.
    pub fn diagnostics(&self) -> impl Iterator<Item = &TaggedOccurrence> {
        self.validated
            .values()
            .flatten()
            .filter(|tagged| !tagged.occurrence.is_success())
    }

    #[must_use]
    pub fn summary(&self) -> StateSummary {
        let mut summary = StateSummary::default();
        for tagged in self.validated.values().flatten() {
            match tagged.occurrence.state {
                OccurrenceState::Success => summary.success += 1,
                OccurrenceState::Warning => summary.warning += 1,
                OccurrenceState::Error => summary.error += 1,
            }
        }
        summary
    }

    /// True when the two views index exactly the same occurrence set.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        if self.by_file.values().any(Vec::is_empty) || self.by_id.values().any(Vec::is_empty) {
            return false;
        }
        let from_files = self.by_file.values().map(Vec::len).sum::<usize>();
        let from_ids = self.by_id.values().map(Vec::len).sum::<usize>();
        if from_files != from_ids {
            return false;
        }
        self.by_file.iter().all(|(document, occurrences)| {
            occurrences.iter().all(|occurrence| {
                let expected = occurrences.iter().filter(|o| *o == occurrence).count();
                let indexed = self
                    .occurrences_of(&occurrence.id)
                    .iter()
                    .filter(|t| &t.document == document && &t.occurrence == occurrence)
                    .count();
                expected == indexed
            })
        })
    }
}

fn is_under(directory: &DocumentId, document: &DocumentId) -> bool {
    let directory = directory.as_str().trim_end_matches('/');
    directory.is_empty()
        || document
            .as_str()
            .strip_prefix(directory)
            .is_some_and(|rest| rest.starts_with('/'))
}
