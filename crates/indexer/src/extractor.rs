use crate::model::{Document, Occurrence};

/// Turns one document into its ordered occurrence records.
///
/// Implementations must be pure: no I/O, no shared state. Problems found in the
/// document are reported as `warning`/`error` occurrences, never as failures.
pub trait Extractor: Send + Sync {
    fn extract(&self, document: &Document) -> Vec<Occurrence>;
}

impl<F> Extractor for F
where
    F: Fn(&Document) -> Vec<Occurrence> + Send + Sync,
{
    fn extract(&self, document: &Document) -> Vec<Occurrence> {
        self(document)
    }
}
