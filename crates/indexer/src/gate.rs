use crate::model::DocumentId;
use std::collections::VecDeque;

/// A change reported for one document, or for a directory of documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Saved(DocumentId),
    Removed(DocumentId),
    /// A directory left the corpus; carries its path relative to the root.
    RemovedDirectory(DocumentId),
}

impl Notification {
    #[must_use]
    pub const fn document(&self) -> &DocumentId {
        match self {
            Self::Saved(document) | Self::Removed(document) | Self::RemovedDirectory(document) => {
                document
            }
        }
    }
}

/// Holds notifications that arrive before the first snapshot is published.
///
/// Released in arrival order exactly once, by the update loop, right after the
/// initial snapshot goes out.
#[derive(Debug, Default)]
pub(crate) struct ReadinessGate {
    held: VecDeque<Notification>,
}

impl ReadinessGate {
    pub(crate) fn hold(&mut self, notification: Notification) {
        self.held.push_back(notification);
    }

    pub(crate) fn release(&mut self) -> impl Iterator<Item = Notification> {
        std::mem::take(&mut self.held).into_iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.held.len()
    }
}
