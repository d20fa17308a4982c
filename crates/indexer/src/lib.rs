//! # Marker Indexer
//!
//! Live index of translation markers across a tree of markup documents.
//!
//! ## Pipeline
//!
//! ```text
//! Corpus root
//!     │
//!     ├──> Initial scan (.gitignore aware, concurrent extraction)
//!     │      └─> generation 1: by-file + by-identifier views
//!     │
//!     ├──> Save / remove notifications
//!     │      ├─> held by the readiness gate until generation 1 is out
//!     │      └─> whole-document replacement, one at a time
//!     │
//!     └──> Validation (on every publish)
//!            └─> validated view: mismatched values → error, markup → warning
//! ```
//!
//! Every publish carries the by-file, by-identifier and validated views of a
//! single generation; subscribers never see views from different generations.
//!
//! ## Example
//!
//! ```no_run
//! use marker_indexer::{DocumentFilter, Document, FsDocumentSource, MarkerIndex, Occurrence};
//! use std::sync::Arc;
//!
//! fn extract(_document: &Document) -> Vec<Occurrence> {
//!     Vec::new()
//! }
//!
//! #[tokio::main]
//! async fn main() -> marker_indexer::Result<()> {
//!     let filter = DocumentFilter::default();
//!     let source = FsDocumentSource::new("/path/to/templates", filter.clone())?;
//!     let index = MarkerIndex::new(Arc::new(source), Arc::new(extract), filter);
//!
//!     if let Some(stats) = index.initialize().wait().await {
//!         println!("Indexed {} occurrences", stats.occurrences);
//!     }
//!
//!     let mut validated = index.subscribe_validated();
//!     while let Some(view) = validated.next().await {
//!         println!("{} identifiers", view.len());
//!     }
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod extractor;
mod filter;
mod gate;
mod index_state;
mod indexer;
mod model;
mod source;
mod stats;
mod stream;
mod validation;
mod views;
mod watcher;

pub use config::{IndexerConfig, WatcherConfig, CONFIG_FILE_NAME};
pub use error::{IndexerError, Result};
pub use extractor::Extractor;
pub use filter::DocumentFilter;
pub use gate::Notification;
pub use index_state::{EngineState, EngineStatus};
pub use indexer::{MarkerIndex, ReadySignal};
pub use model::{Document, DocumentId, Location, Occurrence, OccurrenceState, TaggedOccurrence};
pub use source::{DocumentSource, FsDocumentSource, MemoryDocumentSource};
pub use stats::{ScanStats, StateSummary};
pub use stream::ViewStream;
pub use validation::{normalize_value, validate, HTML_TAG_MESSAGE, MISMATCH_MESSAGE};
pub use views::{ByFileView, ByIdView, IndexSnapshot};
pub use watcher::SaveWatcher;
