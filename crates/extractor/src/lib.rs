//! # Marker Extractor
//!
//! Finds `i18n` translation markers in HTML-like templates and reports them as
//! [`marker_indexer::Occurrence`] records for the marker index.
//!
//! ```
//! use marker_extractor::I18nAttributeExtractor;
//! use marker_indexer::{Document, Extractor};
//!
//! let document = Document::new("a.html", r#"<h1 i18n="@@title">Hello</h1>"#);
//! let found = I18nAttributeExtractor::new().extract(&document);
//! assert_eq!(found[0].id, "title");
//! assert_eq!(found[0].value.as_deref(), Some("Hello"));
//! ```

mod html;
mod i18n;

pub use i18n::{I18nAttributeExtractor, MISSING_VALUE_MESSAGE, UNCLOSED_ELEMENT_MESSAGE};
