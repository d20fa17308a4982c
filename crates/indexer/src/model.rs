use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Root-relative, `/`-separated identifier of one document in the corpus.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Arc<str>);

impl DocumentId {
    pub fn new(raw: impl AsRef<str>) -> Self {
        let mut value = raw.as_ref().trim().replace('\\', "/");
        while let Some(rest) = value.strip_prefix("./") {
            value = rest.to_string();
        }
        Self(Arc::from(value.trim_start_matches('/')))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for DocumentId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl Borrow<str> for DocumentId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// One parsed document handed to an extractor.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: DocumentId,
    pub text: String,
}

impl Document {
    pub fn new(id: impl Into<DocumentId>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccurrenceState {
    Success,
    Warning,
    Error,
}

/// Where an occurrence sits inside its document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// 1-based.
    pub line: usize,
    /// 1-based, counted in characters.
    pub column: usize,
    pub offset: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

/// One use of a translation identifier inside one document.
///
/// `error` is present exactly when `state` is not [`OccurrenceState::Success`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub state: OccurrenceState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub location: Location,
}

impl Occurrence {
    pub fn success(id: impl Into<String>, value: Option<String>, location: Location) -> Self {
        Self {
            id: id.into(),
            value,
            state: OccurrenceState::Success,
            error: None,
            location,
        }
    }

    pub fn warning(
        id: impl Into<String>,
        value: Option<String>,
        location: Location,
        message: impl Into<String>,
    ) -> Self {
        Self::success(id, value, location).escalate(OccurrenceState::Warning, message)
    }

    pub fn error(
        id: impl Into<String>,
        value: Option<String>,
        location: Location,
        message: impl Into<String>,
    ) -> Self {
        Self::success(id, value, location).escalate(OccurrenceState::Error, message)
    }

    /// Overwrites state and message. A `Success` target is ignored so the
    /// `error` field never goes out of sync with the state.
    #[must_use]
    pub fn escalate(mut self, state: OccurrenceState, message: impl Into<String>) -> Self {
        if state != OccurrenceState::Success {
            self.state = state;
            self.error = Some(message.into());
        }
        self
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.state == OccurrenceState::Success
    }
}

/// An occurrence tagged with the document that owns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedOccurrence {
    pub document: DocumentId,
    #[serde(flatten)]
    pub occurrence: Occurrence,
}
