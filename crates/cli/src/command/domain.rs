use marker_indexer::{IndexSnapshot, OccurrenceState, StateSummary, TaggedOccurrence};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ViewKind {
    ByFile,
    ById,
    Validated,
}

/// One non-success translation, flattened for output.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub document: String,
    pub line: usize,
    pub column: usize,
    pub id: String,
    pub state: OccurrenceState,
    pub message: String,
}

impl Diagnostic {
    pub fn from_tagged(tagged: &TaggedOccurrence) -> Self {
        let occurrence = &tagged.occurrence;
        Self {
            document: tagged.document.to_string(),
            line: occurrence.location.line,
            column: occurrence.location.column,
            id: occurrence.id.clone(),
            state: occurrence.state,
            message: occurrence.error.clone().unwrap_or_default(),
        }
    }

    pub fn render(&self) -> String {
        let level = match self.state {
            OccurrenceState::Error => "error",
            OccurrenceState::Warning => "warning",
            OccurrenceState::Success => "ok",
        };
        format!(
            "{}:{}:{}: {level} [{}] {}",
            self.document, self.line, self.column, self.id, self.message
        )
    }
}

#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub generation: u64,
    pub summary: StateSummary,
    pub diagnostics: Vec<Diagnostic>,
}

impl CheckReport {
    pub fn from_snapshot(snapshot: &IndexSnapshot) -> Self {
        let mut diagnostics: Vec<Diagnostic> =
            snapshot.diagnostics().map(Diagnostic::from_tagged).collect();
        diagnostics.sort_by(|a, b| {
            (a.document.as_str(), a.line, a.column, a.id.as_str())
                .cmp(&(b.document.as_str(), b.line, b.column, b.id.as_str()))
        });
        Self {
            generation: snapshot.generation,
            summary: snapshot.summary(),
            diagnostics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marker_indexer::{DocumentId, Location, Occurrence};

    #[test]
    fn diagnostics_render_like_compiler_output() {
        let tagged = TaggedOccurrence {
            document: DocumentId::new("app/a.html"),
            occurrence: Occurrence::warning(
                "bold",
                Some("<b>x</b>".to_string()),
                Location {
                    line: 3,
                    column: 5,
                    ..Location::default()
                },
                "markup",
            ),
        };
        assert_eq!(
            Diagnostic::from_tagged(&tagged).render(),
            "app/a.html:3:5: warning [bold] markup"
        );
    }
}
