//! Derived validation of the by-identifier view.
//!
//! Two passes, in this order:
//!
//! 1. consistency: every bucket with two or more occurrences whose normalized
//!    values disagree is marked `error` as a whole;
//! 2. shape: surviving `success` occurrences whose raw value contains markup
//!    are marked `warning`.
//!
//! The input view is never touched; a new view is returned.

use crate::model::{OccurrenceState, TaggedOccurrence};
use crate::views::ByIdView;
use once_cell::sync::Lazy;
use regex::Regex;

pub const MISMATCH_MESSAGE: &str =
    "There are other items registered with this ID whose value do not match!";
pub const HTML_TAG_MESSAGE: &str = "This translation contains HTML tag. This is not recommended!";

const PLACEHOLDER_TOKEN: &str = "{}";

static PLACEHOLDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{.*?\}\}").expect("placeholder regex"));
static SPACES_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r" {2,}").expect("spaces regex"));

/// Canonical form of a value, used only for equality.
#[must_use]
pub fn normalize_value(value: &str) -> String {
    let without_newlines: String = value.chars().filter(|c| !matches!(c, '\n' | '\r')).collect();
    let placeholders = PLACEHOLDER_RE.replace_all(&without_newlines, PLACEHOLDER_TOKEN);
    SPACES_RE.replace_all(&placeholders, " ").into_owned()
}

#[must_use]
pub fn validate(view: &ByIdView) -> ByIdView {
    view.iter()
        .map(|(id, bucket)| (id.clone(), validate_bucket(bucket)))
        .collect()
}

fn validate_bucket(bucket: &[TaggedOccurrence]) -> Vec<TaggedOccurrence> {
    let mismatch = has_value_mismatch(bucket);

    bucket
        .iter()
        .map(|tagged| {
            let mut tagged = tagged.clone();
            if mismatch {
                tagged.occurrence.state = OccurrenceState::Error;
                tagged.occurrence.error = Some(MISMATCH_MESSAGE.to_string());
            } else if tagged.occurrence.is_success() && contains_markup(&tagged) {
                tagged.occurrence.state = OccurrenceState::Warning;
                tagged.occurrence.error = Some(HTML_TAG_MESSAGE.to_string());
            }
            tagged
        })
        .collect()
}

fn has_value_mismatch(bucket: &[TaggedOccurrence]) -> bool {
    let Some((first, rest)) = bucket.split_first() else {
        return false;
    };
    if rest.is_empty() {
        return false;
    }
    let reference = normalized(first);
    rest.iter().any(|tagged| normalized(tagged) != reference)
}

fn normalized(tagged: &TaggedOccurrence) -> Option<String> {
    tagged.occurrence.value.as_deref().map(normalize_value)
}

fn contains_markup(tagged: &TaggedOccurrence) -> bool {
    tagged
        .occurrence
        .value
        .as_deref()
        .is_some_and(|value| value.contains('<'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DocumentId, Location, Occurrence};
    use pretty_assertions::assert_eq;

    fn tagged(doc: &str, id: &str, value: Option<&str>) -> TaggedOccurrence {
        TaggedOccurrence {
            document: DocumentId::new(doc),
            occurrence: Occurrence::success(id, value.map(str::to_string), Location::default()),
        }
    }

    fn view(items: Vec<TaggedOccurrence>) -> ByIdView {
        let mut view = ByIdView::new();
        for item in items {
            view.entry(item.occurrence.id.clone()).or_default().push(item);
        }
        view
    }

    fn states(view: &ByIdView, id: &str) -> Vec<(OccurrenceState, Option<String>)> {
        view[id]
            .iter()
            .map(|t| (t.occurrence.state, t.occurrence.error.clone()))
            .collect()
    }

    #[test]
    fn normalization_collapses_placeholders_newlines_and_spaces() {
        assert_eq!(normalize_value("Hi {{name}}"), "Hi {}");
        assert_eq!(normalize_value("Hi {{ other.value }}"), "Hi {}");
        assert_eq!(normalize_value("Hello\n   world"), "Hello world");
        assert_eq!(normalize_value("a  {{x}}   b"), "a {} b");
    }

    #[test]
    fn equal_after_normalization_is_not_an_error() {
        let input = view(vec![
            tagged("a.html", "welcome", Some("Hi {{name}}")),
            tagged("b.html", "welcome", Some("Hi {{other}}")),
        ]);
        let out = validate(&input);
        assert_eq!(
            states(&out, "welcome"),
            vec![(OccurrenceState::Success, None), (OccurrenceState::Success, None)]
        );
    }

    #[test]
    fn mismatch_marks_the_whole_bucket() {
        let input = view(vec![
            tagged("a.html", "welcome", Some("Hi {{name}}")),
            tagged("b.html", "welcome", Some("Hi {{name}}")),
            tagged("c.html", "welcome", Some("Bye {{name}}")),
        ]);
        let out = validate(&input);
        let expected = (OccurrenceState::Error, Some(MISMATCH_MESSAGE.to_string()));
        assert_eq!(states(&out, "welcome"), vec![expected.clone(), expected.clone(), expected]);
    }

    #[test]
    fn missing_value_differs_from_present_value() {
        let input = view(vec![
            tagged("a.html", "k", None),
            tagged("b.html", "k", Some("text")),
        ]);
        let out = validate(&input);
        assert!(out["k"].iter().all(|t| t.occurrence.state == OccurrenceState::Error));
    }

    #[test]
    fn markup_escalates_lone_success_to_warning() {
        let input = view(vec![tagged("a.html", "bold", Some("<b>Hello</b>"))]);
        let out = validate(&input);
        assert_eq!(
            states(&out, "bold"),
            vec![(OccurrenceState::Warning, Some(HTML_TAG_MESSAGE.to_string()))]
        );
    }

    #[test]
    fn markup_does_not_downgrade_consistency_errors() {
        let input = view(vec![
            tagged("a.html", "bold", Some("<b>Hello</b>")),
            tagged("b.html", "bold", Some("<i>Hello</i>")),
        ]);
        let out = validate(&input);
        assert!(out["bold"]
            .iter()
            .all(|t| t.occurrence.error.as_deref() == Some(MISMATCH_MESSAGE)));
    }

    #[test]
    fn extractor_states_survive_when_nothing_fires() {
        let mut item = tagged("a.html", "k", Some("plain"));
        item.occurrence = item
            .occurrence
            .escalate(OccurrenceState::Error, "broken markup");
        let out = validate(&view(vec![item.clone()]));
        assert_eq!(out["k"], vec![item]);
    }

    #[test]
    fn input_view_is_untouched() {
        let input = view(vec![
            tagged("a.html", "k", Some("one")),
            tagged("b.html", "k", Some("two")),
        ]);
        let before = input.clone();
        let _ = validate(&input);
        assert_eq!(input, before);
    }
}
