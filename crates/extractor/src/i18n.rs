use crate::html::{element_content, line_column, mask_comments, open_tags, OpenTag};
use marker_indexer::{Document, Extractor, Location, Occurrence};

pub const MISSING_VALUE_MESSAGE: &str = "This translation has no value!";
pub const UNCLOSED_ELEMENT_MESSAGE: &str = "Could not find the closing tag for this element!";

const MARKER_ATTRIBUTE: &str = "i18n";
const ATTRIBUTE_MARKER_PREFIX: &str = "i18n-";
const CUSTOM_ID_SEPARATOR: &str = "@@";

/// Extracts `i18n` / `i18n-<attr>` markers carrying an `@@id` custom id.
///
/// ```text
/// <h1 i18n="site header|An introduction header@@introHeader">Hello i18n!</h1>
/// <img [src]="logo" i18n-title="@@logoTitle" title="Angular logo" />
/// ```
///
/// Markers without a custom id are not reported.
#[derive(Debug, Clone, Copy, Default)]
pub struct I18nAttributeExtractor;

impl I18nAttributeExtractor {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Extractor for I18nAttributeExtractor {
    fn extract(&self, document: &Document) -> Vec<Occurrence> {
        let text = mask_comments(&document.text);
        let mut occurrences = Vec::new();

        for tag in open_tags(&text) {
            for attribute in &tag.attributes {
                let name = attribute.name.to_ascii_lowercase();
                let Some(id) = attribute.value.as_deref().and_then(custom_id) else {
                    if name == MARKER_ATTRIBUTE || name.starts_with(ATTRIBUTE_MARKER_PREFIX) {
                        log::trace!("{}: marker without custom id on <{}>", document.id, tag.name);
                    }
                    continue;
                };

                if name == MARKER_ATTRIBUTE {
                    occurrences.push(element_marker(&document.text, &text, &tag, id));
                } else if let Some(target) = name.strip_prefix(ATTRIBUTE_MARKER_PREFIX) {
                    if !target.is_empty() {
                        occurrences.push(attribute_marker(&document.text, &tag, id, target));
                    }
                }
            }
        }

        occurrences
    }
}

/// `meaning|description@@id` → `id`.
fn custom_id(marker: &str) -> Option<&str> {
    let (_, id) = marker.split_once(CUSTOM_ID_SEPARATOR)?;
    let id = id.trim();
    (!id.is_empty()).then_some(id)
}

fn location(text: &str, tag: &OpenTag, attribute: Option<&str>) -> Location {
    let (line, column) = line_column(text, tag.start);
    Location {
        line,
        column,
        offset: tag.start,
        tag: Some(tag.name.clone()),
        attribute: attribute.map(str::to_string),
    }
}

fn element_marker(original: &str, masked: &str, tag: &OpenTag, id: &str) -> Occurrence {
    let location = location(original, tag, None);
    if !tag.has_content() {
        return Occurrence::warning(id, None, location, MISSING_VALUE_MESSAGE);
    }
    match element_content(masked, tag) {
        Some((start, end)) => with_value(id, original[start..end].trim(), location),
        None => Occurrence::error(id, None, location, UNCLOSED_ELEMENT_MESSAGE),
    }
}

fn attribute_marker(original: &str, tag: &OpenTag, id: &str, target: &str) -> Occurrence {
    let location = location(original, tag, Some(target));
    let value = tag
        .attribute(target)
        .and_then(|attr| attr.value.as_deref())
        .map(str::trim)
        .unwrap_or_default();
    with_value(id, value, location)
}

fn with_value(id: &str, value: &str, location: Location) -> Occurrence {
    if value.is_empty() {
        Occurrence::warning(id, None, location, MISSING_VALUE_MESSAGE)
    } else {
        Occurrence::success(id, Some(value.to_string()), location)
    }
}
