//! Just enough tag scanning to locate markers in HTML-like templates.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};

static OPEN_TAG_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"<([A-Za-z][A-Za-z0-9:_.-]*)((?:\s+[^\s=/>"']+(?:\s*=\s*(?:"[^"]*"|'[^']*'|[^\s"'=<>`]+))?)*)\s*(/?)>"#,
    )
    .expect("open tag regex")
});

static ATTRIBUTE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"([^\s=/>"']+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
        .expect("attribute regex")
});

static COMMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").expect("comment regex"));

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Attribute {
    pub name: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct OpenTag {
    pub name: String,
    pub attributes: Vec<Attribute>,
    /// Byte offset of `<`.
    pub start: usize,
    /// Byte offset just past `>`.
    pub end: usize,
    pub self_closing: bool,
}

impl OpenTag {
    pub(crate) fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|attr| attr.name.eq_ignore_ascii_case(name))
    }

    pub(crate) fn has_content(&self) -> bool {
        !self.self_closing
            && !VOID_ELEMENTS
                .iter()
                .any(|void| self.name.eq_ignore_ascii_case(void))
    }
}

/// Blanks out comments so markers inside them are not seen. Byte offsets and
/// line breaks are kept.
pub(crate) fn mask_comments(text: &str) -> String {
    COMMENT_RE
        .replace_all(text, |caps: &regex::Captures<'_>| {
            caps[0]
                .bytes()
                .map(|b| if b == b'\n' { '\n' } else { ' ' })
                .collect::<String>()
        })
        .into_owned()
}

pub(crate) fn open_tags(text: &str) -> Vec<OpenTag> {
    OPEN_TAG_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let name = caps.get(1)?.as_str().to_string();
            let attributes = caps
                .get(2)
                .map(|raw| parse_attributes(raw.as_str()))
                .unwrap_or_default();
            Some(OpenTag {
                name,
                attributes,
                start: whole.start(),
                end: whole.end(),
                self_closing: caps.get(3).is_some_and(|m| !m.as_str().is_empty()),
            })
        })
        .collect()
}

fn parse_attributes(raw: &str) -> Vec<Attribute> {
    ATTRIBUTE_RE
        .captures_iter(raw)
        .filter_map(|caps| {
            let name = caps.get(1)?.as_str().to_string();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| m.as_str().to_string());
            Some(Attribute { name, value })
        })
        .collect()
}

/// Byte range of the element's content, i.e. up to its matching close tag.
pub(crate) fn element_content(text: &str, tag: &OpenTag) -> Option<(usize, usize)> {
    let pattern = format!(r"<(/?){}(?:\s[^>]*)?>", regex::escape(&tag.name));
    let same_name = RegexBuilder::new(&pattern)
        .case_insensitive(true)
        .build()
        .ok()?;

    let mut depth = 1usize;
    for found in same_name.captures_iter(&text[tag.end..]) {
        let whole = found.get(0)?;
        let closing = found.get(1).is_some_and(|m| !m.as_str().is_empty());
        if closing {
            depth -= 1;
            if depth == 0 {
                return Some((tag.end, tag.end + whole.start()));
            }
        } else if !whole.as_str().ends_with("/>") {
            depth += 1;
        }
    }
    None
}

/// 1-based line and character column of a byte offset.
pub(crate) fn line_column(text: &str, offset: usize) -> (usize, usize) {
    let before = &text[..offset.min(text.len())];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |idx| idx + 1);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_tags_capture_attributes_in_every_quoting_style() {
        let tags = open_tags(r#"<div a="1" b='2' c=3 d><br/></div>"#);
        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].name, "div");
        let values: Vec<_> = tags[0]
            .attributes
            .iter()
            .map(|a| (a.name.as_str(), a.value.as_deref()))
            .collect();
        assert_eq!(
            values,
            vec![("a", Some("1")), ("b", Some("2")), ("c", Some("3")), ("d", None)]
        );
        assert!(tags[1].self_closing);
        assert!(!tags[1].has_content());
    }

    #[test]
    fn element_content_skips_nested_elements_of_the_same_name() {
        let text = "<span i18n>a <span>b</span> c</span> tail";
        let tags = open_tags(text);
        let (start, end) = element_content(text, &tags[0]).unwrap();
        assert_eq!(&text[start..end], "a <span>b</span> c");
    }

    #[test]
    fn element_content_is_none_without_a_close_tag() {
        let text = "<p i18n>never closed";
        let tags = open_tags(text);
        assert_eq!(element_content(text, &tags[0]), None);
    }

    #[test]
    fn comments_are_masked_in_place() {
        let text = "a<!-- <p i18n>\n é -->b";
        let masked = mask_comments(text);
        assert_eq!(masked.len(), text.len());
        assert_eq!(masked.matches('\n').count(), 1);
        assert!(open_tags(&masked).is_empty());
    }

    #[test]
    fn line_column_counts_characters() {
        let text = "ab\nçd<p>";
        assert_eq!(line_column(text, 0), (1, 1));
        assert_eq!(line_column(text, text.find("<p>").unwrap()), (2, 3));
    }
}
