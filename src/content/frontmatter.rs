//! Front-matter parsing

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_yaml::{Mapping, Value};

/// Line that opens and closes a front-matter block
const MARKER: &str = "---";

/// Template used by pages that do not declare one
pub const DEFAULT_PAGE_TEMPLATE: &str = "page.html";

#[derive(thiserror::Error, Debug)]
pub enum FrontmatterError {
    #[error("front-matter block has no closing `---` line")]
    Unterminated,

    #[error("front-matter block is not valid YAML")]
    Yaml(#[from] serde_yaml::Error),
}

/// Untyped front-matter of a document: the YAML mapping between the markers
#[derive(Debug, Clone, Default)]
pub struct FrontMatter {
    fields: Mapping,
}

impl FrontMatter {
    /// Parse front-matter from content string
    /// Returns (front_matter, remaining_content)
    ///
    /// A document that does not open with a `---` line has no front-matter and
    /// is returned whole as the body.
    pub fn parse(content: &str) -> Result<(Self, &str), FrontmatterError> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);

        let Some(rest) = strip_opening_marker(content) else {
            return Ok((FrontMatter::default(), content));
        };

        let mut offset = 0;
        for line in rest.split_inclusive('\n') {
            if line.trim_end_matches(['\n', '\r']) == MARKER {
                let yaml = &rest[..offset];
                let body = &rest[offset + line.len()..];
                return Ok((Self::from_yaml(yaml)?, body));
            }
            offset += line.len();
        }

        Err(FrontmatterError::Unterminated)
    }

    fn from_yaml(yaml: &str) -> Result<Self, FrontmatterError> {
        if yaml.trim().is_empty() {
            return Ok(FrontMatter::default());
        }

        match serde_yaml::from_str::<Value>(yaml)? {
            Value::Mapping(fields) => Ok(Self { fields }),
            other => {
                tracing::debug!("Ignoring non-mapping front-matter: {:?}", other);
                Ok(FrontMatter::default())
            }
        }
    }

    /// Raw value of a key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// A scalar field as a string; numbers and booleans are coerced,
    /// anything else reads as absent
    pub fn string(&self, key: &str) -> Option<String> {
        self.get(key).and_then(scalar_to_string)
    }

    /// A list of strings, or a single scalar read as a one-element list
    pub fn string_list(&self, key: &str) -> Vec<String> {
        match self.get(key) {
            Some(Value::Sequence(items)) => items.iter().filter_map(scalar_to_string).collect(),
            Some(value) => scalar_to_string(value).into_iter().collect(),
            None => Vec::new(),
        }
    }

    /// A date field; unparseable dates read as absent
    pub fn date(&self, key: &str) -> Option<NaiveDateTime> {
        self.string(key).and_then(|s| parse_date_string(&s))
    }
}

/// Metadata recognised on posts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostMatter {
    pub title: String,
    pub date: Option<NaiveDateTime>,
    pub tags: Vec<String>,
    pub summary: String,
    pub image: Option<String>,
}

impl From<&FrontMatter> for PostMatter {
    fn from(fm: &FrontMatter) -> Self {
        Self {
            title: fm.string("title").unwrap_or_default(),
            date: fm.date("date"),
            tags: fm.string_list("tags"),
            summary: fm.string("summary").unwrap_or_default(),
            image: fm.string("image").filter(|s| !s.trim().is_empty()),
        }
    }
}

/// Metadata recognised on pages
#[derive(Debug, Clone, PartialEq)]
pub struct PageMatter {
    pub title: String,
    pub description: String,
    pub template: String,
}

impl From<&FrontMatter> for PageMatter {
    fn from(fm: &FrontMatter) -> Self {
        Self {
            title: fm.string("title").unwrap_or_default(),
            description: fm.string("description").unwrap_or_default(),
            template: fm
                .string("template")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_PAGE_TEMPLATE.to_string()),
        }
    }
}

/// Returns the text after the opening marker line, if the document has one
fn strip_opening_marker(content: &str) -> Option<&str> {
    let (first, rest) = match content.find('\n') {
        Some(pos) => (&content[..pos], &content[pos + 1..]),
        None => (content, ""),
    };
    (first.trim_end_matches('\r') == MARKER).then_some(rest)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Parse a date string in various formats
fn parse_date_string(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }

    let datetime_formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
    ];
    for fmt in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_yaml_frontmatter() {
        let content = r#"---
title: Hello World
date: 2024-01-15 10:30:00
tags:
  - rust
  - web
summary: A first post
image: /img/cover.png
---

This is the content.
"#;

        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        let matter = PostMatter::from(&fm);
        assert_eq!(matter.title, "Hello World");
        assert_eq!(
            matter.date.unwrap().format("%Y-%m-%d %H:%M").to_string(),
            "2024-01-15 10:30"
        );
        assert_eq!(matter.tags, vec!["rust", "web"]);
        assert_eq!(matter.summary, "A first post");
        assert_eq!(matter.image.as_deref(), Some("/img/cover.png"));
        assert_eq!(remaining, "\nThis is the content.\n");
    }

    #[test]
    fn test_omitted_fields_take_zero_values() {
        let (fm, _) = FrontMatter::parse("---\ntitle: Only a title\n---\nbody").unwrap();
        let matter = PostMatter::from(&fm);
        assert_eq!(matter.title, "Only a title");
        assert_eq!(matter.date, None);
        assert!(matter.tags.is_empty());
        assert_eq!(matter.summary, "");
        assert_eq!(matter.image, None);

        let page = PageMatter::from(&fm);
        assert_eq!(page.description, "");
        assert_eq!(page.template, DEFAULT_PAGE_TEMPLATE);
    }

    #[test]
    fn test_no_marker_is_all_body() {
        let content = "# Just markdown\n\ntitle: not metadata\n";
        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert!(fm.is_empty());
        assert_eq!(remaining, content);

        let (fm, remaining) = FrontMatter::parse("").unwrap();
        assert!(fm.is_empty());
        assert_eq!(remaining, "");
    }

    #[test]
    fn test_marker_must_open_the_document() {
        let content = "Intro\n---\ntitle: x\n---\n";
        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert!(fm.is_empty());
        assert_eq!(remaining, content);
    }

    #[test]
    fn test_unterminated_block_fails() {
        let err = FrontMatter::parse("---\ntitle: Oops\n\nNo closing marker").unwrap_err();
        assert!(matches!(err, FrontmatterError::Unterminated));

        let err = FrontMatter::parse("---").unwrap_err();
        assert!(matches!(err, FrontmatterError::Unterminated));
    }

    #[test]
    fn test_invalid_yaml_fails() {
        let err = FrontMatter::parse("---\ntitle: [unclosed\n---\nbody").unwrap_err();
        assert!(matches!(err, FrontmatterError::Yaml(_)));
    }

    #[test]
    fn test_wrong_types_are_tolerated() {
        let content = r#"---
title: [not, a, string]
date: someday
tags: 42
summary: true
unknown_key: whatever
---
body"#;
        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        let matter = PostMatter::from(&fm);
        assert_eq!(matter.title, "");
        assert_eq!(matter.date, None);
        assert_eq!(matter.tags, vec!["42"]);
        assert_eq!(matter.summary, "true");
        assert_eq!(remaining, "body");
    }

    #[test]
    fn test_single_string_tags() {
        let (fm, _) = FrontMatter::parse("---\ntags: Notes\n---\n").unwrap();
        assert_eq!(PostMatter::from(&fm).tags, vec!["Notes"]);
    }

    #[test]
    fn test_crlf_and_bom() {
        let content = "\u{feff}---\r\ntitle: Windows\r\n---\r\nBody\r\n";
        let (fm, remaining) = FrontMatter::parse(content).unwrap();
        assert_eq!(PostMatter::from(&fm).title, "Windows");
        assert_eq!(remaining, "Body\r\n");
    }

    #[test]
    fn test_empty_and_scalar_blocks() {
        let (fm, remaining) = FrontMatter::parse("---\n---\nBody").unwrap();
        assert!(fm.is_empty());
        assert_eq!(remaining, "Body");

        let (fm, _) = FrontMatter::parse("---\njust a string\n---\nBody").unwrap();
        assert!(fm.is_empty());
    }

    #[test]
    fn test_page_matter() {
        let (fm, _) =
            FrontMatter::parse("---\ntitle: About\ntemplate: about.html\n---\n").unwrap();
        let page = PageMatter::from(&fm);
        assert_eq!(page.title, "About");
        assert_eq!(page.template, "about.html");
    }

    #[test]
    fn test_parse_date_formats() {
        let expect = |s: &str, want: &str| {
            let dt = parse_date_string(s).unwrap();
            assert_eq!(dt.format("%Y-%m-%d %H:%M").to_string(), want, "input {s}");
        };
        expect("2024-01-01", "2024-01-01 00:00");
        expect("2024/02/03", "2024-02-03 00:00");
        expect("2024-01-15 10:30", "2024-01-15 10:30");
        expect("2024-01-15T10:30:00", "2024-01-15 10:30");
        expect("2024-01-15T10:30:00+02:00", "2024-01-15 10:30");
        assert!(parse_date_string("January").is_none());
    }
}
