//! Markdown rendering with syntax highlighting
//!
//! Besides converting markdown to HTML this module computes the fields that
//! are derived from a document's source or rendered output: reading time,
//! normalized tags, slug and URL.

use indexmap::IndexSet;
use lazy_static::lazy_static;
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, LinkType, Options, Parser, Tag, TagEnd};
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use syntect::highlighting::ThemeSet;
use syntect::html::{css_for_theme_with_class_style, ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use crate::config::DEFAULT_HIGHLIGHT_THEME;

/// Reading speed used for `reading_time`
pub const WORDS_PER_MINUTE: usize = 200;

/// Prefix of every CSS class emitted for highlighted code
pub const HIGHLIGHT_CLASS_PREFIX: &str = "hl-";

const CLASS_STYLE: ClassStyle = ClassStyle::SpacedPrefixed {
    prefix: HIGHLIGHT_CLASS_PREFIX,
};

lazy_static! {
    static ref BARE_URL: Regex = Regex::new(r#"https?://[^\s<>"'`]+"#).unwrap();
    static ref RAW_ANCHOR: Regex = Regex::new(r"(?i)<(/)?a(?:\s|>)").unwrap();
}

#[derive(thiserror::Error, Debug)]
pub enum HighlightError {
    #[error("unknown highlighting theme: {0}")]
    UnknownTheme(String),

    #[error("failed to generate highlighting stylesheet")]
    Css(#[from] syntect::Error),
}

/// Markdown renderer with syntax highlighting
pub struct MarkdownRenderer {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    theme_name: String,
}

struct CodeBlock {
    lang: Option<String>,
    code: String,
}

struct HeadingState {
    /// Index of the heading's start event in the output buffer
    start: usize,
    text: String,
}

impl MarkdownRenderer {
    /// Create a new markdown renderer
    pub fn new() -> Self {
        Self::with_theme(DEFAULT_HIGHLIGHT_THEME)
    }

    /// Create with a specific highlighting theme for the stylesheet
    pub fn with_theme(theme: &str) -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
            theme_name: theme.to_string(),
        }
    }

    pub fn theme_name(&self) -> &str {
        &self.theme_name
    }

    /// Render markdown to HTML
    pub fn render(&self, markdown: &str) -> String {
        let parsed: Vec<Event> = Parser::new_ext(markdown, markdown_options()).collect();

        let mut events: Vec<Event> = Vec::new();
        let mut code_block: Option<CodeBlock> = None;
        let mut heading: Option<HeadingState> = None;
        // Explicit ids are reserved up front so generated ones never collide
        let mut used_ids: HashSet<String> = explicit_heading_ids(&parsed);
        // Links and images; bare URLs inside them are left alone
        let mut link_depth = 0usize;

        for event in parsed {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let lang = match kind {
                        CodeBlockKind::Fenced(info) => fence_language(&info),
                        CodeBlockKind::Indented => None,
                    };
                    code_block = Some(CodeBlock {
                        lang,
                        code: String::new(),
                    });
                }
                Event::Text(text) if code_block.is_some() => {
                    if let Some(block) = code_block.as_mut() {
                        block.code.push_str(&text);
                    }
                }
                Event::End(TagEnd::CodeBlock) => {
                    if let Some(block) = code_block.take() {
                        let highlighted = self.highlight_code(&block.code, block.lang.as_deref());
                        events.push(Event::Html(CowStr::from(highlighted)));
                    }
                }
                Event::Start(tag @ Tag::Heading { .. }) => {
                    heading = Some(HeadingState {
                        start: events.len(),
                        text: String::new(),
                    });
                    events.push(Event::Start(tag));
                }
                Event::End(TagEnd::Heading(level)) => {
                    if let Some(state) = heading.take() {
                        assign_heading_id(&mut events[state.start], &state.text, &mut used_ids);
                    }
                    events.push(Event::End(TagEnd::Heading(level)));
                }
                Event::Start(tag @ (Tag::Link { .. } | Tag::Image { .. })) => {
                    link_depth += 1;
                    events.push(Event::Start(tag));
                }
                Event::End(end @ (TagEnd::Link | TagEnd::Image)) => {
                    link_depth = link_depth.saturating_sub(1);
                    events.push(Event::End(end));
                }
                Event::Text(text) => {
                    if let Some(state) = heading.as_mut() {
                        state.text.push_str(&text);
                    }
                    if link_depth == 0 {
                        push_autolinked(&mut events, text);
                    } else {
                        events.push(Event::Text(text));
                    }
                }
                Event::InlineHtml(raw) => {
                    link_depth = adjust_anchor_depth(link_depth, &raw);
                    events.push(Event::InlineHtml(raw));
                }
                Event::Html(raw) => {
                    link_depth = adjust_anchor_depth(link_depth, &raw);
                    events.push(Event::Html(raw));
                }
                Event::Code(code) => {
                    if let Some(state) = heading.as_mut() {
                        state.text.push_str(&code);
                    }
                    events.push(Event::Code(code));
                }
                other => events.push(other),
            }
        }

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());
        html_output
    }

    /// Highlight a code block; never fails, unknown languages stay plain
    fn highlight_code(&self, code: &str, lang: Option<&str>) -> String {
        let Some(lang) = lang else {
            return plain_code_block(code, None);
        };

        let Some(syntax) = self.syntax_set.find_syntax_by_token(lang) else {
            tracing::debug!("No syntax for language {:?}, leaving block plain", lang);
            return plain_code_block(code, Some(lang));
        };

        let mut generator =
            ClassedHTMLGenerator::new_with_class_style(syntax, &self.syntax_set, CLASS_STYLE);
        for line in LinesWithEndings::from(code) {
            if let Err(e) = generator.parse_html_for_line_which_includes_newline(line) {
                tracing::warn!("Failed to highlight {} block, leaving it plain: {}", lang, e);
                return plain_code_block(code, Some(lang));
            }
        }

        format!(
            r#"<pre class="highlight"><code class="language-{}">{}</code></pre>"#,
            html_escape(lang),
            generator.finalize()
        )
    }

    /// CSS for the configured theme, matching the classes `render` emits
    pub fn stylesheet(&self) -> Result<String, HighlightError> {
        let theme = self
            .theme_set
            .themes
            .get(&self.theme_name)
            .ok_or_else(|| HighlightError::UnknownTheme(self.theme_name.clone()))?;
        Ok(css_for_theme_with_class_style(theme, CLASS_STYLE)?)
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn markdown_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_HEADING_ATTRIBUTES
        | Options::ENABLE_GFM
}

/// First token of a fence info string (` ```rust,ignore ` -> `rust`)
fn fence_language(info: &str) -> Option<String> {
    info.split(|c: char| c == ',' || c.is_whitespace())
        .next()
        .filter(|lang| !lang.is_empty())
        .map(str::to_string)
}

fn assign_heading_id(event: &mut Event, text: &str, used_ids: &mut HashSet<String>) {
    let Event::Start(Tag::Heading { id, .. }) = event else {
        return;
    };

    if id.is_some() {
        return;
    }

    let base = match slug::slugify(text) {
        s if s.is_empty() => "section".to_string(),
        s => s,
    };
    let mut candidate = base.clone();
    let mut suffix = 1;
    while used_ids.contains(&candidate) {
        candidate = format!("{}-{}", base, suffix);
        suffix += 1;
    }
    used_ids.insert(candidate.clone());
    *id = Some(CowStr::from(candidate));
}

fn explicit_heading_ids(events: &[Event]) -> HashSet<String> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::Start(Tag::Heading { id: Some(id), .. }) => Some(id.to_string()),
            _ => None,
        })
        .collect()
}

/// Track `<a>` elements written as raw HTML, so their text is not linked twice
fn adjust_anchor_depth(depth: usize, html: &str) -> usize {
    RAW_ANCHOR.captures_iter(html).fold(depth, |depth, caps| {
        if caps.get(1).is_some() {
            depth.saturating_sub(1)
        } else {
            depth + 1
        }
    })
}

/// Split a text event around bare URLs, wrapping each in a link
fn push_autolinked<'a>(events: &mut Vec<Event<'a>>, text: CowStr<'a>) {
    if !BARE_URL.is_match(&text) {
        events.push(Event::Text(text));
        return;
    }

    let mut last = 0;
    for m in BARE_URL.find_iter(&text) {
        let url = trim_url_end(m.as_str());
        if url.ends_with("://") {
            continue;
        }
        if m.start() > last {
            events.push(Event::Text(CowStr::from(text[last..m.start()].to_string())));
        }
        events.push(Event::Start(Tag::Link {
            link_type: LinkType::Autolink,
            dest_url: CowStr::from(url.to_string()),
            title: CowStr::from(""),
            id: CowStr::from(""),
        }));
        events.push(Event::Text(CowStr::from(url.to_string())));
        events.push(Event::End(TagEnd::Link));
        last = m.start() + url.len();
    }
    if last < text.len() {
        events.push(Event::Text(CowStr::from(text[last..].to_string())));
    }
}

/// Drop trailing sentence punctuation and unbalanced closing parens
fn trim_url_end(url: &str) -> &str {
    let mut url = url;
    loop {
        let trimmed = url.trim_end_matches(['.', ',', ';', ':', '!', '?', '*', '_', '~']);
        let trimmed = if trimmed.ends_with(')')
            && trimmed.matches(')').count() > trimmed.matches('(').count()
        {
            &trimmed[..trimmed.len() - 1]
        } else {
            trimmed
        };
        if trimmed.len() == url.len() {
            return url;
        }
        url = trimmed;
    }
}

fn plain_code_block(code: &str, lang: Option<&str>) -> String {
    match lang {
        Some(lang) => format!(
            r#"<pre><code class="language-{}">{}</code></pre>"#,
            html_escape(lang),
            html_escape(code)
        ),
        None => format!("<pre><code>{}</code></pre>", html_escape(code)),
    }
}

/// Simple HTML escaping
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Strip HTML tags from content
pub fn strip_html(html: &str) -> String {
    let mut result = String::with_capacity(html.len());
    let mut in_tag = false;

    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => {
                in_tag = false;
                result.push(' ');
            }
            _ if !in_tag => result.push(c),
            _ => {}
        }
    }

    result
}

/// Count words in HTML content (strips tags first)
pub fn count_words(html: &str) -> usize {
    strip_html(html).split_whitespace().count()
}

/// Minutes needed to read rendered HTML, rounded up, at least 1
pub fn reading_time(html: &str) -> usize {
    count_words(html).div_ceil(WORDS_PER_MINUTE).max(1)
}

/// Trim, drop empty and de-duplicate tags, keeping first occurrence order
pub fn normalize_tags<I>(tags: I) -> IndexSet<String>
where
    I: IntoIterator<Item = String>,
{
    tags.into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// Slug of a content file: its file name without the extension
pub fn slug_from_path(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(str::to_string)
        .filter(|s| !s.is_empty())
}

/// Site-relative URL of a slug
pub fn url_for_slug(slug: &str) -> String {
    format!("/{}/", slug)
}
