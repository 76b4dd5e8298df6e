//! Content module - handles posts, pages, and content processing

mod frontmatter;
pub mod loader;
mod markdown;
mod post;

pub use frontmatter::{FrontMatter, FrontmatterError, PageMatter, PostMatter, DEFAULT_PAGE_TEMPLATE};
pub use loader::{check_unique_slugs, ContentError, ContentLoader};
pub use markdown::{
    count_words, normalize_tags, reading_time, slug_from_path, strip_html, url_for_slug,
    HighlightError, MarkdownRenderer, HIGHLIGHT_CLASS_PREFIX, WORDS_PER_MINUTE,
};
pub use post::{Page, Post};
