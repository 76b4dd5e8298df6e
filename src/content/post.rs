//! Post and Page models

use chrono::NaiveDateTime;
use indexmap::IndexSet;
use serde::Serialize;
use std::path::PathBuf;

/// A blog post
#[derive(Debug, Clone, Serialize)]
pub struct Post {
    /// Post title
    pub title: String,

    /// Publication date; undated posts sort last
    pub date: Option<NaiveDateTime>,

    /// Post tags, trimmed and de-duplicated in declaration order
    pub tags: IndexSet<String>,

    /// Short description used in listings and meta tags
    pub summary: String,

    /// Cover image
    pub image: Option<String>,

    /// Rendered HTML content
    pub content: String,

    /// URL path, `/<slug>/`
    pub url: String,

    /// Estimated reading time in minutes
    pub reading_time: usize,

    /// Slug (source file name without extension)
    pub slug: String,

    /// Source file the post was loaded from
    #[serde(skip)]
    pub source: PathBuf,
}

/// A standalone page
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    /// Page title
    pub title: String,

    pub description: String,

    /// Rendered HTML content
    pub content: String,

    /// URL path, `/<slug>/`
    pub url: String,

    pub slug: String,

    /// Name of the template the page is rendered with
    pub template: String,

    #[serde(skip)]
    pub source: PathBuf,
}
