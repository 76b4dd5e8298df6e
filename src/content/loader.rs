//! Content loader - loads posts and pages from the content directories

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::frontmatter::{FrontMatter, FrontmatterError, PageMatter, PostMatter};
use super::markdown::{normalize_tags, reading_time, slug_from_path, url_for_slug};
use super::{MarkdownRenderer, Page, Post};

#[derive(thiserror::Error, Debug)]
pub enum ContentError {
    #[error("content directory not found: {0:?}")]
    MissingDirectory(PathBuf),

    #[error("failed to walk {path:?}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("failed to read {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid front-matter in {path:?}")]
    Frontmatter {
        path: PathBuf,
        #[source]
        source: FrontmatterError,
    },

    #[error("cannot derive a slug from file name {0:?}")]
    InvalidFileName(PathBuf),

    #[error("slug {slug:?} is produced by both {first:?} and {second:?}")]
    DuplicateSlug {
        slug: String,
        first: PathBuf,
        second: PathBuf,
    },
}

/// Loads content from the content directories
pub struct ContentLoader<'a> {
    renderer: &'a MarkdownRenderer,
}

impl<'a> ContentLoader<'a> {
    /// Create a new content loader
    pub fn new(renderer: &'a MarkdownRenderer) -> Self {
        Self { renderer }
    }

    /// Load all posts under `dir`, newest first
    ///
    /// The directory is required. Posts with equal dates keep the order in
    /// which they were found, which is file-name order at every level.
    pub fn load_posts(&self, dir: &Path) -> Result<Vec<Post>, ContentError> {
        if !dir.is_dir() {
            return Err(ContentError::MissingDirectory(dir.to_path_buf()));
        }

        let mut posts = Vec::new();
        for path in markdown_files(dir)? {
            posts.push(self.load_post(&path)?);
        }

        // Sort by date descending (newest first); stable, undated posts last
        posts.sort_by(|a, b| b.date.cmp(&a.date));

        tracing::debug!("Loaded {} posts from {:?}", posts.len(), dir);
        Ok(posts)
    }

    /// Load a single post from a file
    fn load_post(&self, path: &Path) -> Result<Post, ContentError> {
        let raw = read_source(path)?;
        let (fm, body) = FrontMatter::parse(&raw).map_err(|source| ContentError::Frontmatter {
            path: path.to_path_buf(),
            source,
        })?;
        let matter = PostMatter::from(&fm);

        let slug = slug_from_path(path)
            .ok_or_else(|| ContentError::InvalidFileName(path.to_path_buf()))?;
        let content = self.renderer.render(body);

        Ok(Post {
            title: matter.title,
            date: matter.date,
            tags: normalize_tags(matter.tags),
            summary: matter.summary,
            image: matter.image,
            reading_time: reading_time(&content),
            content,
            url: url_for_slug(&slug),
            slug,
            source: path.to_path_buf(),
        })
    }

    /// Load all pages under `dir`; a missing directory means no pages
    pub fn load_pages(&self, dir: &Path) -> Result<Vec<Page>, ContentError> {
        if !dir.exists() {
            tracing::debug!("No pages directory at {:?}", dir);
            return Ok(Vec::new());
        }

        let mut pages = Vec::new();
        for path in markdown_files(dir)? {
            pages.push(self.load_page(&path)?);
        }

        tracing::debug!("Loaded {} pages from {:?}", pages.len(), dir);
        Ok(pages)
    }

    /// Load a single page from a file
    fn load_page(&self, path: &Path) -> Result<Page, ContentError> {
        let raw = read_source(path)?;
        let (fm, body) = FrontMatter::parse(&raw).map_err(|source| ContentError::Frontmatter {
            path: path.to_path_buf(),
            source,
        })?;
        let matter = PageMatter::from(&fm);

        let slug = slug_from_path(path)
            .ok_or_else(|| ContentError::InvalidFileName(path.to_path_buf()))?;

        Ok(Page {
            title: matter.title,
            description: matter.description,
            content: self.renderer.render(body),
            url: url_for_slug(&slug),
            slug,
            template: matter.template,
            source: path.to_path_buf(),
        })
    }
}

/// Posts and pages are written to `<output>/<slug>/`, so a slug may only be
/// used once across both collections.
pub fn check_unique_slugs(posts: &[Post], pages: &[Page]) -> Result<(), ContentError> {
    let mut seen: HashMap<&str, &Path> = HashMap::new();

    let entries = posts
        .iter()
        .map(|p| (p.slug.as_str(), p.source.as_path()))
        .chain(pages.iter().map(|p| (p.slug.as_str(), p.source.as_path())));

    for (slug, source) in entries {
        if let Some(first) = seen.insert(slug, source) {
            return Err(ContentError::DuplicateSlug {
                slug: slug.to_string(),
                first: first.to_path_buf(),
                second: source.to_path_buf(),
            });
        }
    }

    Ok(())
}

/// Markdown files under `dir`, in file-name order at every level
fn markdown_files(dir: &Path) -> Result<Vec<PathBuf>, ContentError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        let entry = entry.map_err(|source| ContentError::Walk {
            path: source
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| dir.to_path_buf()),
            source,
        })?;

        let path = entry.path();
        if entry.file_type().is_file() && is_markdown_file(path) {
            files.push(path.to_path_buf());
        } else if entry.file_type().is_file() {
            tracing::debug!("Skipping non-markdown file {:?}", path);
        }
    }

    Ok(files)
}

fn read_source(path: &Path) -> Result<String, ContentError> {
    fs::read_to_string(path).map_err(|source| ContentError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Check if a file is a markdown file
fn is_markdown_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == "md" || e == "markdown")
        .unwrap_or(false)
}
