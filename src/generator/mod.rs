//! Generator module - builds the output tree from content and templates

mod context;

pub use context::RenderContext;

use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::{ConfigError, SiteConfig};
use crate::content::{
    check_unique_slugs, ContentError, ContentLoader, HighlightError, MarkdownRenderer, Page, Post,
};
use crate::templates::{TemplateError, TemplateHandle, TemplateSet, INDEX_TEMPLATE, POST_TEMPLATE};
use crate::Site;

/// Stylesheet for highlighted code blocks, written at the output root
pub const STYLESHEET_FILE: &str = "syntax.css";

#[derive(thiserror::Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Content(#[from] ContentError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("failed to generate the highlighting stylesheet")]
    Highlight(#[from] HighlightError),

    #[error("failed to walk static directory {path:?}")]
    StaticWalk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("failed to render {target}")]
    Render {
        target: String,
        #[source]
        source: TemplateError,
    },

    #[error("I/O error at {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Counts of what a build produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub posts: usize,
    pub pages: usize,
    pub static_files: usize,
}

/// Static site generator
pub struct Generator {
    config: SiteConfig,
    posts_dir: PathBuf,
    pages_dir: PathBuf,
    static_dir: PathBuf,
    public_dir: PathBuf,
    renderer: MarkdownRenderer,
    templates: TemplateSet,
}

impl Generator {
    /// Create a generator for a loaded site, reading its templates
    pub fn new(site: &Site) -> Result<Self, BuildError> {
        let templates = match &site.templates_dir {
            Some(dir) => TemplateSet::load(dir)?,
            None => {
                tracing::debug!("No template directory found, using built-in templates");
                TemplateSet::builtin()?
            }
        };

        Ok(Self {
            config: site.config.clone(),
            posts_dir: site.posts_dir(),
            pages_dir: site.pages_dir(),
            static_dir: site.static_dir.clone(),
            public_dir: site.public_dir.clone(),
            renderer: MarkdownRenderer::with_theme(&site.config.build.highlight_theme),
            templates,
        })
    }

    /// Run one full build. Stops at the first error; files written before
    /// the error are left in place.
    pub fn build(&self) -> Result<BuildReport, BuildError> {
        fs::create_dir_all(&self.public_dir).map_err(|source| BuildError::Io {
            path: self.public_dir.clone(),
            source,
        })?;

        let static_files = self.copy_static_files()?;

        let loader = ContentLoader::new(&self.renderer);
        let posts = loader.load_posts(&self.posts_dir)?;
        let pages = loader.load_pages(&self.pages_dir)?;
        check_unique_slugs(&posts, &pages)?;
        tracing::info!("Loaded {} posts and {} pages", posts.len(), pages.len());

        // Every template is resolved before anything is rendered
        let index_template = self.templates.resolve(INDEX_TEMPLATE)?;
        let post_template = self.templates.resolve(POST_TEMPLATE)?;
        let page_templates = pages
            .iter()
            .map(|page| self.templates.resolve(&page.template))
            .collect::<Result<Vec<_>, _>>()?;

        self.generate_index(&index_template, &posts)?;
        self.generate_posts(&post_template, &posts)?;
        self.generate_pages(&page_templates, &pages)?;

        let css = self.renderer.stylesheet()?;
        write_file(&self.public_dir.join(STYLESHEET_FILE), &css)?;

        Ok(BuildReport {
            posts: posts.len(),
            pages: pages.len(),
            static_files,
        })
    }

    fn generate_index(&self, template: &TemplateHandle, posts: &[Post]) -> Result<(), BuildError> {
        let context = RenderContext::index(&self.config, posts);
        let html = self
            .templates
            .render(template, &context)
            .map_err(|source| BuildError::Render {
                target: "index".to_string(),
                source,
            })?;
        write_file(&self.public_dir.join("index.html"), &html)
    }

    fn generate_posts(&self, template: &TemplateHandle, posts: &[Post]) -> Result<(), BuildError> {
        for post in posts {
            let context = RenderContext::post(&self.config, post);
            let html = self
                .templates
                .render(template, &context)
                .map_err(|source| BuildError::Render {
                    target: format!("post {:?}", post.slug),
                    source,
                })?;
            write_file(&self.output_path(&post.slug), &html)?;
        }
        Ok(())
    }

    fn generate_pages(
        &self,
        templates: &[TemplateHandle],
        pages: &[Page],
    ) -> Result<(), BuildError> {
        for (page, template) in pages.iter().zip(templates) {
            let context = RenderContext::page(&self.config, page);
            let html = self
                .templates
                .render(template, &context)
                .map_err(|source| BuildError::Render {
                    target: format!("page {:?}", page.slug),
                    source,
                })?;
            write_file(&self.output_path(&page.slug), &html)?;
        }
        Ok(())
    }

    /// `<out>/<slug>/index.html`
    fn output_path(&self, slug: &str) -> PathBuf {
        self.public_dir.join(slug).join("index.html")
    }

    /// Copy the static tree into the output root, returning the file count
    fn copy_static_files(&self) -> Result<usize, BuildError> {
        if !self.static_dir.is_dir() {
            tracing::debug!("No static directory at {:?}", self.static_dir);
            return Ok(0);
        }

        let mut copied = 0;
        for entry in WalkDir::new(&self.static_dir).follow_links(true) {
            let entry = entry.map_err(|source| BuildError::StaticWalk {
                path: self.static_dir.clone(),
                source,
            })?;
            let path = entry.path();
            let relative = path
                .strip_prefix(&self.static_dir)
                .unwrap_or_else(|_| Path::new(entry.file_name()));
            let dest = self.public_dir.join(relative);

            // Directories are mirrored even when empty
            if entry.file_type().is_dir() {
                fs::create_dir_all(&dest).map_err(|source| BuildError::Io {
                    path: dest.clone(),
                    source,
                })?;
                continue;
            }
            if !entry.file_type().is_file() {
                continue;
            }
            ensure_parent(&dest)?;

            // fs::copy carries the permission bits over
            fs::copy(path, &dest).map_err(|source| BuildError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            tracing::debug!("Copied {:?}", dest);
            copied += 1;
        }

        Ok(copied)
    }
}

fn ensure_parent(path: &Path) -> Result<(), BuildError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| BuildError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

fn write_file(path: &Path, contents: &str) -> Result<(), BuildError> {
    ensure_parent(path)?;
    fs::write(path, contents).map_err(|source| BuildError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!("Generated: {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn site_with_post() -> TempDir {
        let tmp = tempfile::tempdir().unwrap();
        write(&tmp.path().join("config.json"), r#"{"site":{"title":"T"}}"#);
        write(
            &tmp.path().join("content/posts/hi.md"),
            "---\ntitle: \"Hi\"\ndate: 2024-01-01\n---\n# Hello\n",
        );
        tmp
    }

    fn build(root: &Path) -> Result<BuildReport, BuildError> {
        let site = Site::load(root).unwrap();
        Generator::new(&site)?.build()
    }

    #[test]
    fn test_end_to_end_build() {
        let tmp = site_with_post();
        let site = Site::load(tmp.path()).unwrap();
        assert_eq!(site.config.build.output_dir, "public");
        assert_eq!(site.config.build.posts_per_page, 10);

        let report = Generator::new(&site).unwrap().build().unwrap();
        assert_eq!(report.posts, 1);
        assert_eq!(report.pages, 0);

        let public = tmp.path().join("public");
        let index = fs::read_to_string(public.join("index.html")).unwrap();
        assert!(index.contains(r#"href="/hi/""#));
        assert!(index.contains("Hi"));

        let post = fs::read_to_string(public.join("hi/index.html")).unwrap();
        assert!(post.contains(r#"<h1 id="hello">Hello</h1>"#));
        assert!(public.join(STYLESHEET_FILE).exists());
    }

    #[test]
    fn test_pages_rendered_with_their_template() {
        let tmp = site_with_post();
        write(
            &tmp.path().join("content/pages/about.md"),
            "---\ntitle: About\n---\nAbout me\n",
        );
        let report = build(tmp.path()).unwrap();
        assert_eq!(report.pages, 1);

        let about = fs::read_to_string(tmp.path().join("public/about/index.html")).unwrap();
        assert!(about.contains("<p>About me</p>"));
    }

    #[test]
    fn test_site_templates_override_builtin() {
        let tmp = site_with_post();
        let templates = tmp.path().join("templates");
        write(
            &templates.join("index.html"),
            "{% for post in posts %}[{{ post.url }}]{% endfor %}",
        );
        write(&templates.join("post.html"), "{{ post.title }}|{{ title }}");
        write(&templates.join("page.html"), "{{ page.title }}");

        build(tmp.path()).unwrap();
        let public = tmp.path().join("public");
        assert_eq!(fs::read_to_string(public.join("index.html")).unwrap(), "[/hi/]");
        assert_eq!(fs::read_to_string(public.join("hi/index.html")).unwrap(), "Hi|Hi");
    }

    #[test]
    fn test_missing_page_template_fails_before_rendering() {
        let tmp = site_with_post();
        write(
            &tmp.path().join("content/pages/contact.md"),
            "---\ntitle: Contact\ntemplate: contact.html\n---\nMail me\n",
        );

        let err = build(tmp.path()).unwrap_err();
        assert!(matches!(
            err,
            BuildError::Template(TemplateError::Missing(ref name)) if name == "contact.html"
        ));
        let public = tmp.path().join("public");
        assert!(!public.join("index.html").exists());
        assert!(!public.join("hi/index.html").exists());
    }

    #[test]
    fn test_missing_posts_directory() {
        let tmp = tempfile::tempdir().unwrap();
        write(&tmp.path().join("config.json"), "{}");

        let err = build(tmp.path()).unwrap_err();
        assert!(matches!(err, BuildError::Content(ContentError::MissingDirectory(_))));
        assert!(err.to_string().contains("posts"));
    }

    #[test]
    fn test_static_files_copied() {
        let tmp = site_with_post();
        write(&tmp.path().join("static/robots.txt"), "User-agent: *\n");
        write(&tmp.path().join("static/img/nested/logo.svg"), "<svg/>");
        let bytes: Vec<u8> = (0..=255).collect();
        fs::write(tmp.path().join("static/img/blob.bin"), &bytes).unwrap();
        fs::create_dir_all(tmp.path().join("static/fonts/empty")).unwrap();

        let report = build(tmp.path()).unwrap();
        assert_eq!(report.static_files, 3);

        let public = tmp.path().join("public");
        assert_eq!(
            fs::read_to_string(public.join("robots.txt")).unwrap(),
            "User-agent: *\n"
        );
        assert_eq!(
            fs::read_to_string(public.join("img/nested/logo.svg")).unwrap(),
            "<svg/>"
        );
        assert_eq!(fs::read(public.join("img/blob.bin")).unwrap(), bytes);
        assert!(public.join("fonts/empty").is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn test_static_copy_preserves_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = site_with_post();
        let script = tmp.path().join("static/run.sh");
        write(&script, "#!/bin/sh\n");
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        build(tmp.path()).unwrap();
        let mode = fs::metadata(tmp.path().join("public/run.sh"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[test]
    fn test_duplicate_slug_between_post_and_page() {
        let tmp = site_with_post();
        write(&tmp.path().join("content/pages/hi.md"), "# Also hi\n");

        let err = build(tmp.path()).unwrap_err();
        assert!(matches!(
            err,
            BuildError::Content(ContentError::DuplicateSlug { ref slug, .. }) if slug == "hi"
        ));
    }

    #[test]
    fn test_unknown_highlight_theme() {
        let tmp = site_with_post();
        write(
            &tmp.path().join("config.json"),
            r#"{"build":{"highlight_theme":"no-such-theme"}}"#,
        );
        let err = build(tmp.path()).unwrap_err();
        assert!(matches!(err, BuildError::Highlight(_)));
    }
}
