//! slate: a small static site generator
//!
//! Markdown posts and pages with YAML front-matter are rendered through Tera
//! templates into a directory of static HTML files. A polling watch loop and
//! a development file server support local authoring.

pub mod commands;
pub mod config;
pub mod content;
pub mod generator;
pub mod server;
pub mod templates;
pub mod watch;

use std::path::{Path, PathBuf};

use config::{ConfigError, SiteConfig};

/// Site configuration file, relative to the site root
pub const CONFIG_FILE: &str = "config.json";

/// Content directory, holding `posts/` and `pages/`
pub const CONTENT_DIR: &str = "content";

/// Files copied verbatim into the output root
pub const STATIC_DIR: &str = "static";

/// Site-local template directory
pub const TEMPLATES_DIR: &str = "templates";

/// A site on disk: its configuration and resolved directories
#[derive(Debug, Clone)]
pub struct Site {
    /// Site configuration
    pub config: SiteConfig,
    /// Site root
    pub base_dir: PathBuf,
    pub config_path: PathBuf,
    pub content_dir: PathBuf,
    pub static_dir: PathBuf,
    /// Output directory
    pub public_dir: PathBuf,
    /// Template directory, `None` when the built-in templates are used
    pub templates_dir: Option<PathBuf>,
}

impl Site {
    /// Load the site rooted at `base_dir`
    pub fn load<P: AsRef<Path>>(base_dir: P) -> Result<Self, ConfigError> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join(CONFIG_FILE);
        let config = SiteConfig::load(&config_path)?;

        let public_dir = base_dir.join(&config.build.output_dir);
        let templates_dir = find_templates_dir(&base_dir);

        Ok(Self {
            config,
            content_dir: base_dir.join(CONTENT_DIR),
            static_dir: base_dir.join(STATIC_DIR),
            public_dir,
            templates_dir,
            config_path,
            base_dir,
        })
    }

    pub fn posts_dir(&self) -> PathBuf {
        self.content_dir.join("posts")
    }

    pub fn pages_dir(&self) -> PathBuf {
        self.content_dir.join("pages")
    }

    /// Paths whose changes should trigger a rebuild
    ///
    /// `<site>/templates` is always included, so a template directory
    /// created while watching is picked up.
    pub fn watch_roots(&self) -> Vec<PathBuf> {
        let local_templates = self.base_dir.join(TEMPLATES_DIR);
        let mut roots = vec![
            self.content_dir.clone(),
            self.config_path.clone(),
            local_templates.clone(),
        ];
        if let Some(dir) = self.templates_dir.as_ref().filter(|d| **d != local_templates) {
            roots.push(dir.clone());
        }
        roots
    }
}

/// `<site>/templates`, then `templates/` next to the executable
fn find_templates_dir(base_dir: &Path) -> Option<PathBuf> {
    let local = base_dir.join(TEMPLATES_DIR);
    if local.is_dir() {
        return Some(local);
    }

    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(TEMPLATES_DIR)))
        .filter(|dir| dir.is_dir())
}
