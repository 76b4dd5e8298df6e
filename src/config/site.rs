//! Site configuration (config.json)

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Output directory used when `build.output_dir` is absent or empty
pub const DEFAULT_OUTPUT_DIR: &str = "public";

/// Posts per page used when `build.posts_per_page` is absent or zero
pub const DEFAULT_POSTS_PER_PAGE: usize = 10;

/// Highlighting theme used when `build.highlight_theme` is absent or empty
pub const DEFAULT_HIGHLIGHT_THEME: &str = "base16-ocean.dark";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path:?}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Main site configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub site: SiteSection,
    pub build: BuildSection,
    pub social: SocialSection,
}

/// `site` section: identity of the site
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSection {
    pub title: String,
    pub description: String,
    pub author: String,
    /// Canonical base URL, e.g. `https://example.com`
    pub url: String,
}

/// `build` section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSection {
    pub output_dir: String,
    pub posts_per_page: usize,
    pub highlight_theme: String,
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
            posts_per_page: DEFAULT_POSTS_PER_PAGE,
            highlight_theme: DEFAULT_HIGHLIGHT_THEME.to_string(),
        }
    }
}

/// `social` section: handles shown by templates
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialSection {
    pub twitter: String,
    pub github: String,
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Parse configuration from JSON text and apply defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut config: SiteConfig = serde_json::from_str(json)?;
        config.apply_defaults();
        Ok(config)
    }

    /// Explicit zero values in the file count as absent
    fn apply_defaults(&mut self) {
        if self.build.output_dir.trim().is_empty() {
            self.build.output_dir = DEFAULT_OUTPUT_DIR.to_string();
        }
        if self.build.posts_per_page == 0 {
            self.build.posts_per_page = DEFAULT_POSTS_PER_PAGE;
        }
        if self.build.highlight_theme.trim().is_empty() {
            self.build.highlight_theme = DEFAULT_HIGHLIGHT_THEME.to_string();
        }
    }
}
