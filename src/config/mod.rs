//! Configuration module

mod site;

pub use site::{BuildSection, ConfigError, SiteConfig, SiteSection, SocialSection};
pub use site::{DEFAULT_HIGHLIGHT_THEME, DEFAULT_OUTPUT_DIR, DEFAULT_POSTS_PER_PAGE};
