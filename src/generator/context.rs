//! Per-page template data

use chrono::Datelike;
use serde::Serialize;

use crate::config::SiteConfig;
use crate::content::{Page, Post};

/// Data passed to a single template render
///
/// The site fields are the same for every page; `title` and `description`
/// describe the page being rendered. `posts` is only filled for the index.
#[derive(Debug, Serialize)]
pub struct RenderContext<'a> {
    pub site_title: &'a str,
    pub site_description: &'a str,
    pub author: &'a str,
    pub site_url: &'a str,
    pub twitter: &'a str,
    pub github: &'a str,
    pub posts_per_page: usize,
    pub year: i32,

    pub title: &'a str,
    pub description: &'a str,

    pub posts: &'a [Post],
    pub post: Option<&'a Post>,
    pub page: Option<&'a Page>,
}

impl<'a> RenderContext<'a> {
    fn base(config: &'a SiteConfig) -> Self {
        Self {
            site_title: &config.site.title,
            site_description: &config.site.description,
            author: &config.site.author,
            site_url: &config.site.url,
            twitter: &config.social.twitter,
            github: &config.social.github,
            posts_per_page: config.build.posts_per_page,
            year: chrono::Local::now().year(),
            title: &config.site.title,
            description: &config.site.description,
            posts: &[],
            post: None,
            page: None,
        }
    }

    /// Context for the site index: every post, newest first
    pub fn index(config: &'a SiteConfig, posts: &'a [Post]) -> Self {
        Self {
            posts,
            ..Self::base(config)
        }
    }

    pub fn post(config: &'a SiteConfig, post: &'a Post) -> Self {
        Self {
            title: &post.title,
            description: &post.summary,
            post: Some(post),
            ..Self::base(config)
        }
    }

    pub fn page(config: &'a SiteConfig, page: &'a Page) -> Self {
        Self {
            title: &page.title,
            description: "",
            page: Some(page),
            ..Self::base(config)
        }
    }
}
