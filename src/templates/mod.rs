//! Page templates using the Tera template engine
//!
//! Templates are looked up by file name (`index.html`, `post.html`, ...).
//! A build resolves every name it needs into a [`TemplateHandle`] before
//! rendering anything, so a missing template is reported up front instead of
//! halfway through writing the output tree.

use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tera::{Context, Tera};

/// Template for the site index
pub const INDEX_TEMPLATE: &str = "index.html";

/// Template for a single post
pub const POST_TEMPLATE: &str = "post.html";

#[derive(thiserror::Error, Debug)]
pub enum TemplateError {
    #[error("failed to load templates from {dir:?}")]
    Load {
        dir: PathBuf,
        #[source]
        source: tera::Error,
    },

    #[error("failed to load the built-in templates")]
    Builtin(#[source] tera::Error),

    #[error("template {0:?} not found")]
    Missing(String),

    #[error("failed to render template {name:?}")]
    Render {
        name: String,
        #[source]
        source: tera::Error,
    },
}

/// A template name checked to exist in the set that produced it
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TemplateHandle {
    name: String,
}

impl TemplateHandle {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// The named templates available to a build
pub struct TemplateSet {
    tera: Tera,
}

impl TemplateSet {
    /// Load every `*.html` file directly under `dir`, named by file name
    pub fn load(dir: &Path) -> Result<Self, TemplateError> {
        let glob = dir.join("*.html");
        let mut tera = Tera::new(&glob.to_string_lossy()).map_err(|source| {
            TemplateError::Load {
                dir: dir.to_path_buf(),
                source,
            }
        })?;
        configure(&mut tera);

        tracing::debug!(
            "Loaded {} templates from {:?}",
            tera.get_template_names().count(),
            dir
        );
        Ok(Self { tera })
    }

    /// The default theme compiled into the binary
    pub fn builtin() -> Result<Self, TemplateError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            ("base.html", include_str!("builtin/base.html")),
            ("index.html", include_str!("builtin/index.html")),
            ("post.html", include_str!("builtin/post.html")),
            ("page.html", include_str!("builtin/page.html")),
        ])
        .map_err(TemplateError::Builtin)?;
        configure(&mut tera);

        Ok(Self { tera })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }

    /// Check that `name` exists and hand out a handle for it
    pub fn resolve(&self, name: &str) -> Result<TemplateHandle, TemplateError> {
        if self.contains(name) {
            Ok(TemplateHandle {
                name: name.to_string(),
            })
        } else {
            Err(TemplateError::Missing(name.to_string()))
        }
    }

    /// Render a template with a serializable context
    pub fn render<T: Serialize>(
        &self,
        template: &TemplateHandle,
        data: &T,
    ) -> Result<String, TemplateError> {
        let render_error = |source| TemplateError::Render {
            name: template.name.clone(),
            source,
        };
        let context = Context::from_serialize(data).map_err(render_error)?;
        self.tera
            .render(&template.name, &context)
            .map_err(render_error)
    }
}

fn configure(tera: &mut Tera) {
    // Rendered markdown and URLs are inserted verbatim; templates escape
    // free text explicitly with `| escape`
    tera.autoescape_on(vec![]);

    tera.register_filter("strip_html", strip_html_filter);
    tera.register_filter("truncate_chars", truncate_chars_filter);
    tera.register_filter("date_format", date_format_filter);
}

/// Tera filter: strip HTML tags
fn strip_html_filter(
    value: &tera::Value,
    _args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("strip_html", "value", String, value);
    let text = crate::content::strip_html(&s);
    Ok(tera::Value::String(
        text.split_whitespace().collect::<Vec<_>>().join(" "),
    ))
}

/// Tera filter: truncate by character count
fn truncate_chars_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("truncate_chars", "value", String, value);
    let length = match args.get("length") {
        Some(val) => tera::try_get_value!("truncate_chars", "length", usize, val),
        None => 150,
    };
    let omission = match args.get("omission") {
        Some(val) => tera::try_get_value!("truncate_chars", "omission", String, val),
        None => "...".to_string(),
    };

    if s.chars().count() <= length {
        Ok(tera::Value::String(s))
    } else {
        let truncated: String = s.chars().take(length).collect();
        Ok(tera::Value::String(format!(
            "{}{}",
            truncated.trim_end(),
            omission
        )))
    }
}

/// Tera filter: format a post date (`2024-01-15T10:30:00`) with a chrono
/// format string, `%Y-%m-%d` by default
fn date_format_filter(
    value: &tera::Value,
    args: &HashMap<String, tera::Value>,
) -> tera::Result<tera::Value> {
    let s = tera::try_get_value!("date_format", "value", String, value);
    let format = match args.get("format") {
        Some(val) => tera::try_get_value!("date_format", "format", String, val),
        None => "%Y-%m-%d".to_string(),
    };

    let date = chrono::NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| {
            chrono::NaiveDate::parse_from_str(&s, "%Y-%m-%d")
                .map(|d| d.and_hms_opt(0, 0, 0).unwrap_or_default())
        })
        .map_err(|_| tera::Error::msg(format!("date_format: cannot parse date {:?}", s)))?;

    Ok(tera::Value::String(date.format(&format).to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;

    #[test]
    fn test_builtin_has_required_templates() {
        let set = TemplateSet::builtin().unwrap();
        for name in [INDEX_TEMPLATE, POST_TEMPLATE, "page.html"] {
            assert!(set.resolve(name).is_ok(), "missing {name}");
        }
    }

    #[test]
    fn test_resolve_missing_template() {
        let set = TemplateSet::builtin().unwrap();
        let err = set.resolve("contact.html").unwrap_err();
        assert!(matches!(err, TemplateError::Missing(ref name) if name == "contact.html"));
    }

    #[test]
    fn test_load_from_directory() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("index.html"), "<h1>{{ title }}</h1>").unwrap();
        fs::write(tmp.path().join("about.html"), "{{ body | safe }}").unwrap();
        fs::write(tmp.path().join("notes.txt"), "not a template").unwrap();

        let set = TemplateSet::load(tmp.path()).unwrap();
        assert!(set.contains("index.html"));
        assert!(set.contains("about.html"));
        assert!(!set.contains("notes.txt"));

        let handle = set.resolve("index.html").unwrap();
        let html = set.render(&handle, &json!({ "title": "Hi" })).unwrap();
        assert_eq!(html, "<h1>Hi</h1>");
    }

    #[test]
    fn test_malformed_template_fails_to_load() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("index.html"), "{% if %}").unwrap();
        let err = TemplateSet::load(tmp.path()).err().unwrap();
        assert!(matches!(err, TemplateError::Load { .. }));
    }

    #[test]
    fn test_render_error_names_template() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("post.html"), "{{ post.title }}").unwrap();
        let set = TemplateSet::load(tmp.path()).unwrap();
        let handle = set.resolve("post.html").unwrap();
        let err = set.render(&handle, &json!({})).unwrap_err();
        assert!(err.to_string().contains("post.html"));
    }

    #[test]
    fn test_filters() {
        let mut tera = Tera::default();
        configure(&mut tera);
        let mut context = Context::new();
        context.insert("html", "<p>Hello <em>there</em> world</p>");
        context.insert("date", "2024-01-15T10:30:00");

        let out = tera
            .render_str("{{ html | strip_html }}", &context)
            .unwrap();
        assert_eq!(out, "Hello there world");

        let out = tera
            .render_str("{{ html | strip_html | truncate_chars(length=5) }}", &context)
            .unwrap();
        assert_eq!(out, "Hello...");

        let out = tera
            .render_str(r#"{{ date | date_format(format="%B %d, %Y") }}"#, &context)
            .unwrap();
        assert_eq!(out, "January 15, 2024");
    }
}
