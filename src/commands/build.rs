//! Build the site from scratch

use anyhow::{Context, Result};
use std::fs;

use crate::generator::{BuildReport, Generator};
use crate::Site;

/// Remove the output directory
pub fn clean(site: &Site) -> Result<()> {
    if site.public_dir.exists() {
        fs::remove_dir_all(&site.public_dir)
            .with_context(|| format!("failed to remove {:?}", site.public_dir))?;
        tracing::debug!("Deleted: {:?}", site.public_dir);
    }
    Ok(())
}

/// Clean the output directory and run a full build
pub fn run(site: &Site) -> Result<BuildReport> {
    let start = std::time::Instant::now();

    clean(site)?;
    let report = Generator::new(site)?.build()?;

    tracing::info!(
        "Built {} posts, {} pages and {} static files in {:.2}s",
        report.posts,
        report.pages,
        report.static_files,
        start.elapsed().as_secs_f64()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_removes_stale_output() {
        let tmp = tempfile::tempdir().unwrap();
        fs::write(tmp.path().join("config.json"), "{}").unwrap();
        fs::create_dir_all(tmp.path().join("content/posts")).unwrap();
        fs::write(tmp.path().join("content/posts/one.md"), "# One\n").unwrap();
        fs::create_dir_all(tmp.path().join("public/old")).unwrap();
        fs::write(tmp.path().join("public/old/index.html"), "stale").unwrap();

        let site = Site::load(tmp.path()).unwrap();
        let report = run(&site).unwrap();

        assert_eq!(report.posts, 1);
        assert!(!tmp.path().join("public/old").exists());
        assert!(tmp.path().join("public/one/index.html").exists());
    }
}
