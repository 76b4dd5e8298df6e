//! Polling change detection for development mode
//!
//! The watcher keeps a single baseline: the newest modification time among
//! the site's source files. Each tick recomputes it and triggers a full
//! rebuild when it has moved forward, so several saves landing within one
//! interval produce one rebuild.

use std::path::PathBuf;
use std::thread;
use std::time::{Duration, SystemTime};
use walkdir::WalkDir;

/// Time between two polls
pub const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Extensions of files that feed a build
pub const WATCHED_EXTENSIONS: &[&str] = &["md", "markdown", "json", "html"];

/// Newest modification time among watched files under `roots`
///
/// Roots may be directories or single files. Entries that cannot be read
/// are skipped.
pub fn latest_modification(roots: &[PathBuf]) -> Option<SystemTime> {
    let mut latest: Option<SystemTime> = None;

    for root in roots {
        for entry in WalkDir::new(root).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!("Skipping unreadable path under {:?}: {}", root, e);
                    continue;
                }
            };
            if !entry.file_type().is_file() || !is_watched(&entry) {
                continue;
            }

            let modified = match entry.metadata().map(|m| m.modified()) {
                Ok(Ok(modified)) => modified,
                Ok(Err(e)) => {
                    tracing::debug!("No modification time for {:?}: {}", entry.path(), e);
                    continue;
                }
                Err(e) => {
                    tracing::debug!("Skipping {:?}: {}", entry.path(), e);
                    continue;
                }
            };

            if latest.map_or(true, |t| modified > t) {
                latest = Some(modified);
            }
        }
    }

    latest
}

fn is_watched(entry: &walkdir::DirEntry) -> bool {
    entry
        .path()
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| WATCHED_EXTENSIONS.contains(&ext))
}

/// Tracks the newest modification time seen so far
pub struct ChangeDetector {
    roots: Vec<PathBuf>,
    baseline: Option<SystemTime>,
}

impl ChangeDetector {
    /// Start watching `roots`, taking the current state as the baseline
    pub fn new(roots: Vec<PathBuf>) -> Self {
        let baseline = latest_modification(&roots);
        Self { roots, baseline }
    }

    /// Whether anything changed since the last poll. The new baseline is
    /// adopted immediately, whatever the rebuild that follows does.
    pub fn poll(&mut self) -> bool {
        let current = latest_modification(&self.roots);
        if current > self.baseline {
            self.baseline = current;
            true
        } else {
            false
        }
    }
}

/// Poll once and rebuild on change. Returns whether a rebuild ran.
pub fn tick<F>(detector: &mut ChangeDetector, rebuild: &mut F) -> bool
where
    F: FnMut() -> anyhow::Result<()>,
{
    if !detector.poll() {
        return false;
    }

    tracing::info!("Change detected, rebuilding...");
    match rebuild() {
        Ok(()) => tracing::info!("Rebuild finished"),
        Err(e) => tracing::error!("Rebuild failed: {:#}", e),
    }
    true
}

/// Poll forever, calling `rebuild` whenever a watched file changes
pub fn run<F>(mut detector: ChangeDetector, interval: Duration, mut rebuild: F) -> !
where
    F: FnMut() -> anyhow::Result<()>,
{
    loop {
        thread::sleep(interval);
        tick(&mut detector, &mut rebuild);
    }
}
