//! Build, watch for changes and serve the site

use anyhow::Result;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::commands::build;
use crate::server;
use crate::watch::{self, ChangeDetector};
use crate::Site;

/// Build once, then rebuild on every change while serving the output
///
/// The output directory is fixed when the server starts; changing
/// `build.output_dir` while serving needs a restart.
pub async fn run(base_dir: PathBuf) -> Result<()> {
    let site = Site::load(&base_dir)?;
    build::run(&site)?;

    let detector = ChangeDetector::new(site.watch_roots());
    tracing::info!("Watching for changes every {:?}", watch::POLL_INTERVAL);

    // Each rebuild reloads the config and templates from disk
    let watch_dir = base_dir.clone();
    tokio::task::spawn_blocking(move || {
        watch::run(detector, watch::POLL_INTERVAL, || {
            let site = Site::load(&watch_dir)?;
            build::run(&site).map(|_| ())
        })
    });

    let addr = SocketAddr::from(server::DEFAULT_ADDR);
    server::start(&site.public_dir, addr).await
}
