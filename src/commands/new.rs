//! Create a new post

use anyhow::Result;

/// Scaffolding new posts is not supported yet; the title is only logged
pub fn run(title: &str) -> Result<()> {
    tracing::warn!("Creating new posts is not implemented yet (title: {:?})", title);
    println!("Create content/posts/<slug>.md by hand for now.");
    Ok(())
}
