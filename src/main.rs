//! CLI entry point for slate

use anyhow::Result;
use clap::{CommandFactory, Parser};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "slate")]
#[command(version)]
#[command(about = "A small static site generator for markdown blogs", long_about = None)]
struct Cli {
    /// Build the site into the output directory
    #[arg(long)]
    build: bool,

    /// Build, watch for changes and serve the site on 127.0.0.1:8080
    #[arg(long)]
    serve: bool,

    /// Create a new post with the given title
    #[arg(long, value_name = "TITLE")]
    new: Option<String>,

    /// Site root directory
    #[arg(long, value_name = "DIR", default_value = ".")]
    site: PathBuf,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

/// What a command line asks for; the first matching flag wins
#[derive(Debug, PartialEq, Eq)]
enum Action {
    Build,
    Serve,
    New(String),
    Usage,
}

impl Cli {
    fn action(&self) -> Action {
        if self.build {
            Action::Build
        } else if self.serve {
            Action::Serve
        } else {
            match &self.new {
                Some(title) if !title.trim().is_empty() => Action::New(title.clone()),
                _ => Action::Usage,
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "slate=debug,info"
    } else {
        "slate=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.action() {
        Action::Build => {
            let site = slate::Site::load(&cli.site)?;
            tracing::info!("Building site in {:?}", site.base_dir);
            let report = slate::commands::build::run(&site)?;
            println!(
                "Built {} posts and {} pages into {:?}",
                report.posts, report.pages, site.public_dir
            );
        }
        Action::Serve => slate::commands::serve::run(cli.site).await?,
        Action::New(title) => slate::commands::new::run(&title)?,
        Action::Usage => {
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
