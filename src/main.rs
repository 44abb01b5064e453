mod app;
mod input;
mod render;

use anyhow::{Context, Result};
use bloop::config::{project_paths, Args};
use clap::Parser;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();
    let paths = project_paths(args.data_dir.as_deref())?;

    // stdout belongs to the alternate screen, so logs go to a file
    let log = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&paths.log_path)
        .with_context(|| format!("opening {}", paths.log_path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "bloop=info".into()),
        )
        .with_ansi(false)
        .with_writer(Mutex::new(log))
        .init();

    app::run(&args, &paths)
}
