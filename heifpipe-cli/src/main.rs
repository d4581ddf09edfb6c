use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use heifpipe::DEFAULT_OUTPUT;
use heifpipe::libheif::LibHeif;
use tracing_subscriber::EnvFilter;

mod prompt;

/// Log filter directives, e.g. `HEIFPIPE_LOG=debug`. Falls back to `RUST_LOG`.
const LOG_ENV: &str = "HEIFPIPE_LOG";

fn main() -> Result<()> {
    init_logging();
    let input = prompt::read_input_path(io::stdin().lock(), io::stdout().lock())?;
    run(&input)
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run(input: &Path) -> Result<()> {
    let codec = LibHeif::new().context("Failed to initialize libheif")?;

    let decoded = heifpipe::decode(&codec, input)
        .with_context(|| format!("Failed to decode {}", input.display()))?;
    tracing::debug!(
        width = decoded.image.width(),
        height = decoded.image.height(),
        channels = decoded.image.channels(),
        "decoded input"
    );

    heifpipe::encode(&codec, &decoded)
        .with_context(|| format!("Failed to encode {}", DEFAULT_OUTPUT))?;

    println!("Wrote {}", DEFAULT_OUTPUT);
    Ok(())
}
