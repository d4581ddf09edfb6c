use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

pub const PROMPT: &str = "Enter path of an input image file";

/// Prints the prompt to `out`, then returns the first whitespace-delimited token of `input`.
pub fn read_input_path(mut input: impl BufRead, mut out: impl Write) -> Result<PathBuf> {
    writeln!(out, "{}", PROMPT).context("Failed to write prompt")?;
    out.flush().context("Failed to write prompt")?;

    let mut line = String::new();
    loop {
        line.clear();
        let read = input
            .read_line(&mut line)
            .context("Failed to read input path")?;
        if read == 0 {
            bail!("No input path given");
        }
        if let Some(token) = line.split_whitespace().next() {
            return Ok(PathBuf::from(token));
        }
    }
}
