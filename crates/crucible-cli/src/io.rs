//! Reads the target/query documents `cruq` operates on, each either a file
//! path or the literal `-` for stdin.

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};

/// Read `source` as UTF-8 text: `-` reads stdin to EOF, anything else is
/// treated as a file path.
pub fn read_source(source: &Path) -> Result<String> {
    if source == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading from stdin")?;
        Ok(buf)
    } else {
        std::fs::read_to_string(source)
            .with_context(|| format!("reading `{}`", source.display()))
    }
}
