//! Command-line surface for `cruq`, the thin wrapper composing
//! `crucible-query`'s parser and interpreter (spec.md §6: "A convenience
//! wrapper composing the two is expected but not part of the core").

use std::path::PathBuf;

use clap::Parser;

/// `cruq` reads a JSON target and a JSON query, invokes `crucible-query`
/// against them, and prints the result.
///
/// Either `--target` or `--query` may be `-` to read from stdin, but not
/// both at once.
#[derive(Parser, Debug)]
#[command(name = "cruq")]
#[command(about = "Run a declarative query against a JSON object graph")]
#[command(version)]
pub struct Cli {
    /// Path to the JSON target document, or `-` to read it from stdin.
    #[arg(short = 't', long)]
    pub target: PathBuf,

    /// Path to the JSON query document, or `-` to read it from stdin.
    #[arg(short = 'q', long)]
    pub query: PathBuf,

    /// A JSON literal threaded through as the interpreter's `context`,
    /// appended as the trailing argument to every method call.
    #[arg(short = 'c', long)]
    pub context: Option<String>,

    /// Pretty-print the JSON result.
    #[arg(short, long)]
    pub pretty: bool,

    /// Enable debug-level logging.
    #[arg(short, long)]
    pub verbose: bool,
}
