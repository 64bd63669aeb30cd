use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use serde_json::Value;

use crucible_cli::{cli::Cli, io::read_source};
use crucible_query::{parser::ParseOptions, options::InvokeOptions, target::{JsonTarget, Target}};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let directive = if cli.verbose {
        "crucible_cli=debug,crucible_query=debug"
    } else {
        "crucible_cli=info,crucible_query=info"
    };
    crucible_core::init_tracing(directive);

    if cli.target == Path::new("-") && cli.query == Path::new("-") {
        bail!("--target and --query cannot both read from stdin");
    }

    let target_text = read_source(&cli.target)?;
    let target_value: Value =
        serde_json::from_str(&target_text).context("parsing target document as JSON")?;
    let target: Arc<dyn Target> = Arc::new(JsonTarget::new(target_value));

    let query_text = read_source(&cli.query)?;
    let query_value: Value =
        serde_json::from_str(&query_text).context("parsing query document as JSON")?;

    let mut invoke_options = InvokeOptions::new();
    if let Some(context_text) = &cli.context {
        let context_value: Value =
            serde_json::from_str(context_text).context("parsing --context as JSON")?;
        invoke_options = invoke_options.with_context(context_value);
    }

    let result = crucible_query::query(
        target,
        &query_value,
        &ParseOptions::default(),
        &invoke_options,
    )
    .await
    .context("evaluating query")?;

    let rendered = if cli.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{rendered}");

    Ok(())
}
