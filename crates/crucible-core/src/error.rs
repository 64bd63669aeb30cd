//! Top-level error type for the Crucible workspace.

use thiserror::Error;

/// Result type alias used at crate boundaries that need to collapse
/// multiple crates' error types into one.
pub type Result<T> = std::result::Result<T, CrucibleError>;

/// Workspace-wide error wrapper.
///
/// Individual crates (e.g. `crucible-query`) define their own focused error
/// enums; this type exists for callers that need to handle errors from more
/// than one crate in the same `Result`, such as the CLI wrapper.
#[derive(Debug, Error)]
pub enum CrucibleError {
    /// IO errors (reading a target/query file, writing output).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing errors for the target or query input.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Anything else, carried with context.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
