//! CLI support for jqflow
//!
//! Provides programmatic access to the jqflow commands so they can be
//! embedded in other tools and tested without spawning the binary.

mod check;
mod draw;
mod labels;

pub use check::{execute_check, CheckOptions, CheckResult};
pub use draw::{execute_draw, DrawOptions, DrawResult};
pub use labels::{execute_labels, StageLabel};

use std::io;

use thiserror::Error;

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Parse error: {0}")]
    Parse(#[from] crate::ParseError),

    #[error("Diagram error: {0}")]
    Traverse(#[from] crate::TraverseError),

    #[error("Render error: {0}")]
    Render(#[from] crate::RenderError),

    #[error("Unknown direction '{0}'. Expected one of: right, down, left, up.")]
    InvalidDirection(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("No query provided. Pass it as an argument or pipe it to stdin.")]
    NoInput,
}
