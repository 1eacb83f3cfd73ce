//! Draw a query to a file

use std::path::PathBuf;

use super::CliError;
use crate::{
    parse_query,
    render::{Direction, OutputKind, RenderOptions, Renderer},
};

/// Options for the draw command
#[derive(Debug, Clone)]
pub struct DrawOptions {
    /// The query to draw
    pub query: String,
    /// Output path; `.d2` or `.svg`
    pub output: PathBuf,
    /// Layout engine name for image output
    pub engine: String,
    /// Flow direction name
    pub direction: String,
}

/// Result of a draw operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawResult {
    pub kind: OutputKind,
    pub path: PathBuf,
}

/// Execute a draw operation
pub fn execute_draw(options: &DrawOptions) -> Result<DrawResult, CliError> {
    let direction = Direction::parse(&options.direction)
        .ok_or_else(|| CliError::InvalidDirection(options.direction.clone()))?;
    let query = parse_query(&options.query)?;

    let renderer = Renderer::new(RenderOptions {
        engine: options.engine.clone(),
        direction,
        ..RenderOptions::default()
    });
    let kind = renderer.draw(&query, &options.output)?;

    Ok(DrawResult {
        kind,
        path: options.output.clone(),
    })
}
