//! # Rendering
//!
//! Turns a finished [`Diagram`] into a file. The output path's extension
//! picks the target:
//!
//! - **`.d2`** - the diagram text, verbatim, no directives
//! - **`.svg`** - directives prepended, text compiled back, laid out by a
//!   [`LayoutEngine`] and rasterized
//!
//! Anything else is rejected before a graph is built.
//!
//! ## Image pipeline
//!
//! ```text
//! Diagram ──to_d2──▶ "direction: right\nlayout-engine: dagre\n..." (pre-render text)
//!                         │
//!                      compile        (directives read, pseudo-node stripped)
//!                         │
//!                   layout_diagram    (boards bottom-up, engine per board)
//!                         │
//!                     rasterize       (fixed theme and padding)
//!                         ▼
//!                        SVG
//! ```
//!
//! When any stage after the text is produced fails, the pre-render text is
//! saved next to the requested output as `<stem>.d2` and the error names it.
//!
//! ## Submodules
//!
//! - **[compile]** - D2 reader
//! - **[layout]** - geometry and the [`LayoutEngine`] trait
//! - **[engines]** - built-in `dagre` and `dot` engines
//! - **[svg]** - SVG writer
//! - **[theme]** - fixed theme and text measurement

pub mod compile;
pub mod engines;
pub mod layout;
pub mod svg;
pub mod theme;

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{debug, warn};

pub use compile::{CompileError, Compiled, compile};
pub use layout::{LayoutEngine, LayoutError};
pub use svg::RasterError;
pub use theme::Theme;

use crate::{
    ast::Query,
    diagram::Diagram,
    output::to_d2,
    traverse::{TraverseError, build_diagram},
};

/// Extension written for text output and for saved pre-render text.
pub const TEXT_EXTENSION: &str = "d2";
/// Extension written for image output.
pub const IMAGE_EXTENSION: &str = "svg";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(
        "unsupported output format '{extension}' for {}: expected .d2 or .svg",
        .path.display()
    )]
    UnsupportedFormat { path: PathBuf, extension: String },

    #[error(transparent)]
    Traverse(#[from] TraverseError),

    #[error("layout failed (pre-render text saved to {}): {source}", .saved.display())]
    LayoutCompilation {
        saved: PathBuf,
        #[source]
        source: LayoutError,
    },

    #[error("rasterization failed (pre-render text saved to {}): {source}", .saved.display())]
    Rasterization {
        saved: PathBuf,
        #[source]
        source: RasterError,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// What a given output path asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Text,
    Image,
}

impl OutputKind {
    pub fn from_path(path: &Path) -> Result<OutputKind, RenderError> {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_string())
            .unwrap_or_default();
        match extension.as_str() {
            TEXT_EXTENSION => Ok(OutputKind::Text),
            IMAGE_EXTENSION => Ok(OutputKind::Image),
            _ => Err(RenderError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension: if extension.is_empty() {
                    String::new()
                } else {
                    format!(".{}", extension)
                },
            }),
        }
    }
}

/// Flow direction of the drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Right,
    Down,
    Left,
    Up,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Right => "right",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Up => "up",
        }
    }

    pub fn parse(value: &str) -> Option<Direction> {
        match value {
            "right" => Some(Direction::Right),
            "down" => Some(Direction::Down),
            "left" => Some(Direction::Left),
            "up" => Some(Direction::Up),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    /// Layout engine name written into the `layout-engine` directive.
    pub engine: String,
    pub direction: Direction,
    pub theme: Theme,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            engine: engines::DEFAULT_ENGINE.to_string(),
            direction: Direction::default(),
            theme: Theme::default(),
        }
    }
}

/// Failure of the image pipeline, before the pre-render text is saved.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Raster(#[from] RasterError),
}

/// Writes diagrams to disk using a set of registered layout engines.
pub struct Renderer {
    engines: Vec<Box<dyn LayoutEngine>>,
    options: RenderOptions,
}

impl Default for Renderer {
    fn default() -> Self {
        Renderer::new(RenderOptions::default())
    }
}

impl Renderer {
    /// A renderer with the built-in engines.
    pub fn new(options: RenderOptions) -> Self {
        Renderer {
            engines: engines::builtin(),
            options,
        }
    }

    /// Register an engine, replacing any engine of the same name.
    pub fn with_engine(mut self, engine: Box<dyn LayoutEngine>) -> Self {
        self.engines.retain(|e| e.name() != engine.name());
        self.engines.push(engine);
        self
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn engine_names(&self) -> Vec<&str> {
        self.engines.iter().map(|e| e.name()).collect()
    }

    fn engine(&self, name: &str) -> Result<&dyn LayoutEngine, LayoutError> {
        self.engines
            .iter()
            .find(|e| e.name() == name)
            .map(|e| e.as_ref())
            .ok_or_else(|| LayoutError::UnknownEngine {
                name: name.to_string(),
                available: self.engine_names().join(", "),
            })
    }

    /// Diagram text with the image directives prepended.
    pub fn prerender(&self, diagram: &Diagram) -> String {
        format!(
            "{}: {}\n{}: {}\n{}",
            compile::DIRECTION_KEY,
            self.options.direction.as_str(),
            compile::LAYOUT_ENGINE_KEY,
            self.options.engine,
            to_d2(diagram)
        )
    }

    /// Compile pre-render text, lay it out and rasterize it.
    pub fn render_svg(&self, source: &str) -> Result<String, ImageError> {
        let compiled = compile(source).map_err(LayoutError::from)?;
        let name = compiled
            .engine
            .as_deref()
            .unwrap_or(engines::DEFAULT_ENGINE);
        let engine = self.engine(name)?;

        let geometry = layout::layout_diagram(
            &compiled.diagram,
            engine,
            compiled.direction,
            &self.options.theme,
        )?;
        debug!(engine = name, width = geometry.size.width, height = geometry.size.height, "laid out");
        Ok(svg::rasterize(&geometry, &self.options.theme)?)
    }

    /// Build the diagram for `query` and write it to `path`.
    ///
    /// The format is checked before any graph work.
    pub fn draw(&self, query: &Query, path: &Path) -> Result<OutputKind, RenderError> {
        let kind = OutputKind::from_path(path)?;
        let diagram = build_diagram(query)?;
        self.write(&diagram, path, kind)?;
        Ok(kind)
    }

    /// Write an already built diagram to `path`.
    pub fn write_diagram(&self, diagram: &Diagram, path: &Path) -> Result<OutputKind, RenderError> {
        let kind = OutputKind::from_path(path)?;
        self.write(diagram, path, kind)?;
        Ok(kind)
    }

    fn write(&self, diagram: &Diagram, path: &Path, kind: OutputKind) -> Result<(), RenderError> {
        match kind {
            OutputKind::Text => write_file(path, &to_d2(diagram)),
            OutputKind::Image => {
                let source = self.prerender(diagram);
                match self.render_svg(&source) {
                    Ok(svg) => write_file(path, &svg),
                    Err(err) => {
                        let saved = path.with_extension(TEXT_EXTENSION);
                        if let Err(io) = write_file(&saved, &source) {
                            warn!(error = %err, "image rendering failed, pre-render text not saved");
                            return Err(io);
                        }
                        warn!(saved = %saved.display(), error = %err, "image rendering failed");
                        Err(match err {
                            ImageError::Layout(source) => {
                                RenderError::LayoutCompilation { saved, source }
                            }
                            ImageError::Raster(source) => RenderError::Rasterization { saved, source },
                        })
                    }
                }
            }
        }
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), RenderError> {
    debug!(path = %path.display(), bytes = contents.len(), "writing");
    fs::write(path, contents).map_err(|source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Draw `query` to `path` with default options.
pub fn draw(query: &Query, path: &Path) -> Result<OutputKind, RenderError> {
    Renderer::default().draw(query, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_kind_from_extension() {
        assert_eq!(OutputKind::from_path(Path::new("a/b.d2")).unwrap(), OutputKind::Text);
        assert_eq!(OutputKind::from_path(Path::new("b.svg")).unwrap(), OutputKind::Image);

        let err = OutputKind::from_path(Path::new("report.txt")).unwrap_err();
        let message = err.to_string();
        assert!(message.contains(".txt"));
        assert!(message.contains(".d2"));
        assert!(message.contains(".svg"));

        assert!(OutputKind::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn test_prerender_starts_with_directives() {
        let renderer = Renderer::default();
        let text = renderer.prerender(&Diagram::new());
        assert_eq!(text, "direction: right\nlayout-engine: dagre\n");
    }

    #[test]
    fn test_with_engine_replaces_by_name() {
        let renderer = Renderer::default().with_engine(Box::new(engines::DagreEngine));
        assert_eq!(renderer.engine_names(), vec!["dot", "dagre"]);
    }
}
