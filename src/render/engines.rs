//! Built-in layout engines.
//!
//! - **[dagre]** - native layered layout (longest-path ranks, barycenter ordering)
//! - **[dot]** - Graphviz `dot`, driven through `graphviz-rust`

pub mod dagre;
pub mod dot;

pub use dagre::DagreEngine;
pub use dot::DotEngine;

use crate::render::layout::LayoutEngine;

/// Engine used when nothing else is requested.
pub const DEFAULT_ENGINE: &str = dagre::NAME;

/// Every built-in engine, in lookup order.
pub fn builtin() -> Vec<Box<dyn LayoutEngine>> {
    vec![Box::new(DagreEngine), Box::new(DotEngine)]
}
