//! Reads pre-render D2 text back into a [`Diagram`].
//!
//! Only the subset written by [`crate::output`] plus the two directive lines
//! is understood:
//!
//! ```text
//! direction: right          # root keyword
//! layout-engine: dagre      # shorthand node, read and stripped
//! n1: {                     # node block
//!   label: "length()"
//!   shape: rectangle
//!   child_0: {              # block inside a node is a child board
//!     label: "arg 1"
//!     ...
//!   }
//! }
//! n1 -> n2: "string"
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::{
    diagram::{Diagram, ScopePath},
    emitter::{Attribute, GraphBuilder, GraphError},
    render::Direction,
};

/// Root key naming the layout engine; becomes a pseudo-node until stripped.
pub const LAYOUT_ENGINE_KEY: &str = "layout-engine";
/// Root keyword setting the flow direction.
pub const DIRECTION_KEY: &str = "direction";

static EDGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([\w-]+)\s*->\s*([\w-]+)\s*(?::\s*(.+))?$").unwrap());
static BLOCK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([\w-]+)\s*:\s*\{$").unwrap());
static FIELD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([\w-]+)\s*:\s*(.+)$").unwrap());
static BARE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([\w-]+)$").unwrap());

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("line {line}: unclosed block '{key}'")]
    Unclosed { line: usize, key: String },

    #[error("line {line}: {source}")]
    Graph {
        line: usize,
        #[source]
        source: GraphError,
    },
}

/// Result of reading pre-render text.
#[derive(Debug, Clone, PartialEq)]
pub struct Compiled {
    pub diagram: Diagram,
    pub direction: Direction,
    /// Engine named by the `layout-engine` directive, if present.
    pub engine: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
enum Item {
    Field {
        line: usize,
        key: String,
        value: String,
    },
    Block {
        line: usize,
        key: String,
        items: Vec<Item>,
    },
    Edge {
        line: usize,
        from: String,
        to: String,
        label: Option<String>,
    },
    Bare {
        line: usize,
        key: String,
    },
}

/// Parse D2 text, apply root directives and strip the engine pseudo-node.
pub fn compile(source: &str) -> Result<Compiled, CompileError> {
    let items = parse_items(source)?;

    let mut direction = Direction::default();
    let mut body = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Item::Field { line, key, value } if key == DIRECTION_KEY => {
                direction = Direction::parse(&value).ok_or_else(|| CompileError::Syntax {
                    line,
                    message: format!("unknown direction '{}'", value),
                })?;
            }
            item => body.push(item),
        }
    }

    let mut diagram = build_board(Diagram::new(), &ScopePath::root(), &body)?;
    let engine = diagram
        .root_mut()
        .remove_node(LAYOUT_ENGINE_KEY)
        .and_then(|node| node.label);

    debug!(?direction, engine = ?engine, nodes = diagram.nodes().len(), "compiled diagram text");
    Ok(Compiled {
        diagram,
        direction,
        engine,
    })
}

// ============================================================================
// Line parsing
// ============================================================================

fn parse_items(source: &str) -> Result<Vec<Item>, CompileError> {
    // (line, key, items) of every open block, innermost last
    let mut stack: Vec<(usize, String, Vec<Item>)> = Vec::new();
    let mut top = Vec::new();

    for (index, raw) in source.lines().enumerate() {
        let line = index + 1;
        let text = raw.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }

        let item = if text == "}" {
            let (open_line, key, items) = stack.pop().ok_or_else(|| CompileError::Syntax {
                line,
                message: "unexpected '}'".to_string(),
            })?;
            Item::Block {
                line: open_line,
                key,
                items,
            }
        } else if let Some(caps) = BLOCK_RE.captures(text) {
            stack.push((line, caps[1].to_string(), Vec::new()));
            continue;
        } else if let Some(caps) = EDGE_RE.captures(text) {
            let label = match caps.get(3) {
                Some(m) => Some(parse_value(m.as_str(), line)?),
                None => None,
            };
            Item::Edge {
                line,
                from: caps[1].to_string(),
                to: caps[2].to_string(),
                label,
            }
        } else if let Some(caps) = FIELD_RE.captures(text) {
            Item::Field {
                line,
                key: caps[1].to_string(),
                value: parse_value(&caps[2], line)?,
            }
        } else if let Some(caps) = BARE_RE.captures(text) {
            Item::Bare {
                line,
                key: caps[1].to_string(),
            }
        } else {
            return Err(CompileError::Syntax {
                line,
                message: format!("cannot read '{}'", text),
            });
        };

        match stack.last_mut() {
            Some((_, _, items)) => items.push(item),
            None => top.push(item),
        }
    }

    if let Some((line, key, _)) = stack.pop() {
        return Err(CompileError::Unclosed { line, key });
    }
    Ok(top)
}

/// A bare word or a double-quoted string with JSON-style escapes.
fn parse_value(raw: &str, line: usize) -> Result<String, CompileError> {
    let raw = raw.trim();
    let Some(inner) = raw.strip_prefix('"') else {
        return Ok(raw.to_string());
    };

    let err = |message: &str| CompileError::Syntax {
        line,
        message: message.to_string(),
    };

    let mut out = String::new();
    let mut chars = inner.chars();
    loop {
        match chars.next() {
            None => return Err(err("unterminated string")),
            Some('"') => break,
            Some('\\') => match chars.next() {
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                Some('/') => out.push('/'),
                Some('n') => out.push('\n'),
                Some('r') => out.push('\r'),
                Some('t') => out.push('\t'),
                Some('u') => {
                    let hex: String = chars.by_ref().take(4).collect();
                    let c = u32::from_str_radix(&hex, 16)
                        .ok()
                        .and_then(char::from_u32)
                        .ok_or_else(|| err("invalid unicode escape"))?;
                    out.push(c);
                }
                _ => return Err(err("invalid escape")),
            },
            Some(c) => out.push(c),
        }
    }

    if !chars.as_str().trim().is_empty() {
        return Err(err("trailing text after string"));
    }
    Ok(out)
}

// ============================================================================
// Graph building
// ============================================================================

fn build_board(mut diagram: Diagram, scope: &ScopePath, items: &[Item]) -> Result<Diagram, CompileError> {
    // nodes first so edges may refer to nodes declared below them
    for item in items {
        diagram = match item {
            Item::Block { line, key, items } => build_node(diagram, scope, key, items, *line)?,
            Item::Bare { line, key } => graph(diagram.create_node(scope, key), *line)?,
            // board label, already applied by create_scope
            Item::Field { key, .. } if key == "label" && !scope.is_root() => diagram,
            Item::Field { line, key, value } => {
                let created = diagram
                    .create_node(scope, key)
                    .and_then(|d| d.set_attribute(scope, key, Attribute::Label, value));
                graph(created, *line)?
            }
            Item::Edge { .. } => diagram,
        };
    }

    for item in items {
        if let Item::Edge {
            line,
            from,
            to,
            label,
        } = item
        {
            diagram = graph(diagram.create_edge(scope, from, to, label.as_deref()), *line)?;
        }
    }
    Ok(diagram)
}

fn build_node(
    diagram: Diagram,
    scope: &ScopePath,
    id: &str,
    items: &[Item],
    line: usize,
) -> Result<Diagram, CompileError> {
    let mut diagram = graph(diagram.create_node(scope, id), line)?;

    for item in items {
        diagram = match item {
            Item::Field { line, key, value } => {
                let attribute = match key.as_str() {
                    "label" => Attribute::Label,
                    "shape" => Attribute::Shape,
                    other => {
                        return Err(CompileError::Syntax {
                            line: *line,
                            message: format!("unknown attribute '{}'", other),
                        });
                    }
                };
                graph(diagram.set_attribute(scope, id, attribute, value), *line)?
            }
            Item::Block {
                line,
                key: name,
                items: board_items,
            } => {
                let label = board_items.iter().find_map(|item| match item {
                    Item::Field { key, value, .. } if key == "label" => Some(value.as_str()),
                    _ => None,
                });
                let diagram = graph(diagram.create_scope(scope, id, name, label), *line)?;
                build_board(diagram, &scope.child(id, name), board_items)?
            }
            Item::Edge { line, .. } | Item::Bare { line, .. } => {
                return Err(CompileError::Syntax {
                    line: *line,
                    message: format!("unexpected statement inside node '{}'", id),
                });
            }
        };
    }
    Ok(diagram)
}

fn graph(result: Result<Diagram, GraphError>, line: usize) -> Result<Diagram, CompileError> {
    result.map_err(|source| CompileError::Graph { line, source })
}
