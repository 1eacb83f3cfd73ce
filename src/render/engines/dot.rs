//! Graphviz `dot` layout.
//!
//! Each board is written as a digraph of fixed-size boxes, run through
//! `dot -Tplain`, and the node centers are read back from the plain output.
//! Plain output is in inches with the origin at the bottom-left, so
//! coordinates are scaled to points and flipped.

use graphviz_rust::{
    cmd::{CommandArg, Format, Layout},
    dot_structures::{
        Attribute, Edge as DotEdge, EdgeTy, Graph as DotGraph, GraphAttributes, Id, Node as DotNode,
        NodeId, Stmt, Vertex,
    },
    exec,
    printer::PrinterContext,
};
use tracing::trace;

use crate::render::{
    Direction,
    layout::{FlatGraph, LayoutEngine, LayoutError, Placement, Point},
};

pub const NAME: &str = "dot";

const POINTS_PER_INCH: f64 = 72.0;

#[derive(Debug, Clone, Default)]
pub struct DotEngine;

impl LayoutEngine for DotEngine {
    fn name(&self) -> &str {
        NAME
    }

    fn arrange(&self, graph: &FlatGraph) -> Result<Placement, LayoutError> {
        if graph.nodes.is_empty() {
            return Ok(Placement::default());
        }

        let output = exec(
            to_dot(graph),
            &mut PrinterContext::default(),
            vec![
                CommandArg::Format(Format::Plain),
                CommandArg::Layout(Layout::Dot),
            ],
        )
        .map_err(|e| engine_error(format!("failed to run dot: {}", e)))?;

        let text = String::from_utf8_lossy(&output);
        trace!(bytes = output.len(), "dot plain output");
        parse_plain(&text, graph.nodes.len())
    }
}

fn engine_error(message: String) -> LayoutError {
    LayoutError::Engine {
        engine: NAME.to_string(),
        message,
    }
}

fn vertex_id(index: usize) -> String {
    format!("v{}", index)
}

fn attr(key: &str, value: String) -> Attribute {
    Attribute(Id::Plain(key.to_string()), Id::Plain(value))
}

fn inches(points: f64) -> String {
    format!("{:.4}", points / POINTS_PER_INCH)
}

fn rankdir(direction: Direction) -> &'static str {
    match direction {
        Direction::Right => "LR",
        Direction::Left => "RL",
        Direction::Down => "TB",
        Direction::Up => "BT",
    }
}

/// Build the Graphviz document for one board.
fn to_dot(graph: &FlatGraph) -> DotGraph {
    let mut stmts = vec![
        Stmt::GAttribute(GraphAttributes::Graph(vec![
            attr("rankdir", rankdir(graph.direction).to_string()),
            attr("nodesep", inches(graph.node_gap)),
            attr("ranksep", inches(graph.rank_gap)),
        ])),
        Stmt::GAttribute(GraphAttributes::Node(vec![
            attr("shape", "box".to_string()),
            attr("fixedsize", "true".to_string()),
            Attribute(Id::Plain("label".to_string()), Id::Escaped("\"\"".to_string())),
        ])),
    ];

    for (index, size) in graph.nodes.iter().enumerate() {
        stmts.push(Stmt::Node(DotNode {
            id: NodeId(Id::Plain(vertex_id(index)), None),
            attributes: vec![
                attr("width", inches(size.width)),
                attr("height", inches(size.height)),
            ],
        }));
    }

    for &(from, to) in &graph.edges {
        stmts.push(Stmt::Edge(DotEdge {
            ty: EdgeTy::Pair(
                Vertex::N(NodeId(Id::Plain(vertex_id(from)), None)),
                Vertex::N(NodeId(Id::Plain(vertex_id(to)), None)),
            ),
            attributes: Vec::new(),
        }));
    }

    DotGraph::DiGraph {
        id: Id::Plain("board".to_string()),
        strict: false,
        stmts,
    }
}

/// Read node centers out of `dot -Tplain` output.
///
/// ```text
/// graph 1 2.5 0.5
/// node v0 0.3 0.25 0.5 0.3 "" solid box black lightgrey
/// edge v0 v1 4 ...
/// stop
/// ```
fn parse_plain(text: &str, count: usize) -> Result<Placement, LayoutError> {
    let mut height = None;
    let mut centers: Vec<Option<Point>> = vec![None; count];

    for line in text.lines() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        match fields.first().copied() {
            Some("graph") => {
                let h = fields.get(3).and_then(|v| v.parse::<f64>().ok());
                height = Some(h.ok_or_else(|| engine_error(format!("bad graph line '{}'", line)))?);
            }
            Some("node") => {
                let parsed = (|| {
                    let index: usize = fields.get(1)?.strip_prefix('v')?.parse().ok()?;
                    let x: f64 = fields.get(2)?.parse().ok()?;
                    let y: f64 = fields.get(3)?.parse().ok()?;
                    Some((index, x, y))
                })();
                let (index, x, y) =
                    parsed.ok_or_else(|| engine_error(format!("bad node line '{}'", line)))?;
                let slot = centers
                    .get_mut(index)
                    .ok_or_else(|| engine_error(format!("unknown node 'v{}'", index)))?;
                *slot = Some(Point::new(x, y));
            }
            Some("stop") => break,
            _ => {}
        }
    }

    let height = height.ok_or_else(|| engine_error("missing graph line".to_string()))?;
    let centers = centers
        .into_iter()
        .enumerate()
        .map(|(i, point)| {
            let point = point.ok_or_else(|| engine_error(format!("node 'v{}' was not placed", i)))?;
            Ok(Point::new(
                point.x * POINTS_PER_INCH,
                (height - point.y) * POINTS_PER_INCH,
            ))
        })
        .collect::<Result<Vec<_>, LayoutError>>()?;

    Ok(Placement { centers })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::layout::Size;
    use graphviz_rust::printer::DotPrinter;

    #[test]
    fn test_plain_output_is_scaled_and_flipped() {
        let text = "\
graph 1 2 1
node v0 0.5 0.75 0.5 0.3 \"\" solid box black lightgrey
node v1 1.5 0.25 0.5 0.3 \"\" solid box black lightgrey
edge v0 v1 4 0.75 0.75 1 0.5 1 0.5 1.25 0.25 solid black
stop
";
        let placement = parse_plain(text, 2).unwrap();
        assert_eq!(placement.centers[0], Point::new(36.0, 18.0));
        assert_eq!(placement.centers[1], Point::new(108.0, 54.0));
    }

    #[test]
    fn test_missing_node_is_an_error() {
        let err = parse_plain("graph 1 1 1\nnode v0 0 0 1 1\nstop\n", 2).unwrap_err();
        assert!(err.to_string().contains("v1"));
    }

    #[test]
    fn test_document_uses_fixed_size_boxes() {
        let graph = FlatGraph {
            direction: Direction::Right,
            nodes: vec![Size::new(72.0, 36.0), Size::new(144.0, 36.0)],
            edges: vec![(0, 1)],
            rank_gap: 36.0,
            node_gap: 18.0,
        };
        let text = to_dot(&graph).print(&mut PrinterContext::default());
        assert!(text.contains("rankdir"));
        assert!(text.contains("LR"));
        assert!(text.contains("1.0000"));
        assert!(text.contains("2.0000"));
        assert!(text.contains("->"));
    }
}
