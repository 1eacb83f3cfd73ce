//! Geometry for a compiled diagram.
//!
//! Boards are laid out bottom-up: every child board is placed first, its
//! container is sized to enclose the stacked boards, and only then is the
//! enclosing board handed to a [`LayoutEngine`] as a flat graph of boxes.
//! Engines only place box centers; edge routes are straight segments clipped
//! to the box outlines.

use std::collections::HashMap;

use thiserror::Error;
use tracing::trace;

use crate::{
    diagram::{Board, Diagram, Node, Shape},
    render::{Direction, compile::CompileError, theme::{TextBlock, Theme}},
};

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("compile error: {0}")]
    Compile(#[from] CompileError),

    #[error("unknown layout engine '{name}' (available: {available})")]
    UnknownEngine { name: String, available: String },

    #[error("layout engine '{engine}' failed: {message}")]
    Engine { engine: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Size { width, height }
    }
}

/// One board reduced to sized boxes and index pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatGraph {
    pub direction: Direction,
    pub nodes: Vec<Size>,
    pub edges: Vec<(usize, usize)>,
    /// Distance between consecutive ranks along the flow.
    pub rank_gap: f64,
    /// Distance between neighbours within a rank.
    pub node_gap: f64,
}

/// Box centers, in the same order as [`FlatGraph::nodes`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Placement {
    pub centers: Vec<Point>,
}

pub trait LayoutEngine {
    /// Name used by the `layout-engine` directive.
    fn name(&self) -> &str;

    fn arrange(&self, graph: &FlatGraph) -> Result<Placement, LayoutError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiagramLayout {
    pub size: Size,
    pub root: BoardLayout,
}

/// A laid-out board. Coordinates of its contents are relative to its top-left.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardLayout {
    pub name: String,
    pub label: Option<TextBlock>,
    pub size: Size,
    pub nodes: Vec<NodeLayout>,
    pub edges: Vec<EdgeLayout>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeLayout {
    pub id: String,
    pub text: TextBlock,
    pub shape: Shape,
    /// Top-left corner relative to the owning board.
    pub origin: Point,
    pub size: Size,
    /// Child boards with their top-left relative to this node.
    pub boards: Vec<(Point, BoardLayout)>,
}

impl NodeLayout {
    pub fn is_container(&self) -> bool {
        !self.boards.is_empty()
    }

    fn center(&self) -> Point {
        Point::new(
            self.origin.x + self.size.width / 2.0,
            self.origin.y + self.size.height / 2.0,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeLayout {
    pub from: String,
    pub to: String,
    pub points: Vec<Point>,
    pub label: Option<TextBlock>,
}

/// Lay out a whole diagram with `engine`.
pub fn layout_diagram(
    diagram: &Diagram,
    engine: &dyn LayoutEngine,
    direction: Direction,
    theme: &Theme,
) -> Result<DiagramLayout, LayoutError> {
    let root = layout_board(diagram.root(), engine, direction, theme)?;
    let pad = theme.canvas_padding * 2.0;
    Ok(DiagramLayout {
        size: Size::new(root.size.width + pad, root.size.height + pad),
        root,
    })
}

fn layout_board(
    board: &Board,
    engine: &dyn LayoutEngine,
    direction: Direction,
    theme: &Theme,
) -> Result<BoardLayout, LayoutError> {
    let label = board.label.as_deref().map(|l| theme.measure_label(l));
    let header = label
        .as_ref()
        .map(|l| l.height + theme.board_padding / 2.0)
        .unwrap_or(0.0);

    let mut nodes = board
        .nodes
        .iter()
        .map(|node| size_node(node, engine, direction, theme))
        .collect::<Result<Vec<_>, _>>()?;

    let index: HashMap<&str, usize> = board
        .nodes
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id.as_str(), i))
        .collect();
    let edges: Vec<(usize, usize)> = board
        .edges
        .iter()
        .filter_map(|e| Some((*index.get(e.from.as_str())?, *index.get(e.to.as_str())?)))
        .collect();

    let flat = FlatGraph {
        direction,
        nodes: nodes.iter().map(|n| n.size).collect(),
        edges,
        rank_gap: theme.rank_gap,
        node_gap: theme.node_gap,
    };
    let placement = engine.arrange(&flat)?;
    if placement.centers.len() != nodes.len() {
        return Err(LayoutError::Engine {
            engine: engine.name().to_string(),
            message: format!(
                "placed {} boxes for {} nodes",
                placement.centers.len(),
                nodes.len()
            ),
        });
    }

    for (node, center) in nodes.iter_mut().zip(&placement.centers) {
        node.origin = Point::new(
            center.x - node.size.width / 2.0,
            center.y - node.size.height / 2.0,
        );
    }

    // shift so the content starts inside the padding, below the label
    let min_x = nodes.iter().map(|n| n.origin.x).fold(f64::INFINITY, f64::min);
    let min_y = nodes.iter().map(|n| n.origin.y).fold(f64::INFINITY, f64::min);
    let (dx, dy) = if nodes.is_empty() {
        (0.0, 0.0)
    } else {
        (theme.board_padding - min_x, theme.board_padding + header - min_y)
    };
    for node in &mut nodes {
        node.origin.x += dx;
        node.origin.y += dy;
    }

    let content_width = nodes
        .iter()
        .map(|n| n.origin.x + n.size.width)
        .fold(0.0, f64::max);
    let content_height = nodes
        .iter()
        .map(|n| n.origin.y + n.size.height)
        .fold(header, f64::max);
    let label_width = label.as_ref().map(|l| l.width).unwrap_or(0.0);
    let size = Size::new(
        content_width.max(label_width + theme.board_padding) + theme.board_padding,
        content_height + theme.board_padding,
    );

    let edges = board
        .edges
        .iter()
        .filter_map(|edge| {
            let from = &nodes[*index.get(edge.from.as_str())?];
            let to = &nodes[*index.get(edge.to.as_str())?];
            Some(EdgeLayout {
                from: edge.from.clone(),
                to: edge.to.clone(),
                points: route(from, to),
                label: edge.label.as_deref().map(|l| theme.measure_label(l)),
            })
        })
        .collect();

    trace!(board = %board.name, nodes = nodes.len(), width = size.width, height = size.height, "board laid out");
    Ok(BoardLayout {
        name: board.name.clone(),
        label,
        size,
        nodes,
        edges,
    })
}

/// Size a node; containers are sized around their stacked child boards.
fn size_node(
    node: &Node,
    engine: &dyn LayoutEngine,
    direction: Direction,
    theme: &Theme,
) -> Result<NodeLayout, LayoutError> {
    let text = theme.measure_label(node.label.as_deref().unwrap_or(&node.id));
    let shape = node.shape.unwrap_or(Shape::Rectangle);

    let mut boards = Vec::with_capacity(node.boards.len());
    for board in &node.boards {
        boards.push(layout_board(board, engine, direction, theme)?);
    }

    let header = text.height + theme.node_padding_y * 2.0;
    let size = match shape {
        Shape::Circle => {
            let d = text.width.max(text.height) + theme.node_padding_y * 2.0;
            let d = d.max(theme.marker_diameter);
            Size::new(d, d)
        }
        Shape::Rectangle if boards.is_empty() => Size::new(
            (text.width + theme.node_padding_x * 2.0).max(theme.min_node_width),
            text.height + theme.node_padding_y * 2.0,
        ),
        Shape::Rectangle => {
            let widest = boards.iter().map(|b| b.size.width).fold(0.0, f64::max);
            let stacked: f64 = boards.iter().map(|b| b.size.height).sum::<f64>()
                + theme.board_gap * (boards.len() as f64 - 1.0);
            Size::new(
                (text.width + theme.node_padding_x * 2.0).max(widest + theme.board_padding * 2.0),
                header + stacked + theme.board_padding,
            )
        }
    };

    let mut y = header;
    let boards = boards
        .into_iter()
        .map(|board| {
            let origin = Point::new(theme.board_padding, y);
            y += board.size.height + theme.board_gap;
            (origin, board)
        })
        .collect();

    Ok(NodeLayout {
        id: node.id.clone(),
        text,
        shape,
        origin: Point::default(),
        size,
        boards,
    })
}

fn route(from: &NodeLayout, to: &NodeLayout) -> Vec<Point> {
    let (a, b) = (from.center(), to.center());
    vec![clip(from, a, b), clip(to, b, a)]
}

/// Point where the segment from the center `inside` towards `toward` leaves the box.
fn clip(node: &NodeLayout, inside: Point, toward: Point) -> Point {
    let (dx, dy) = (toward.x - inside.x, toward.y - inside.y);
    if dx == 0.0 && dy == 0.0 {
        return inside;
    }
    let (hw, hh) = (node.size.width / 2.0, node.size.height / 2.0);
    let t = match node.shape {
        Shape::Circle => hw / (dx * dx + dy * dy).sqrt(),
        Shape::Rectangle => {
            let tx = if dx == 0.0 { f64::INFINITY } else { hw / dx.abs() };
            let ty = if dy == 0.0 { f64::INFINITY } else { hh / dy.abs() };
            tx.min(ty)
        }
    };
    let t = t.min(1.0);
    Point::new(inside.x + dx * t, inside.y + dy * t)
}
