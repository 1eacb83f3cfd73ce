//! In-memory diagram model.
//!
//! A [`Diagram`] is a tree of boards. Each [`Board`] is one scope holding
//! nodes and the edges between them; a container [`Node`] owns child boards
//! (`child_0`, `child_1`, ...), one per argument or object entry.
//!
//! Nodes are addressed by a [`ScopePath`] plus a relative id. Absolute ids
//! are dotted: `n2.child_0.n1` is node `n1` on board `child_0` of node `n2`.

use std::fmt;

/// Node shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Operations
    Rectangle,
    /// Start/end markers
    Circle,
}

impl Shape {
    pub fn as_str(self) -> &'static str {
        match self {
            Shape::Rectangle => "rectangle",
            Shape::Circle => "circle",
        }
    }

    pub fn parse(value: &str) -> Option<Shape> {
        match value {
            "rectangle" => Some(Shape::Rectangle),
            "circle" => Some(Shape::Circle),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: String,
    pub label: Option<String>,
    pub shape: Option<Shape>,
    pub boards: Vec<Board>,
}

impl Node {
    pub fn new(id: impl Into<String>) -> Self {
        Node {
            id: id.into(),
            label: None,
            shape: None,
            boards: Vec::new(),
        }
    }

    pub fn is_marker(&self) -> bool {
        self.shape == Some(Shape::Circle)
    }

    pub fn board(&self, name: &str) -> Option<&Board> {
        self.boards.iter().find(|b| b.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub label: Option<String>,
}

/// One scope: ordered nodes plus the edges between them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Board {
    pub name: String,
    pub label: Option<String>,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Board {
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub(crate) fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Drop a node and every edge touching it.
    pub fn remove_node(&mut self, id: &str) -> Option<Node> {
        let index = self.nodes.iter().position(|n| n.id == id)?;
        self.edges.retain(|e| e.from != id && e.to != id);
        Some(self.nodes.remove(index))
    }
}

/// Dotted address of a board: alternating node id and board name.
///
/// The root board is the empty path.
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash)]
pub struct ScopePath(Vec<String>);

impl ScopePath {
    pub fn root() -> Self {
        ScopePath(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Path of board `board` owned by node `node` on this board.
    pub fn child(&self, node: &str, board: &str) -> ScopePath {
        let mut segments = self.0.clone();
        segments.push(node.to_string());
        segments.push(board.to_string());
        ScopePath(segments)
    }

    /// Absolute id of a node living on this board.
    pub fn join(&self, id: &str) -> String {
        if self.is_root() {
            id.to_string()
        } else {
            format!("{}.{}", self, id)
        }
    }

    pub fn parse(path: &str) -> ScopePath {
        if path.is_empty() {
            return ScopePath::root();
        }
        ScopePath(path.split('.').map(str::to_string).collect())
    }
}

impl fmt::Display for ScopePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

/// A finished or in-progress diagram.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Diagram {
    root: Board,
}

impl Diagram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> &Board {
        &self.root
    }

    pub(crate) fn root_mut(&mut self) -> &mut Board {
        &mut self.root
    }

    pub fn board(&self, scope: &ScopePath) -> Option<&Board> {
        let mut board = &self.root;
        for pair in scope.segments().chunks(2) {
            let [node, name] = pair else {
                return None;
            };
            board = board.node(node)?.board(name)?;
        }
        Some(board)
    }

    pub(crate) fn board_mut(&mut self, scope: &ScopePath) -> Option<&mut Board> {
        let mut board = &mut self.root;
        for pair in scope.segments().chunks(2) {
            let [node, name] = pair else {
                return None;
            };
            board = board
                .node_mut(node)?
                .boards
                .iter_mut()
                .find(|b| &b.name == name)?;
        }
        Some(board)
    }

    /// Look up a node by absolute dotted id.
    pub fn node(&self, id: &str) -> Option<&Node> {
        let (scope, relative) = match id.rsplit_once('.') {
            Some((scope, relative)) => (ScopePath::parse(scope), relative),
            None => (ScopePath::root(), id),
        };
        self.board(&scope)?.node(relative)
    }

    /// Every node, depth first, with its absolute id.
    pub fn nodes(&self) -> Vec<(String, &Node)> {
        let mut out = Vec::new();
        collect_nodes(&self.root, &ScopePath::root(), &mut out);
        out
    }

    /// Every node except start/end markers.
    pub fn stages(&self) -> Vec<(String, &Node)> {
        self.nodes()
            .into_iter()
            .filter(|(_, node)| !node.is_marker())
            .collect()
    }

    /// Every edge with absolute endpoint ids.
    pub fn edges(&self) -> Vec<(String, String, Option<&str>)> {
        let mut out = Vec::new();
        collect_edges(&self.root, &ScopePath::root(), &mut out);
        out
    }
}

fn collect_nodes<'a>(board: &'a Board, scope: &ScopePath, out: &mut Vec<(String, &'a Node)>) {
    for node in &board.nodes {
        out.push((scope.join(&node.id), node));
        for child in &node.boards {
            collect_nodes(child, &scope.child(&node.id, &child.name), out);
        }
    }
}

fn collect_edges<'a>(
    board: &'a Board,
    scope: &ScopePath,
    out: &mut Vec<(String, String, Option<&'a str>)>,
) {
    for edge in &board.edges {
        out.push((scope.join(&edge.from), scope.join(&edge.to), edge.label.as_deref()));
    }
    for node in &board.nodes {
        for child in &node.boards {
            collect_edges(child, &scope.child(&node.id, &child.name), out);
        }
    }
}
