//! Graph mutation primitives.
//!
//! Every operation consumes the graph and hands back the updated one, so a
//! stale handle cannot be used after a mutation.

use thiserror::Error;

use crate::diagram::{Board, Diagram, Edge, Node, ScopePath, Shape};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("node '{id}' already exists in scope '{scope}'")]
    DuplicateId { scope: String, id: String },

    #[error("scope '{0}' does not exist")]
    InvalidScope(String),

    #[error("node '{id}' does not exist in scope '{scope}'")]
    MissingNode { scope: String, id: String },

    #[error("edge {from} -> {to} in scope '{scope}' has a missing endpoint")]
    MissingEndpoint {
        scope: String,
        from: String,
        to: String,
    },

    #[error("attribute '{attribute}' of node '{id}' is already set")]
    AttributeAlreadySet { id: String, attribute: &'static str },

    #[error("invalid value '{value}' for attribute '{attribute}'")]
    InvalidAttribute { attribute: &'static str, value: String },
}

/// Node attributes settable after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    Label,
    Shape,
}

impl Attribute {
    pub fn as_str(self) -> &'static str {
        match self {
            Attribute::Label => "label",
            Attribute::Shape => "shape",
        }
    }
}

pub trait GraphBuilder: Sized {
    /// Create an unlabelled node on the board at `scope`.
    fn create_node(self, scope: &ScopePath, id: &str) -> Result<Self, GraphError>;

    /// Create child board `name` under node `node` on the board at `scope`.
    fn create_scope(
        self,
        scope: &ScopePath,
        node: &str,
        name: &str,
        label: Option<&str>,
    ) -> Result<Self, GraphError>;

    /// Set a node attribute. Each attribute may be set once.
    fn set_attribute(
        self,
        scope: &ScopePath,
        id: &str,
        attribute: Attribute,
        value: &str,
    ) -> Result<Self, GraphError>;

    /// Create an edge between two nodes of the same board.
    fn create_edge(
        self,
        scope: &ScopePath,
        from: &str,
        to: &str,
        label: Option<&str>,
    ) -> Result<Self, GraphError>;
}

fn board_at<'a>(diagram: &'a mut Diagram, scope: &ScopePath) -> Result<&'a mut Board, GraphError> {
    diagram
        .board_mut(scope)
        .ok_or_else(|| GraphError::InvalidScope(scope.to_string()))
}

impl GraphBuilder for Diagram {
    fn create_node(mut self, scope: &ScopePath, id: &str) -> Result<Self, GraphError> {
        let board = board_at(&mut self, scope)?;
        if board.node(id).is_some() {
            return Err(GraphError::DuplicateId {
                scope: scope.to_string(),
                id: id.to_string(),
            });
        }
        board.nodes.push(Node::new(id));
        Ok(self)
    }

    fn create_scope(
        mut self,
        scope: &ScopePath,
        node: &str,
        name: &str,
        label: Option<&str>,
    ) -> Result<Self, GraphError> {
        let board = board_at(&mut self, scope)?;
        let owner = board.node_mut(node).ok_or_else(|| GraphError::MissingNode {
            scope: scope.to_string(),
            id: node.to_string(),
        })?;
        if owner.board(name).is_some() {
            return Err(GraphError::DuplicateId {
                scope: scope.join(node),
                id: name.to_string(),
            });
        }
        owner.boards.push(Board {
            name: name.to_string(),
            label: label.map(str::to_string),
            ..Board::default()
        });
        Ok(self)
    }

    fn set_attribute(
        mut self,
        scope: &ScopePath,
        id: &str,
        attribute: Attribute,
        value: &str,
    ) -> Result<Self, GraphError> {
        let board = board_at(&mut self, scope)?;
        let node = board.node_mut(id).ok_or_else(|| GraphError::MissingNode {
            scope: scope.to_string(),
            id: id.to_string(),
        })?;
        let already_set = || GraphError::AttributeAlreadySet {
            id: scope.join(id),
            attribute: attribute.as_str(),
        };
        match attribute {
            Attribute::Label => {
                if node.label.is_some() {
                    return Err(already_set());
                }
                node.label = Some(value.to_string());
            }
            Attribute::Shape => {
                if node.shape.is_some() {
                    return Err(already_set());
                }
                let shape = Shape::parse(value).ok_or_else(|| GraphError::InvalidAttribute {
                    attribute: attribute.as_str(),
                    value: value.to_string(),
                })?;
                node.shape = Some(shape);
            }
        }
        Ok(self)
    }

    fn create_edge(
        mut self,
        scope: &ScopePath,
        from: &str,
        to: &str,
        label: Option<&str>,
    ) -> Result<Self, GraphError> {
        let board = board_at(&mut self, scope)?;
        if board.node(from).is_none() || board.node(to).is_none() {
            return Err(GraphError::MissingEndpoint {
                scope: scope.to_string(),
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        board.edges.push(Edge {
            from: from.to_string(),
            to: to.to_string(),
            label: label.map(str::to_string),
        });
        Ok(self)
    }
}
