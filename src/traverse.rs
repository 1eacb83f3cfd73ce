//! Recursive descent over the query, emitting one diagram stage per
//! pipeline step.
//!
//! A [`Cursor`] is threaded through every call within one scope: it records
//! the last node emitted (so the next node can be wired to it) and the id
//! counter. Pipes emit nothing; they only pass the cursor and the inferred
//! type from left to right.

use thiserror::Error;
use tracing::{debug, trace};

use crate::{
    ast::{Index, Operator, Query, Term, TermKind},
    container,
    diagram::{Diagram, ScopePath, Shape},
    emitter::{Attribute, GraphBuilder, GraphError},
    infer::{self, SLICE_PREFIX, ValueType},
};

/// Id of the synthetic entry node of the top-level scope.
pub const START_NODE: &str = "start";
/// Id of the synthetic exit node of the top-level scope.
pub const END_NODE: &str = "end";

#[derive(Debug, Error)]
pub enum TraverseError {
    #[error("failed to emit '{node}': {source}")]
    Graph {
        node: String,
        #[source]
        source: GraphError,
    },

    #[error("{kind} {index} of '{container}' could not be drawn: {source}")]
    Argument {
        container: String,
        kind: &'static str,
        index: usize,
        #[source]
        source: Box<TraverseError>,
    },
}

/// Traversal state for one scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cursor {
    /// Relative id of the last node emitted; `None` while still at the scope entry.
    pub last_node: Option<String>,
    /// Number of ids allocated in this scope so far.
    pub counter: usize,
}

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next node id in this scope.
    pub fn next_id(&mut self) -> String {
        self.counter += 1;
        format!("n{}", self.counter)
    }
}

/// A board being filled, with its synthetic entry node if it has one.
#[derive(Debug, Clone)]
pub struct Scope {
    pub path: ScopePath,
    pub entry: Option<String>,
}

impl Scope {
    pub fn root() -> Self {
        Scope {
            path: ScopePath::root(),
            entry: Some(START_NODE.to_string()),
        }
    }

    /// A container child board; it has no entry node.
    pub fn nested(path: ScopePath) -> Self {
        Scope { path, entry: None }
    }

    fn graph_error(&self, id: &str) -> impl FnOnce(GraphError) -> TraverseError {
        let node = self.path.join(id);
        move |source| TraverseError::Graph { node, source }
    }
}

/// Build the complete diagram for a query.
pub fn build_diagram(query: &Query) -> Result<Diagram, TraverseError> {
    let scope = Scope::root();
    let graph = emit_marker(Diagram::new(), &scope, START_NODE)?;

    let mut cursor = Cursor::new();
    let (output, graph) = traverse(query, graph, &scope, &mut cursor, None)?;

    let graph = emit_marker(graph, &scope, END_NODE)?;
    let graph = connect(graph, &scope, &cursor, END_NODE, output)?;

    debug!(stages = cursor.counter, output = ?output, "diagram built");
    Ok(graph)
}

fn emit_marker<G: GraphBuilder>(graph: G, scope: &Scope, id: &str) -> Result<G, TraverseError> {
    graph
        .create_node(&scope.path, id)
        .and_then(|g| g.set_attribute(&scope.path, id, Attribute::Shape, Shape::Circle.as_str()))
        .map_err(scope.graph_error(id))
}

/// Wire `to` to whatever the cursor last visited.
///
/// From a real node the edge carries the incoming type; from the scope entry
/// it is unlabelled; a scope without entry gets no edge.
pub(crate) fn connect<G: GraphBuilder>(
    graph: G,
    scope: &Scope,
    cursor: &Cursor,
    to: &str,
    incoming: Option<ValueType>,
) -> Result<G, TraverseError> {
    let (from, label) = match (&cursor.last_node, &scope.entry) {
        (Some(last), _) => (last.as_str(), infer::type_edge_label(incoming)),
        (None, Some(entry)) => (entry.as_str(), None),
        (None, None) => return Ok(graph),
    };
    graph
        .create_edge(&scope.path, from, to, label.as_deref())
        .map_err(scope.graph_error(to))
}

/// Create a labelled rectangle, wire it in and move the cursor onto it.
pub(crate) fn emit_stage<G: GraphBuilder>(
    graph: G,
    scope: &Scope,
    cursor: &mut Cursor,
    label: &str,
    incoming: Option<ValueType>,
) -> Result<(String, G), TraverseError> {
    let id = cursor.next_id();
    trace!(scope = %scope.path, %id, label, "emit stage");

    let graph = graph
        .create_node(&scope.path, &id)
        .and_then(|g| g.set_attribute(&scope.path, &id, Attribute::Label, label))
        .and_then(|g| g.set_attribute(&scope.path, &id, Attribute::Shape, Shape::Rectangle.as_str()))
        .map_err(scope.graph_error(&id))?;
    let graph = connect(graph, scope, cursor, &id, incoming)?;

    cursor.last_node = Some(id.clone());
    Ok((id, graph))
}

/// Traverse one query node, returning its inferred output type.
pub fn traverse<G: GraphBuilder>(
    query: &Query,
    graph: G,
    scope: &Scope,
    cursor: &mut Cursor,
    incoming: Option<ValueType>,
) -> Result<(Option<ValueType>, G), TraverseError> {
    match query {
        Query::Binary {
            op: Operator::Pipe,
            left,
            right,
        } => {
            let (left_type, graph) = traverse(left, graph, scope, cursor, incoming)?;
            traverse(right, graph, scope, cursor, left_type)
        }
        Query::Binary {
            op: Operator::Comma,
            ..
        } => {
            trace!(kind = ?infer::unmodeled_kind(query), "unmodeled construct drawn as text");
            let (_, graph) = emit_stage(graph, scope, cursor, &query.to_string(), incoming)?;
            Ok((None, graph))
        }
        Query::Binary { op, left, right } => {
            traverse_operator(*op, left, right, graph, scope, cursor, incoming)
        }
        Query::Term(term) => traverse_term(term, graph, scope, cursor, incoming),
    }
}

/// Operator node first, then both operands as branches feeding into it.
fn traverse_operator<G: GraphBuilder>(
    op: Operator,
    left: &Query,
    right: &Query,
    graph: G,
    scope: &Scope,
    cursor: &mut Cursor,
    incoming: Option<ValueType>,
) -> Result<(Option<ValueType>, G), TraverseError> {
    let input = cursor.last_node.clone();
    let (id, mut graph) = emit_stage(graph, scope, cursor, op.symbol(), incoming)?;

    for operand in [left, right] {
        graph = attach_branch(operand, graph, scope, cursor, input.clone(), &id, incoming)?;
    }

    cursor.last_node = Some(id);
    Ok((infer::operator_type(op), graph))
}

/// Traverse `branch` starting from `input` and wire its tail into `target`.
///
/// The branch shares the scope's counter so ids stay unique.
fn attach_branch<G: GraphBuilder>(
    branch: &Query,
    graph: G,
    scope: &Scope,
    cursor: &mut Cursor,
    input: Option<String>,
    target: &str,
    incoming: Option<ValueType>,
) -> Result<G, TraverseError> {
    let mut local = Cursor {
        last_node: input.clone(),
        counter: cursor.counter,
    };
    let (branch_type, graph) = traverse(branch, graph, scope, &mut local, incoming)?;
    cursor.counter = local.counter;

    match local.last_node {
        Some(tail) if local.last_node != input => {
            let label = infer::type_edge_label(branch_type);
            graph
                .create_edge(&scope.path, &tail, target, label.as_deref())
                .map_err(scope.graph_error(target))
        }
        _ => Ok(graph),
    }
}

fn traverse_term<G: GraphBuilder>(
    term: &Term,
    graph: G,
    scope: &Scope,
    cursor: &mut Cursor,
    incoming: Option<ValueType>,
) -> Result<(Option<ValueType>, G), TraverseError> {
    let label = infer::term_label(term);
    let output = infer::term_type(term);

    // The label already carries the bounds; drawing them again would
    // duplicate the slice.
    if label.starts_with(SLICE_PREFIX) {
        let (_, graph) = emit_stage(graph, scope, cursor, &label, incoming)?;
        return Ok((output, graph));
    }

    match &term.kind {
        TermKind::Func(_) | TermKind::Object(_) => {
            container::build_container(term, graph, scope, cursor, incoming)
        }
        TermKind::Paren(inner) if term.suffixes.is_empty() => {
            traverse(inner, graph, scope, cursor, incoming)
        }
        TermKind::Array(Some(inner)) if inner.contains_call() => {
            stage_with_branch(inner, &label, output, graph, scope, cursor, incoming)
        }
        TermKind::Index(Index::Expr(key)) if key.contains_call() => {
            stage_with_branch(key, &label, output, graph, scope, cursor, incoming)
        }
        TermKind::Control(control) => {
            trace!(kind = control.kind(), "unmodeled construct drawn as text");
            let (_, graph) = emit_stage(graph, scope, cursor, &label, incoming)?;
            Ok((output, graph))
        }
        TermKind::Identity
        | TermKind::Recurse
        | TermKind::Null
        | TermKind::Boolean(_)
        | TermKind::Number(_)
        | TermKind::String(_)
        | TermKind::Format(..)
        | TermKind::Variable(_)
        | TermKind::Index(_)
        | TermKind::Array(_)
        | TermKind::Paren(_) => {
            let (_, graph) = emit_stage(graph, scope, cursor, &label, incoming)?;
            Ok((output, graph))
        }
    }
}

/// A plain stage whose inner query hangs off it as a dependency branch.
fn stage_with_branch<G: GraphBuilder>(
    inner: &Query,
    label: &str,
    output: Option<ValueType>,
    graph: G,
    scope: &Scope,
    cursor: &mut Cursor,
    incoming: Option<ValueType>,
) -> Result<(Option<ValueType>, G), TraverseError> {
    let input = cursor.last_node.clone();
    let (id, graph) = emit_stage(graph, scope, cursor, label, incoming)?;
    let graph = attach_branch(inner, graph, scope, cursor, input, &id, incoming)?;
    cursor.last_node = Some(id);
    Ok((output, graph))
}
