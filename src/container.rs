//! Container nodes for function calls and object constructors.
//!
//! A container stands in for the whole construct in the enclosing scope.
//! Each argument (or object entry) is drawn on its own child board with a
//! fresh cursor, so arguments never see each other's nodes or ids.

use tracing::debug;

use crate::{
    ast::{Index, ObjectEntry, ObjectKey, Query, Term, TermKind},
    emitter::GraphBuilder,
    infer::{self, ValueType},
    traverse::{self, Cursor, Scope, TraverseError},
};

/// Name of the `k`-th child board of a container.
pub fn child_board(k: usize) -> String {
    format!("child_{}", k)
}

/// Draw `term` (a call or an object) as a container.
pub fn build_container<G: GraphBuilder>(
    term: &Term,
    graph: G,
    scope: &Scope,
    cursor: &mut Cursor,
    incoming: Option<ValueType>,
) -> Result<(Option<ValueType>, G), TraverseError> {
    let label = infer::container_label(term);
    let (id, mut graph) = traverse::emit_stage(graph, scope, cursor, &label, incoming)?;

    let children = children(&term.kind);
    debug!(container = %scope.path.join(&id), %label, children = children.len(), "container");

    for (index, child) in children.iter().enumerate() {
        let name = child_board(index);
        graph = graph
            .create_scope(&scope.path, &id, &name, Some(&child.label))
            .map_err(|source| TraverseError::Graph {
                node: scope.path.child(&id, &name).to_string(),
                source,
            })?;

        let nested = Scope::nested(scope.path.child(&id, &name));
        let mut local = Cursor::new();
        let (_, next) = traverse::traverse(&child.query, graph, &nested, &mut local, incoming)
            .map_err(|source| TraverseError::Argument {
                container: scope.path.join(&id),
                kind: child.kind,
                index,
                source: Box::new(source),
            })?;
        graph = next;
    }

    Ok((infer::term_type(term), graph))
}

/// One child board to draw: its board label and the query on it.
struct Child {
    kind: &'static str,
    label: String,
    query: Query,
}

fn children(kind: &TermKind) -> Vec<Child> {
    match kind {
        TermKind::Func(call) => call
            .args
            .iter()
            .enumerate()
            .map(|(i, arg)| Child {
                kind: "argument",
                label: format!("arg {}", i + 1),
                query: arg.clone(),
            })
            .collect(),
        TermKind::Object(entries) => entries.iter().map(entry_child).collect(),
        _ => Vec::new(),
    }
}

fn entry_child(entry: &ObjectEntry) -> Child {
    let label = match &entry.key {
        ObjectKey::Computed(q) => format!("({})", infer::compact(q)),
        key => key.to_string(),
    };
    let query = match (&entry.value, &entry.key) {
        (Some(value), _) => value.clone(),
        // `{a}` reads `.a`, `{$x}` reads `$x`
        (None, ObjectKey::Name(name)) => Query::term(TermKind::Index(Index::Name(name.clone()))),
        (None, ObjectKey::Variable(name)) => Query::term(TermKind::Variable(name.clone())),
        (None, ObjectKey::Computed(q)) => (**q).clone(),
    };
    Child {
        kind: "entry",
        label,
        query,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::FuncCall;

    #[test]
    fn test_shorthand_entries_synthesize_values() {
        let name = entry_child(&ObjectEntry {
            key: ObjectKey::Name("user".to_string()),
            value: None,
        });
        assert_eq!(name.label, "user");
        assert_eq!(name.query.to_string(), ".user");

        let var = entry_child(&ObjectEntry {
            key: ObjectKey::Variable("x".to_string()),
            value: None,
        });
        assert_eq!(var.label, "$x");
        assert_eq!(var.query.to_string(), "$x");
    }

    #[test]
    fn test_arguments_are_numbered_from_one() {
        let kind = TermKind::Func(FuncCall {
            name: "sub".to_string(),
            args: vec![
                Query::term(TermKind::String("a".to_string())),
                Query::term(TermKind::String("b".to_string())),
            ],
        });
        let labels: Vec<String> = children(&kind).into_iter().map(|c| c.label).collect();
        assert_eq!(labels, vec!["arg 1", "arg 2"]);
    }
}
