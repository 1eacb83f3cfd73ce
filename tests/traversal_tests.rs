// tests/traversal_tests.rs

use jqflow::diagram::{Diagram, ScopePath, Shape};
use jqflow::emitter::{Attribute, GraphBuilder, GraphError};
use jqflow::traverse::{self, Cursor, END_NODE, START_NODE, Scope, TraverseError};
use jqflow::{build_diagram, parse_query};

fn diagram(query: &str) -> Diagram {
    build_diagram(&parse_query(query).unwrap()).unwrap()
}

fn labels(diagram: &Diagram) -> Vec<(String, String)> {
    diagram
        .stages()
        .into_iter()
        .map(|(id, node)| (id, node.label.clone().unwrap_or_default()))
        .collect()
}

fn edges(diagram: &Diagram) -> Vec<(String, String, Option<String>)> {
    diagram
        .edges()
        .into_iter()
        .map(|(from, to, label)| (from, to, label.map(str::to_string)))
        .collect()
}

fn edge(from: &str, to: &str, label: Option<&str>) -> (String, String, Option<String>) {
    (from.to_string(), to.to_string(), label.map(str::to_string))
}

// ============================================================================
// Pipelines
// ============================================================================

#[test]
fn test_codec_pipeline() {
    let d = diagram("\"hello\" | base64_encode | base64_decode");

    assert_eq!(
        labels(&d),
        vec![
            ("n1".to_string(), "\"hello\"".to_string()),
            ("n2".to_string(), "base64_encode()".to_string()),
            ("n3".to_string(), "base64_decode()".to_string()),
        ]
    );
    assert_eq!(
        edges(&d),
        vec![
            edge(START_NODE, "n1", None),
            edge("n1", "n2", Some("\"string\"")),
            edge("n2", "n3", Some("\"string\"")),
            edge("n3", END_NODE, Some("\"string\"")),
        ]
    );
}

#[test]
fn test_markers_are_circles() {
    let d = diagram(".");
    assert_eq!(d.node(START_NODE).unwrap().shape, Some(Shape::Circle));
    assert_eq!(d.node(END_NODE).unwrap().shape, Some(Shape::Circle));
    assert_eq!(d.node("n1").unwrap().shape, Some(Shape::Rectangle));
}

#[test]
fn test_pipe_emits_no_node() {
    let d = diagram(".a | .b | .c | length");
    assert_eq!(d.stages().len(), 4);
    assert_eq!(d.nodes().len(), 6);
}

#[test]
fn test_unknown_type_leaves_edge_unlabelled() {
    let d = diagram(".a | length");
    assert!(edges(&d).contains(&edge("n1", "n2", None)));
    assert!(edges(&d).contains(&edge("n2", END_NODE, Some("\"number\""))));
}

#[test]
fn test_building_twice_is_identical() {
    let query = parse_query("{a: map(.x + 1), b} | .a[2:] | length").unwrap();
    assert_eq!(build_diagram(&query).unwrap(), build_diagram(&query).unwrap());
}

// ============================================================================
// Slices
// ============================================================================

#[test]
fn test_bare_slice_is_one_stage() {
    let d = diagram(".[0:3]");
    assert_eq!(labels(&d), vec![("n1".to_string(), "Slice [0:3]".to_string())]);
}

#[test]
fn test_suffix_slice_is_one_stage() {
    let d = diagram(".items[2:] | length");
    assert_eq!(
        labels(&d),
        vec![
            ("n1".to_string(), "Slice [2:]".to_string()),
            ("n2".to_string(), "length()".to_string()),
        ]
    );
}

// ============================================================================
// Containers
// ============================================================================

#[test]
fn test_argument_is_drawn_on_child_board() {
    let d = diagram("map(.x)");
    assert_eq!(
        labels(&d),
        vec![
            ("n1".to_string(), "map()".to_string()),
            ("n1.child_0.n1".to_string(), ".x".to_string()),
        ]
    );

    let board = d.board(&ScopePath::parse("n1.child_0")).unwrap();
    assert_eq!(board.label.as_deref(), Some("arg 1"));
    assert!(board.edges.is_empty());
}

#[test]
fn test_arguments_are_independent() {
    let d = diagram("sub(\"a\" | ascii_downcase; \"b\")");
    let ids: Vec<String> = d.stages().into_iter().map(|(id, _)| id).collect();
    assert_eq!(
        ids,
        vec!["n1", "n1.child_0.n1", "n1.child_0.n2", "n1.child_1.n1"]
    );

    let second = d.board(&ScopePath::parse("n1.child_1")).unwrap();
    assert_eq!(second.label.as_deref(), Some("arg 2"));
    assert!(second.edges.is_empty());

    let first = d.board(&ScopePath::parse("n1.child_0")).unwrap();
    assert_eq!(first.edges.len(), 1);
}

#[test]
fn test_argument_boards_ignore_their_siblings() {
    let chain = "\"a\" | ascii_downcase";
    let drawings = [
        (diagram(&format!("sub({}; \"b\")", chain)), "n1.child_0"),
        (diagram(&format!("sub(\"b\"; {})", chain)), "n1.child_1"),
        (diagram(&format!("f({})", chain)), "n1.child_0"),
    ];

    let (reference, scope) = &drawings[0];
    let expected = reference.board(&ScopePath::parse(scope)).unwrap();
    assert_eq!(expected.nodes.len(), 2);
    assert_eq!(
        expected.edges.iter().map(|e| (e.from.as_str(), e.to.as_str())).collect::<Vec<_>>(),
        vec![("n1", "n2")]
    );

    for (d, scope) in &drawings {
        let board = d.board(&ScopePath::parse(scope)).unwrap();
        assert_eq!(board.nodes, expected.nodes, "{}", scope);
        assert_eq!(board.edges, expected.edges, "{}", scope);

        let container = d.node("n1").unwrap();
        let inner: usize = container.boards.iter().map(|b| b.nodes.len()).sum();
        assert_eq!(d.stages().len(), 1 + inner);
    }
}

#[test]
fn test_nested_containers() {
    let d = diagram("map(select(.ok))");
    assert!(d.node("n1.child_0.n1").is_some());
    assert_eq!(
        d.node("n1.child_0.n1.child_0.n1").unwrap().label.as_deref(),
        Some(".ok")
    );
}

#[test]
fn test_object_entries_become_boards() {
    let d = diagram("{name: .user | ascii_upcase, id}");
    let root = d.node("n1").unwrap();
    let names: Vec<&str> = root.boards.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec!["child_0", "child_1"]);

    let board_labels: Vec<Option<&str>> = root.boards.iter().map(|b| b.label.as_deref()).collect();
    assert_eq!(board_labels, vec![Some("name"), Some("id")]);

    assert_eq!(
        d.node("n1.child_1.n1").unwrap().label.as_deref(),
        Some(".id")
    );
}

#[test]
fn test_container_type_flows_on() {
    let d = diagram("\"x\" | ltrimstr(\"y\") | length");
    assert!(edges(&d).contains(&edge("n1", "n2", Some("\"string\""))));
    assert!(edges(&d).contains(&edge("n2", "n3", None)));
}

// ============================================================================
// Operators and dependency branches
// ============================================================================

#[test]
fn test_binary_operator_collects_operands() {
    let d = diagram(".a + 1");
    assert_eq!(
        labels(&d),
        vec![
            ("n1".to_string(), "+".to_string()),
            ("n2".to_string(), ".a".to_string()),
            ("n3".to_string(), "1".to_string()),
        ]
    );
    let all = edges(&d);
    assert!(all.contains(&edge("n2", "n1", None)));
    assert!(all.contains(&edge("n3", "n1", Some("\"number\""))));
    assert!(all.contains(&edge("n1", END_NODE, Some("\"number\""))));
}

#[test]
fn test_operator_branches_start_from_previous_stage() {
    let d = diagram(".items | length > 3");
    let all = edges(&d);
    // both operands read what `.items` produced
    assert!(all.contains(&edge("n1", "n3", None)));
    assert!(all.contains(&edge("n1", "n4", None)));
    assert!(all.contains(&edge("n2", END_NODE, Some("\"boolean\""))));
}

#[test]
fn test_array_with_call_has_dependency_branch() {
    let d = diagram("[.[] | length]");
    assert_eq!(d.stages().len(), 3);
    assert_eq!(d.node("n1").unwrap().label.as_deref(), Some("[.[] | length()]"));
    assert!(edges(&d).contains(&edge("n3", "n1", Some("\"number\""))));
}

#[test]
fn test_array_without_call_is_plain() {
    let d = diagram("[.a, .b]");
    assert_eq!(d.stages().len(), 1);
}

#[test]
fn test_parens_are_transparent() {
    let d = diagram("(.a | length)");
    assert_eq!(d.stages().len(), 2);
}

// ============================================================================
// Unmodeled constructs
// ============================================================================

#[test]
fn test_comma_is_drawn_as_text() {
    let d = diagram(".a, .b | length");
    assert_eq!(
        labels(&d),
        vec![
            ("n1".to_string(), ".a, .b".to_string()),
            ("n2".to_string(), "length()".to_string()),
        ]
    );
}

#[test]
fn test_control_is_drawn_as_text() {
    let d = diagram("if .a then 1 else 2 end | tostring");
    assert_eq!(
        d.node("n1").unwrap().label.as_deref(),
        Some("if .a then 1 else 2 end")
    );
    assert_eq!(d.stages().len(), 2);
}

// ============================================================================
// Graph builder seam
// ============================================================================

/// Builder that refuses any node labelled `poison`.
struct Refusing(Diagram);

impl GraphBuilder for Refusing {
    fn create_node(self, scope: &ScopePath, id: &str) -> Result<Self, GraphError> {
        self.0.create_node(scope, id).map(Refusing)
    }

    fn create_scope(
        self,
        scope: &ScopePath,
        node: &str,
        name: &str,
        label: Option<&str>,
    ) -> Result<Self, GraphError> {
        self.0.create_scope(scope, node, name, label).map(Refusing)
    }

    fn set_attribute(
        self,
        scope: &ScopePath,
        id: &str,
        attribute: Attribute,
        value: &str,
    ) -> Result<Self, GraphError> {
        if value == "poison()" {
            return Err(GraphError::InvalidAttribute {
                attribute: attribute.as_str(),
                value: value.to_string(),
            });
        }
        self.0.set_attribute(scope, id, attribute, value).map(Refusing)
    }

    fn create_edge(
        self,
        scope: &ScopePath,
        from: &str,
        to: &str,
        label: Option<&str>,
    ) -> Result<Self, GraphError> {
        self.0.create_edge(scope, from, to, label).map(Refusing)
    }
}

#[test]
fn test_emit_failure_names_the_node() {
    let query = parse_query(".a | poison").unwrap();
    let mut cursor = Cursor::new();
    let result = traverse::traverse(&query, Refusing(Diagram::new()), &Scope::nested(ScopePath::root()), &mut cursor, None);
    let Err(err) = result else {
        panic!("expected a failure");
    };
    assert!(matches!(err, TraverseError::Graph { ref node, .. } if node == "n2"));
}

#[test]
fn test_argument_failure_is_wrapped() {
    let query = parse_query("map(poison)").unwrap();
    let mut cursor = Cursor::new();
    let result = traverse::traverse(&query, Refusing(Diagram::new()), &Scope::nested(ScopePath::root()), &mut cursor, None);
    let Err(err) = result else {
        panic!("expected a failure");
    };
    match err {
        TraverseError::Argument {
            container,
            kind,
            index,
            source,
        } => {
            assert_eq!(container, "n1");
            assert_eq!(kind, "argument");
            assert_eq!(index, 0);
            assert!(matches!(*source, TraverseError::Graph { ref node, .. } if node == "n1.child_0.n1"));
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_cursor_allocates_sequential_ids() {
    let mut cursor = Cursor::new();
    assert_eq!(cursor.next_id(), "n1");
    assert_eq!(cursor.next_id(), "n2");
    assert_eq!(cursor.counter, 2);
    assert_eq!(cursor.last_node, None);
}
