//! D2 text serialization for diagrams.
//!
//! Output is deterministic: nodes, child boards and edges are written in
//! creation order, so building the same query twice yields identical text.
//!
//! # Layout of the text
//!
//! - Every node is a block holding its `label` and `shape`.
//! - A container's child boards are nested blocks inside the node block,
//!   each with an optional `label`.
//! - Edges follow the nodes of the board they belong to.
//!
//! ```text
//! start: {
//!   shape: circle
//! }
//! n1: {
//!   label: "base64_encode()"
//!   shape: rectangle
//! }
//! start -> n1
//! ```
//!
//! # Examples
//!
//! ```
//! use jqflow::{build_diagram, parse_query};
//! use jqflow::output::to_d2;
//!
//! let diagram = build_diagram(&parse_query(". | length").unwrap()).unwrap();
//! let text = to_d2(&diagram);
//! assert!(text.contains("label: \"length()\""));
//! assert!(text.contains("n1 -> n2"));
//! ```

use crate::diagram::{Board, Diagram, Edge, Node};

pub struct D2Printer {
    indent_width: usize,
}

impl D2Printer {
    pub fn new(indent_width: usize) -> Self {
        D2Printer { indent_width }
    }

    pub fn print(&self, diagram: &Diagram) -> String {
        let mut out = String::new();
        self.print_board_body(diagram.root(), 0, &mut out);
        out
    }

    fn print_board_body(&self, board: &Board, indent: usize, out: &mut String) {
        for node in &board.nodes {
            self.print_node(node, indent, out);
        }
        for edge in &board.edges {
            self.print_edge(edge, indent, out);
        }
    }

    fn print_node(&self, node: &Node, indent: usize, out: &mut String) {
        let pad = self.indent(indent);
        out.push_str(&format!("{}{}: {{\n", pad, node.id));
        if let Some(label) = &node.label {
            out.push_str(&format!("{}label: {}\n", self.indent(indent + 1), self.quote(label)));
        }
        if let Some(shape) = node.shape {
            out.push_str(&format!("{}shape: {}\n", self.indent(indent + 1), shape.as_str()));
        }
        for board in &node.boards {
            self.print_child_board(board, indent + 1, out);
        }
        out.push_str(&format!("{}}}\n", pad));
    }

    fn print_child_board(&self, board: &Board, indent: usize, out: &mut String) {
        let pad = self.indent(indent);
        out.push_str(&format!("{}{}: {{\n", pad, board.name));
        if let Some(label) = &board.label {
            out.push_str(&format!("{}label: {}\n", self.indent(indent + 1), self.quote(label)));
        }
        self.print_board_body(board, indent + 1, out);
        out.push_str(&format!("{}}}\n", pad));
    }

    fn print_edge(&self, edge: &Edge, indent: usize, out: &mut String) {
        out.push_str(&self.indent(indent));
        out.push_str(&format!("{} -> {}", edge.from, edge.to));
        if let Some(label) = &edge.label {
            out.push_str(": ");
            out.push_str(&self.edge_label(label));
        }
        out.push('\n');
    }

    /// Type labels arrive already quoted (`"string"`); anything else is quoted here.
    fn edge_label(&self, label: &str) -> String {
        let quoted = label.len() >= 2 && label.starts_with('"') && label.ends_with('"');
        if quoted {
            label.to_string()
        } else {
            self.quote(label)
        }
    }

    fn quote(&self, s: &str) -> String {
        format!("\"{}\"", self.escape_string(s))
    }

    fn indent(&self, level: usize) -> String {
        " ".repeat(self.indent_width * level)
    }

    fn escape_string(&self, s: &str) -> String {
        s.chars()
            .flat_map(|c| match c {
                '"' => vec!['\\', '"'],
                '\\' => vec!['\\', '\\'],
                '\n' => vec!['\\', 'n'],
                '\r' => vec!['\\', 'r'],
                '\t' => vec!['\\', 't'],
                c if c.is_control() => format!("\\u{:04x}", c as u32).chars().collect(),
                c => vec![c],
            })
            .collect()
    }
}

/// Serialize a diagram to D2 text with 2-space indentation.
pub fn to_d2(diagram: &Diagram) -> String {
    D2Printer::new(2).print(diagram)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagram::{ScopePath, Shape};
    use crate::emitter::{Attribute, GraphBuilder};

    #[test]
    fn test_labels_are_escaped() {
        let root = ScopePath::root();
        let diagram = Diagram::new()
            .create_node(&root, "n1")
            .and_then(|d| d.set_attribute(&root, "n1", Attribute::Label, "\"hello\""))
            .unwrap();
        assert_eq!(to_d2(&diagram), "n1: {\n  label: \"\\\"hello\\\"\"\n}\n");
    }

    #[test]
    fn test_child_boards_nest_inside_node() {
        let root = ScopePath::root();
        let child = root.child("n1", "child_0");
        let diagram = Diagram::new()
            .create_node(&root, "n1")
            .and_then(|d| d.set_attribute(&root, "n1", Attribute::Shape, Shape::Rectangle.as_str()))
            .and_then(|d| d.create_scope(&root, "n1", "child_0", Some("arg 1")))
            .and_then(|d| d.create_node(&child, "n1"))
            .unwrap();
        let expected = "\
n1: {
  shape: rectangle
  child_0: {
    label: \"arg 1\"
    n1: {
    }
  }
}
";
        assert_eq!(to_d2(&diagram), expected);
    }

    #[test]
    fn test_quoted_edge_label_is_kept() {
        let printer = D2Printer::new(2);
        assert_eq!(printer.edge_label("\"string\""), "\"string\"");
        assert_eq!(printer.edge_label("bytes"), "\"bytes\"");
    }
}
