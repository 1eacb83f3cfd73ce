//! List the stages a query would be drawn with

use super::CliError;
use crate::{build_diagram, parse_query};

/// One drawn stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageLabel {
    /// Absolute dotted id
    pub id: String,
    pub label: String,
    /// Label of the edge leaving the stage, if any
    pub output: Option<String>,
}

/// Build the diagram for `query` and list its stages in drawing order.
pub fn execute_labels(query: &str) -> Result<Vec<StageLabel>, CliError> {
    let diagram = build_diagram(&parse_query(query)?)?;
    let edges = diagram.edges();

    let stages = diagram
        .stages()
        .into_iter()
        .map(|(id, node)| {
            let output = edges
                .iter()
                .find(|(from, _, label)| *from == id && label.is_some())
                .and_then(|(_, _, label)| label.map(str::to_string));
            StageLabel {
                label: node.label.clone().unwrap_or_default(),
                id,
                output,
            }
        })
        .collect();
    Ok(stages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_outputs() {
        let stages = execute_labels("\"hi\" | length").unwrap();
        assert_eq!(stages.len(), 2);
        assert_eq!(stages[0].id, "n1");
        assert_eq!(stages[0].label, "\"hi\"");
        assert_eq!(stages[0].output.as_deref(), Some("\"string\""));
        assert_eq!(stages[1].label, "length()");
        assert_eq!(stages[1].output.as_deref(), Some("\"number\""));
    }
}
