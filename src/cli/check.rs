//! Validate queries without writing anything

use super::CliError;
use crate::{build_diagram, parse_query};

/// Options for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// The query to validate
    pub query: String,
    /// Only validate syntax, don't build the diagram
    pub syntax_only: bool,
}

/// Result of a check operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckResult {
    /// Syntax validation passed
    SyntaxValid,
    /// The diagram was built; number of stages drawn
    Drawable { stages: usize },
}

/// Execute a check operation
pub fn execute_check(options: &CheckOptions) -> Result<CheckResult, CliError> {
    let query = parse_query(&options.query)?;
    if options.syntax_only {
        return Ok(CheckResult::SyntaxValid);
    }

    let diagram = build_diagram(&query)?;
    Ok(CheckResult::Drawable {
        stages: diagram.stages().len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntax_only() {
        let options = CheckOptions {
            query: ".a | length".to_string(),
            syntax_only: true,
        };
        assert_eq!(execute_check(&options).unwrap(), CheckResult::SyntaxValid);
    }

    #[test]
    fn test_counts_stages() {
        let options = CheckOptions {
            query: ".a | length".to_string(),
            syntax_only: false,
        };
        assert_eq!(
            execute_check(&options).unwrap(),
            CheckResult::Drawable { stages: 2 }
        );
    }

    #[test]
    fn test_syntax_error_is_reported() {
        let options = CheckOptions {
            query: ".a |".to_string(),
            syntax_only: true,
        };
        assert!(matches!(execute_check(&options), Err(CliError::Parse(_))));
    }
}
