// tests/cli_tests.rs

use std::fs;

use jqflow::cli::{
    CheckOptions, CheckResult, CliError, DrawOptions, execute_check, execute_draw, execute_labels,
};
use jqflow::OutputKind;
use tempfile::TempDir;

fn draw_options(query: &str, output: std::path::PathBuf) -> DrawOptions {
    DrawOptions {
        query: query.to_string(),
        output,
        engine: "dagre".to_string(),
        direction: "right".to_string(),
    }
}

#[test]
fn test_check_counts_stages() {
    let result = execute_check(&CheckOptions {
        query: "map(.x) | length".to_string(),
        syntax_only: false,
    })
    .unwrap();
    assert_eq!(result, CheckResult::Drawable { stages: 3 });
}

#[test]
fn test_check_syntax_only() {
    let result = execute_check(&CheckOptions {
        query: ".a | .b".to_string(),
        syntax_only: true,
    })
    .unwrap();
    assert_eq!(result, CheckResult::SyntaxValid);
}

#[test]
fn test_check_reports_parse_errors() {
    let err = execute_check(&CheckOptions {
        query: ".a |".to_string(),
        syntax_only: true,
    })
    .unwrap_err();
    assert!(matches!(err, CliError::Parse(_)));
}

#[test]
fn test_labels_follow_drawing_order() {
    let stages = execute_labels("\"hello\" | base64_encode | base64_decode").unwrap();
    let rows: Vec<(&str, &str, Option<&str>)> = stages
        .iter()
        .map(|s| (s.id.as_str(), s.label.as_str(), s.output.as_deref()))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("n1", "\"hello\"", Some("\"string\"")),
            ("n2", "base64_encode()", Some("\"string\"")),
            ("n3", "base64_decode()", Some("\"string\"")),
        ]
    );
}

#[test]
fn test_draw_text() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.d2");

    let result = execute_draw(&draw_options(".[0:3]", output.clone())).unwrap();
    assert_eq!(result.kind, OutputKind::Text);
    assert_eq!(result.path, output);
    assert!(fs::read_to_string(&output).unwrap().contains("Slice [0:3]"));
}

#[test]
fn test_draw_image_downwards() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("out.svg");
    let mut options = draw_options(".a | length", output.clone());
    options.direction = "down".to_string();

    let result = execute_draw(&options).unwrap();
    assert_eq!(result.kind, OutputKind::Image);
    assert!(output.exists());
}

#[test]
fn test_draw_rejects_unknown_direction() {
    let dir = TempDir::new().unwrap();
    let mut options = draw_options(".", dir.path().join("out.svg"));
    options.direction = "sideways".to_string();

    let err = execute_draw(&options).unwrap_err();
    assert!(matches!(err, CliError::InvalidDirection(ref d) if d == "sideways"));
    assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[test]
fn test_draw_unknown_engine_keeps_text() {
    let dir = TempDir::new().unwrap();
    let mut options = draw_options(".a", dir.path().join("out.svg"));
    options.engine = "neato".to_string();

    let err = execute_draw(&options).unwrap_err();
    assert!(matches!(err, CliError::Render(_)));
    assert!(err.to_string().contains("out.d2"));
    assert!(dir.path().join("out.d2").exists());
}
