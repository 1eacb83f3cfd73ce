// tests/render_tests.rs

use std::fs;
use std::path::Path;

use jqflow::render::layout::{FlatGraph, LayoutEngine, LayoutError, Placement, Point};
use jqflow::render::{Direction, RasterError, compile};
use jqflow::{OutputKind, RenderError, RenderOptions, Renderer, build_diagram, parse_query, to_d2};
use tempfile::TempDir;

const QUERY: &str = "\"hello\" | base64_encode | base64_decode";

struct Broken;

impl LayoutEngine for Broken {
    fn name(&self) -> &str {
        "broken"
    }

    fn arrange(&self, _graph: &FlatGraph) -> Result<Placement, LayoutError> {
        Err(LayoutError::Engine {
            engine: "broken".to_string(),
            message: "no layout today".to_string(),
        })
    }
}

/// Places every box at a non-finite position.
struct Unplaced;

impl LayoutEngine for Unplaced {
    fn name(&self) -> &str {
        "unplaced"
    }

    fn arrange(&self, graph: &FlatGraph) -> Result<Placement, LayoutError> {
        Ok(Placement {
            centers: vec![Point::new(f64::NAN, 0.0); graph.nodes.len()],
        })
    }
}

fn renderer(engine: &str) -> Renderer {
    Renderer::new(RenderOptions {
        engine: engine.to_string(),
        ..RenderOptions::default()
    })
    .with_engine(Box::new(Broken))
    .with_engine(Box::new(Unplaced))
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

// ============================================================================
// Text output
// ============================================================================

#[test]
fn test_text_output_is_plain_diagram_text() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("flow.d2");
    let query = parse_query(QUERY).unwrap();

    let kind = Renderer::default().draw(&query, &path).unwrap();
    assert_eq!(kind, OutputKind::Text);

    let written = fs::read_to_string(&path).unwrap();
    assert_eq!(written, to_d2(&build_diagram(&query).unwrap()));
    assert!(!written.contains("layout-engine"));
    assert!(!written.contains("direction"));
}

#[test]
fn test_text_output_compiles_back() {
    let diagram = build_diagram(&parse_query("{a: map(.x)} | .a[1:]").unwrap()).unwrap();
    let compiled = compile(&to_d2(&diagram)).unwrap();

    assert_eq!(compiled.engine, None);
    let ids = |d: &jqflow::Diagram| -> Vec<(String, Option<String>)> {
        d.nodes()
            .into_iter()
            .map(|(id, node)| (id, node.label.clone()))
            .collect()
    };
    assert_eq!(ids(&compiled.diagram), ids(&diagram));

    let endpoints = |d: &jqflow::Diagram| -> Vec<(String, String)> {
        d.edges().into_iter().map(|(from, to, _)| (from, to)).collect()
    };
    assert_eq!(endpoints(&compiled.diagram), endpoints(&diagram));
}

// ============================================================================
// Image output
// ============================================================================

#[test]
fn test_svg_output() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("flow.svg");

    let kind = jqflow::draw(&parse_query(QUERY).unwrap(), &path).unwrap();
    assert_eq!(kind, OutputKind::Image);

    let svg = fs::read_to_string(&path).unwrap();
    assert!(svg.starts_with("<?xml"));
    assert!(svg.contains("base64_encode()"));
    assert!(svg.contains("&quot;hello&quot;"));
    assert_eq!(file_names(dir.path()), vec!["flow.svg"]);
}

#[test]
fn test_svg_output_with_containers() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested.svg");
    let query = parse_query("{name: .user | ascii_upcase, tags: map(select(. != null))}").unwrap();

    Renderer::default().draw(&query, &path).unwrap();
    let svg = fs::read_to_string(&path).unwrap();
    assert!(svg.contains("ascii_upcase()"));
    assert!(svg.contains("stroke-dasharray"));
}

#[test]
fn test_write_prebuilt_diagram() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("built.d2");
    let diagram = build_diagram(&parse_query("map(.x) | length").unwrap()).unwrap();

    let renderer = Renderer::new(RenderOptions {
        direction: Direction::Up,
        ..RenderOptions::default()
    });
    assert_eq!(renderer.options().direction, Direction::Up);
    assert_eq!(renderer.options().engine, "dagre");

    let kind = renderer.write_diagram(&diagram, &path).unwrap();
    assert_eq!(kind, OutputKind::Text);
    assert_eq!(fs::read_to_string(&path).unwrap(), to_d2(&diagram));

    let err = renderer
        .write_diagram(&diagram, &dir.path().join("built.png"))
        .unwrap_err();
    assert!(matches!(err, RenderError::UnsupportedFormat { .. }));
}

#[test]
fn test_prerender_carries_directives() {
    let renderer = Renderer::new(RenderOptions {
        direction: Direction::Down,
        ..RenderOptions::default()
    });
    let text = renderer.prerender(&build_diagram(&parse_query(".").unwrap()).unwrap());
    assert!(text.starts_with("direction: down\nlayout-engine: dagre\n"));

    let compiled = compile(&text).unwrap();
    assert_eq!(compiled.direction, Direction::Down);
    assert_eq!(compiled.engine.as_deref(), Some("dagre"));
    assert!(compiled.diagram.node("layout-engine").is_none());
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn test_layout_failure_saves_prerender_text() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("report.svg");

    let err = renderer("broken")
        .draw(&parse_query(QUERY).unwrap(), &path)
        .unwrap_err();

    let expected = dir.path().join("report.d2");
    match &err {
        RenderError::LayoutCompilation { saved, source } => {
            assert_eq!(saved, &expected);
            assert!(matches!(source, LayoutError::Engine { .. }));
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert!(err.to_string().contains("report.d2"));

    assert!(!path.exists());
    let saved = fs::read_to_string(&expected).unwrap();
    assert!(saved.starts_with("direction: right\nlayout-engine: broken\n"));
    assert!(saved.contains("base64_decode()"));
}

#[test]
fn test_raster_failure_saves_prerender_text() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("report.svg");

    let err = renderer("unplaced")
        .draw(&parse_query(". | length").unwrap(), &path)
        .unwrap_err();

    let expected = dir.path().join("report.d2");
    match &err {
        RenderError::Rasterization { saved, source } => {
            assert_eq!(saved, &expected);
            assert!(matches!(source, RasterError::NonFinite { .. }));
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert!(err.to_string().contains("report.d2"));

    assert!(!path.exists());
    assert_eq!(file_names(dir.path()), vec!["report.d2"]);
    let saved = fs::read_to_string(&expected).unwrap();
    assert!(saved.starts_with("direction: right\nlayout-engine: unplaced\n"));
}

#[test]
fn test_unsaved_prerender_text_is_io_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing").join("report.svg");

    let err = renderer("broken")
        .draw(&parse_query(QUERY).unwrap(), &path)
        .unwrap_err();

    match err {
        RenderError::Io { path: failed, .. } => {
            assert_eq!(failed, dir.path().join("missing").join("report.d2"));
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_unknown_engine_saves_prerender_text() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("report.svg");

    let err = renderer("nope")
        .draw(&parse_query(QUERY).unwrap(), &path)
        .unwrap_err();

    assert!(matches!(
        err,
        RenderError::LayoutCompilation {
            source: LayoutError::UnknownEngine { .. },
            ..
        }
    ));
    assert_eq!(file_names(dir.path()), vec!["report.d2"]);
}

#[test]
fn test_unsupported_extension_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("report.txt");

    let err = Renderer::default()
        .draw(&parse_query(QUERY).unwrap(), &path)
        .unwrap_err();

    match &err {
        RenderError::UnsupportedFormat { extension, .. } => assert_eq!(extension, ".txt"),
        other => panic!("unexpected error {:?}", other),
    }
    assert!(file_names(dir.path()).is_empty());
}

#[test]
fn test_missing_directory_is_io_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing").join("flow.d2");

    let err = Renderer::default()
        .draw(&parse_query(".").unwrap(), &path)
        .unwrap_err();
    assert!(matches!(err, RenderError::Io { .. }));
}
