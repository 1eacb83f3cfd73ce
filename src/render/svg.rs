//! SVG rasterization of a laid-out diagram.
//!
//! Boards and containers are nested `<g>` groups translated to their
//! origin, so every element is written in its board's own coordinates.

use std::fmt::{self, Write};

use thiserror::Error;

use crate::{
    diagram::Shape,
    render::{
        layout::{BoardLayout, DiagramLayout, EdgeLayout, NodeLayout, Point},
        theme::{TextBlock, Theme},
    },
};

#[derive(Debug, Error)]
pub enum RasterError {
    #[error("non-finite geometry in {element}")]
    NonFinite { element: String },

    #[error("failed to write svg: {0}")]
    Format(#[from] fmt::Error),
}

/// Rasterize a layout to SVG text.
pub fn rasterize(layout: &DiagramLayout, theme: &Theme) -> Result<String, RasterError> {
    check_finite("diagram", &[layout.size.width, layout.size.height])?;

    let mut svg = String::new();
    write!(
        svg,
        r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{w:.0}" height="{h:.0}" viewBox="0 0 {w:.0} {h:.0}" font-family="{font}" font-size="{size}">
  <defs>
    <marker id="arrow" markerWidth="10" markerHeight="10" refX="9" refY="5" orient="auto" markerUnits="userSpaceOnUse">
      <path d="M0,0 L10,5 L0,10 z" fill="{edge}" />
    </marker>
  </defs>
  <rect width="100%" height="100%" fill="{bg}" />
"##,
        w = layout.size.width,
        h = layout.size.height,
        font = theme.font_family,
        size = theme.font_size,
        edge = theme.edge_stroke,
        bg = theme.background,
    )?;

    let origin = Point::new(theme.canvas_padding, theme.canvas_padding);
    write_board_contents(&mut svg, &layout.root, origin, theme, 1)?;
    svg.push_str("</svg>\n");
    Ok(svg)
}

fn check_finite(element: &str, values: &[f64]) -> Result<(), RasterError> {
    if values.iter().all(|v| v.is_finite()) {
        Ok(())
    } else {
        Err(RasterError::NonFinite {
            element: element.to_string(),
        })
    }
}

fn pad(depth: usize) -> String {
    "  ".repeat(depth)
}

fn write_board_contents(
    svg: &mut String,
    board: &BoardLayout,
    origin: Point,
    theme: &Theme,
    depth: usize,
) -> Result<(), RasterError> {
    check_finite(&format!("board '{}'", board.name), &[origin.x, origin.y])?;
    writeln!(
        svg,
        "{}<g transform=\"translate({:.1},{:.1})\">",
        pad(depth),
        origin.x,
        origin.y
    )?;

    for edge in &board.edges {
        write_edge(svg, edge, theme, depth + 1)?;
    }
    for node in &board.nodes {
        write_node(svg, node, theme, depth + 1)?;
    }

    writeln!(svg, "{}</g>", pad(depth))?;
    Ok(())
}

fn write_node(svg: &mut String, node: &NodeLayout, theme: &Theme, depth: usize) -> Result<(), RasterError> {
    check_finite(
        &format!("node '{}'", node.id),
        &[node.origin.x, node.origin.y, node.size.width, node.size.height],
    )?;
    let p = pad(depth);
    let (x, y, w, h) = (node.origin.x, node.origin.y, node.size.width, node.size.height);

    match node.shape {
        Shape::Circle => {
            writeln!(
                svg,
                "{}<circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"{:.1}\" fill=\"{}\" />",
                p,
                x + w / 2.0,
                y + h / 2.0,
                w / 2.0,
                theme.marker_fill
            )?;
            write_text(svg, &node.text, Point::new(x + w / 2.0, y + h / 2.0), theme.background, depth)?;
        }
        Shape::Rectangle if node.is_container() => {
            writeln!(
                svg,
                "{}<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" rx=\"6\" fill=\"{}\" stroke=\"{}\" stroke-width=\"2\" />",
                p, x, y, w, h, theme.container_fill, theme.node_stroke
            )?;
            let header = node.text.height + theme.node_padding_y * 2.0;
            write_text(svg, &node.text, Point::new(x + w / 2.0, y + header / 2.0), theme.text, depth)?;

            for (offset, board) in &node.boards {
                let origin = Point::new(x + offset.x, y + offset.y);
                write_board_frame(svg, board, origin, theme, depth)?;
                write_board_contents(svg, board, origin, theme, depth)?;
            }
        }
        Shape::Rectangle => {
            writeln!(
                svg,
                "{}<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" rx=\"4\" fill=\"{}\" stroke=\"{}\" stroke-width=\"2\" />",
                p, x, y, w, h, theme.node_fill, theme.node_stroke
            )?;
            write_text(svg, &node.text, Point::new(x + w / 2.0, y + h / 2.0), theme.text, depth)?;
        }
    }
    Ok(())
}

fn write_board_frame(
    svg: &mut String,
    board: &BoardLayout,
    origin: Point,
    theme: &Theme,
    depth: usize,
) -> Result<(), RasterError> {
    check_finite(
        &format!("board '{}'", board.name),
        &[board.size.width, board.size.height],
    )?;
    writeln!(
        svg,
        "{}<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" rx=\"4\" fill=\"{}\" stroke=\"{}\" stroke-dasharray=\"4 3\" />",
        pad(depth),
        origin.x,
        origin.y,
        board.size.width,
        board.size.height,
        theme.board_fill,
        theme.board_stroke
    )?;
    if let Some(label) = &board.label {
        let anchor = Point::new(
            origin.x + theme.board_padding / 2.0,
            origin.y + theme.board_padding / 2.0 + label.height / 2.0,
        );
        write_lines(svg, label, anchor, "start", theme.muted_text, depth)?;
    }
    Ok(())
}

fn write_edge(svg: &mut String, edge: &EdgeLayout, theme: &Theme, depth: usize) -> Result<(), RasterError> {
    let coords: Vec<f64> = edge.points.iter().flat_map(|p| [p.x, p.y]).collect();
    check_finite(&format!("edge {} -> {}", edge.from, edge.to), &coords)?;

    let points: Vec<String> = edge
        .points
        .iter()
        .map(|p| format!("{:.1},{:.1}", p.x, p.y))
        .collect();
    writeln!(
        svg,
        "{}<polyline points=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"2\" marker-end=\"url(#arrow)\" />",
        pad(depth),
        points.join(" "),
        theme.edge_stroke
    )?;

    if let (Some(label), [first, .., last]) = (&edge.label, edge.points.as_slice()) {
        let mid = Point::new((first.x + last.x) / 2.0, (first.y + last.y) / 2.0);
        writeln!(
            svg,
            "{}<rect x=\"{:.1}\" y=\"{:.1}\" width=\"{:.1}\" height=\"{:.1}\" fill=\"{}\" />",
            pad(depth),
            mid.x - label.width / 2.0 - 2.0,
            mid.y - label.height / 2.0,
            label.width + 4.0,
            label.height,
            theme.background
        )?;
        write_text(svg, label, mid, theme.muted_text, depth)?;
    }
    Ok(())
}

fn write_text(svg: &mut String, text: &TextBlock, center: Point, fill: &str, depth: usize) -> Result<(), RasterError> {
    write_lines(svg, text, center, "middle", fill, depth)
}

/// Lines of `text` vertically centred on `anchor`.
fn write_lines(
    svg: &mut String,
    text: &TextBlock,
    anchor: Point,
    align: &str,
    fill: &str,
    depth: usize,
) -> Result<(), RasterError> {
    if text.lines.iter().all(|l| l.is_empty()) {
        return Ok(());
    }
    let line_height = text.height / text.lines.len() as f64;
    let top = anchor.y - text.height / 2.0 + line_height / 2.0;
    for (i, line) in text.lines.iter().enumerate() {
        writeln!(
            svg,
            "{}<text x=\"{:.1}\" y=\"{:.1}\" fill=\"{}\" text-anchor=\"{}\" dominant-baseline=\"middle\">{}</text>",
            pad(depth),
            anchor.x,
            top + line_height * i as f64,
            fill,
            align,
            escape_xml(line)
        )?;
    }
    Ok(())
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
