//! Fixed rendering theme and text measurement.

/// Colors, font metrics and spacing used for every rendered image.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub font_family: &'static str,
    pub font_size: f64,
    /// Average glyph width as a fraction of the font size.
    pub char_width_ratio: f64,
    pub line_height: f64,

    pub node_padding_x: f64,
    pub node_padding_y: f64,
    pub min_node_width: f64,
    pub marker_diameter: f64,
    pub board_padding: f64,
    pub board_gap: f64,
    pub rank_gap: f64,
    pub node_gap: f64,
    /// Blank margin around the whole image.
    pub canvas_padding: f64,

    pub background: &'static str,
    pub node_fill: &'static str,
    pub node_stroke: &'static str,
    pub container_fill: &'static str,
    pub board_fill: &'static str,
    pub board_stroke: &'static str,
    pub marker_fill: &'static str,
    pub edge_stroke: &'static str,
    pub text: &'static str,
    pub muted_text: &'static str,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            font_family: "Helvetica, Arial, sans-serif",
            font_size: 14.0,
            char_width_ratio: 0.6,
            line_height: 1.3,

            node_padding_x: 16.0,
            node_padding_y: 10.0,
            min_node_width: 48.0,
            marker_diameter: 40.0,
            board_padding: 16.0,
            board_gap: 12.0,
            rank_gap: 56.0,
            node_gap: 28.0,
            canvas_padding: 24.0,

            background: "#FFFFFF",
            node_fill: "#EDF0FD",
            node_stroke: "#0D32B2",
            container_fill: "#F7F8FE",
            board_fill: "#FFFFFF",
            board_stroke: "#B4BBDC",
            marker_fill: "#0D32B2",
            edge_stroke: "#0D32B2",
            text: "#0A0F25",
            muted_text: "#676C7E",
        }
    }
}

/// Measured text, one entry per line.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    pub lines: Vec<String>,
    pub width: f64,
    pub height: f64,
}

impl Theme {
    /// Measure `text` with the fixed glyph-width model.
    pub fn measure_label(&self, text: &str) -> TextBlock {
        let mut lines: Vec<String> = text.split('\n').map(str::to_string).collect();
        if lines.is_empty() {
            lines.push(String::new());
        }

        let max_len = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        let width = max_len as f64 * self.font_size * self.char_width_ratio;
        let height = lines.len() as f64 * self.font_size * self.line_height;

        TextBlock {
            lines,
            width,
            height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_counts_chars_not_bytes() {
        let theme = Theme::default();
        let ascii = theme.measure_label("abcd");
        let wide = theme.measure_label("äöüß");
        assert_eq!(ascii.width, wide.width);
        assert!((ascii.width - 4.0 * 14.0 * 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_measure_multiline() {
        let block = Theme::default().measure_label("a\nlonger");
        assert_eq!(block.lines.len(), 2);
        assert!((block.width - 6.0 * 14.0 * 0.6).abs() < 1e-9);
    }
}
