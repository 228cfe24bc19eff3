//! Pure layout math for slides.
//!
//! Everything here is testable without fonts or images: vertical bands are
//! derived from config, and wrapping takes a width function.
//!
//! ```text
//! ┌──────────────────────────┐  0
//! │ image band (optional)    │
//! ├──────────────────────────┤  image_band
//! │ padding_top              │
//! │ heading                  │  heading_top
//! │ heading_gap              │
//! │ ┄┄┄┄┄ body text ┄┄┄┄┄┄┄┄ │  text_top      ┐
//! │                          │                │ text_budget
//! │ ┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄┄ │                ┘
//! │ reference_gap            │
//! │ reference (grade)        │  reference_top
//! │ verification note        │  note_top
//! │ watermark                │  watermark_top
//! │ padding_bottom           │
//! └──────────────────────────┘  height
//! ```

use crate::config::AppConfig;

/// Vertical gap between footer lines.
pub const FOOTER_LINE_GAP: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlideGeometry {
    pub width: u32,
    pub height: u32,
    /// Height of the image band at the top; zero when images are off.
    pub image_band: u32,
    pub heading_top: u32,
    pub text_top: u32,
    pub text_left: u32,
    pub text_width: u32,
    /// Vertical space for body text.
    pub text_budget: u32,
    pub body_line_height: u32,
    pub reference_top: u32,
    pub note_size: u32,
    pub note_top: u32,
    pub watermark_top: u32,
}

impl SlideGeometry {
    pub fn from_config(config: &AppConfig) -> Self {
        let layout = &config.layout;
        let fonts = &config.fonts;

        let image_band = if config.assets.enabled {
            (layout.height as f32 * layout.image_height_ratio).round() as u32
        } else {
            0
        };
        let heading_top = image_band + layout.padding_top;
        let text_top = heading_top + fonts.heading_size + layout.heading_gap;

        let note_size = note_size(fonts.source_size);
        let watermark_top = layout
            .height
            .saturating_sub(layout.padding_bottom + fonts.watermark_size);
        let note_top = watermark_top.saturating_sub(FOOTER_LINE_GAP + note_size);
        let reference_top = note_top.saturating_sub(FOOTER_LINE_GAP + fonts.source_size);
        let text_bottom = reference_top.saturating_sub(layout.reference_gap);

        Self {
            width: layout.width,
            height: layout.height,
            image_band,
            heading_top,
            text_top,
            text_left: layout.margin,
            text_width: layout.width.saturating_sub(layout.margin.saturating_mul(2)),
            text_budget: text_bottom.saturating_sub(text_top),
            body_line_height: line_height(fonts.body_size, layout.line_spacing),
            reference_top,
            note_size,
            note_top,
            watermark_top,
        }
    }

    /// Top of a body block of `block_height`, centered in the text area.
    pub fn centered_text_top(&self, block_height: u32) -> u32 {
        self.text_top + self.text_budget.saturating_sub(block_height) / 2
    }

    /// Height of `lines` lines of body text.
    pub fn block_height(&self, lines: usize) -> u32 {
        lines as u32 * self.body_line_height
    }
}

/// The verification note is set at two thirds of the source size.
pub fn note_size(source_size: u32) -> u32 {
    (source_size * 2 / 3).max(1)
}

pub fn line_height(font_size: u32, spacing: f32) -> u32 {
    (font_size as f32 * spacing).round() as u32
}

/// Greedy word wrap: a word moves to the next line when appending it would
/// exceed `max_width`. A single word wider than the line keeps its own line.
pub fn wrap_lines<F>(text: &str, width_of: F, max_width: f32) -> Vec<String>
where
    F: Fn(&str) -> f32,
{
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        let candidate = format!("{current} {word}");
        if width_of(&candidate) > max_width {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ten_per_char(s: &str) -> f32 {
        s.chars().count() as f32 * 10.0
    }

    // =========================================================================
    // Geometry
    // =========================================================================

    #[test]
    fn default_geometry() {
        let g = SlideGeometry::from_config(&AppConfig::default());
        assert_eq!(g.image_band, 338);
        assert_eq!(g.heading_top, 378);
        assert_eq!(g.text_top, 459);
        assert_eq!(g.text_left, 80);
        assert_eq!(g.text_width, 920);
        assert_eq!(g.body_line_height, 81);
        assert_eq!(g.watermark_top, 1262);
        assert_eq!(g.note_top, 1227);
        assert_eq!(g.reference_top, 1179);
        assert_eq!(g.text_budget, 1179 - 50 - 459);
    }

    #[test]
    fn no_images_frees_the_band() {
        let mut config = AppConfig::default();
        let with = SlideGeometry::from_config(&config);
        config.assets.enabled = false;
        let without = SlideGeometry::from_config(&config);
        assert_eq!(without.image_band, 0);
        assert_eq!(without.text_budget, with.text_budget + with.image_band);
    }

    #[test]
    fn huge_margin_leaves_zero_text_width() {
        let mut config = AppConfig::default();
        config.layout.margin = u32::MAX;
        assert_eq!(SlideGeometry::from_config(&config).text_width, 0);
    }

    #[test]
    fn cramped_canvas_has_zero_budget() {
        let mut config = AppConfig::default();
        config.layout.height = 300;
        assert_eq!(SlideGeometry::from_config(&config).text_budget, 0);
    }

    #[test]
    fn centered_block() {
        let g = SlideGeometry::from_config(&AppConfig::default());
        assert_eq!(g.centered_text_top(g.text_budget), g.text_top);
        assert_eq!(g.centered_text_top(g.text_budget - 100), g.text_top + 50);
        assert_eq!(g.centered_text_top(g.text_budget + 100), g.text_top);
    }

    // =========================================================================
    // Wrapping
    // =========================================================================

    #[test]
    fn wraps_at_width() {
        let lines = wrap_lines("aaa bbb ccc ddd", ten_per_char, 70.0);
        assert_eq!(lines, vec!["aaa bbb", "ccc ddd"]);
    }

    #[test]
    fn long_word_gets_own_line() {
        let lines = wrap_lines("a supercalifragilistic b", ten_per_char, 50.0);
        assert_eq!(lines, vec!["a", "supercalifragilistic", "b"]);
    }

    #[test]
    fn collapses_whitespace() {
        let lines = wrap_lines("  one\n\ttwo  ", ten_per_char, 1000.0);
        assert_eq!(lines, vec!["one two"]);
    }

    #[test]
    fn empty_text_has_no_lines() {
        assert!(wrap_lines("   ", ten_per_char, 100.0).is_empty());
    }
}
