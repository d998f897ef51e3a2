//! Subtitle line wrapping and placement.
//!
//! Wraps narration text into lines that fit a pixel width budget and yields
//! time-boxed, vertically stacked overlays. Pure function of the text and the
//! layout parameters; the font is consulted only through [`FontMetrics`].

use regex::Regex;
use std::sync::OnceLock;

/// Pixel safety margin subtracted from the width budget.
pub const WIDTH_MARGIN: f32 = 100.0;

/// Trailing seconds trimmed from each caption to avoid overlap with the next.
pub const TRAILING_TRIM: f64 = 0.2;

/// Font metrics query used to measure rendered text width.
pub trait FontMetrics: Send + Sync {
    /// Width in pixels of `text` rendered at `font_size`.
    fn text_width(&self, text: &str, font_size: f32) -> f32;
}

/// Fixed-advance metrics: ASCII glyphs half an em, everything else one em.
///
/// Close enough for wrapping CJK-dominant subtitle text; a real font backend
/// can be swapped in behind the trait without touching the layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct HalfWidthMetrics;

impl FontMetrics for HalfWidthMetrics {
    fn text_width(&self, text: &str, font_size: f32) -> f32 {
        text.chars()
            .map(|c| if c.is_ascii() { 0.5 } else { 1.0 })
            .sum::<f32>()
            * font_size
    }
}

/// One positioned, time-boxed subtitle overlay line.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleLine {
    pub text: String,
    /// Vertical position of the line's baseline
    pub y: f32,
    pub start: f64,
    pub duration: f64,
}

/// Subtitle layout configuration.
pub struct SubtitleLayout<'m> {
    metrics: &'m dyn FontMetrics,
    font_size: f32,
    line_spacing: f32,
}

/// Token pattern: numbers (with optional decimals/percent), ASCII words,
/// then any single remaining character (CJK chars and punctuation wrap as
/// individual tokens). Keeps numbers and words unsplit across lines.
fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\d+(?:\.\d+)?%?|[A-Za-z]+(?:'[A-Za-z]+)?|\S").expect("token regex")
    })
}

impl<'m> SubtitleLayout<'m> {
    pub fn new(metrics: &'m dyn FontMetrics, font_size: f32, line_spacing: f32) -> Self {
        Self {
            metrics,
            font_size,
            line_spacing,
        }
    }

    /// Wrap `text` into overlay lines for the given time window.
    ///
    /// Lines stack downward from `baseline_y` by `font_size + line_spacing`;
    /// every line shares the start time, and the duration loses a small
    /// trailing trim so consecutive captions never overlap.
    pub fn layout(
        &self,
        text: &str,
        start: f64,
        duration: f64,
        baseline_y: f32,
        max_width: f32,
    ) -> Vec<SubtitleLine> {
        let budget = max_width - WIDTH_MARGIN;
        let duration = (duration - TRAILING_TRIM).max(0.0);

        let mut lines: Vec<String> = Vec::new();
        let mut current = String::new();

        for token in token_regex().find_iter(text) {
            let token = token.as_str();
            let candidate = if current.is_empty() {
                token.to_string()
            } else if token.starts_with(|c: char| c.is_ascii_alphanumeric()) {
                // Keep a thin space before word and number tokens.
                format!("{} {}", current, token)
            } else {
                format!("{}{}", current, token)
            };

            if self.metrics.text_width(&candidate, self.font_size) <= budget
                || current.is_empty()
            {
                current = candidate;
            } else {
                lines.push(std::mem::take(&mut current));
                current = token.to_string();
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }

        lines
            .into_iter()
            .enumerate()
            .map(|(i, text)| SubtitleLine {
                text,
                y: baseline_y + i as f32 * (self.font_size + self.line_spacing),
                start,
                duration,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout_lines(text: &str, max_width: f32) -> Vec<SubtitleLine> {
        let metrics = HalfWidthMetrics;
        SubtitleLayout::new(&metrics, 50.0, 10.0).layout(text, 1.0, 4.0, 1500.0, max_width)
    }

    #[test]
    fn test_short_text_single_line() {
        let lines = layout_lines("三分命中", 1080.0);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "三分命中");
        assert!((lines[0].start - 1.0).abs() < 1e-9);
        assert!((lines[0].duration - 3.8).abs() < 1e-9);
    }

    #[test]
    fn test_lines_fit_width_budget() {
        let metrics = HalfWidthMetrics;
        let text = "这是一段相当长的解说词需要被拆分成多行显示在画面底部";
        let lines = layout_lines(text, 1080.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(metrics.text_width(&line.text, 50.0) <= 1080.0 - WIDTH_MARGIN);
        }
    }

    #[test]
    fn test_lines_stack_vertically() {
        let text = "这是一段相当长的解说词需要被拆分成多行显示在画面底部";
        let lines = layout_lines(text, 1080.0);
        for pair in lines.windows(2) {
            assert!((pair[1].y - pair[0].y - 60.0).abs() < 1e-6);
            assert_eq!(pair[0].start, pair[1].start);
        }
    }

    #[test]
    fn test_numbers_never_split() {
        // A percent token must move to the next line whole.
        let text = format!("{}99.5%", "字".repeat(19));
        let lines = layout_lines(&text, 1080.0);
        let carrying: Vec<&SubtitleLine> =
            lines.iter().filter(|l| l.text.contains("99.5%")).collect();
        assert_eq!(carrying.len(), 1);
        assert!(carrying[0].text.contains("99.5%"));
    }

    #[test]
    fn test_number_after_word_keeps_space() {
        let lines = layout_lines("beat 99.5%", 1080.0);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].text, "beat 99.5%");
    }

    #[test]
    fn test_empty_text_yields_no_lines() {
        assert!(layout_lines("", 1080.0).is_empty());
    }

    #[test]
    fn test_overlong_single_token_still_emitted() {
        // A single token wider than the budget is emitted on its own line
        // rather than dropped.
        let lines = layout_lines("10000000000000000000000000000%", 200.0);
        assert_eq!(lines.len(), 1);
    }
}
