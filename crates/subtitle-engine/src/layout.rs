//! Text measurement and line wrapping for the portrait frame.
//!
//! Wrapping is driven by a measurement pass over per-glyph advance widths,
//! not by a fixed character limit, so long verses wrap to the frame width
//! without truncation.

use serde::{Deserialize, Serialize};

/// Measures rendered text width.
pub trait TextMeasurer: Send + Sync {
    /// Advance width of one character at the given font size, in pixels.
    fn advance_px(&self, c: char, font_px: u32) -> f64;

    /// Width of a whole string.
    fn measure_px(&self, text: &str, font_px: u32) -> f64 {
        text.chars().map(|c| self.advance_px(c, font_px)).sum()
    }
}

/// Heuristic measurer using per-class glyph advance factors.
///
/// Good enough for wrapping decisions; exact metrics belong to the
/// renderer that rasterizes the subtitles.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlyphAdvanceMeasurer;

impl TextMeasurer for GlyphAdvanceMeasurer {
    fn advance_px(&self, c: char, font_px: u32) -> f64 {
        let factor = match c {
            // Arabic combining marks (tashkeel) take no horizontal space.
            '\u{064B}'..='\u{0652}' | '\u{0670}' | '\u{06D6}'..='\u{06ED}' => 0.0,
            // Arabic letters render joined and comparatively narrow.
            '\u{0600}'..='\u{06FF}'
            | '\u{0750}'..='\u{077F}'
            | '\u{08A0}'..='\u{08FF}'
            | '\u{FB50}'..='\u{FDFF}'
            | '\u{FE70}'..='\u{FEFF}' => 0.52,
            // CJK ideographs are full-width.
            '\u{4E00}'..='\u{9FFF}' | '\u{3400}'..='\u{4DBF}' | '\u{F900}'..='\u{FAFF}' => 1.0,
            ' ' => 0.28,
            'i' | 'j' | 'l' | 't' | 'f' | '.' | ',' | ':' | ';' | '!' | '\'' | '|' => 0.30,
            'm' | 'w' | 'M' | 'W' => 0.85,
            'A'..='Z' => 0.72,
            _ => 0.55,
        };
        factor * font_px as f64
    }
}

/// Frame geometry and font sizing for subtitle layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutOptions {
    /// Output frame width in pixels.
    pub frame_width_px: u32,

    /// Output frame height in pixels.
    pub frame_height_px: u32,

    /// Horizontal margin on each side.
    pub horizontal_margin_px: u32,

    /// Arabic font size in pixels.
    pub arabic_font_px: u32,

    /// Translation font size in pixels.
    pub translation_font_px: u32,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            frame_width_px: 1080,
            frame_height_px: 1920,
            horizontal_margin_px: 80,
            arabic_font_px: 64,
            translation_font_px: 44,
        }
    }
}

impl LayoutOptions {
    /// Width available to subtitle text.
    pub fn usable_width_px(&self) -> f64 {
        (self.frame_width_px.saturating_sub(2 * self.horizontal_margin_px)).max(1) as f64
    }
}

/// Greedy word wrap against measured line widths.
///
/// A single word wider than the line gets a line of its own; nothing is
/// ever truncated.
pub fn wrap_text(
    text: &str,
    measurer: &dyn TextMeasurer,
    font_px: u32,
    max_width_px: f64,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0.0f64;
    let space_width = measurer.advance_px(' ', font_px);

    for word in text.split_whitespace() {
        let word_width = measurer.measure_px(word, font_px);
        let needed = if current.is_empty() {
            word_width
        } else {
            current_width + space_width + word_width
        };

        if needed > max_width_px && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_width = word_width;
        } else {
            if !current.is_empty() {
                current.push(' ');
                current_width += space_width;
            }
            current.push_str(word);
            current_width += word_width;
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

    #[test]
    fn short_text_stays_on_one_line() {
        let measurer = GlyphAdvanceMeasurer;
        let options = LayoutOptions::default();
        let lines = wrap_text("short line", &measurer, 44, options.usable_width_px());
        assert_eq!(lines, vec!["short line".to_string()]);
    }

    #[test]
    fn long_text_wraps_without_losing_words() {
        let measurer = GlyphAdvanceMeasurer;
        let text = "Allah there is no deity except Him the Ever Living the Sustainer of all existence";
        let lines = wrap_text(text, &measurer, 44, 400.0);

        assert!(lines.len() > 1);
        let rejoined = lines.join(" ");
        assert_eq!(rejoined, text);

        // Every line fits, except unbreakable single words.
        for line in &lines {
            let width = measurer.measure_px(line, 44);
            assert!(width <= 400.0 || !line.contains(' '));
        }
    }

    #[test]
    fn oversized_word_gets_its_own_line() {
        let measurer = GlyphAdvanceMeasurer;
        let lines = wrap_text("a Supercalifragilisticexpialidocious b", &measurer, 44, 200.0);
        assert!(lines.iter().any(|l| l == "Supercalifragilisticexpialidocious"));
    }

    #[test]
    fn arabic_measures_narrower_than_cjk() {
        let measurer = GlyphAdvanceMeasurer;
        let arabic = measurer.measure_px("سلام", 44);
        let cjk = measurer.measure_px("平安平安", 44);
        assert!(arabic > 0.0);
        assert!(cjk > arabic);
    }

    #[test]
    fn tashkeel_marks_are_zero_width() {
        let measurer = GlyphAdvanceMeasurer;
        let bare = measurer.measure_px("\u{0628}", 44);
        let with_mark = measurer.measure_px("\u{0628}\u{064E}", 44);
        assert_eq!(bare, with_mark);
    }

    #[test]
    fn wrapping_is_deterministic() {
        let measurer = GlyphAdvanceMeasurer;
        let text = "بسم الله الرحمن الرحيم الحمد لله رب العالمين";
        let a = wrap_text(text, &measurer, 64, 500.0);
        let b = wrap_text(text, &measurer, 64, 500.0);
        assert_eq!(a, b);
    }
}
