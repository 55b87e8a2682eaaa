//! Text measurement and rasterisation
//!
//! Font files are not loaded here. The shell ships a block font that draws
//! each visible glyph as a filled cell, which is all a framebuffer this small
//! can show legibly in a terminal anyway.

use super::{Color, Rect, Size, Surface};
use unicode_width::UnicodeWidthChar;

/// Anything that can measure and draw a single line of text
pub trait FontCache {
    /// Pixel size of `text` at `size` (the line height)
    fn measure(&self, text: &str, size: u32) -> Size;

    /// Draw `text` into a new transparent surface
    fn rasterize(&self, text: &str, size: u32, color: Color) -> Surface;

    /// Break `text` into lines no wider than `max_width`, on word boundaries.
    /// A single word wider than the limit gets its own line.
    fn wrap(&self, text: &str, size: u32, max_width: i32) -> Vec<String> {
        let mut lines = Vec::new();
        for paragraph in text.split('\n') {
            let mut line = String::new();
            for word in paragraph.split_whitespace() {
                let candidate = if line.is_empty() {
                    word.to_string()
                } else {
                    format!("{line} {word}")
                };
                if !line.is_empty() && self.measure(&candidate, size).width > max_width {
                    lines.push(std::mem::replace(&mut line, word.to_string()));
                } else {
                    line = candidate;
                }
            }
            lines.push(line);
        }
        lines
    }
}

/// Monospace block font: a column is half the font size wide
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockFont;

impl BlockFont {
    fn column_width(size: u32) -> i32 {
        (size as i32 / 2).max(1)
    }
}

impl FontCache for BlockFont {
    fn measure(&self, text: &str, size: u32) -> Size {
        let columns: usize = text.chars().map(|c| c.width().unwrap_or(0)).sum();
        Size::new(columns as i32 * Self::column_width(size), size as i32)
    }

    fn rasterize(&self, text: &str, size: u32, color: Color) -> Surface {
        let mut surface = Surface::new(self.measure(text, size));
        let column = Self::column_width(size);
        let height = size as i32;
        // Leave a one pixel gutter around glyphs once there is room for it
        let inset = if column >= 3 { 1 } else { 0 };
        let top = if height >= 4 { height / 4 } else { 0 };

        let mut x = 0;
        for c in text.chars() {
            let w = c.width().unwrap_or(0) as i32 * column;
            if w > 0 && !c.is_whitespace() {
                surface.fill_rect(
                    Rect::new(x + inset, top, w - 2 * inset, height - top - inset),
                    color,
                );
            }
            x += w;
        }
        surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_counts_wide_chars_twice() {
        let font = BlockFont;
        assert_eq!(font.measure("ab", 10), Size::new(10, 10));
        // CJK ideographs occupy two columns
        assert_eq!(font.measure("日", 10), Size::new(10, 10));
        assert_eq!(font.measure("", 10), Size::new(0, 10));
    }

    #[test]
    fn test_rasterize_leaves_spaces_blank() {
        let font = BlockFont;
        let s = font.rasterize("a b", 8, Color::RED);
        assert_eq!(s.size(), Size::new(12, 8));
        assert_eq!(s.get(1, 4), Some(Color::RED));
        assert_eq!(s.get(5, 4), Some(Color::TRANSPARENT));
        assert_eq!(s.get(9, 4), Some(Color::RED));
    }

    #[test]
    fn test_wrap_breaks_on_words() {
        let font = BlockFont;
        // 10px per column at size 20 → 60px fits six columns
        let lines = font.wrap("one two three", 20, 60);
        assert_eq!(lines, vec!["one", "two", "three"]);

        let lines = font.wrap("ab cd", 20, 60);
        assert_eq!(lines, vec!["ab cd"]);
    }
}
