//! Line placement
//!
//! Lines are stacked `font_size + 5` pixels apart. The block is centered
//! vertically and each line horizontally; offsets use floor division so
//! a block taller or a line wider than the canvas gets a negative origin.
//! Such overflow is flagged, never corrected.

use std::fmt::Display;

use super::font::Face;

/// Vertical gap added to the font size for each line
pub const LINE_SPACING: i64 = 5;

/// One line with its top-left drawing position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedLine {
    pub text: String,
    pub x: i64,
    pub y: i64,
    pub width: u32,
}

/// Placement of every line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Lines in input order
    pub lines: Vec<PlacedLine>,
    /// Y coordinate of the first line
    pub top: i64,
    /// Whether the block is taller than the canvas
    pub overflows: bool,
}

pub fn line_height(font_size: u32) -> i64 {
    i64::from(font_size) + LINE_SPACING
}

/// Y coordinate that vertically centers `count` lines
pub fn block_top(count: usize, font_size: u32, canvas_height: u32) -> i64 {
    let block = count as i64 * line_height(font_size);
    (i64::from(canvas_height) - block).div_euclid(2)
}

/// X coordinate that horizontally centers a line of `text_width` pixels
pub fn centered_x(canvas_width: u32, text_width: u32) -> i64 {
    (i64::from(canvas_width) - i64::from(text_width)).div_euclid(2)
}

/// Place every item, coerced to text, on a `width` x `height` canvas
pub fn layout<T: Display>(
    items: &[T],
    face: &dyn Face,
    font_size: u32,
    width: u32,
    height: u32,
) -> Layout {
    let top = block_top(items.len(), font_size, height);
    let block = items.len() as i64 * line_height(font_size);
    let overflows = block > i64::from(height);
    if overflows {
        tracing::warn!(
            lines = items.len(),
            block_height = block,
            canvas_height = height,
            "text block is taller than the canvas and will be clipped"
        );
    }

    let mut y = top;
    let lines = items
        .iter()
        .map(|item| {
            let text = item.to_string();
            let width_px = face.text_width(&text);
            let line = PlacedLine {
                x: centered_x(width, width_px),
                y,
                width: width_px,
                text,
            };
            y += line_height(font_size);
            line
        })
        .collect();

    Layout {
        lines,
        top,
        overflows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::font::BitmapFace;

    #[test]
    fn three_lines_are_centered() {
        let face = BitmapFace::new(20);
        let items = ["apple", "banana", "kiwi"];
        let placed = layout(&items, &face, 20, 500, 800);

        assert_eq!(placed.top, (800 - 3 * (20 + 5)) / 2);
        assert!(!placed.overflows);
        for (index, line) in placed.lines.iter().enumerate() {
            assert_eq!(line.text, items[index]);
            assert_eq!(line.y, placed.top + index as i64 * 25);
            let measured = i64::from(face.text_width(items[index]));
            assert_eq!(line.x, (500 - measured).div_euclid(2));
        }
    }

    #[test]
    fn odd_remainders_floor() {
        assert_eq!(block_top(1, 20, 100), 37);
        assert_eq!(centered_x(101, 50), 25);
        assert_eq!(centered_x(100, 101), -1);
    }

    #[test]
    fn overflow_is_flagged_not_fixed() {
        let face = BitmapFace::new(20);
        let items: Vec<usize> = (0..40).collect();
        let placed = layout(&items, &face, 20, 500, 800);

        assert!(placed.overflows);
        assert_eq!(placed.top, (800 - 40 * 25_i64).div_euclid(2));
        assert!(placed.top < 0);
    }

    #[test]
    fn non_string_items_are_coerced() {
        let face = BitmapFace::new(8);
        let placed = layout(&[3.5_f64, 42.0], &face, 8, 100, 100);
        assert_eq!(placed.lines[0].text, "3.5");
        assert_eq!(placed.lines[1].text, "42");
    }

    #[test]
    fn empty_list_places_nothing() {
        let face = BitmapFace::new(20);
        let placed = layout::<&str>(&[], &face, 20, 500, 800);
        assert!(placed.lines.is_empty());
        assert_eq!(placed.top, 400);
        assert!(!placed.overflows);
    }
}
