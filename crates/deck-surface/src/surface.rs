#![forbid(unsafe_code)]

//! Layer stack, cursor, composition, and scrollback.

use std::time::Duration;

use deck_text::{utf8_to_utf32, utf32_to_utf8};

use crate::animation::Animation;
use crate::buffer::LayerBuffer;
use crate::OPACITY_THRESHOLD;

/// A (row, col) cell address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pos {
    /// Row, 0 at the top.
    pub row: usize,
    /// Column, 0 at the left.
    pub col: usize,
}

impl Pos {
    /// Construct from row and column.
    #[inline]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// A layered, animatable terminal surface.
///
/// Layer 0 is the opaque base; [`Surface::add_layer`] pushes transparent
/// overlays on top. The cursor addresses the base layer for
/// [`Surface::append`], which scrolls the surface when text runs off the
/// bottom and hands the displaced rows back for scrollback.
#[derive(Debug)]
pub struct Surface {
    width: usize,
    height: usize,
    layers: Vec<LayerBuffer>,
    cursor: Pos,
    animations: Vec<Animation>,
}

impl Surface {
    /// Create a surface with its opaque base layer.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is 0.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            layers: vec![LayerBuffer::new(width, height, false)],
            cursor: Pos::default(),
            animations: Vec::new(),
        }
    }

    /// Surface width in cells.
    #[inline]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Surface height in rows.
    #[inline]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Number of layers, base included.
    #[inline]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Push a transparent overlay; returns its index.
    pub fn add_layer(&mut self) -> usize {
        self.layers.push(LayerBuffer::new(self.width, self.height, true));
        self.layers.len() - 1
    }

    /// Borrow a layer.
    ///
    /// # Panics
    ///
    /// Panics on an unknown layer index.
    pub fn layer(&self, index: usize) -> &LayerBuffer {
        &self.layers[index]
    }

    /// Mutably borrow a layer.
    ///
    /// # Panics
    ///
    /// Panics on an unknown layer index.
    pub fn layer_mut(&mut self, index: usize) -> &mut LayerBuffer {
        &mut self.layers[index]
    }

    /// Current cursor position on the base layer.
    ///
    /// The row may equal `height` when the last append finished exactly at
    /// the bottom-right corner; the next append scrolls first.
    #[inline]
    pub const fn cursor(&self) -> Pos {
        self.cursor
    }

    /// Composed codepoint at (row, col): the highest layer whose opacity
    /// exceeds the threshold wins; a space if none does.
    pub fn composed_char(&self, row: usize, col: usize) -> char {
        for layer in self.layers.iter().rev() {
            if layer.opacity_at(row, col) > OPACITY_THRESHOLD {
                return layer.char_at(row, col);
            }
        }
        ' '
    }

    /// One composed row as UTF-8.
    pub fn utf8_line(&self, row: usize) -> String {
        let mut line = Vec::with_capacity(self.width);
        for col in 0..self.width {
            line.push(self.composed_char(row, col));
        }
        utf32_to_utf8(&line)
    }

    /// The base layer's full contents, row-major.
    pub fn resolve_base(&self) -> String {
        self.layers[0].utf8_buffer()
    }

    /// Write `text` at the cursor, clipped to the cursor row.
    pub fn append_clipped(&mut self, text: &str) {
        let row = self.cursor.row.min(self.height - 1);
        let col = self.cursor.col;
        self.layers[0].set_utf8_clipped(row, col, text);
    }

    /// Write `text` at the cursor, wrapping to further rows and scrolling
    /// the surface when it runs past the bottom.
    ///
    /// Returns the rows displaced off the top — each row's composed content
    /// concatenated — so the caller can persist them as scrollback.
    pub fn append(&mut self, text: &str) -> String {
        let codepoints = utf8_to_utf32(text);
        let mut remaining: &[char] = &codepoints;
        let mut displaced = String::new();

        while !remaining.is_empty() {
            if self.cursor.row >= self.height {
                let over = (self.cursor.row - self.height + 1).min(self.height);
                displaced.push_str(&self.scroll(over));
                self.cursor.row -= over;
            }

            let room = (self.height - self.cursor.row) * self.width - self.cursor.col;
            let take = remaining.len().min(room);
            self.layers[0].set_str(self.cursor.row, self.cursor.col, &remaining[..take]);
            self.advance_cursor(take);
            remaining = &remaining[take..];
        }

        displaced
    }

    /// Advance the cursor by `chars` cells, wrapping at the right edge.
    pub fn advance_cursor(&mut self, chars: usize) {
        let linear = (self.cursor.row * self.width + self.cursor.col + chars)
            .min(self.height * self.width);
        self.cursor = Pos::new(linear / self.width, linear % self.width);
    }

    /// Place the cursor.
    ///
    /// # Panics
    ///
    /// Panics when the position is outside the grid.
    pub fn set_cursor(&mut self, pos: Pos) {
        assert!(pos.row < self.height && pos.col < self.width);
        self.cursor = pos;
    }

    /// Scroll every layer up by `n` rows.
    ///
    /// Returns the composed contents of the displaced top rows, in order,
    /// before they are lost.
    ///
    /// # Panics
    ///
    /// Panics when `n > height`.
    pub fn scroll(&mut self, n: usize) -> String {
        assert!(n <= self.height, "cannot scroll past the surface height");
        let mut displaced = String::new();
        for row in 0..n {
            displaced.push_str(&self.utf8_line(row));
        }
        for layer in &mut self.layers {
            layer.scroll_up(n);
        }
        displaced
    }

    /// Reset the cursor and clear every layer.
    pub fn clear(&mut self) {
        self.cursor = Pos::default();
        for layer in &mut self.layers {
            layer.clear();
        }
    }

    /// Attach an animation.
    pub fn add_animation(&mut self, animation: Animation) {
        self.animations.push(animation);
    }

    /// Number of live animations.
    pub fn animation_count(&self) -> usize {
        self.animations.len()
    }

    /// Advance every animation by `dt`.
    ///
    /// Every outstanding animation observes the same `dt` for the frame.
    /// Animations that completed on a previous update are compacted out
    /// before the pass, so a finished animation's final frame stays on its
    /// layer.
    pub fn update(&mut self, dt: Duration) {
        let mut animations = std::mem::take(&mut self.animations);
        animations.retain(|a| !a.is_complete());
        for animation in &mut animations {
            animation.tick(dt, &mut self.layers);
        }
        self.animations = animations;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_layer_is_opaque() {
        let s = Surface::new(4, 2);
        assert_eq!(s.layer_count(), 1);
        assert_eq!(s.layer(0).opacity_at(0, 0), 0xFF);
    }

    #[test]
    fn overlay_wins_composition_when_opaque() {
        let mut s = Surface::new(4, 2);
        s.layer_mut(0).set_utf8_clipped(0, 0, "base");
        let top = s.add_layer();
        s.layer_mut(top).set_char(0, 1, 'X');
        s.layer_mut(top).set_opaque(0, 1);

        assert_eq!(s.composed_char(0, 0), 'b');
        assert_eq!(s.composed_char(0, 1), 'X');
        assert_eq!(s.utf8_line(0), "bXse");
    }

    #[test]
    fn opacity_at_threshold_does_not_win() {
        let mut s = Surface::new(2, 1);
        s.layer_mut(0).set_utf8_clipped(0, 0, "ab");
        let top = s.add_layer();
        s.layer_mut(top).set_char(0, 0, 'Z');
        s.layer_mut(top).set_opacity(0, 0, OPACITY_THRESHOLD);
        assert_eq!(s.composed_char(0, 0), 'a');

        s.layer_mut(top).set_opacity(0, 0, OPACITY_THRESHOLD + 1);
        assert_eq!(s.composed_char(0, 0), 'Z');
    }

    #[test]
    fn append_fills_and_wraps() {
        let mut s = Surface::new(4, 2);
        let displaced = s.append("AAAAAAAA");
        assert_eq!(displaced, "");
        assert_eq!(s.utf8_line(0), "AAAA");
        assert_eq!(s.utf8_line(1), "AAAA");
        assert_eq!(s.cursor(), Pos::new(2, 0));
    }

    #[test]
    fn append_past_bottom_scrolls_and_returns_top_row() {
        let mut s = Surface::new(4, 2);
        s.append("AAAAAAAA");
        let displaced = s.append("B");
        assert_eq!(displaced, "AAAA");
        assert_eq!(s.utf8_line(0), "AAAA");
        assert_eq!(s.utf8_line(1), "B   ");
        assert_eq!(s.cursor(), Pos::new(1, 1));
    }

    #[test]
    fn append_longer_than_surface_spills_leading_text() {
        let mut s = Surface::new(2, 2);
        s.layer_mut(0).set_utf8_clipped(0, 0, "xx");
        s.layer_mut(0).set_utf8_clipped(1, 0, "yy");
        s.set_cursor(Pos::new(1, 0));

        // 6 chars starting on the second row of a 2x2 surface produce four
        // conceptual rows: "xx", "ab" (overwriting "yy"), "cd", "ef". The
        // last two stay visible; the first two are handed back in order.
        let displaced = s.append("abcdef");
        assert_eq!(displaced, "xxab");
        assert_eq!(s.utf8_line(0), "cd");
        assert_eq!(s.utf8_line(1), "ef");
        assert_eq!(s.cursor(), Pos::new(2, 0));
    }

    #[test]
    fn append_mid_row_continues_from_cursor() {
        let mut s = Surface::new(4, 2);
        s.append("ab");
        s.append("cd");
        assert_eq!(s.utf8_line(0), "abcd");
        assert_eq!(s.cursor(), Pos::new(1, 0));
    }

    #[test]
    fn append_clipped_stays_on_row() {
        let mut s = Surface::new(3, 2);
        s.append_clipped("wxyz");
        assert_eq!(s.utf8_line(0), "wxy");
        assert_eq!(s.utf8_line(1), "   ");
    }

    #[test]
    fn scroll_returns_composed_rows() {
        let mut s = Surface::new(2, 3);
        s.layer_mut(0).set_utf8_clipped(0, 0, "aa");
        s.layer_mut(0).set_utf8_clipped(1, 0, "bb");
        let top = s.add_layer();
        s.layer_mut(top).set_char(0, 0, 'Z');
        s.layer_mut(top).set_opaque(0, 0);

        let displaced = s.scroll(2);
        assert_eq!(displaced, "Zabb");
        assert_eq!(s.utf8_line(0), "  ");
    }

    #[test]
    fn clear_resets_cursor_and_layers() {
        let mut s = Surface::new(3, 2);
        s.add_layer();
        s.append("abcdef");
        s.clear();
        assert_eq!(s.cursor(), Pos::default());
        assert_eq!(s.utf8_line(0), "   ");
    }
}
