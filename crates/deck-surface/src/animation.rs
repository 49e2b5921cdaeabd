#![forbid(unsafe_code)]

//! Time-based cell animations.
//!
//! Animations write directly into a layer at a fixed position and live in
//! the surface's animation vector; [`Surface::update`] drives every
//! outstanding animation with the same `dt` and compacts out the completed
//! ones afterwards.
//!
//! [`Surface::update`]: crate::Surface::update

use std::collections::VecDeque;
use std::time::Duration;

use deck_text::utf8_to_utf32;

use crate::buffer::LayerBuffer;
use crate::surface::Pos;

/// One animation slot. The variant owns all of its per-animation data.
#[derive(Debug)]
pub enum Animation {
    /// Characters sweep in from the right until the full string stands.
    ScrollIn(ScrollIn),
    /// A marquee strip rotating one cell at a time.
    Ticker(Ticker),
}

impl Animation {
    /// Advance by `dt`, writing into the owning surface's layers.
    pub fn tick(&mut self, dt: Duration, layers: &mut [LayerBuffer]) {
        match self {
            Animation::ScrollIn(a) => a.tick(dt, layers),
            Animation::Ticker(a) => a.tick(dt, layers),
        }
    }

    /// Whether the animation has finished and can be compacted away.
    pub fn is_complete(&self) -> bool {
        match self {
            Animation::ScrollIn(a) => a.is_complete(),
            Animation::Ticker(a) => a.is_complete(),
        }
    }
}

/// Right-aligned reveal: at `t/D` of the duration, `floor(L * t/D)`
/// characters are visible at the right of the span; the leading cells are
/// forced transparent so the layers below show through.
#[derive(Debug)]
pub struct ScrollIn {
    layer: usize,
    pos: Pos,
    text: Vec<char>,
    span: usize,
    elapsed: Duration,
    duration: Duration,
    complete: bool,
}

impl ScrollIn {
    /// Build a scroll-in of `text` at `pos` on `layer`.
    ///
    /// `width` is the surface width; a text running past the right edge is
    /// clipped to the row.
    pub fn new(layer: usize, pos: Pos, text: &str, duration: Duration, width: usize) -> Self {
        let text = utf8_to_utf32(text);
        let last_col = (pos.col + text.len().max(1) - 1).min(width - 1);
        let span = last_col + 1 - pos.col;
        Self {
            layer,
            pos,
            text,
            span,
            elapsed: Duration::ZERO,
            duration,
            complete: false,
        }
    }

    fn tick(&mut self, dt: Duration, layers: &mut [LayerBuffer]) {
        self.elapsed += dt;
        if self.elapsed >= self.duration {
            self.elapsed = self.duration;
            self.complete = true;
        }

        let t = if self.duration.is_zero() {
            1.0
        } else {
            (self.elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
        };
        let chars = (self.text.len() as f32 * t) as usize;
        let spaces = (self.text.len() - chars).min(self.span);

        let layer = &mut layers[self.layer];
        let mut cells = vec![' '; self.span];
        for i in 0..spaces {
            layer.set_opacity(self.pos.row, self.pos.col + i, 0x00);
        }
        for (i, cell) in cells.iter_mut().enumerate().skip(spaces) {
            *cell = self.text[i - spaces];
            layer.set_opacity(self.pos.row, self.pos.col + i, 0xFF);
        }
        layer.set_str_clipped(self.pos.row, self.pos.col, &cells);
    }

    fn is_complete(&self) -> bool {
        self.complete
    }
}

/// Options for [`Ticker`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TickerOptions {
    /// Rotate forever instead of completing after one full pass.
    pub looping: bool,
    /// Prepend a span's worth of spaces so content enters from the right.
    pub pad: bool,
}

/// Ticker tape: the backing buffer rotates left one cell per step, the
/// first codepoint moving to the tail, at `chars_per_second` steps per
/// second. The visible window is the first `span` cells of the buffer.
#[derive(Debug)]
pub struct Ticker {
    layer: usize,
    pos: Pos,
    span: usize,
    buf: VecDeque<char>,
    step: Duration,
    acc: Duration,
    looping: bool,
    steps_left: usize,
    complete: bool,
}

impl Ticker {
    /// Build a ticker of `text` across `span` cells.
    ///
    /// # Panics
    ///
    /// Panics when `chars_per_second` is not strictly positive.
    pub fn new(
        layer: usize,
        pos: Pos,
        span: usize,
        text: &str,
        chars_per_second: f32,
        options: TickerOptions,
    ) -> Self {
        assert!(chars_per_second > 0.0, "ticker rate must be positive");

        let mut buf = VecDeque::new();
        if options.pad {
            buf.extend(std::iter::repeat_n(' ', span));
        }
        buf.extend(text.chars());

        let steps_left = buf.len();
        Self {
            layer,
            pos,
            span,
            buf,
            step: Duration::from_secs_f32(1.0 / chars_per_second),
            acc: Duration::ZERO,
            looping: options.looping,
            steps_left,
            complete: false,
        }
    }

    fn tick(&mut self, dt: Duration, layers: &mut [LayerBuffer]) {
        self.acc += dt;
        while self.acc >= self.step && !self.complete {
            self.acc -= self.step;
            if let Some(front) = self.buf.pop_front() {
                self.buf.push_back(front);
            }
            if !self.looping {
                self.steps_left -= 1;
                if self.steps_left == 0 {
                    self.complete = true;
                }
            }
        }

        let layer = &mut layers[self.layer];
        let mut cells = vec![' '; self.span];
        for (i, cell) in cells.iter_mut().enumerate() {
            if let Some(&c) = self.buf.get(i) {
                *cell = c;
            }
            layer.set_opacity(self.pos.row, self.pos.col + i, 0xFF);
        }
        layer.set_str_clipped(self.pos.row, self.pos.col, &cells);
    }

    fn is_complete(&self) -> bool {
        self.complete
    }
}
