#![forbid(unsafe_code)]

//! Layered virtual terminal surface.
//!
//! A [`Surface`] composites ordinary output, scrolling-region contents, and
//! time-based animations into a single visible frame. It owns an ordered
//! stack of [`LayerBuffer`]s — equally sized codepoint/opacity grids — and a
//! cursor addressing the opaque base layer for [`Surface::append`].
//!
//! Composition is a pure function per cell: walk the layers top-down and
//! take the first whose opacity exceeds [`OPACITY_THRESHOLD`]; if none
//! qualifies, the cell is a space.

pub mod animation;
pub mod buffer;
pub mod surface;

pub use animation::{Animation, ScrollIn, Ticker, TickerOptions};
pub use buffer::LayerBuffer;
pub use surface::{Pos, Surface};

/// Opacity above which a layer's cell wins composition.
pub const OPACITY_THRESHOLD: u8 = 15;
