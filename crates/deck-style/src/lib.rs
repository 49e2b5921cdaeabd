#![forbid(unsafe_code)]

//! Truecolor escape sequences and the shell palette.
//!
//! The engine emits exactly four escape forms for styling: foreground
//! truecolor (`ESC[38;2;r;g;bm`), background truecolor (`ESC[48;2;r;g;bm`),
//! reset, and the cursor-movement sequences owned by the line editor. This
//! crate builds the color forms and names the palette the session and the
//! completion overlay draw from.

pub mod format;

pub use format::{ColorTable, format_color_runs, format_interleaved};

/// Style reset sequence.
pub const RESET: &str = "\x1b[0m";

/// A truecolor value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Rgb {
    /// Construct from channels.
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Foreground escape sequence for this color.
    pub fn fg(self) -> String {
        format!("\x1b[38;2;{};{};{}m", self.r, self.g, self.b)
    }

    /// Background escape sequence for this color.
    pub fn bg(self) -> String {
        format!("\x1b[48;2;{};{};{}m", self.r, self.g, self.b)
    }

    /// Wrap `text` in this foreground color followed by a reset.
    pub fn paint(self, text: &str) -> String {
        let mut out = self.fg();
        out.push_str(text);
        out.push_str(RESET);
        out
    }
}

/// The shell palette.
///
/// Named after what the color marks, not what it looks like, so callbacks
/// read as intent.
pub mod palette {
    use super::Rgb;

    /// Prompt scope path (`>hangar>mech`).
    pub const PROMPT: Rgb = Rgb::new(180, 180, 190);
    /// The `  \-> ` prompt suffix.
    pub const PROMPT_SUFFIX: Rgb = Rgb::new(52, 144, 111);
    /// Error text.
    pub const ERROR: Rgb = Rgb::new(220, 70, 60);
    /// Command names inside diagnostics.
    pub const COMMAND: Rgb = Rgb::new(120, 190, 240);
    /// The completion currently inserted by the overlay.
    pub const COMPLETION: Rgb = Rgb::new(228, 200, 62);
    /// The bracketed list of remaining alternatives.
    pub const ALTERNATIVES: Rgb = Rgb::new(92, 140, 230);
    /// Object identifiers.
    pub const OBJECT_ID: Rgb = Rgb::new(150, 210, 150);
    /// Object names.
    pub const OBJECT: Rgb = Rgb::new(200, 170, 220);
}

/// Error-styled text, reset afterwards.
#[inline]
pub fn error(text: &str) -> String {
    palette::ERROR.paint(text)
}

/// Command-styled text, reset afterwards.
#[inline]
pub fn command(text: &str) -> String {
    palette::COMMAND.paint(text)
}
