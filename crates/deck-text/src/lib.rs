#![forbid(unsafe_code)]

//! Text measurement and UTF conversion helpers.
//!
//! Every column-width calculation in the line editor and the layered surface
//! goes through this crate. Two representations are used throughout
//! mechdeck:
//!
//! - **UTF-8**: `&str`/`String`, what gets written to the terminal.
//! - **UTF-32**: `Vec<char>`, one codepoint per element, what the surface
//!   grids store so that cell addressing is O(1).
//!
//! # Invariants
//!
//! 1. `utf32_to_utf8(&utf8_to_utf32(s)) == s` for every valid UTF-8 `s`.
//! 2. `utf8_info(s).char_count == utf8_to_utf32(s).len()`.
//! 3. `trim_back_chars(s, 0) == s.len()` (truncating nothing is a no-op).

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Decode a UTF-8 string into a codepoint buffer.
#[inline]
pub fn utf8_to_utf32(s: &str) -> Vec<char> {
    s.chars().collect()
}

/// Encode a codepoint buffer back into a UTF-8 string.
#[inline]
pub fn utf32_to_utf8(codepoints: &[char]) -> String {
    codepoints.iter().collect()
}

/// Decode a UTF-8 string that must hold exactly one codepoint.
///
/// Returns `None` when the string is empty or holds more than one codepoint.
/// Surface cells store single codepoints; this is the checked boundary.
pub fn utf8_to_single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    let c = chars.next()?;
    if chars.next().is_some() { None } else { Some(c) }
}

/// Byte-level measurement of a UTF-8 string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Utf8Info {
    /// Number of codepoints.
    pub char_count: usize,
    /// Bytes spent on UTF-8 continuations (total length minus `char_count`).
    pub extra_bytes: usize,
}

/// Measure codepoint count and continuation-byte overhead in one pass.
pub fn utf8_info(s: &str) -> Utf8Info {
    let mut info = Utf8Info::default();
    for b in s.bytes() {
        // Continuation bytes are 0b10xx_xxxx; everything else starts a char.
        if b & 0xC0 == 0x80 {
            info.extra_bytes += 1;
        } else {
            info.char_count += 1;
        }
    }
    info
}

/// Repeat `s` end to end `count` times.
pub fn pad(s: &str, count: usize) -> String {
    let mut out = String::with_capacity(s.len() * count);
    for _ in 0..count {
        out.push_str(s);
    }
    out
}

/// Byte index at which the last `n` codepoints of `s` begin.
///
/// Truncating at the returned index (`&s[..idx]`) removes exactly `n`
/// codepoints from the back, or the whole string when it holds fewer than
/// `n`. `n = 0` returns `s.len()`.
pub fn trim_back_chars(s: &str, n: usize) -> usize {
    if n == 0 {
        return s.len();
    }
    s.char_indices()
        .rev()
        .nth(n - 1)
        .map(|(idx, _)| idx)
        .unwrap_or(0)
}

/// Displayed-cell width of a string.
#[inline]
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Displayed-cell width of a single codepoint.
///
/// Control characters measure 0 except tab, which occupies one cell in the
/// editor's model.
#[inline]
pub fn char_width(c: char) -> usize {
    if c == '\t' {
        return 1;
    }
    UnicodeWidthChar::width(c).unwrap_or(0)
}
