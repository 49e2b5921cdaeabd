#![forbid(unsafe_code)]

//! Color-run formatting for ASCII diagrams.
//!
//! Command callbacks paint schematics (reactor line maps, module bays) by
//! pairing each text line with a same-width mask line. Every character of
//! the mask selects a color from a [`ColorTable`]; runs of the same mask
//! character become one escape sequence. Mask characters missing from the
//! table emit a reset, so ` ` conventionally means "plain".
//!
//! The mask is per *displayed character*, not per byte: a 3-byte box-drawing
//! glyph in the text line is covered by exactly one mask character.

use std::collections::HashMap;

use crate::{RESET, Rgb};

/// Mask character to color mapping.
pub type ColorTable = HashMap<char, Rgb>;

/// Render `text_lines` colored by `mask_lines` through `table`.
///
/// Each output line ends with a reset and a newline. Text beyond the mask's
/// coverage is dropped; a mask longer than its text line simply runs out of
/// characters to paint.
///
/// # Panics
///
/// Panics if the two slices differ in length; pairing them up is the
/// caller's contract.
pub fn format_color_runs(table: &ColorTable, text_lines: &[String], mask_lines: &[String]) -> String {
    assert_eq!(
        text_lines.len(),
        mask_lines.len(),
        "every text line needs a mask line"
    );

    let mut out = String::new();
    for (text, mask) in text_lines.iter().zip(mask_lines) {
        let mut text_chars = text.chars();
        let mut mask_chars = mask.chars().peekable();

        while let Some(&mask_char) = mask_chars.peek() {
            let mut run_len = 0usize;
            while mask_chars.peek() == Some(&mask_char) {
                mask_chars.next();
                run_len += 1;
            }

            match table.get(&mask_char) {
                Some(color) => out.push_str(&color.fg()),
                None => out.push_str(RESET),
            }
            for _ in 0..run_len {
                match text_chars.next() {
                    Some(c) => out.push(c),
                    None => break,
                }
            }
        }

        out.push_str(RESET);
        out.push('\n');
    }
    out
}

/// Render interleaved text/mask lines (`text0, mask0, text1, mask1, …`).
///
/// # Panics
///
/// Panics on an odd number of lines.
pub fn format_interleaved(table: &ColorTable, lines: &[String]) -> String {
    assert!(lines.len() % 2 == 0, "lines must come in text/mask pairs");

    let mut text_lines = Vec::with_capacity(lines.len() / 2);
    let mut mask_lines = Vec::with_capacity(lines.len() / 2);
    for pair in lines.chunks_exact(2) {
        text_lines.push(pair[0].clone());
        mask_lines.push(pair[1].clone());
    }
    format_color_runs(table, &text_lines, &mask_lines)
}
