#![forbid(unsafe_code)]

//! The line-editor model and its escape-sequence emitter.
//!
//! # Display model
//!
//! The current input line is held as a codepoint buffer; `position` is a
//! displayed-cell index from column 0 and `prompt_size` is the column where
//! user input starts, so `position - prompt_size` indexes the buffer.
//! Overlay rows live at `y = 1, 2, …` below the prompt row.
//!
//! # Invariants
//!
//! 1. `position >= prompt_size` whenever the cursor is on the prompt row
//!    (cursor-movement helpers reset `position` to 0 mid-flight, matching
//!    the terminal's own column reset on `ESC[nF`/`ESC[nE`).
//! 2. `position - prompt_size <= line.len()`.
//! 3. Overlay bookkeeping (`auto_complete_start`, inserted length) either
//!    both present or both absent.

use std::io::{self, Write};

use crate::key::{EditorEvent, Key};

const BACKSPACE: char = '\u{8}';

/// Which token of a line a position falls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParamInfo {
    /// First character index of the token.
    pub start: usize,
    /// Last character index of the token (inclusive).
    pub end: usize,
    /// Zero-based token index.
    pub index: usize,
}

/// The terminal line editor.
///
/// Generic over its sink so tests can capture the exact byte stream.
#[derive(Debug)]
pub struct LineEditor<W: Write> {
    out: W,
    width: usize,
    line: Vec<char>,
    /// Displayed-cell cursor column.
    position: usize,
    /// Cursor row; 0 is the prompt row.
    cursor_y: usize,
    prompt_size: usize,
    /// Overlay rows below the prompt, top to bottom.
    next_lines: Vec<String>,
    /// Column at which the current completion was inserted.
    pub(crate) auto_complete_start: Option<usize>,
    /// How many characters the overlay inserted at `auto_complete_start`.
    pub(crate) auto_complete_len: usize,
    silent: bool,
}

impl<W: Write> LineEditor<W> {
    /// Create an editor writing to `out` on a terminal `width` cells wide.
    pub fn new(out: W, width: usize) -> Self {
        Self {
            out,
            width,
            line: Vec::new(),
            position: 0,
            cursor_y: 0,
            prompt_size: 0,
            next_lines: Vec::new(),
            auto_complete_start: None,
            auto_complete_len: 0,
            silent: false,
        }
    }

    /// Terminal width in cells.
    #[inline]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// The current input line.
    pub fn line(&self) -> String {
        self.line.iter().collect()
    }

    pub(crate) fn line_chars(&self) -> &[char] {
        &self.line
    }

    pub(crate) fn position_mut(&mut self) -> &mut usize {
        &mut self.position
    }

    /// The overlay rows currently displayed below the prompt.
    pub fn overlay_rows(&self) -> &[String] {
        &self.next_lines
    }

    /// Consume the editor and hand back its sink.
    pub fn into_sink(self) -> W {
        self.out
    }

    /// Cursor column in displayed cells from the left edge.
    #[inline]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Cursor row; 0 is the prompt row.
    #[inline]
    pub const fn cursor_y(&self) -> usize {
        self.cursor_y
    }

    /// Index of the cursor within the input line.
    #[inline]
    pub fn input_position(&self) -> usize {
        self.position.saturating_sub(self.prompt_size)
    }

    /// Width of the prompt preceding the input.
    #[inline]
    pub const fn prompt_size(&self) -> usize {
        self.prompt_size
    }

    /// Record the prompt width just emitted by the session.
    pub fn set_prompt_size(&mut self, size: usize) {
        self.prompt_size = size;
        self.position = self.position.max(size);
    }

    /// Shift where input starts without moving the cursor's input offset.
    pub fn set_line_start(&mut self, start: usize) {
        let offset = self.input_position();
        self.prompt_size = start;
        self.position = start + offset;
    }

    /// Silence or restore output. The model keeps advancing while silent.
    pub fn set_silent(&mut self, silent: bool) {
        self.silent = silent;
    }

    /// After a silent run, drop all editor state.
    pub fn reset(&mut self) {
        if self.silent {
            self.line.clear();
            self.next_lines.clear();
            self.auto_complete_start = None;
            self.auto_complete_len = 0;
            self.position = 0;
            self.cursor_y = 0;
            self.prompt_size = 0;
            self.silent = false;
        }
    }

    pub(crate) fn emit(&mut self, s: &str) -> io::Result<()> {
        if self.silent {
            return Ok(());
        }
        self.out.write_all(s.as_bytes())
    }

    pub(crate) fn flush(&mut self) -> io::Result<()> {
        if self.silent {
            return Ok(());
        }
        self.out.flush()
    }

    fn repeated(c: char, n: usize) -> String {
        std::iter::repeat_n(c, n).collect()
    }

    // --- Cursor movement -------------------------------------------------

    /// Move right by `n` cells with `ESC[nC`, padding the model with spaces
    /// if the cursor passes the end of the line on the prompt row.
    pub fn advance(&mut self, n: usize) -> io::Result<()> {
        if n == 0 {
            return Ok(());
        }
        self.emit(&format!("\x1b[{n}C"))?;
        self.position += n;
        if self.cursor_y == 0 && self.position > self.prompt_size + self.line.len() {
            let pad = self.position - self.prompt_size - self.line.len();
            self.line.extend(std::iter::repeat_n(' ', pad));
        }
        Ok(())
    }

    /// Move left by `n` cells with backspaces, clamped to column 0.
    pub fn reverse(&mut self, n: usize) -> io::Result<()> {
        if n == 0 {
            return Ok(());
        }
        let n = n.min(self.position);
        self.emit(&Self::repeated(BACKSPACE, n))?;
        self.position -= n;
        Ok(())
    }

    /// Cursor to start of a previous line: `ESC[nF`.
    pub fn up(&mut self, lines: usize) -> io::Result<()> {
        if lines == 0 || self.cursor_y == 0 {
            return Ok(());
        }
        let lines = lines.min(self.cursor_y);
        self.emit(&format!("\x1b[{lines}F"))?;
        self.position = 0;
        self.cursor_y -= lines;
        Ok(())
    }

    /// Cursor to start of a following line: `ESC[nE`.
    pub fn down(&mut self, lines: usize) -> io::Result<()> {
        if lines == 0 {
            return Ok(());
        }
        self.emit(&format!("\x1b[{lines}E"))?;
        self.position = 0;
        self.cursor_y += lines;
        Ok(())
    }

    /// Move the cursor to absolute column `column` on the current row.
    pub(crate) fn seek(&mut self, column: usize) -> io::Result<()> {
        if column >= self.position {
            self.advance(column - self.position)
        } else {
            self.reverse(self.position - column)
        }
    }

    /// Backspace-walk left to `new_position` without erasing.
    pub fn back_up_to_position(&mut self, new_position: usize) -> io::Result<()> {
        if new_position >= self.position {
            return Ok(());
        }
        let n = self.position - new_position;
        self.emit(&Self::repeated(BACKSPACE, n))?;
        self.position = new_position;
        self.flush()
    }

    /// Re-emit from the cursor to the end of the line and land there.
    pub fn complete_line(&mut self) -> io::Result<()> {
        let pos = self.input_position();
        let tail: String = self.line[pos..].iter().collect();
        self.emit(&tail)?;
        self.position = self.prompt_size + self.line.len();
        self.flush()
    }

    // --- Line mutation ---------------------------------------------------

    /// Replace the whole input line (history traversal).
    pub fn set_line(&mut self, new_line: &str) -> io::Result<()> {
        let new: Vec<char> = new_line.chars().collect();
        let mut seq = Self::repeated(BACKSPACE, self.input_position());
        seq.push_str(new_line);
        if new.len() < self.line.len() {
            let shrink = self.line.len() - new.len();
            seq.push_str(&Self::repeated(' ', shrink));
            seq.push_str(&Self::repeated(BACKSPACE, shrink));
        }
        self.emit(&seq)?;
        self.line = new;
        self.position = self.prompt_size + self.line.len();
        self.auto_complete_start = None;
        self.auto_complete_len = 0;
        self.flush()
    }

    /// Insert text at the cursor on the current row, clipping with `" .."`
    /// when it would run past the terminal's right edge.
    pub fn insert_text(&mut self, text: &str) -> io::Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        let mut chars: Vec<char> = text.chars().collect();
        let avail = self.width.saturating_sub(self.position);
        if chars.len() > avail {
            if avail >= 4 {
                chars.truncate(avail - 3);
                chars.extend([' ', '.', '.']);
            } else {
                chars.truncate(avail);
            }
        }

        if self.cursor_y == 0 {
            let pos = self.input_position().min(self.line.len());
            for (i, &c) in chars.iter().enumerate() {
                self.line.insert(pos + i, c);
            }
        } else {
            let row = &mut self.next_lines[self.cursor_y - 1];
            let byte = row
                .char_indices()
                .nth(self.position.min(row.chars().count()))
                .map(|(b, _)| b)
                .unwrap_or(row.len());
            let inserted: String = chars.iter().collect();
            row.insert_str(byte, &inserted);
        }

        self.position += chars.len();
        let rendered: String = chars.iter().collect();
        self.emit(&rendered)?;
        self.flush()
    }

    /// Drop everything past input index `to_position`, optionally walking
    /// the cursor back over the dropped cells.
    pub fn trim_end(&mut self, to_position: usize, move_back: bool) -> io::Result<()> {
        let old = self.line.len();
        if old <= to_position {
            return Ok(());
        }
        self.line.truncate(to_position);
        self.position = self.prompt_size + to_position;
        if move_back {
            self.emit(&Self::repeated(BACKSPACE, old - to_position))?;
            self.flush()?;
        }
        Ok(())
    }

    /// Erase `n` characters at the cursor (to the end of line when `None`).
    pub fn clear_ahead(&mut self, n: Option<usize>) -> io::Result<()> {
        let pos = self.input_position();
        let n = n.unwrap_or_else(|| self.line.len().saturating_sub(pos));
        if n == 0 || self.line.len() < pos + n {
            return Ok(());
        }
        self.line.drain(pos..pos + n);
        let mut seq = Self::repeated(' ', n);
        seq.push_str(&Self::repeated(BACKSPACE, n));
        self.emit(&seq)?;
        self.flush()
    }

    /// Erase `n` characters left of the cursor.
    pub fn clear_behind(&mut self, n: usize) -> io::Result<()> {
        if n == 0 {
            return Ok(());
        }
        let n = n.min(self.input_position());
        let mut seq = Self::repeated(BACKSPACE, n);
        seq.push_str(&Self::repeated(' ', n));
        seq.push_str(&Self::repeated(BACKSPACE, n));
        self.emit(&seq)?;
        let pos = self.input_position();
        self.line.drain(pos - n..pos);
        self.position -= n;
        Ok(())
    }

    // --- Overlay row management ------------------------------------------

    /// Rows currently occupied: the prompt row plus the overlay rows.
    pub fn line_count(&self) -> usize {
        1 + self.next_lines.len()
    }

    /// Ensure `count` blank rows exist beneath the prompt, cursor restored.
    pub fn create_lines(&mut self, count: usize) -> io::Result<()> {
        let saved_x = self.position;
        let saved_y = self.cursor_y;
        for _ in 0..count {
            self.emit("\r\n")?;
        }
        self.cursor_y += count;
        self.up(self.cursor_y - saved_y)?;
        self.advance(saved_x)?;
        self.flush()
    }

    /// Write `line` on the next overlay row and record it.
    pub fn add_line(&mut self, line: &str) -> io::Result<()> {
        self.down(1)?;
        self.emit(line)?;
        self.next_lines.push(line.to_string());
        self.position = line.chars().count();
        self.flush()
    }

    /// Erase the overlay rows bottom-up, restoring the cursor column.
    pub fn clear_next_lines(&mut self) -> io::Result<()> {
        let old_position = self.position;
        let had_lines = !self.next_lines.is_empty();
        while !self.next_lines.is_empty() {
            debug_assert!(self.cursor_y <= self.line_count() - 1);
            let dist = (self.line_count() - 1) - self.cursor_y;
            self.down(dist)?;
            self.emit(&Self::repeated(' ', self.width))?;
            self.up(dist)?;
            self.next_lines.pop();
        }
        if had_lines {
            self.advance(old_position)?;
        }
        Ok(())
    }

    /// Clear overlay rows, then drop any partial token left at the end of
    /// the line (back to the last whitespace), cursor landing after it.
    pub fn clear_to_current(&mut self) -> io::Result<()> {
        self.clear_next_lines()?;
        if let Some(&last) = self.line.last()
            && !last.is_whitespace()
        {
            if let Some(space_idx) = self.line.iter().rposition(|c| c.is_whitespace()) {
                let mut dist = self.line.len() - 1 - space_idx;
                dist = dist.min(self.line.len() - self.input_position());
                if dist >= 1 {
                    let end = self.prompt_size + self.line.len();
                    let delta = end - self.position;
                    self.advance(delta)?;
                    self.clear_behind(dist)?;
                }
            }
        }
        self.flush()
    }

    /// Clear the whole input line and the overlay rows.
    pub fn clear_current_line(&mut self) -> io::Result<()> {
        self.clear_next_lines()?;
        let back = self.position - self.prompt_size.min(self.position);
        self.reverse(back)?;
        self.clear_ahead(None)?;
        self.flush()
    }

    // --- Key handling ----------------------------------------------------

    /// Feed one decoded keypress through the editor.
    pub fn keypressed(&mut self, key: Key) -> io::Result<EditorEvent> {
        match key {
            Key::Eof => return Ok(EditorEvent::Eof),
            Key::Up => return Ok(EditorEvent::Up),
            Key::Down => return Ok(EditorEvent::Down),
            Key::Backspace => self.on_backspace()?,
            Key::Left => {
                if self.input_position() > 0 {
                    self.emit("\u{8}")?;
                    self.flush()?;
                    self.position -= 1;
                }
            }
            Key::Right => {
                if self.input_position() < self.line.len() {
                    let c = self.line[self.input_position()];
                    self.emit(&c.to_string())?;
                    self.flush()?;
                    self.position += 1;
                }
            }
            Key::Return => {
                let cmd: String = self.line.iter().collect();
                self.try_finish_auto_complete()?;
                self.emit("\r\n")?;
                self.flush()?;
                self.line.clear();
                self.position = self.prompt_size;
                return Ok(EditorEvent::Command(cmd));
            }
            Key::Ascii('\t') => return Ok(EditorEvent::Tab),
            Key::Ascii(c) => self.on_char(c)?,
            Key::Delete => self.on_delete()?,
            Key::End => self.complete_line()?,
            Key::Home => self.back_up_to_position(self.prompt_size)?,
            Key::Ignored => {}
        }
        Ok(EditorEvent::None)
    }

    fn on_backspace(&mut self) -> io::Result<()> {
        // Clear the completion overlay even with no input to delete.
        if let Some(start) = self.auto_complete_start
            && self.position <= start
        {
            return self.clear_auto_complete();
        }
        if self.input_position() == 0 {
            return Ok(());
        }

        self.position -= 1;
        let pos = self.input_position();
        self.line.remove(pos);

        let mut seq = String::from("\u{8}");
        seq.extend(self.line[pos..].iter());
        seq.push(' ');
        seq.push_str(&Self::repeated(BACKSPACE, self.line.len() - pos + 1));
        self.emit(&seq)?;
        self.flush()
    }

    fn on_char(&mut self, c: char) -> io::Result<()> {
        if let Some(start) = self.auto_complete_start {
            if self.position < start {
                self.clear_auto_complete()?;
            } else if c == ' ' {
                if self.try_finish_auto_complete()? {
                    return Ok(());
                }
            } else if start == self.position {
                // Typing at the overlay's start shifts the completion right.
                self.auto_complete_start = Some(start + 1);
            }
        }

        let pos = self.input_position();
        let mut seq = String::new();
        seq.push(c);
        seq.extend(self.line[pos..].iter());
        seq.push_str(&Self::repeated(BACKSPACE, self.line.len() - pos));
        self.emit(&seq)?;
        self.flush()?;
        self.line.insert(pos, c);
        self.position += 1;
        Ok(())
    }

    fn on_delete(&mut self) -> io::Result<()> {
        let pos = self.input_position();
        if pos == self.line.len() {
            return Ok(());
        }
        let mut seq: String = self.line[pos + 1..].iter().collect();
        seq.push(' ');
        seq.push_str(&Self::repeated(BACKSPACE, self.line.len() - pos));
        self.emit(&seq)?;
        self.flush()?;
        self.line.remove(pos);
        Ok(())
    }

    // --- Token and parameter lookup --------------------------------------

    /// Zero-based index of the token the cursor is in.
    pub fn get_param_index(&self) -> usize {
        Self::param_info(&self.line, self.input_position()).index
    }

    /// The line up to the cursor plus the parameter index under it — the
    /// payload the outer loop hands to completion lookup on Tab.
    pub fn auto_complete_line(&self) -> (String, usize) {
        if self.line.is_empty() {
            return (String::new(), 0);
        }
        let info = Self::param_info(&self.line, self.input_position());
        let upto: String = self.line[..self.input_position().min(self.line.len())]
            .iter()
            .collect();
        (upto, info.index)
    }

    /// Locate the token containing `pos`.
    ///
    /// A cursor one past the end of an unterminated line refers to the last
    /// token (completion with a filter); a cursor on whitespace refers to
    /// nothing.
    pub(crate) fn get_token(line: &[char], pos: usize) -> Option<(usize, usize)> {
        if line.is_empty() {
            return None;
        }

        let completing_with_filter =
            pos == line.len() && !line.last().is_some_and(|c| c.is_whitespace());
        if (!completing_with_filter && pos >= line.len())
            || (pos < line.len() && line[pos].is_whitespace())
        {
            return None;
        }

        let pos = if completing_with_filter { pos - 1 } else { pos };

        let mut start = pos;
        while start > 0 && !line[start].is_whitespace() {
            start -= 1;
        }
        if line[start].is_whitespace() {
            start += 1;
        }

        let mut end = pos;
        while end < line.len() && !line[end].is_whitespace() {
            end += 1;
        }

        Some((start, end - start))
    }

    /// Which parameter a position falls in, skipping whitespace runs.
    pub(crate) fn param_info(line: &[char], pos: usize) -> ParamInfo {
        if line.is_empty() {
            return ParamInfo::default();
        }

        if pos < line.len() && line[pos].is_whitespace() {
            return ParamInfo::default();
        }

        let token_count = |chars: &[char]| -> usize {
            let s: String = chars.iter().collect();
            s.split_whitespace().count()
        };

        if pos >= line.len() {
            let index = token_count(line);
            if index == 0 {
                // All whitespace.
                return ParamInfo { start: pos, end: pos, index: 0 };
            }
            if line.last().is_some_and(|c| c.is_whitespace()) {
                // Trailing space: the next, not-yet-typed parameter.
                return ParamInfo { start: pos, end: pos, index };
            }
            let mut i = line.len() - 1;
            while i > 0 {
                if line[i].is_whitespace() {
                    return ParamInfo {
                        start: i + 1,
                        end: line.len() - 1,
                        index: index - 1,
                    };
                }
                i -= 1;
            }
            return ParamInfo {
                start: 0,
                end: line.len() - 1,
                index: index - 1,
            };
        }

        let mut on_whitespace = line[0].is_whitespace();
        let mut start = 0usize;
        let mut index: isize = -1;
        for i in 1..line.len() {
            let matches = line[i].is_whitespace() == on_whitespace;
            if !matches {
                if !on_whitespace {
                    index += 1;
                    if i > pos {
                        return ParamInfo {
                            start,
                            end: i - 1,
                            index: index as usize,
                        };
                    }
                } else {
                    start = i;
                }
                on_whitespace = !on_whitespace;
            }
        }

        // pos is inside the last token.
        ParamInfo {
            start,
            end: line.len() - 1,
            index: (index + 1) as usize,
        }
    }
}
