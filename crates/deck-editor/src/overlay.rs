#![forbid(unsafe_code)]

//! The auto-complete overlay.
//!
//! After the first Tab the outer loop hands the editor a non-empty
//! completion list. The editor inserts the first completion at the cursor
//! (only the missing suffix when the typed token is a prefix of it), draws
//! the remaining alternatives bracketed on the row below, a description on
//! the row after that, and leaves the cursor at the end of the inserted
//! text. A space or Return commits the completion; Backspace at or before
//! the insertion point abandons it.

use std::io;
use std::io::Write;

use deck_style::{RESET, palette};
use deck_text::display_width;

use crate::completion::Completion;
use crate::editor::LineEditor;

/// Room needed to squeeze an abbreviated alternative into the bracket row.
const MIN_ABBREV_WIDTH: usize = 6;

impl<W: Write> LineEditor<W> {
    /// Whether a completion overlay is currently active.
    pub fn auto_complete_active(&self) -> bool {
        self.auto_complete_start.is_some()
    }

    /// Present `completions` for the parameter at `param_index`.
    ///
    /// `description` is shown on the overlay's last row; callers pass the
    /// active completion's description.
    ///
    /// # Panics
    ///
    /// Panics on an empty completion list; the caller filters that case.
    pub fn set_completions(
        &mut self,
        _param_index: usize,
        completions: &[Completion],
        description: &str,
    ) -> io::Result<()> {
        assert!(!completions.is_empty(), "overlay needs at least one completion");

        let info = Self::param_info(self.line_chars(), self.input_position());
        let start = self.auto_complete_start.unwrap_or(self.position());
        self.auto_complete_start = Some(start);

        // Remove any previously inserted completion and its rows; the
        // user's typed prefix survives.
        self.clear_next_lines()?;
        if self.auto_complete_len > 0 {
            let end = start + self.auto_complete_len;
            self.seek(end)?;
            let len = self.auto_complete_len;
            self.clear_behind(len)?;
            self.auto_complete_len = 0;
        } else {
            self.seek(start)?;
        }

        self.create_lines(2)?;

        // The prefix the user typed: token start up to the insertion point.
        let start_input = start - self.prompt_size();
        let prefix: String = self.line_chars()[info.start.min(start_input)..start_input]
            .iter()
            .collect();

        let mut insert = completions[0].text.clone();
        if insert.starts_with(&prefix) {
            insert = insert[prefix.len()..].to_string();
        } else {
            // Filter mismatch: wipe the typed token and take the whole
            // completion instead.
            let prefix_len = prefix.chars().count();
            self.clear_behind(prefix_len)?;
            self.auto_complete_start = Some(self.position());
        }

        self.emit(&palette::COMPLETION.fg())?;
        self.insert_text(&insert)?;
        self.emit(RESET)?;
        self.auto_complete_len = insert.chars().count();

        let caret_col = self.auto_complete_start.unwrap_or(0);
        let rows = self.print_alternatives(completions, caret_col)?;

        self.add_line(&" ".repeat(caret_col))?;
        self.insert_text(description)?;

        self.up(1 + rows)?;
        let end = caret_col + self.auto_complete_len;
        self.advance(end)?;
        self.flush()
    }

    /// Accept the active completion: redraw the finished token in the
    /// regular style, append a single trailing space, and clear overlay
    /// state. Returns `false` when no overlay is active.
    pub fn try_finish_auto_complete(&mut self) -> io::Result<bool> {
        let Some(start) = self.auto_complete_start else {
            return Ok(false);
        };

        self.clear_next_lines()?;

        let start_input = (start - self.prompt_size()).min(self.line_chars().len().saturating_sub(1));
        let Some((tok_start, tok_len)) = Self::get_token(self.line_chars(), start_input) else {
            self.auto_complete_start = None;
            self.auto_complete_len = 0;
            return Ok(false);
        };
        let tok_end = tok_start + tok_len;

        // Re-print the token in the regular style over the highlighted text.
        let prompt = self.prompt_size();
        self.seek(prompt + tok_start)?;
        let token: String = self.line_chars()[tok_start..tok_end].iter().collect();
        self.emit(&token)?;
        *self.position_mut() = prompt + tok_end;

        self.insert_text(" ")?;

        self.auto_complete_start = None;
        self.auto_complete_len = 0;
        self.flush()?;
        Ok(true)
    }

    /// Abandon the active completion: remove the inserted characters and
    /// the overlay rows without committing.
    pub fn clear_auto_complete(&mut self) -> io::Result<()> {
        let Some(start) = self.auto_complete_start else {
            return Ok(());
        };

        let cursor_was = self.position();
        self.clear_next_lines()?;
        if self.auto_complete_len > 0 {
            let end = start + self.auto_complete_len;
            self.seek(end)?;
            let len = self.auto_complete_len;
            self.clear_behind(len)?;
        }
        // A cursor that sat before the insertion keeps its place.
        if cursor_was < start {
            self.seek(cursor_was)?;
        }
        self.auto_complete_start = None;
        self.auto_complete_len = 0;
        self.flush()
    }

    /// Render the alternatives row: `[c  b  a] ^> description`, fitted to
    /// the width left of the caret column, newest-rotation first nearest
    /// the caret. Returns the number of overlay rows written.
    fn print_alternatives(
        &mut self,
        completions: &[Completion],
        caret_col: usize,
    ) -> io::Result<usize> {
        if completions.len() == 1 {
            self.add_line(&" ".repeat(caret_col))?;
            self.insert_text("^>")?;
            return Ok(1);
        }

        // `[` + alternatives + `]` must fit left of the caret.
        let width = caret_col.saturating_sub(3);
        let mut remaining = width.saturating_sub(2);
        let mut space_size = 1usize;

        let mut fitted = 0usize;
        for completion in &completions[1..] {
            let size = display_width(&completion.text) + if fitted > 0 { space_size } else { 0 };
            if remaining < size {
                break;
            }
            fitted += 1;
            remaining -= size;
        }

        let mut items: Vec<String> = completions[1..1 + fitted]
            .iter()
            .map(|c| c.text.clone())
            .collect();

        if fitted < completions.len() - 1 && fitted > 0 && remaining >= MIN_ABBREV_WIDTH {
            // Cram in one abbreviated alternative; leave room for a space.
            let next = &completions[1 + fitted].text;
            let abbreviated = if next.chars().count() > MIN_ABBREV_WIDTH - 1 {
                let head: String = next.chars().take(MIN_ABBREV_WIDTH - 3).collect();
                format!("{head}..")
            } else {
                next.clone()
            };
            remaining -= display_width(&abbreviated) + space_size;
            items.push(abbreviated);
        } else if fitted > 0 && remaining > 0 {
            // Nothing else fits; widen the spacing instead.
            let extra = remaining / fitted;
            if extra > 0 {
                space_size += extra;
                remaining -= (fitted.saturating_sub(1)) * extra;
            }
        }

        items.reverse();

        self.add_line(&" ".repeat(remaining + 1))?;
        self.insert_text("[")?;
        self.emit(&palette::ALTERNATIVES.fg())?;
        for (i, item) in items.iter().enumerate() {
            self.insert_text(item)?;
            if i != items.len() - 1 {
                self.insert_text(&" ".repeat(space_size))?;
            }
        }
        self.emit(RESET)?;
        self.insert_text("] ")?;
        self.insert_text("^>")?;
        Ok(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{EditorEvent, Key};

    fn editor() -> LineEditor<Vec<u8>> {
        let mut ed = LineEditor::new(Vec::new(), 60);
        ed.set_prompt_size(6);
        ed
    }

    fn typed(ed: &mut LineEditor<Vec<u8>>, text: &str) {
        for c in text.chars() {
            ed.keypressed(Key::Ascii(c)).unwrap();
        }
    }

    fn comps(names: &[&str]) -> Vec<Completion> {
        names.iter().map(|n| Completion::new(*n, format!("{n} desc"))).collect()
    }

    #[test]
    fn prefix_completion_inserts_only_the_suffix() {
        let mut ed = editor();
        typed(&mut ed, "sta");
        ed.set_completions(0, &comps(&["status", "start"]), "Status").unwrap();

        assert_eq!(ed.line(), "status");
        assert!(ed.auto_complete_active());
        // Cursor at the end of the inserted completion.
        assert_eq!(ed.input_position(), 6);
    }

    #[test]
    fn mismatched_token_is_replaced_wholesale() {
        let mut ed = editor();
        typed(&mut ed, "zzz");
        ed.set_completions(0, &comps(&["status"]), "Status").unwrap();
        assert_eq!(ed.line(), "status");
        assert_eq!(ed.input_position(), 6);
    }

    #[test]
    fn second_tab_swaps_the_inserted_completion() {
        let mut ed = editor();
        typed(&mut ed, "sta");
        ed.set_completions(0, &comps(&["status", "start"]), "a").unwrap();
        assert_eq!(ed.line(), "status");
        // The session rotated; the editor replaces its insertion.
        ed.set_completions(0, &comps(&["start", "status"]), "b").unwrap();
        assert_eq!(ed.line(), "start");
        assert_eq!(ed.input_position(), 5);
    }

    #[test]
    fn space_finalizes_with_trailing_space() {
        let mut ed = editor();
        typed(&mut ed, "sta");
        ed.set_completions(0, &comps(&["status"]), "Status").unwrap();
        ed.keypressed(Key::Ascii(' ')).unwrap();

        assert_eq!(ed.line(), "status ");
        assert!(!ed.auto_complete_active());
        assert_eq!(ed.line_count(), 1);
    }

    #[test]
    fn return_finalizes_and_reports_the_completed_command() {
        let mut ed = editor();
        typed(&mut ed, "sta");
        ed.set_completions(0, &comps(&["status"]), "Status").unwrap();
        let event = ed.keypressed(Key::Return).unwrap();
        assert_eq!(event, EditorEvent::Command("status".into()));
        assert!(!ed.auto_complete_active());
    }

    #[test]
    fn backspace_at_insertion_point_abandons_the_completion() {
        let mut ed = editor();
        typed(&mut ed, "sta");
        ed.set_completions(0, &comps(&["status"]), "Status").unwrap();
        // Walk back to the insertion point, then backspace.
        ed.keypressed(Key::Left).unwrap();
        ed.keypressed(Key::Left).unwrap();
        ed.keypressed(Key::Left).unwrap();
        ed.keypressed(Key::Backspace).unwrap();

        assert_eq!(ed.line(), "sta");
        assert!(!ed.auto_complete_active());
        assert_eq!(ed.line_count(), 1);
    }

    #[test]
    fn typing_before_insertion_point_clears_the_overlay() {
        let mut ed = editor();
        typed(&mut ed, "sta");
        ed.set_completions(0, &comps(&["status"]), "Status").unwrap();
        ed.keypressed(Key::Home).unwrap();
        ed.keypressed(Key::Ascii('x')).unwrap();

        assert!(!ed.auto_complete_active());
        assert_eq!(ed.line(), "xsta");
    }

    #[test]
    fn overlay_rows_show_alternatives_and_description() {
        let mut ed = LineEditor::new(Vec::new(), 60);
        ed.set_prompt_size(20);
        typed(&mut ed, "c");
        ed.set_completions(0, &comps(&["cat", "car", "can"]), "Feline").unwrap();

        assert_eq!(ed.line_count(), 3);
        let rows = ed.overlay_rows();
        // Remaining alternatives bracketed, reversed, before the caret.
        assert!(rows[0].contains('[') && rows[0].contains(']'), "row: {:?}", rows[0]);
        let can = rows[0].find("can").expect("can listed");
        let car = rows[0].find("car").expect("car listed");
        assert!(can < car, "alternatives render reversed: {:?}", rows[0]);
        assert!(rows[0].contains("^>"));
        assert!(rows[1].contains("Feline"));
    }

    #[test]
    fn single_completion_shows_description_row_only() {
        let mut ed = editor();
        typed(&mut ed, "he");
        ed.set_completions(0, &comps(&["help"]), "This help message").unwrap();
        let rows = ed.overlay_rows();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].contains("^>"));
        assert!(rows[1].contains("This help message"));
    }

    #[test]
    fn completion_text_renders_highlighted() {
        let mut ed = editor();
        typed(&mut ed, "sta");
        ed.set_completions(0, &comps(&["status"]), "Status").unwrap();
        let out = String::from_utf8(ed.into_sink()).unwrap();
        let colored = format!("{}tus", palette::COMPLETION.fg());
        assert!(out.contains(&colored), "missing highlighted suffix in {out:?}");
    }

    #[test]
    fn long_alternative_lists_abbreviate() {
        let mut ed = LineEditor::new(Vec::new(), 60);
        ed.set_prompt_size(2);
        typed(&mut ed, "reconfigure-servos");
        // Two short alternatives fit; the long one is crammed in abbreviated.
        ed.set_completions(
            0,
            &comps(&["reconfigure-servos-now", "aa", "bb", "very-long-name"]),
            "cfg",
        )
        .unwrap();
        let rows = ed.overlay_rows();
        assert!(rows[0].contains("ver.."), "expected abbreviation in {:?}", rows[0]);
    }
}
