#![forbid(unsafe_code)]

//! Decoded keypresses and the editor's reactions to them.

/// One decoded keypress, as delivered by the external raw-tty reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// End of input.
    Eof,
    /// Backspace.
    Backspace,
    /// Arrow up.
    Up,
    /// Arrow down.
    Down,
    /// Arrow left.
    Left,
    /// Arrow right.
    Right,
    /// Return / Enter.
    Return,
    /// A printable character. `'\t'` is how Tab arrives.
    Ascii(char),
    /// Forward delete.
    Delete,
    /// End.
    End,
    /// Home.
    Home,
    /// Anything the decoder chose not to surface.
    Ignored,
}

/// What a keypress meant at the editor level.
///
/// The editor handles in-line edits itself; everything that needs the
/// session (history, completion, dispatch) is surfaced to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorEvent {
    /// The key was consumed by the editor (or was a no-op).
    None,
    /// End of input; the caller should wind the session down.
    Eof,
    /// Return produced a finished command line.
    Command(String),
    /// History: previous entry requested.
    Up,
    /// History: next entry requested.
    Down,
    /// Tab: the caller decides how to present completions.
    Tab,
}
