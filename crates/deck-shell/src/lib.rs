#![forbid(unsafe_code)]

//! The interactive shell driver.
//!
//! [`Shell`] wires a [`Session`] to a [`LineEditor`]: keys flow into the
//! editor, finished lines flow into the session, and the session's
//! completions and history flow back into the editor on Tab and Up/Down.
//! Raw-tty configuration and key decoding live in [`input`].

pub mod input;

use std::io::{self, Write};

use deck_cli::{FeedOptions, Session};
use deck_editor::{EditorEvent, Key, LineEditor};

/// Shell construction knobs, fillable from the environment.
#[derive(Debug, Clone)]
pub struct ShellConfig {
    /// Terminal width in cells.
    pub width: usize,
    /// History ring capacity.
    pub history_size: usize,
    /// Optional path for persistent history.
    pub history_file: Option<String>,
    /// Register the global `history` command.
    pub history_command: bool,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            width: 120,
            history_size: 100,
            history_file: None,
            history_command: true,
        }
    }
}

impl ShellConfig {
    /// Defaults overridden by `DECK_WIDTH`, `DECK_HISTORY_SIZE`, and
    /// `DECK_HISTORY_FILE`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(width) = std::env::var("DECK_WIDTH").ok().and_then(|v| v.parse().ok()) {
            config.width = width;
        }
        if let Some(size) = std::env::var("DECK_HISTORY_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.history_size = size;
        }
        if let Ok(path) = std::env::var("DECK_HISTORY_FILE") {
            config.history_file = Some(path);
        }
        config
    }
}

/// What one keypress amounted to at the shell level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellEvent {
    /// Nothing the caller needs to act on.
    Continue,
    /// A command line ran.
    Command {
        /// The line as fed.
        line: String,
        /// Whether the scan resolved completely.
        found: bool,
    },
    /// The session ended (exit at the root).
    Exited,
    /// End of input.
    Eof,
}

/// A session bound to a line editor.
pub struct Shell<W: Write> {
    session: Session,
    editor: LineEditor<W>,
}

impl<W: Write> Shell<W> {
    /// Wire a session and an editor together.
    pub fn new(session: Session, editor: LineEditor<W>) -> Self {
        Self { session, editor }
    }

    /// The session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The session, mutably.
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// The editor.
    pub fn editor(&self) -> &LineEditor<W> {
        &self.editor
    }

    /// Emit the first prompt and size the editor to it.
    pub fn start(&mut self) -> io::Result<()> {
        let size = self.session.prompt();
        self.editor.set_prompt_size(size);
        Ok(())
    }

    /// Route one decoded keypress.
    pub fn handle_key(&mut self, key: Key) -> io::Result<ShellEvent> {
        match self.editor.keypressed(key)? {
            EditorEvent::None => Ok(ShellEvent::Continue),
            EditorEvent::Eof => Ok(ShellEvent::Eof),
            EditorEvent::Command(line) => {
                let found = self.session.feed(&line, FeedOptions::default());
                if self.session.exited() {
                    return Ok(ShellEvent::Exited);
                }
                let size = self.session.prompt();
                self.editor.set_prompt_size(size);
                Ok(ShellEvent::Command { line, found })
            }
            EditorEvent::Tab => {
                let (line, param) = self.editor.auto_complete_line();
                let completions = self.session.get_completions(&line, param);
                if !completions.is_empty() {
                    let description = completions[0].description.clone();
                    self.editor.set_completions(param, &completions, &description)?;
                }
                Ok(ShellEvent::Continue)
            }
            EditorEvent::Up => {
                let previous = self.session.previous_cmd(&self.editor.line());
                self.editor.set_line(&previous)?;
                Ok(ShellEvent::Continue)
            }
            EditorEvent::Down => {
                let next = self.session.next_cmd();
                self.editor.set_line(&next)?;
                Ok(ShellEvent::Continue)
            }
        }
    }

    /// Drive keys until exit or end of input.
    pub fn run<I: Iterator<Item = Key>>(&mut self, keys: I) -> io::Result<ShellEvent> {
        for key in keys {
            match self.handle_key(key)? {
                ShellEvent::Exited => return Ok(ShellEvent::Exited),
                ShellEvent::Eof => return Ok(ShellEvent::Eof),
                _ => {}
            }
        }
        Ok(ShellEvent::Continue)
    }
}
