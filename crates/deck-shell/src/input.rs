#![forbid(unsafe_code)]

//! Raw-tty input: decoding crossterm events into the editor's [`Key`]
//! alphabet and keeping the terminal's raw mode scoped.

use std::io;

use crossterm::event::{Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use deck_editor::Key;

/// Map one crossterm event onto a decoded [`Key`].
///
/// Returns `None` for events that are not keypresses (mouse, resize,
/// focus); unmapped keys come back as [`Key::Ignored`] so the editor can
/// drop them explicitly.
pub fn key_from_crossterm(event: Event) -> Option<Key> {
    let Event::Key(key) = event else {
        return None;
    };
    if key.kind == KeyEventKind::Release {
        return None;
    }

    Some(match key.code {
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => Key::Eof,
        KeyCode::Char(c) => Key::Ascii(c),
        KeyCode::Tab => Key::Ascii('\t'),
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Enter => Key::Return,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Delete => Key::Delete,
        KeyCode::End => Key::End,
        KeyCode::Home => Key::Home,
        _ => Key::Ignored,
    })
}

/// Block until the next decoded keypress.
pub fn read_key() -> io::Result<Key> {
    loop {
        if let Some(key) = key_from_crossterm(crossterm::event::read()?) {
            return Ok(key);
        }
    }
}

/// Raw mode for the lifetime of the guard.
#[derive(Debug)]
pub struct RawModeGuard(());

impl RawModeGuard {
    /// Enable raw mode; it is restored on drop.
    pub fn new() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self(()))
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = terminal::disable_raw_mode() {
            tracing::warn!(error = %e, "failed to restore cooked mode");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyEvent, KeyEventState};

    fn press(code: KeyCode, modifiers: KeyModifiers) -> Event {
        Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        })
    }

    #[test]
    fn printable_keys_map_to_ascii() {
        assert_eq!(
            key_from_crossterm(press(KeyCode::Char('x'), KeyModifiers::NONE)),
            Some(Key::Ascii('x'))
        );
        assert_eq!(
            key_from_crossterm(press(KeyCode::Tab, KeyModifiers::NONE)),
            Some(Key::Ascii('\t'))
        );
    }

    #[test]
    fn ctrl_d_is_eof() {
        assert_eq!(
            key_from_crossterm(press(KeyCode::Char('d'), KeyModifiers::CONTROL)),
            Some(Key::Eof)
        );
    }

    #[test]
    fn navigation_keys_map_through() {
        for (code, expected) in [
            (KeyCode::Enter, Key::Return),
            (KeyCode::Backspace, Key::Backspace),
            (KeyCode::Up, Key::Up),
            (KeyCode::Down, Key::Down),
            (KeyCode::Left, Key::Left),
            (KeyCode::Right, Key::Right),
            (KeyCode::Delete, Key::Delete),
            (KeyCode::Home, Key::Home),
            (KeyCode::End, Key::End),
        ] {
            assert_eq!(key_from_crossterm(press(code, KeyModifiers::NONE)), Some(expected));
        }
    }

    #[test]
    fn releases_and_non_keys_are_dropped() {
        let release = Event::Key(KeyEvent {
            code: KeyCode::Char('a'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        });
        assert_eq!(key_from_crossterm(release), None);
        assert_eq!(key_from_crossterm(Event::FocusGained), None);
        assert_eq!(
            key_from_crossterm(press(KeyCode::Esc, KeyModifiers::NONE)),
            Some(Key::Ignored)
        );
    }
}
