#![forbid(unsafe_code)]

//! Command history: the bounded ring the session browses, and the storage
//! policies that persist it across sessions.

use std::collections::VecDeque;
use std::io::{self, Write};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Bounded command ring with Up/Down browsing state.
///
/// Browsing remembers the in-progress line on the first step back and
/// restores it when stepping past the newest entry again.
#[derive(Debug)]
pub struct History {
    items: VecDeque<String>,
    capacity: usize,
    /// Browse cursor; `items.len()` means "not browsing".
    cursor: usize,
    /// The line being typed when browsing started.
    pending: String,
}

impl History {
    /// A ring holding at most `capacity` commands.
    pub fn new(capacity: usize) -> Self {
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            cursor: 0,
            pending: String::new(),
        }
    }

    /// Seed from storage, oldest first.
    pub fn load_commands(&mut self, commands: Vec<String>) {
        for command in commands {
            self.push(&command);
        }
    }

    /// Record a fed command and reset browsing.
    pub fn push(&mut self, line: &str) {
        if self.items.len() == self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(line.to_string());
        self.cursor = self.items.len();
        self.pending.clear();
    }

    /// Step to the previous (older) command; `line` is what the user had
    /// typed so far and comes back on the way down.
    pub fn previous(&mut self, line: &str) -> String {
        if self.cursor == self.items.len() {
            self.pending = line.to_string();
        }
        if self.cursor > 0 {
            self.cursor -= 1;
        }
        self.items
            .get(self.cursor)
            .cloned()
            .unwrap_or_else(|| self.pending.clone())
    }

    /// Step to the next (newer) command, restoring the pending line past
    /// the newest entry.
    pub fn next(&mut self) -> String {
        if self.cursor < self.items.len() {
            self.cursor += 1;
        }
        match self.items.get(self.cursor) {
            Some(item) => item.clone(),
            None => self.pending.clone(),
        }
    }

    /// Everything in the ring, oldest first.
    pub fn commands(&self) -> Vec<String> {
        self.items.iter().cloned().collect()
    }

    /// Number of stored commands.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the ring is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Print the ring, oldest first.
    pub fn show(&self, out: &mut dyn Write) -> io::Result<()> {
        for item in &self.items {
            writeln!(out, "{item}")?;
        }
        Ok(())
    }
}

/// Where the history ring goes between sessions.
///
/// Called once at session construction (`commands`) and once at session
/// exit (`store`).
pub trait HistoryStorage {
    /// Persist the ring.
    fn store(&mut self, commands: &[String]) -> io::Result<()>;

    /// Recover whatever was stored last time.
    fn commands(&self) -> Vec<String>;
}

/// Keeps history for this process only.
#[derive(Debug, Default)]
pub struct VolatileHistoryStorage {
    commands: Vec<String>,
}

impl VolatileHistoryStorage {
    /// An empty volatile store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStorage for VolatileHistoryStorage {
    fn store(&mut self, commands: &[String]) -> io::Result<()> {
        self.commands = commands.to_vec();
        Ok(())
    }

    fn commands(&self) -> Vec<String> {
        self.commands.clone()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct HistoryFile {
    version: u32,
    commands: Vec<String>,
}

/// Persists history as JSON at a fixed path.
#[derive(Debug)]
pub struct FileHistoryStorage {
    path: PathBuf,
}

impl FileHistoryStorage {
    /// Store at `path`; the file is created on the first store.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl HistoryStorage for FileHistoryStorage {
    fn store(&mut self, commands: &[String]) -> io::Result<()> {
        let file = HistoryFile {
            version: 1,
            commands: commands.to_vec(),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        std::fs::write(&self.path, json)
    }

    fn commands(&self) -> Vec<String> {
        let Ok(text) = std::fs::read_to_string(&self.path) else {
            return Vec::new();
        };
        match serde_json::from_str::<HistoryFile>(&text) {
            Ok(file) => file.commands,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring unreadable history file");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_drops_oldest_at_capacity() {
        let mut h = History::new(2);
        h.push("one");
        h.push("two");
        h.push("three");
        assert_eq!(h.commands(), vec!["two".to_string(), "three".to_string()]);
    }

    #[test]
    fn browsing_walks_back_and_restores_pending() {
        let mut h = History::new(10);
        h.push("first");
        h.push("second");

        assert_eq!(h.previous("typing"), "second");
        assert_eq!(h.previous("ignored"), "first");
        // At the oldest entry, stay put.
        assert_eq!(h.previous("ignored"), "first");

        assert_eq!(h.next(), "second");
        assert_eq!(h.next(), "typing");
        // Past the newest, keep returning the pending line.
        assert_eq!(h.next(), "typing");
    }

    #[test]
    fn push_resets_browsing() {
        let mut h = History::new(10);
        h.push("first");
        let _ = h.previous("");
        h.push("second");
        assert_eq!(h.previous("x"), "second");
    }

    #[test]
    fn empty_history_echoes_the_pending_line() {
        let mut h = History::new(4);
        assert_eq!(h.previous("draft"), "draft");
        assert_eq!(h.next(), "draft");
    }

    #[test]
    fn show_prints_oldest_first() {
        let mut h = History::new(4);
        h.push("a");
        h.push("b");
        let mut out = Vec::new();
        h.show(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "a\nb\n");
    }

    #[test]
    fn volatile_storage_round_trips() {
        let mut storage = VolatileHistoryStorage::new();
        storage.store(&["x".to_string(), "y".to_string()]).unwrap();
        assert_eq!(storage.commands(), vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn file_storage_round_trips() {
        let dir = std::env::temp_dir().join("deck-cli-history-test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("history.json");
        let _ = std::fs::remove_file(&path);

        let mut storage = FileHistoryStorage::new(&path);
        assert!(storage.commands().is_empty());
        storage.store(&["power on".to_string()]).unwrap();

        let storage = FileHistoryStorage::new(&path);
        assert_eq!(storage.commands(), vec!["power on".to_string()]);
        let _ = std::fs::remove_file(&path);
    }
}
