#![forbid(unsafe_code)]

//! Output sinks and the shared fan-out stream.
//!
//! Sessions write to a [`SharedSink`]; the [`Fanout`] is the global
//! "every connected console" stream: observers register once and every
//! write is forwarded to all of them. The observer list must only change
//! outside a write — the interior `RefCell` turns a violation into a loud
//! panic rather than silent reentrancy.

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

/// A writer shareable between the session and the fan-out stream.
pub type SharedSink = Rc<RefCell<dyn Write>>;

/// Wrap any writer as a [`SharedSink`].
pub fn shared_sink<W: Write + 'static>(writer: W) -> SharedSink {
    Rc::new(RefCell::new(writer))
}

/// Swallows everything; the silent session's sink.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl Write for NullSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Default)]
struct FanoutInner {
    next_id: usize,
    observers: Vec<(usize, SharedSink)>,
}

/// Multiplexes writes to every registered observer.
///
/// Cloning shares the observer list; the clone a session holds writes to
/// the same consoles as the one the shell owns.
#[derive(Clone, Default)]
pub struct Fanout {
    inner: Rc<RefCell<FanoutInner>>,
}

impl Fanout {
    /// An empty fan-out.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an observer; the returned id unregisters it.
    pub fn register(&self, sink: SharedSink) -> usize {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.observers.push((id, sink));
        id
    }

    /// Remove an observer.
    pub fn unregister(&self, id: usize) {
        self.inner.borrow_mut().observers.retain(|(i, _)| *i != id);
    }

    /// How many observers are registered.
    pub fn observer_count(&self) -> usize {
        self.inner.borrow().observers.len()
    }
}

impl Write for Fanout {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let inner = self.inner.borrow();
        for (_, sink) in &inner.observers {
            sink.borrow_mut().write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let inner = self.inner.borrow();
        for (_, sink) in &inner.observers {
            sink.borrow_mut().flush()?;
        }
        Ok(())
    }
}
