#![forbid(unsafe_code)]

//! The per-invocation parameter context.
//!
//! A [`ParamContext`] travels through one scan/prepare pass. It carries the
//! output sink, the registry view, and every value bound so far in the
//! command chain: the ancestor scopes' stored values first (seeded before
//! the scan), then the current line's bindings appended left to right as
//! they succeed.

use std::io::Write;

use deck_world::{Capabilities, Object, Registry};

use crate::value::{FromValue, Value};

/// Scan-time state shared by every parameter of a command chain.
pub struct ParamContext<'a> {
    /// Diagnostic sink.
    pub out: &'a mut dyn Write,
    /// The registry object-reference parameters resolve against.
    pub world: &'a Registry,
    bound: Vec<Value>,
}

impl<'a> ParamContext<'a> {
    /// Fresh context with nothing bound.
    pub fn new(out: &'a mut dyn Write, world: &'a Registry) -> Self {
        Self {
            out,
            world,
            bound: Vec::new(),
        }
    }

    /// Append a successfully bound value.
    pub fn push(&mut self, value: Value) {
        self.bound.push(value);
    }

    /// Everything bound so far, oldest first.
    pub fn bound(&self) -> &[Value] {
        &self.bound
    }

    /// Most recent bound value of type `T`, skipping the first `skip`
    /// matches.
    pub fn previous<T: FromValue>(&self, skip: usize) -> Option<T> {
        let mut skip = skip;
        for value in self.bound.iter().rev() {
            if let Some(v) = T::from_value(value) {
                if skip == 0 {
                    return Some(v);
                }
                skip -= 1;
            }
        }
        None
    }

    /// Most recent bound object advertising `caps`, resolved through the
    /// registry. Bound ids whose objects have vanished are passed over.
    pub fn previous_object(&self, caps: Capabilities, skip: usize) -> Option<&'a Object> {
        let world = self.world;
        let mut skip = skip;
        for value in self.bound.iter().rev() {
            let Some(id) = value.as_object() else { continue };
            let Some(object) = world.get(id) else { continue };
            if !object.is_a(caps) {
                continue;
            }
            if skip == 0 {
                return Some(object);
            }
            skip -= 1;
        }
        None
    }
}
