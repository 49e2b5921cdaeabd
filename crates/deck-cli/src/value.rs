#![forbid(unsafe_code)]

//! Tagged values bound by parameters.
//!
//! Every parameter kind produces one of these shapes on a successful
//! parse. Command callbacks retrieve them back out through [`FromValue`],
//! which also powers the context's "most recent value of this type"
//! lookup.

use deck_world::ObjectId;

/// A bound parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A whole number.
    Int(i64),
    /// A floating-point number.
    Float(f64),
    /// A verbatim string (also what free commands bind).
    Str(String),
    /// A reference into the object registry.
    Object(ObjectId),
    /// A slot/line/port index validated against an earlier object.
    Index(usize),
}

impl Value {
    /// Integer payload, if that is what this is.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Float payload.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// String payload.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(v) => Some(v),
            _ => None,
        }
    }

    /// Object reference payload.
    pub fn as_object(&self) -> Option<ObjectId> {
        match self {
            Value::Object(v) => Some(*v),
            _ => None,
        }
    }

    /// Index payload.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Value::Index(v) => Some(*v),
            _ => None,
        }
    }
}

/// Typed extraction from a [`Value`], with a benign fallback for command
/// authors who asked for the wrong shape.
pub trait FromValue: Sized {
    /// Human-readable shape name used in mismatch diagnostics.
    const LABEL: &'static str;

    /// Extract this type's payload, if the value holds it.
    fn from_value(value: &Value) -> Option<Self>;

    /// Zero-ish stand-in returned on a reported mismatch.
    fn fallback() -> Self;
}

impl FromValue for i64 {
    const LABEL: &'static str = "int";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_int()
    }

    fn fallback() -> Self {
        0
    }
}

impl FromValue for f64 {
    const LABEL: &'static str = "float";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_float()
    }

    fn fallback() -> Self {
        0.0
    }
}

impl FromValue for String {
    const LABEL: &'static str = "string";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().map(str::to_owned)
    }

    fn fallback() -> Self {
        String::new()
    }
}

impl FromValue for ObjectId {
    const LABEL: &'static str = "object";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_object()
    }

    fn fallback() -> Self {
        ObjectId::INVALID
    }
}

impl FromValue for usize {
    const LABEL: &'static str = "index";

    fn from_value(value: &Value) -> Option<Self> {
        value.as_index()
    }

    fn fallback() -> Self {
        0
    }
}
