#![forbid(unsafe_code)]

//! The completion payload the overlay renders.

/// One completion alternative: the text to insert and a short description
/// shown on the overlay's description row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Completion {
    /// Replacement text for the token being completed.
    pub text: String,
    /// Human-readable description.
    pub description: String,
}

impl Completion {
    /// Build a completion from anything string-like.
    pub fn new(text: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            description: description.into(),
        }
    }
}
