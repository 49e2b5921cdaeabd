#![forbid(unsafe_code)]

//! The prompt-line editor.
//!
//! [`LineEditor`] owns the authoritative model of the visible prompt line:
//! the current input text, the cursor measured in displayed cells, the
//! prompt width, and any transient overlay rows used by auto-completion.
//! Every decoded keypress advances the model and emits the minimal
//! escape/backspace sequence needed to keep the physical terminal in sync.
//!
//! The editor emits only the escape forms the engine's output contract
//! allows: `ESC[nC` (cursor right), `ESC[nF` / `ESC[nE` (start of
//! previous/next line), truecolor styling from `deck-style`, and
//! backspace–space–backspace triplets for erasure.
//!
//! Key decoding and raw-tty configuration live elsewhere; this crate only
//! consumes the decoded [`Key`] stream.

pub mod completion;
pub mod editor;
pub mod key;
mod overlay;

pub use completion::Completion;
pub use editor::{LineEditor, ParamInfo};
pub use key::{EditorEvent, Key};
