#![forbid(unsafe_code)]

//! Hierarchical command tree with typed parameters and the interactive
//! session driving it.
//!
//! The pieces, leaf first:
//!
//! - [`Value`] / [`FromValue`] — the tagged container parameters bind.
//! - [`Param`] / [`ParamKind`] / [`ObjectFilter`] — one token's parse,
//!   validate, and complete behavior, with context-dependent kinds (slot,
//!   reactor line, connector port) resolved against values bound earlier
//!   in the chain.
//! - [`ParamList`] — batch prepare with the free-command rule and gated
//!   completion.
//! - [`CommandArena`] / [`Command`] — the tree itself, arena-allocated
//!   with stable handles, with recursive scan-then-execute semantics.
//! - [`Session`] / [`Cli`] — the feed pipeline, scope transitions, prompt
//!   rendering, history, and Tab-rotation of completions.
//!
//! Keypress decoding and prompt-line rendering live in `deck-editor`; the
//! simulation registry the object parameters query lives in `deck-world`.

pub mod command;
pub mod context;
pub mod history;
pub mod param;
pub mod params;
pub mod session;
pub mod stream;
pub mod value;

pub use command::{
    ChainView, Command, CommandArena, CommandError, CommandId, ExecResult, ExecutionResult,
    InsertError, PrepareResult, ScanOutcome, ValidateFn, Validation,
};
pub use context::ParamContext;
pub use deck_editor::Completion;
pub use history::{FileHistoryStorage, History, HistoryStorage, VolatileHistoryStorage};
pub use param::{ObjectFilter, Param, ParamKind};
pub use params::{ParamList, PrepareOutcome};
pub use session::{Cli, FeedOptions, Session, SessionOptions};
pub use stream::{Fanout, NullSink, SharedSink, shared_sink};
pub use value::{FromValue, Value};
