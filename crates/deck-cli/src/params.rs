#![forbid(unsafe_code)]

//! Ordered parameter lists.
//!
//! A command's parameters parse as a batch: prepare attempts every
//! position so the user sees all bad parameters at once, and completion is
//! gated on every earlier parameter validating.

use std::io::Write;

use deck_editor::Completion;

use crate::context::ParamContext;
use crate::param::{Param, ParamKind};
use crate::value::FromValue;

/// What one batch prepare produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrepareOutcome {
    /// Count of successfully bound parameters.
    pub prepared: usize,
    /// Token indices (into the full command line) that failed to parse.
    pub failed_indices: Vec<usize>,
}

impl PrepareOutcome {
    /// True when something bound and nothing failed.
    pub fn success(&self) -> bool {
        self.failed_indices.is_empty() && self.prepared > 0
    }
}

/// The ordered parameters of one command.
#[derive(Debug, Clone, Default)]
pub struct ParamList {
    params: Vec<Param>,
}

impl ParamList {
    /// An empty list (a bare menu command).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build from parameters in order.
    pub fn new(params: Vec<Param>) -> Self {
        Self { params }
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Whether the list has no parameters.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Parameter at `index`.
    pub fn get(&self, index: usize) -> Option<&Param> {
        self.params.get(index)
    }

    /// Iterate the parameters in order.
    pub fn iter(&self) -> impl Iterator<Item = &Param> {
        self.params.iter()
    }

    /// A *free* list is exactly one string parameter; it swallows all
    /// remaining tokens joined by single spaces.
    pub fn is_free(&self) -> bool {
        self.params.len() == 1 && matches!(self.params[0].kind(), ParamKind::Str)
    }

    /// Parse tokens `[start..]` against the parameters.
    ///
    /// A free list concatenates everything into the single parameter;
    /// otherwise parameters consume tokens one for one until either runs
    /// out. Failures never short-circuit.
    pub fn prepare(
        &mut self,
        ctx: &mut ParamContext<'_>,
        tokens: &[String],
        start: usize,
    ) -> PrepareOutcome {
        let mut outcome = PrepareOutcome::default();

        if self.is_free() {
            let joined = tokens[start.min(tokens.len())..].join(" ");
            if self.params[0].prepare(ctx, &joined) {
                outcome.prepared = 1;
            } else {
                outcome.failed_indices.push(start);
            }
            return outcome;
        }

        let count = tokens.len().saturating_sub(start).min(self.params.len());
        for i in 0..count {
            if self.params[i].prepare(ctx, &tokens[start + i]) {
                outcome.prepared += 1;
            } else {
                outcome.failed_indices.push(start + i);
            }
        }
        outcome
    }

    /// Completions for parameter `k` given the tokens typed so far.
    ///
    /// Every parameter before `k` must validate or nothing is offered.
    /// Advisory only: never binds.
    pub fn auto_complete(
        &self,
        ctx: &ParamContext<'_>,
        param_tokens: &[String],
        k: usize,
    ) -> Vec<Completion> {
        debug_assert!(k < param_tokens.len(), "completion index out of tokens");
        if k >= param_tokens.len() || k >= self.params.len() {
            return Vec::new();
        }
        for i in 0..k {
            if !self.params[i].validate(ctx, &param_tokens[i]) {
                return Vec::new();
            }
        }
        self.params[k].complete(ctx, &param_tokens[k])
    }

    /// Push every stored value onto the context, in order.
    pub fn add_to_context(&self, ctx: &mut ParamContext<'_>) {
        for param in &self.params {
            if let Some(value) = param.value() {
                ctx.push(value.clone());
            }
        }
    }

    /// Retrieve the bound value at `index` as `T`.
    ///
    /// A missing parameter or shape mismatch is a command-author error: it
    /// is reported on `out` and a zero-ish default comes back so the
    /// callback proceeds benignly.
    pub fn arg<T: FromValue>(&self, index: usize, out: &mut dyn Write) -> T {
        let Some(param) = self.params.get(index) else {
            let _ = writeln!(out, "No parameter at index {index}");
            return T::fallback();
        };
        match param.value().and_then(T::from_value) {
            Some(v) => v,
            None => {
                let _ = writeln!(
                    out,
                    "Parameter '{}' at index {index} is not bound as {}",
                    param.name(),
                    T::LABEL
                );
                T::fallback()
            }
        }
    }

    /// The first two bound values as a tuple.
    pub fn args2<A: FromValue, B: FromValue>(&self, out: &mut dyn Write) -> (A, B) {
        (self.arg(0, out), self.arg(1, out))
    }

    /// The first three bound values as a tuple.
    pub fn args3<A: FromValue, B: FromValue, C: FromValue>(
        &self,
        out: &mut dyn Write,
    ) -> (A, B, C) {
        (self.arg(0, out), self.arg(1, out), self.arg(2, out))
    }
}

impl From<Vec<Param>> for ParamList {
    fn from(params: Vec<Param>) -> Self {
        Self::new(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use deck_world::Registry;

    fn strs(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn free_list_is_exactly_one_string() {
        assert!(ParamList::new(vec![Param::string("text")]).is_free());
        assert!(!ParamList::new(vec![Param::int("n")]).is_free());
        assert!(!ParamList::new(vec![Param::string("a"), Param::string("b")]).is_free());
        assert!(!ParamList::empty().is_free());
    }

    #[test]
    fn free_prepare_joins_remaining_tokens() {
        let world = Registry::new();
        let mut out = Vec::new();
        let mut ctx = ParamContext::new(&mut out, &world);
        let mut list = ParamList::new(vec![Param::string("text")]);

        let tokens = strs(&["say", "hello", "brave", "world"]);
        let outcome = list.prepare(&mut ctx, &tokens, 1);
        assert!(outcome.success());
        assert_eq!(outcome.prepared, 1);
        assert_eq!(
            list.get(0).unwrap().value(),
            Some(&Value::Str("hello brave world".into()))
        );
    }

    #[test]
    fn prepare_collects_every_failure() {
        let world = Registry::new();
        let mut out = Vec::new();
        let mut ctx = ParamContext::new(&mut out, &world);
        let mut list = ParamList::new(vec![Param::int("a"), Param::int("b"), Param::int("c")]);

        let tokens = strs(&["cmd", "1", "x", "y"]);
        let outcome = list.prepare(&mut ctx, &tokens, 1);
        assert_eq!(outcome.prepared, 1);
        assert_eq!(outcome.failed_indices, vec![2, 3]);
        assert!(!outcome.success());
    }

    #[test]
    fn prepare_stops_when_tokens_run_out() {
        let world = Registry::new();
        let mut out = Vec::new();
        let mut ctx = ParamContext::new(&mut out, &world);
        let mut list = ParamList::new(vec![Param::int("a"), Param::int("b")]);

        let tokens = strs(&["cmd", "5"]);
        let outcome = list.prepare(&mut ctx, &tokens, 1);
        assert_eq!(outcome.prepared, 1);
        assert!(outcome.failed_indices.is_empty());
    }

    #[test]
    fn auto_complete_gates_on_earlier_params() {
        let world = Registry::new();
        let mut out = Vec::new();
        let ctx = ParamContext::new(&mut out, &world);
        let list = ParamList::new(vec![
            Param::int_range("power", 0, 3),
            Param::choice("mode", &[("auto", ""), ("manual", "")]),
        ]);

        // Valid first param: the choice completes.
        let comps = list.auto_complete(&ctx, &strs(&["2", "a"]), 1);
        assert_eq!(comps.len(), 1);

        // Broken first param: nothing.
        let comps = list.auto_complete(&ctx, &strs(&["nope", "a"]), 1);
        assert!(comps.is_empty());
    }

    #[test]
    fn auto_complete_past_the_list_is_empty() {
        let world = Registry::new();
        let mut out = Vec::new();
        let ctx = ParamContext::new(&mut out, &world);
        let list = ParamList::new(vec![Param::int("a")]);
        assert!(list.auto_complete(&ctx, &strs(&["1", ""]), 1).is_empty());
    }

    #[test]
    fn arg_retrieval_reports_mismatches() {
        let world = Registry::new();
        let mut sink = Vec::new();
        let mut ctx = ParamContext::new(&mut sink, &world);
        let mut list = ParamList::new(vec![Param::int("count")]);
        list.prepare(&mut ctx, &strs(&["cmd", "9"]), 1);

        let mut out = Vec::new();
        let n: i64 = list.arg(0, &mut out);
        assert_eq!(n, 9);
        assert!(out.is_empty());

        // Wrong shape: diagnostic plus fallback.
        let s: String = list.arg(0, &mut out);
        assert_eq!(s, "");
        let msg = String::from_utf8(out).unwrap();
        assert!(msg.contains("count"));
        assert!(msg.contains("string"));
    }

    #[test]
    fn args2_returns_in_order() {
        let world = Registry::new();
        let mut sink = Vec::new();
        let mut ctx = ParamContext::new(&mut sink, &world);
        let mut list = ParamList::new(vec![Param::int("a"), Param::float("b")]);
        list.prepare(&mut ctx, &strs(&["cmd", "4", "0.25"]), 1);

        let mut out = Vec::new();
        let (a, b): (i64, f64) = list.args2(&mut out);
        assert_eq!(a, 4);
        assert_eq!(b, 0.25);
    }
}
