#![forbid(unsafe_code)]

//! The command tree.
//!
//! Commands live in an arena addressed by stable [`CommandId`] handles;
//! parent/child links are handles, so cycles are impossible by
//! construction and the ancestor chain handed to callbacks is a plain
//! ordered slice.
//!
//! A command line resolves in two phases: a *scan* walks the tree matching
//! names and preparing parameters (binding values into the nodes and the
//! context), then every scanned command *executes* in discovery order.

use std::fmt;
use std::io::Write;
use std::rc::Rc;

use deck_editor::Completion;
use deck_world::Registry;

use crate::context::ParamContext;
use crate::params::ParamList;
use crate::value::FromValue;

/// Stable handle to a command node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandId(usize);

/// Outcome of scanning a command line against a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanOutcome {
    /// No command matched at all.
    #[default]
    NoneFound,
    /// Every matched command bound completely.
    Found,
    /// A command matched by name but parameters failed or were missing.
    BadOrMissingParams,
    /// Some commands succeeded, then one matched partially.
    PartialCompletion,
}

/// What one node's [`CommandArena::prepare`] produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrepareResult {
    /// `Found`, `BadOrMissingParams`, or `NoneFound`.
    pub outcome: ScanOutcome,
    /// Consumed token count, name token included.
    pub tokens_consumed: usize,
}

/// Accumulated result of a recursive scan.
#[derive(Debug, Clone, Default)]
pub struct ExecutionResult {
    /// Fully prepared commands in discovery order.
    pub scanned: Vec<CommandId>,
    /// The command that matched by name but failed its parameters.
    pub partial: Option<CommandId>,
    /// Final four-state action.
    pub action: ScanOutcome,
    /// Tokens consumed across the scan.
    pub tokens_consumed: usize,
}

/// Command-line-shape gating, consulted before a node prepares.
///
/// Plain menus always [`Validation::Match`]; a command can install a
/// validator to opt out of lines it does not want to own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Validation {
    /// Pretend the name did not match; the scan keeps looking.
    NoMatch,
    /// Proceed to parameter preparation.
    #[default]
    Match,
    /// Match the name but refuse the line.
    Invalid,
}

/// Optional line-shape validator.
pub type ValidateFn = Rc<dyn Fn(&[String]) -> Validation>;

/// What a callback returns; an `Err` is routed to the session's error
/// handler and skips the scope transition.
pub type ExecResult = Result<(), Box<dyn std::error::Error>>;

/// Execute callback: the sink and the ancestor chain of the command.
pub type ExecFn = Rc<dyn Fn(&mut dyn Write, &ChainView<'_>) -> ExecResult>;

/// Invoked once when control leaves the command's scope.
pub type ExitFn = Rc<dyn Fn()>;

/// Overrides the node's prompt label.
pub type PromptFn = Rc<dyn Fn() -> String>;

/// A command definition, built up and handed to [`CommandArena::insert`].
#[derive(Default)]
pub struct Command {
    name: String,
    description: String,
    params: ParamList,
    on_execute: Option<ExecFn>,
    on_exit: Option<ExitFn>,
    prompt_display: Option<PromptFn>,
    validator: Option<ValidateFn>,
}

impl Command {
    /// Start a definition.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    /// Attach parameters.
    pub fn params(mut self, params: impl Into<ParamList>) -> Self {
        self.params = params.into();
        self
    }

    /// Attach the execute callback.
    pub fn execute<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut dyn Write, &ChainView<'_>) -> ExecResult + 'static,
    {
        self.on_execute = Some(Rc::new(f));
        self
    }

    /// Attach an exit hook, run when control leaves this scope.
    pub fn on_exit<F: Fn() + 'static>(mut self, f: F) -> Self {
        self.on_exit = Some(Rc::new(f));
        self
    }

    /// Override the label shown in the prompt path.
    pub fn prompt_display<F: Fn() -> String + 'static>(mut self, f: F) -> Self {
        self.prompt_display = Some(Rc::new(f));
        self
    }

    /// Install a line-shape validator.
    pub fn validate_with<F: Fn(&[String]) -> Validation + 'static>(mut self, f: F) -> Self {
        self.validator = Some(Rc::new(f));
        self
    }
}

/// Errors from [`CommandArena::insert`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertError {
    /// Command names are matched verbatim and must be non-empty.
    EmptyName,
    /// The parent already has a child with this name.
    DuplicateName {
        /// The offending name.
        name: String,
        /// The parent's name.
        parent: String,
    },
}

impl fmt::Display for InsertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsertError::EmptyName => write!(f, "command name must be non-empty"),
            InsertError::DuplicateName { name, parent } => {
                write!(f, "'{parent}' already has a command named '{name}'")
            }
        }
    }
}

impl std::error::Error for InsertError {}

/// A callback failure tagged with the command that raised it.
#[derive(Debug)]
pub struct CommandError {
    /// The failing command.
    pub command: CommandId,
    /// What it reported.
    pub source: Box<dyn std::error::Error>,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

impl std::error::Error for CommandError {}

/// The ancestor chain handed to execute callbacks, eldest first, the
/// executing command last.
pub struct ChainView<'a> {
    arena: &'a CommandArena,
    chain: &'a [CommandId],
}

impl ChainView<'_> {
    /// The full chain of handles.
    pub fn chain(&self) -> &[CommandId] {
        self.chain
    }

    /// The executing command.
    ///
    /// # Panics
    ///
    /// Panics on an empty chain, which the arena never constructs.
    pub fn command(&self) -> CommandId {
        *self.chain.last().unwrap_or_else(|| unreachable!("chain is never empty"))
    }

    /// The arena, for name/description lookups.
    pub fn arena(&self) -> &CommandArena {
        self.arena
    }

    /// The executing command's parameters.
    pub fn args(&self) -> &ParamList {
        self.arena.params(self.command())
    }

    /// Most recent bound value of type `T` anywhere in the chain,
    /// youngest command first, skipping the first `skip` matches.
    pub fn previous<T: FromValue>(&self, skip: usize) -> Option<T> {
        let mut skip = skip;
        for &id in self.chain.iter().rev() {
            let params = self.arena.params(id);
            for i in (0..params.len()).rev() {
                let Some(value) = params.get(i).and_then(|p| p.value()) else {
                    continue;
                };
                if let Some(v) = T::from_value(value) {
                    if skip == 0 {
                        return Some(v);
                    }
                    skip -= 1;
                }
            }
        }
        None
    }
}

struct CommandNode {
    name: String,
    description: String,
    params: ParamList,
    on_execute: Option<ExecFn>,
    on_exit: Option<ExitFn>,
    prompt_display: Option<PromptFn>,
    validator: Option<ValidateFn>,
    parent: Option<CommandId>,
    children: Vec<CommandId>,
}

/// Arena owning every command node of a shell.
#[derive(Default)]
pub struct CommandArena {
    nodes: Vec<CommandNode>,
}

impl CommandArena {
    /// An empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parentless node: a root menu or a global scope.
    pub fn add_root(&mut self, name: impl Into<String>, description: impl Into<String>) -> CommandId {
        let id = CommandId(self.nodes.len());
        self.nodes.push(CommandNode {
            name: name.into(),
            description: description.into(),
            params: ParamList::empty(),
            on_execute: None,
            on_exit: None,
            prompt_display: None,
            validator: None,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    /// Insert a command under `parent`.
    pub fn insert(&mut self, parent: CommandId, command: Command) -> Result<CommandId, InsertError> {
        if command.name.is_empty() {
            return Err(InsertError::EmptyName);
        }
        if self.find_child(parent, &command.name).is_some() {
            return Err(InsertError::DuplicateName {
                name: command.name,
                parent: self.nodes[parent.0].name.clone(),
            });
        }

        let id = CommandId(self.nodes.len());
        self.nodes.push(CommandNode {
            name: command.name,
            description: command.description,
            params: command.params,
            on_execute: command.on_execute,
            on_exit: command.on_exit,
            prompt_display: command.prompt_display,
            validator: command.validator,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    // --- Accessors -------------------------------------------------------

    /// Node name.
    pub fn name(&self, id: CommandId) -> &str {
        &self.nodes[id.0].name
    }

    /// Node description.
    pub fn description(&self, id: CommandId) -> &str {
        &self.nodes[id.0].description
    }

    /// Parent handle.
    pub fn parent(&self, id: CommandId) -> Option<CommandId> {
        self.nodes[id.0].parent
    }

    /// Child handles in insertion order.
    pub fn children(&self, id: CommandId) -> &[CommandId] {
        &self.nodes[id.0].children
    }

    /// Whether the node is a scope.
    pub fn has_children(&self, id: CommandId) -> bool {
        !self.nodes[id.0].children.is_empty()
    }

    /// The node's parameters.
    pub fn params(&self, id: CommandId) -> &ParamList {
        &self.nodes[id.0].params
    }

    /// Whether the node is a free command (one string parameter).
    pub fn is_free(&self, id: CommandId) -> bool {
        self.nodes[id.0].params.is_free()
    }

    /// Name plus parameter count: the tokens a full match consumes.
    pub fn total_tokens(&self, id: CommandId) -> usize {
        1 + self.nodes[id.0].params.len()
    }

    /// The label shown in the prompt path.
    pub fn prompt_display(&self, id: CommandId) -> String {
        match &self.nodes[id.0].prompt_display {
            Some(f) => f(),
            None => self.nodes[id.0].name.clone(),
        }
    }

    /// Child with this exact name.
    pub fn find_child(&self, id: CommandId, name: &str) -> Option<CommandId> {
        self.nodes[id.0]
            .children
            .iter()
            .copied()
            .find(|&c| self.nodes[c.0].name == name)
    }

    /// Every node from the root down to `id`, inclusive.
    pub fn ancestors(&self, id: CommandId) -> Vec<CommandId> {
        let mut chain = vec![id];
        let mut cur = id;
        while let Some(parent) = self.nodes[cur.0].parent {
            chain.push(parent);
            cur = parent;
        }
        chain.reverse();
        chain
    }

    /// `name(type param, type param)`.
    pub fn signature(&self, id: CommandId) -> String {
        let node = &self.nodes[id.0];
        let params: Vec<String> = node.params.iter().map(|p| p.to_string()).collect();
        format!("{}({})", node.name, params.join(", "))
    }

    /// ` - name` and an indented description.
    pub fn help(&self, id: CommandId, out: &mut dyn Write) -> std::io::Result<()> {
        let node = &self.nodes[id.0];
        writeln!(out, " - {}\n\t{}", node.name, node.description)
    }

    /// Help for every child, in order.
    pub fn main_help(&self, id: CommandId, out: &mut dyn Write) -> std::io::Result<()> {
        for &child in &self.nodes[id.0].children {
            self.help(child, out)?;
        }
        Ok(())
    }

    /// Run the node's exit hook, if any.
    pub fn cleanup(&self, id: CommandId) {
        if let Some(f) = &self.nodes[id.0].on_exit {
            f();
        }
    }

    /// Line-shape gating; plain menus always match.
    pub fn validate(&self, id: CommandId, line: &[String]) -> Validation {
        match &self.nodes[id.0].validator {
            Some(f) => f(line),
            None => Validation::Match,
        }
    }

    /// Children whose names start with `token` (all of them when empty).
    pub fn all_children_completions(&self, id: CommandId, token: &str) -> Vec<Completion> {
        self.nodes[id.0]
            .children
            .iter()
            .filter(|&&c| token.is_empty() || self.nodes[c.0].name.starts_with(token))
            .map(|&c| Completion::new(self.nodes[c.0].name.clone(), self.nodes[c.0].description.clone()))
            .collect()
    }

    /// Seed `ctx` with every ancestor's stored parameter values, eldest
    /// scope first.
    pub fn seed_context(&self, ctx: &mut ParamContext<'_>, id: CommandId) {
        for ancestor in self.ancestors(id) {
            self.nodes[ancestor.0].params.add_to_context(ctx);
        }
    }

    // --- Scan ------------------------------------------------------------

    /// Match `tokens[index]` against this node's name and prepare its
    /// parameters from the following tokens.
    ///
    /// Failed parameters are reported on the context's sink with the
    /// command signature; the consumed count always includes the name.
    pub fn prepare(
        &mut self,
        ctx: &mut ParamContext<'_>,
        id: CommandId,
        tokens: &[String],
        index: usize,
    ) -> PrepareResult {
        if tokens.is_empty() || index >= tokens.len() || tokens[index] != self.nodes[id.0].name {
            return PrepareResult {
                outcome: ScanOutcome::NoneFound,
                tokens_consumed: 0,
            };
        }

        match self.validate(id, tokens) {
            Validation::Match => {}
            Validation::NoMatch => {
                return PrepareResult {
                    outcome: ScanOutcome::NoneFound,
                    tokens_consumed: 0,
                };
            }
            Validation::Invalid => {
                return PrepareResult {
                    outcome: ScanOutcome::BadOrMissingParams,
                    tokens_consumed: 1,
                };
            }
        }

        let outcome = self.nodes[id.0].params.prepare(ctx, tokens, index + 1);
        if !outcome.failed_indices.is_empty() {
            let _ = writeln!(ctx.out, "Error: Bad param(s) for {}", self.signature(id));
            for &i in &outcome.failed_indices {
                let param_index = i - (index + 1);
                if let Some(param) = self.nodes[id.0].params.get(param_index) {
                    let _ = writeln!(ctx.out, "  {}:   '{}'", param.name(), tokens[i]);
                }
            }
        }

        let consumed = outcome.prepared + 1;
        let scan = if consumed == self.total_tokens(id) && outcome.failed_indices.is_empty() {
            ScanOutcome::Found
        } else {
            ScanOutcome::BadOrMissingParams
        };
        PrepareResult {
            outcome: scan,
            tokens_consumed: consumed,
        }
    }

    /// Depth-first scan: at each level pick the first child that fully
    /// prepares and descend; a partially matching child stops the scan.
    ///
    /// `result.action` is left as the raw outcome of the last prepare
    /// attempt; [`finish_action`](Self::finish_action) derives the final
    /// four-state action.
    pub fn scan_raw(
        &mut self,
        ctx: &mut ParamContext<'_>,
        start: CommandId,
        tokens: &[String],
        result: &mut ExecutionResult,
    ) {
        if result.tokens_consumed >= tokens.len() {
            return;
        }

        let children = self.nodes[start.0].children.clone();
        for child in children {
            let prepared = self.prepare(ctx, child, tokens, result.tokens_consumed);
            result.tokens_consumed += prepared.tokens_consumed;
            result.action = prepared.outcome;
            match prepared.outcome {
                ScanOutcome::Found => {
                    result.scanned.push(child);
                    self.scan_raw(ctx, child, tokens, result);
                    break;
                }
                ScanOutcome::BadOrMissingParams => {
                    result.partial = Some(child);
                    break;
                }
                _ => {}
            }
        }
    }

    /// Derive the final action from what the scan gathered.
    pub fn finish_action(&self, result: &mut ExecutionResult) {
        if result.scanned.is_empty() {
            result.action = ScanOutcome::NoneFound;
            return;
        }
        let max_tokens: usize = result.scanned.iter().map(|&id| self.total_tokens(id)).sum();
        result.action = if result.partial.is_some() {
            ScanOutcome::PartialCompletion
        } else if result.tokens_consumed == max_tokens {
            ScanOutcome::Found
        } else {
            ScanOutcome::BadOrMissingParams
        };
    }

    /// Run every scanned command's callback in discovery order, stopping
    /// at the first failure.
    pub fn execute_scanned(
        &self,
        out: &mut dyn Write,
        result: &ExecutionResult,
    ) -> Result<(), CommandError> {
        for &id in &result.scanned {
            let Some(exec) = self.nodes[id.0].on_execute.clone() else {
                continue;
            };
            let chain = self.ancestors(id);
            let view = ChainView { arena: self, chain: &chain };
            exec(out, &view).map_err(|source| CommandError { command: id, source })?;
        }
        Ok(())
    }

    /// Scan and execute `tokens` against `start` in one call.
    ///
    /// Returns the scan result plus any callback failure. Callbacks that
    /// need the registry capture their own handle; the `world` reference
    /// here is only read during the scan.
    pub fn execute_recursive(
        &mut self,
        out: &mut dyn Write,
        world: &Registry,
        start: CommandId,
        tokens: &[String],
    ) -> (ExecutionResult, Result<(), CommandError>) {
        let mut result = ExecutionResult::default();
        {
            let mut ctx = ParamContext::new(&mut *out, world);
            self.seed_context(&mut ctx, start);
            self.scan_raw(&mut ctx, start, tokens, &mut result);
        }
        self.finish_action(&mut result);
        let exec = self.execute_scanned(out, &result);
        (result, exec)
    }

    /// Completions for this node: at `k = 0` its children filtered by
    /// prefix, past that its parameter list.
    pub fn auto_complete_impl(
        &self,
        ctx: &ParamContext<'_>,
        id: CommandId,
        param_tokens: &[String],
        k: usize,
    ) -> Vec<Completion> {
        if k >= self.total_tokens(id) {
            return Vec::new();
        }
        if k == 0 {
            let token = param_tokens.first().map(String::as_str).unwrap_or("");
            return self.all_children_completions(id, token);
        }
        if param_tokens.len() <= 1 {
            return Vec::new();
        }
        self.nodes[id.0].params.auto_complete(ctx, &param_tokens[1..], k - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::Param;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn strs(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|s| s.to_string()).collect()
    }

    /// root -> alpha -> beta(int), recording execution order.
    fn nested_tree() -> (CommandArena, CommandId, Rc<RefCell<Vec<String>>>) {
        let mut arena = CommandArena::new();
        let root = arena.add_root("root", "");
        let log = Rc::new(RefCell::new(Vec::new()));

        let l = Rc::clone(&log);
        let alpha = arena
            .insert(
                root,
                Command::new("alpha", "Alpha scope")
                    .execute(move |_, _| {
                        l.borrow_mut().push("alpha".to_string());
                        Ok(())
                    })
                    .on_exit({
                        let l = Rc::clone(&log);
                        move || l.borrow_mut().push("exit-alpha".to_string())
                    }),
            )
            .unwrap();

        let l = Rc::clone(&log);
        arena
            .insert(
                alpha,
                Command::new("beta", "Beta command")
                    .params(vec![Param::int("count")])
                    .execute(move |out, view| {
                        let count: i64 = view.args().arg(0, out);
                        l.borrow_mut().push(format!("beta {count}"));
                        Ok(())
                    })
                    .on_exit({
                        let l = Rc::clone(&log);
                        move || l.borrow_mut().push("exit-beta".to_string())
                    }),
            )
            .unwrap();

        (arena, root, log)
    }

    #[test]
    fn insert_rejects_duplicates_and_empty_names() {
        let mut arena = CommandArena::new();
        let root = arena.add_root("root", "");
        arena.insert(root, Command::new("fire", "")).unwrap();
        let err = arena.insert(root, Command::new("fire", "")).unwrap_err();
        assert!(matches!(err, InsertError::DuplicateName { .. }));
        let err = arena.insert(root, Command::new("", "")).unwrap_err();
        assert_eq!(err, InsertError::EmptyName);
    }

    #[test]
    fn ancestors_run_root_to_leaf() {
        let (arena, root, _) = nested_tree();
        let alpha = arena.find_child(root, "alpha").unwrap();
        let beta = arena.find_child(alpha, "beta").unwrap();
        assert_eq!(arena.ancestors(beta), vec![root, alpha, beta]);
    }

    #[test]
    fn nested_scan_executes_in_discovery_order() {
        let (mut arena, root, log) = nested_tree();
        let world = Registry::new();
        let mut out = Vec::new();

        let (result, exec) =
            arena.execute_recursive(&mut out, &world, root, &strs(&["alpha", "beta", "3"]));
        assert!(exec.is_ok());
        assert_eq!(result.action, ScanOutcome::Found);
        assert_eq!(result.scanned.len(), 2);
        assert_eq!(result.tokens_consumed, 3);
        assert_eq!(*log.borrow(), vec!["alpha".to_string(), "beta 3".to_string()]);
    }

    #[test]
    fn partial_scan_reports_the_failing_command() {
        let (mut arena, root, log) = nested_tree();
        let world = Registry::new();
        let mut out = Vec::new();

        let (result, exec) =
            arena.execute_recursive(&mut out, &world, root, &strs(&["alpha", "beta", "notAnInt"]));
        assert!(exec.is_ok());
        assert_eq!(result.action, ScanOutcome::PartialCompletion);
        let alpha = arena.find_child(root, "alpha").unwrap();
        let beta = arena.find_child(alpha, "beta").unwrap();
        assert_eq!(result.partial, Some(beta));
        // Alpha still executed; beta did not.
        assert_eq!(*log.borrow(), vec!["alpha".to_string()]);
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Bad param(s) for beta(int count)"), "got {text}");
        assert!(text.contains("notAnInt"));
    }

    #[test]
    fn unknown_first_token_scans_nothing() {
        let (mut arena, root, log) = nested_tree();
        let world = Registry::new();
        let mut out = Vec::new();

        let (result, _) = arena.execute_recursive(&mut out, &world, root, &strs(&["gamma"]));
        assert_eq!(result.action, ScanOutcome::NoneFound);
        assert!(result.scanned.is_empty());
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn trailing_tokens_still_yield_found() {
        let (mut arena, root, _) = nested_tree();
        let world = Registry::new();
        let mut out = Vec::new();

        let (result, _) =
            arena.execute_recursive(&mut out, &world, root, &strs(&["alpha", "beta", "3", "junk"]));
        // The scan itself is complete; the session reports the leftovers.
        assert_eq!(result.action, ScanOutcome::Found);
        assert_eq!(result.tokens_consumed, 3);
    }

    #[test]
    fn callback_errors_stop_execution() {
        let mut arena = CommandArena::new();
        let root = arena.add_root("root", "");
        arena
            .insert(
                root,
                Command::new("boom", "").execute(|_, _| Err("reactor overload".into())),
            )
            .unwrap();

        let world = Registry::new();
        let mut out = Vec::new();
        let (_, exec) = arena.execute_recursive(&mut out, &world, root, &strs(&["boom"]));
        let err = exec.unwrap_err();
        assert_eq!(err.to_string(), "reactor overload");
    }

    #[test]
    fn chain_view_sees_ancestor_values() {
        let mut arena = CommandArena::new();
        let root = arena.add_root("root", "");
        let seen = Rc::new(RefCell::new(None));

        let outer = arena
            .insert(
                root,
                Command::new("outer", "").params(vec![Param::int("base")]),
            )
            .unwrap();
        let s = Rc::clone(&seen);
        arena
            .insert(
                outer,
                Command::new("inner", "").execute(move |_, view| {
                    *s.borrow_mut() = view.previous::<i64>(0);
                    Ok(())
                }),
            )
            .unwrap();

        let world = Registry::new();
        let mut out = Vec::new();
        let (result, exec) =
            arena.execute_recursive(&mut out, &world, root, &strs(&["outer", "7", "inner"]));
        assert!(exec.is_ok());
        assert_eq!(result.action, ScanOutcome::Found);
        assert_eq!(*seen.borrow(), Some(7));
    }

    #[test]
    fn auto_complete_at_zero_filters_children() {
        let mut arena = CommandArena::new();
        let root = arena.add_root("root", "");
        arena.insert(root, Command::new("cat", "c1")).unwrap();
        arena.insert(root, Command::new("car", "c2")).unwrap();
        arena.insert(root, Command::new("dog", "d")).unwrap();

        let world = Registry::new();
        let mut out = Vec::new();
        let ctx = ParamContext::new(&mut out, &world);
        let comps = arena.auto_complete_impl(&ctx, root, &strs(&["ca"]), 0);
        assert_eq!(comps.len(), 2);
        assert_eq!(comps[0].text, "cat");
        assert_eq!(comps[1].text, "car");
    }

    #[test]
    fn auto_complete_past_params_delegates_to_list() {
        let mut arena = CommandArena::new();
        let root = arena.add_root("root", "");
        arena
            .insert(
                root,
                Command::new("set", "").params(vec![Param::choice("mode", &[("auto", ""), ("manual", "")])]),
            )
            .unwrap();
        let set = arena.find_child(root, "set").unwrap();

        let world = Registry::new();
        let mut out = Vec::new();
        let ctx = ParamContext::new(&mut out, &world);
        let comps = arena.auto_complete_impl(&ctx, set, &strs(&["set", "m"]), 1);
        assert_eq!(comps.len(), 1);
        assert_eq!(comps[0].text, "manual");

        // Beyond the parameter list: nothing.
        assert!(arena.auto_complete_impl(&ctx, set, &strs(&["set", "auto", ""]), 2).is_empty());
    }

    #[test]
    fn validator_can_reject_or_disown_a_line() {
        let mut arena = CommandArena::new();
        let root = arena.add_root("root", "");
        arena
            .insert(
                root,
                Command::new("guarded", "").validate_with(|line| {
                    if line.len() > 1 {
                        Validation::Invalid
                    } else {
                        Validation::Match
                    }
                }),
            )
            .unwrap();

        let world = Registry::new();
        let mut out = Vec::new();
        let (result, _) = arena.execute_recursive(&mut out, &world, root, &strs(&["guarded"]));
        assert_eq!(result.action, ScanOutcome::Found);

        let mut out = Vec::new();
        let (result, _) =
            arena.execute_recursive(&mut out, &world, root, &strs(&["guarded", "extra"]));
        // Nothing fully scanned: the refusal surfaces as NoneFound with the
        // refusing command recorded as the partial.
        assert_eq!(result.action, ScanOutcome::NoneFound);
        let guarded = arena.find_child(root, "guarded").unwrap();
        assert_eq!(result.partial, Some(guarded));
    }

    #[test]
    fn signature_renders_types_and_names() {
        let (arena, root, _) = nested_tree();
        let alpha = arena.find_child(root, "alpha").unwrap();
        let beta = arena.find_child(alpha, "beta").unwrap();
        assert_eq!(arena.signature(beta), "beta(int count)");
        assert_eq!(arena.signature(alpha), "alpha()");
    }

    #[test]
    fn free_command_swallows_the_rest() {
        let mut arena = CommandArena::new();
        let root = arena.add_root("root", "");
        let heard = Rc::new(RefCell::new(String::new()));
        let h = Rc::clone(&heard);
        arena
            .insert(
                root,
                Command::new("say", "")
                    .params(vec![Param::string("text")])
                    .execute(move |out, view| {
                        *h.borrow_mut() = view.args().arg::<String>(0, out);
                        Ok(())
                    }),
            )
            .unwrap();

        let world = Registry::new();
        let mut out = Vec::new();
        let (result, exec) =
            arena.execute_recursive(&mut out, &world, root, &strs(&["say", "hello", "big", "world"]));
        assert!(exec.is_ok());
        assert_eq!(result.action, ScanOutcome::Found);
        assert_eq!(*heard.borrow(), "hello big world");
    }
}
