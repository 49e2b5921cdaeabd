#![forbid(unsafe_code)]

//! The interactive shell session.
//!
//! A [`Session`] owns a [`Cli`] (the command tree, history storage, and
//! hooks), a current-menu pointer into it, the history ring, and the
//! completion-rotation state. [`Session::feed`] is the whole pipeline:
//! tokenise, scan current scope then root then globals, execute, report,
//! and apply the scope transition.

use std::io::{self, Write};
use std::rc::Rc;

use deck_editor::Completion;
use deck_style::{RESET, palette};
use deck_world::Registry;
use std::cell::RefCell;

use crate::command::{
    Command, CommandArena, CommandError, CommandId, ExecutionResult, InsertError, ScanOutcome,
};
use crate::context::ParamContext;
use crate::history::{History, HistoryStorage};
use crate::stream::{Fanout, NullSink, SharedSink, shared_sink};

/// Per-feed flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeedOptions {
    /// Keep the line out of the history ring.
    pub dont_save: bool,
    /// Echo the line before executing it.
    pub print_cmd: bool,
    /// Silence the session's sink for the duration of this feed.
    pub silent_output: bool,
}

/// Session construction knobs.
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    /// Capacity of the history ring.
    pub history_size: usize,
    /// Register the optional global `history` command.
    pub history_command: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            history_size: 100,
            history_command: false,
        }
    }
}

type ExitAction = Box<dyn FnMut(&mut dyn Write)>;
type ErrorHandler = Box<dyn FnMut(&mut dyn Write, &str, &dyn std::error::Error)>;

/// Owner of the command tree and the cross-session collaborators.
pub struct Cli {
    arena: CommandArena,
    root: CommandId,
    world: Rc<RefCell<Registry>>,
    history_storage: Box<dyn HistoryStorage>,
    exit_action: Option<ExitAction>,
    error_handler: Option<ErrorHandler>,
    cout: Fanout,
}

impl Cli {
    /// Build a shell around a root menu named `root_name`.
    pub fn new(
        root_name: impl Into<String>,
        world: Rc<RefCell<Registry>>,
        history_storage: Box<dyn HistoryStorage>,
    ) -> Self {
        let mut arena = CommandArena::new();
        let root = arena.add_root(root_name, "");
        Self {
            arena,
            root,
            world,
            history_storage,
            exit_action: None,
            error_handler: None,
            cout: Fanout::new(),
        }
    }

    /// The root menu handle.
    pub fn root(&self) -> CommandId {
        self.root
    }

    /// The command tree.
    pub fn arena(&self) -> &CommandArena {
        &self.arena
    }

    /// The command tree, mutably (registration, scanning).
    pub fn arena_mut(&mut self) -> &mut CommandArena {
        &mut self.arena
    }

    /// Register a command under `parent`.
    pub fn insert(&mut self, parent: CommandId, command: Command) -> Result<CommandId, InsertError> {
        self.arena.insert(parent, command)
    }

    /// Handle to the registry.
    pub fn world(&self) -> Rc<RefCell<Registry>> {
        Rc::clone(&self.world)
    }

    /// The global fan-out stream writing to every connected console.
    pub fn cout(&self) -> Fanout {
        self.cout.clone()
    }

    /// Hook run when a session exits its last scope.
    pub fn on_exit<F: FnMut(&mut dyn Write) + 'static>(&mut self, f: F) {
        self.exit_action = Some(Box::new(f));
    }

    /// Handler for errors raised by command callbacks. Without one, the
    /// error's display is printed as a single line.
    pub fn on_error<F>(&mut self, f: F)
    where
        F: FnMut(&mut dyn Write, &str, &dyn std::error::Error) + 'static,
    {
        self.error_handler = Some(Box::new(f));
    }

    fn run_exit_action(&mut self, out: &mut dyn Write) {
        if let Some(f) = self.exit_action.as_mut() {
            f(out);
        }
    }

    fn handle_error(&mut self, out: &mut dyn Write, line: &str, err: &CommandError) -> io::Result<()> {
        match self.error_handler.as_mut() {
            Some(handler) => {
                handler(out, line, err.source.as_ref());
                Ok(())
            }
            None => writeln!(out, "{err}"),
        }
    }

    fn store_history(&mut self, commands: &[String]) {
        if let Err(e) = self.history_storage.store(commands) {
            tracing::warn!(error = %e, "failed to persist command history");
        }
    }
}

/// One interactive session over a [`Cli`].
pub struct Session {
    cli: Cli,
    current: CommandId,
    top: Option<CommandId>,
    global: CommandId,
    exit_id: CommandId,
    help_id: CommandId,
    history_id: Option<CommandId>,
    previous_completions: Vec<Completion>,
    rotation_index: usize,
    history: History,
    sink: SharedSink,
    null: SharedSink,
    observer_id: usize,
    silent: bool,
    exited: bool,
    prompt_size: usize,
    exit_action: Option<ExitAction>,
}

impl Session {
    /// Attach a session to `cli`, writing to `sink`.
    ///
    /// The global scope (`help`, `exit`, optionally `history`) is created
    /// here, and the sink registers with the shell's fan-out stream.
    pub fn new(mut cli: Cli, sink: SharedSink, options: SessionOptions) -> Self {
        let global = cli.arena.add_root("", "");
        let help_id = cli
            .arena
            .insert(global, Command::new("help", "This help message"))
            .unwrap_or_else(|_| unreachable!("fresh global scope"));
        let exit_id = cli
            .arena
            .insert(global, Command::new("exit", "Quit the session"))
            .unwrap_or_else(|_| unreachable!("fresh global scope"));
        let history_id = options.history_command.then(|| {
            cli.arena
                .insert(global, Command::new("history", "Show the history"))
                .unwrap_or_else(|_| unreachable!("fresh global scope"))
        });

        let mut history = History::new(options.history_size);
        history.load_commands(cli.history_storage.commands());

        let observer_id = cli.cout.register(Rc::clone(&sink));
        let current = cli.root;

        Self {
            cli,
            current,
            top: None,
            global,
            exit_id,
            help_id,
            history_id,
            previous_completions: Vec::new(),
            rotation_index: 0,
            history,
            sink,
            null: shared_sink(NullSink),
            observer_id,
            silent: false,
            exited: false,
            prompt_size: 0,
            exit_action: None,
        }
    }

    /// The owning shell.
    pub fn cli(&self) -> &Cli {
        &self.cli
    }

    /// The owning shell, mutably (for registering commands).
    pub fn cli_mut(&mut self) -> &mut Cli {
        &mut self.cli
    }

    /// The active scope.
    pub fn current(&self) -> CommandId {
        self.current
    }

    /// Name of the active scope.
    pub fn current_name(&self) -> String {
        self.cli.arena.name(self.current).to_string()
    }

    /// Whether the session has ended.
    pub fn exited(&self) -> bool {
        self.exited
    }

    /// Displayed-cell width of the last emitted prompt suffix.
    pub fn prompt_size(&self) -> usize {
        self.prompt_size
    }

    /// Silence or restore all session output.
    pub fn set_silent(&mut self, silent: bool) {
        self.silent = silent;
    }

    /// Hook run when this session exits its last scope.
    pub fn on_exit<F: FnMut(&mut dyn Write) + 'static>(&mut self, f: F) {
        self.exit_action = Some(Box::new(f));
    }

    fn out_handle(&self) -> SharedSink {
        if self.silent {
            Rc::clone(&self.null)
        } else {
            Rc::clone(&self.sink)
        }
    }

    /// Run one command line through the shell.
    ///
    /// Returns true iff the scan resolved completely and every callback
    /// succeeded.
    pub fn feed(&mut self, line: &str, options: FeedOptions) -> bool {
        let was_silent = self.silent;
        if options.silent_output {
            self.silent = true;
        }
        let outcome = self.feed_inner(line, options);
        self.silent = was_silent;
        match outcome {
            Ok(found) => found,
            Err(e) => {
                tracing::error!(error = %e, "i/o failure while feeding command line");
                false
            }
        }
    }

    fn feed_inner(&mut self, line: &str, options: FeedOptions) -> io::Result<bool> {
        let sink = self.out_handle();
        let mut guard = sink.borrow_mut();

        if options.print_cmd {
            writeln!(guard, "{line}")?;
        }

        let tokens: Vec<String> = line.split_whitespace().map(str::to_owned).collect();
        if tokens.is_empty() {
            return Ok(false);
        }

        if !options.dont_save {
            self.history.push(line);
        }

        let before = self.current;
        let world_rc = self.cli.world();
        let result = {
            let world = world_rc.borrow();
            let mut result = self.scan_scope(&mut *guard, &world, self.current, &tokens);
            if matches!(result.action, ScanOutcome::NoneFound) {
                result = self.scan_scope(&mut *guard, &world, self.cli.root, &tokens);
            }
            if matches!(result.action, ScanOutcome::NoneFound) {
                result = self.scan_scope(&mut *guard, &world, self.global, &tokens);
            }
            result
        };
        tracing::debug!(line, action = ?result.action, scanned = result.scanned.len(), "feed");

        if let Err(err) = self.cli.arena.execute_scanned(&mut *guard, &result) {
            self.cli.handle_error(&mut *guard, line, &err)?;
            return Ok(false);
        }

        match result.action {
            ScanOutcome::Found => {
                self.apply_found(&mut *guard, &result, before, &tokens)?;
                Ok(true)
            }
            ScanOutcome::NoneFound => {
                writeln!(
                    guard,
                    "{}{}{}",
                    deck_style::error("Command '"),
                    deck_style::command(&tokens[0]),
                    deck_style::error("' not found.")
                )?;
                Ok(false)
            }
            _ => {
                writeln!(guard, "Bad parameters, cannot execute commands.")?;
                let help_target = result.partial.or_else(|| result.scanned.last().copied());
                if let Some(id) = help_target {
                    self.cli.arena.help(id, &mut *guard)?;
                }
                Ok(false)
            }
        }
    }

    /// Scope transition and trailing-token diagnostics after a full match.
    fn apply_found(
        &mut self,
        out: &mut dyn Write,
        result: &ExecutionResult,
        before: CommandId,
        tokens: &[String],
    ) -> io::Result<()> {
        let Some(&last) = result.scanned.last() else {
            return Ok(());
        };

        // Global built-ins dispatch inside the session.
        if last == self.exit_id {
            self.do_exit(out)?;
        } else if last == self.help_id {
            self.print_help(out)?;
        } else if Some(last) == self.history_id {
            self.history.show(out)?;
        }

        if last != self.exit_id {
            if self.cli.arena.has_children(last) {
                // Entering a submenu.
                self.current = last;
            } else {
                // Leaf command: unwind to the pre-feed scope, running exit
                // hooks child to parent, stopping at (not past) it.
                for &id in result.scanned.iter().rev() {
                    if id == before {
                        break;
                    }
                    self.cli.arena.cleanup(id);
                }
                self.current = before;
            }
        }

        let mut ended_in_free = false;
        let mut used_tokens = 0usize;
        for &id in &result.scanned {
            if self.cli.arena.is_free(id) {
                ended_in_free = true;
                break;
            }
            used_tokens += self.cli.arena.total_tokens(id);
        }
        if !ended_in_free && tokens.len() > used_tokens {
            writeln!(
                out,
                "{}  Discarding remainder of command line: '{}'.",
                deck_style::error(&format!("Couldn't find command '{}'.", tokens[used_tokens])),
                tokens[used_tokens..].join(" ")
            )?;
        }
        Ok(())
    }

    fn scan_scope(
        &mut self,
        out: &mut dyn Write,
        world: &Registry,
        scope: CommandId,
        tokens: &[String],
    ) -> ExecutionResult {
        let mut result = ExecutionResult::default();
        {
            let mut ctx = ParamContext::new(&mut *out, world);
            self.cli.arena.seed_context(&mut ctx, scope);
            self.cli.arena.scan_raw(&mut ctx, scope, tokens, &mut result);
        }
        self.cli.arena.finish_action(&mut result);
        result
    }

    /// Pop one scope; at the root, end the session.
    pub fn exit(&mut self) {
        let sink = self.out_handle();
        let mut guard = sink.borrow_mut();
        if let Err(e) = self.do_exit(&mut *guard) {
            tracing::error!(error = %e, "exit hook output failed");
        }
    }

    fn do_exit(&mut self, out: &mut dyn Write) -> io::Result<()> {
        self.cli.arena.cleanup(self.current);
        match self.cli.arena.parent(self.current) {
            Some(parent) => {
                self.current = parent;
            }
            None => {
                if let Some(f) = self.exit_action.as_mut() {
                    f(out);
                }
                self.cli.run_exit_action(out);
                let commands = self.history.commands();
                self.cli.store_history(&commands);
                self.exited = true;
            }
        }
        Ok(())
    }

    /// Save the current scope for a later [`Session::pop`].
    pub fn push_top(&mut self) {
        self.top = Some(self.current);
    }

    /// Unwind to the scope saved by [`Session::push_top`], running exit
    /// hooks on the way.
    pub fn pop(&mut self) {
        let Some(top) = self.top else {
            return;
        };
        let mut cursor = Some(self.current);
        while let Some(id) = cursor {
            if id == top {
                break;
            }
            self.cli.arena.cleanup(id);
            cursor = self.cli.arena.parent(id);
        }
        self.current = top;
        self.top = None;
    }

    /// Emit the prompt and record its suffix width.
    ///
    /// The path row joins every ancestor's prompt label behind `>`; the
    /// suffix `  \-> ` is six displayed cells.
    pub fn prompt(&mut self) -> usize {
        match self.prompt_impl() {
            Ok(size) => {
                self.prompt_size = size;
                size
            }
            Err(e) => {
                tracing::error!(error = %e, "prompt emission failed");
                0
            }
        }
    }

    fn prompt_impl(&mut self) -> io::Result<usize> {
        if self.exited {
            return Ok(0);
        }
        const SUFFIX: &str = "  \\-> ";
        const SUFFIX_CELLS: usize = 6;

        let mut path = String::new();
        for id in self.cli.arena.ancestors(self.current) {
            path.push('>');
            path.push_str(&self.cli.arena.prompt_display(id));
        }

        let sink = self.out_handle();
        let mut guard = sink.borrow_mut();
        write!(
            guard,
            "{}{path}{}\n{}{SUFFIX}{}",
            palette::PROMPT.fg(),
            RESET,
            palette::PROMPT_SUFFIX.fg(),
            RESET
        )?;
        guard.flush()?;
        Ok(SUFFIX_CELLS)
    }

    /// Print the global commands followed by the current scope's.
    pub fn help(&self) {
        let sink = self.out_handle();
        let mut guard = sink.borrow_mut();
        if let Err(e) = self.print_help(&mut *guard) {
            tracing::error!(error = %e, "help output failed");
        }
    }

    fn print_help(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "Commands available:")?;
        self.cli.arena.main_help(self.global, out)?;
        self.cli.arena.main_help(self.current, out)
    }

    /// Print the history ring.
    pub fn show_history(&self) {
        let sink = self.out_handle();
        let mut guard = sink.borrow_mut();
        if let Err(e) = self.history.show(&mut *guard) {
            tracing::error!(error = %e, "history output failed");
        }
    }

    /// History traversal: previous entry (Up).
    pub fn previous_cmd(&mut self, line: &str) -> String {
        self.history.previous(line)
    }

    /// History traversal: next entry (Down).
    pub fn next_cmd(&mut self) -> String {
        self.history.next()
    }

    /// Completion lookup with Tab-cycling.
    ///
    /// Tries the current scope, then the root menu, then the globals, and
    /// rotates the first non-empty list by the session's rotation index,
    /// which post-increments modulo the list size. The index resets
    /// whenever the list's content changes.
    pub fn get_completions(&mut self, line: &str, param: usize) -> Vec<Completion> {
        let sink = self.out_handle();
        let mut guard = sink.borrow_mut();
        let world_rc = self.cli.world();
        let world = world_rc.borrow();

        let mut completions = self.completions_for(&mut *guard, &world, self.current, line, param);
        if completions.is_empty() {
            completions = self.completions_for(&mut *guard, &world, self.cli.root, line, param);
        }
        if completions.is_empty() {
            completions = self.completions_for(&mut *guard, &world, self.global, line, param);
        }
        if completions.is_empty() {
            self.previous_completions.clear();
            return completions;
        }

        if completions != self.previous_completions {
            self.rotation_index = 0;
            self.previous_completions = completions.clone();
        }
        let index = self.rotation_index;
        self.rotation_index = (self.rotation_index + 1) % completions.len();
        completions.rotate_left(index);
        tracing::debug!(line, param, count = completions.len(), index, "completions");
        completions
    }

    /// Forget the rotation position.
    pub fn reset_completions(&mut self) {
        self.rotation_index = 0;
    }

    fn completions_for(
        &mut self,
        out: &mut dyn Write,
        world: &Registry,
        scope: CommandId,
        line: &str,
        param: usize,
    ) -> Vec<Completion> {
        let tokens: Vec<String> = line.split_whitespace().map(str::to_owned).collect();
        if tokens.is_empty() {
            return self.cli.arena.all_children_completions(scope, "");
        }

        let mut ctx = ParamContext::new(out, world);
        self.cli.arena.seed_context(&mut ctx, scope);
        let mut result = ExecutionResult::default();
        self.cli.arena.scan_raw(&mut ctx, scope, &tokens, &mut result);

        if matches!(result.action, ScanOutcome::Found) {
            // Everything resolved; nothing left to complete.
            return Vec::new();
        }

        let target = result
            .partial
            .or_else(|| result.scanned.last().copied())
            .unwrap_or(scope);
        let consumed: usize = result
            .scanned
            .iter()
            .map(|&id| self.cli.arena.total_tokens(id))
            .sum();
        if param < consumed {
            return Vec::new();
        }
        let relative = param - consumed;
        let mut relative_tokens: Vec<String> = tokens[consumed.min(tokens.len())..].to_vec();
        if relative == relative_tokens.len() {
            relative_tokens.push(String::new());
        }
        self.cli
            .arena
            .auto_complete_impl(&ctx, target, &relative_tokens, relative)
    }

    /// Feed a canned sequence of lines, prompting before each, without
    /// recording them in history.
    pub fn run_program(&mut self, name: &str, program: &[String]) {
        {
            let sink = self.out_handle();
            let mut guard = sink.borrow_mut();
            let _ = writeln!(guard, "Executing program {name}...");
        }
        for line in program {
            self.prompt();
            self.feed(
                line,
                FeedOptions {
                    dont_save: true,
                    ..FeedOptions::default()
                },
            );
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.cli.cout.unregister(self.observer_id);
    }
}
