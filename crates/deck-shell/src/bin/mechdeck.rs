//! Interactive hangar console over the demo world.
//!
//! Wires the whole stack together: the registry-backed command tree, the
//! prompt-line editor on a raw tty, and a layered surface for the boot
//! banner. `RUST_LOG=deck_cli=debug` traces the feed pipeline.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;
use std::time::Duration;

use deck_cli::{
    Cli, Command, FileHistoryStorage, HistoryStorage, ObjectFilter, Param, Session,
    SessionOptions, VolatileHistoryStorage, shared_sink,
};
use deck_editor::LineEditor;
use deck_shell::input::{RawModeGuard, read_key};
use deck_shell::{Shell, ShellConfig, ShellEvent};
use deck_style::{ColorTable, format_color_runs, palette};
use deck_world::{Capabilities, ObjectId, Registry};

fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = ShellConfig::from_env();
    let (registry, _) = deck_world::fixtures::hangar();
    let world = Rc::new(RefCell::new(registry));

    let storage: Box<dyn HistoryStorage> = match &config.history_file {
        Some(path) => Box::new(FileHistoryStorage::new(path)),
        None => Box::new(VolatileHistoryStorage::new()),
    };

    let cli = build_cli(&config, Rc::clone(&world), storage);
    let session = Session::new(
        cli,
        shared_sink(std::io::stdout()),
        SessionOptions {
            history_size: config.history_size,
            history_command: config.history_command,
        },
    );
    let editor = LineEditor::new(std::io::stdout(), config.width);
    let mut shell = Shell::new(session, editor);

    println!("{}", boot_banner(config.width));
    let _raw = RawModeGuard::new()?;
    shell.start()?;
    loop {
        match shell.handle_key(read_key()?)? {
            ShellEvent::Exited | ShellEvent::Eof => break,
            _ => {}
        }
    }
    Ok(())
}

fn build_cli(
    config: &ShellConfig,
    world: Rc<RefCell<Registry>>,
    storage: Box<dyn HistoryStorage>,
) -> Cli {
    let mut cli = Cli::new("hangar", Rc::clone(&world), storage);
    let root = cli.root();
    let width = config.width;

    let w = Rc::clone(&world);
    cli.insert(
        root,
        Command::new("status", "Show the hangar inventory").execute(move |out, _| {
            print_status(out, &w.borrow(), width)?;
            Ok(())
        }),
    )
    .unwrap_or_else(|e| panic!("command registration: {e}"));

    // mech <id> opens a scope on a top-level aggregate.
    let mech_menu = cli
        .insert(
            root,
            Command::new("mech", "Operate on a mech")
                .params(vec![Param::object("mech", ObjectFilter::TopLevel)])
                .execute(|out, view| {
                    let id: ObjectId = view.args().arg(0, out);
                    writeln!(out, "Boarding mech {id}.")?;
                    Ok(())
                })
                .on_exit(|| tracing::debug!("left mech scope")),
        )
        .unwrap_or_else(|e| panic!("command registration: {e}"));

    // reactor <id> inside the mech scope; its line parameter resolves
    // against the reactor bound here.
    let w = Rc::clone(&world);
    let reactor_menu = cli
        .insert(
            mech_menu,
            Command::new("reactor", "Select a reactor")
                .params(vec![Param::object(
                    "reactor",
                    ObjectFilter::IsA(Capabilities::REACTOR),
                )])
                .execute(move |out, view| {
                    let id: ObjectId = view.args().arg(0, out);
                    if let Some(reactor) = w.borrow().get(id) {
                        writeln!(out, "Reactor {} with {} lines.", reactor.name, reactor.line_count())?;
                    }
                    Ok(())
                }),
        )
        .unwrap_or_else(|e| panic!("command registration: {e}"));

    let w = Rc::clone(&world);
    cli.insert(
        reactor_menu,
        Command::new("line", "Report one power line")
            .params(vec![Param::reactor_line("line")])
            .execute(move |out, view| {
                let line: usize = view.args().arg(0, out);
                let reactor_id: ObjectId = view
                    .previous(0)
                    .ok_or("no reactor in scope")?;
                let world = w.borrow();
                let reactor = world.get(reactor_id).ok_or("reactor vanished")?;
                writeln!(out, "Line {line}: {}V", reactor.lines[line].voltage)?;
                Ok(())
            }),
    )
    .unwrap_or_else(|e| panic!("command registration: {e}"));

    // bay <id> then mount <part> <slot>: the part filter consults the
    // bay bound in scope, the slot validates against its slot list.
    let bay_menu = cli
        .insert(
            mech_menu,
            Command::new("bay", "Open a module bay")
                .params(vec![Param::object(
                    "bay",
                    ObjectFilter::IsA(Capabilities::CONTROLLER),
                )])
                .execute(|out, view| {
                    let id: ObjectId = view.args().arg(0, out);
                    writeln!(out, "Bay {id} open.")?;
                    Ok(())
                }),
        )
        .unwrap_or_else(|e| panic!("command registration: {e}"));

    let w = Rc::clone(&world);
    cli.insert(
        bay_menu,
        Command::new("mount", "Mount a part into a slot")
            .params(vec![
                Param::object("part", ObjectFilter::MountableByBound),
                Param::slot("slot"),
            ])
            .execute(move |out, view| {
                let part: ObjectId = view.args().arg(0, out);
                let slot: usize = view.args().arg(1, out);
                let bay: ObjectId = view.previous(1).ok_or("no bay in scope")?;
                let mut world = w.borrow_mut();
                let slot_label = world
                    .get(bay)
                    .and_then(|b| b.slots.get(slot).cloned())
                    .ok_or("slot out of range")?;
                world.get_mut(part).ok_or("part vanished")?.container = bay;
                writeln!(out, "Mounted {part} into '{slot_label}'.")?;
                Ok(())
            }),
    )
    .unwrap_or_else(|e| panic!("command registration: {e}"));

    // Free command: the rest of the line is one message. The session's
    // sink is already registered with the shell's fan-out, so this reaches
    // every connected console.
    cli.insert(
        root,
        Command::new("broadcast", "Send a message to all consoles")
            .params(vec![Param::string("message")])
            .execute(move |out, view| {
                let message: String = view.args().arg(0, out);
                writeln!(out, "[ALL] {message}")?;
                Ok(())
            }),
    )
    .unwrap_or_else(|e| panic!("command registration: {e}"));

    cli
}

/// Compose the boot banner on a layered surface: static base text plus a
/// scroll-in status line revealed over the first frames.
fn boot_banner(width: usize) -> String {
    use deck_surface::{Animation, Pos, ScrollIn, Surface};

    let width = width.clamp(24, 60);
    let mut surface = Surface::new(width, 4);
    surface.append("== MECHDECK ==");
    let overlay = surface.add_layer();
    surface.add_animation(Animation::ScrollIn(ScrollIn::new(
        overlay,
        Pos::new(2, 1),
        "all systems nominal",
        Duration::from_millis(300),
        width,
    )));
    for _ in 0..8 {
        surface.update(Duration::from_millis(50));
    }

    (0..surface.height())
        .map(|row| surface.utf8_line(row))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Inventory listing plus a colored reactor-line diagram.
fn print_status(out: &mut dyn Write, world: &Registry, width: usize) -> std::io::Result<()> {
    writeln!(out, "Objects ({} cells wide):", width)?;
    for object in world.iter() {
        let place = if object.is_installed() {
            format!("in {}", object.container)
        } else {
            "depot".to_string()
        };
        writeln!(
            out,
            "  {} {} [{}]",
            palette::OBJECT_ID.paint(&object.id.to_string()),
            palette::OBJECT.paint(&object.name),
            place
        )?;
    }

    let mut table = ColorTable::new();
    table.insert('g', palette::OBJECT_ID);
    table.insert('r', palette::ERROR);
    let diagram = format_color_runs(
        &table,
        &["[12V]--[48V]--[480V]".to_string()],
        &["ggggg  ggggg  rrrrrr".to_string()],
    );
    write!(out, "{diagram}")
}
