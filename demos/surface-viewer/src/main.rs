//! Surface viewer - replays a surface-dispatch stream in the terminal
//!
//! Lines are read from a file or stdin and fed to the engine one at a time,
//! optionally paced so the surface can be watched as it assembles. The
//! surface is live: Tab moves focus, Enter/Space press and toggle, typing
//! edits text fields. Every user action is printed as JSONL on exit.
//!
//! # Usage
//!
//! ```sh
//! # Watch a recorded stream build up
//! cargo run -p surface-viewer -- --input demos/surface-viewer/streams/signup.jsonl --delay-ms 400
//!
//! # Print one frame without a terminal
//! cargo run -p surface-viewer -- --input demos/surface-viewer/streams/signup.jsonl --dump
//! ```

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    style::{Color, Style},
    widgets::Paragraph,
    Frame, Terminal,
};
use surface_dispatch::debug::{MessageLogConfig, MessageLogMiddleware};
use surface_dispatch::{spawn_line_reader, Engine, EngineConfig, IngestOutcome, UserAction};
use surface_dispatch_widgets::{
    process_raw_event, spawn_event_poller, tui_registry, Component, EventKind, SurfaceView,
    SurfaceViewProps, TuiWidget,
};
use tokio::io::AsyncBufRead;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

type ViewerEngine = Engine<MessageLogMiddleware>;

/// Replay a JSONL surface stream in the terminal
#[derive(Parser, Debug)]
#[command(name = "surface-viewer")]
#[command(about = "Replay a surface-dispatch JSONL stream in the terminal")]
struct Args {
    /// Stream to read (default: stdin)
    #[arg(long, short)]
    input: Option<PathBuf>,

    /// Surface to show (default: the first one that declares a root)
    #[arg(long, short)]
    surface: Option<String>,

    /// Delay before each line, in milliseconds
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Ingest everything, print one plain-text frame and exit
    #[arg(long)]
    dump: bool,

    /// Frame width for --dump
    #[arg(long, default_value = "80")]
    width: u16,

    /// Frame height for --dump
    #[arg(long, default_value = "24")]
    height: u16,

    /// Engine config as JSON
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log at debug level
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let args = Args::parse();
    init_tracing(&args)?;

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => EngineConfig::default(),
    };
    let engine = Engine::new()
        .with_config(config)
        .with_middleware(MessageLogMiddleware::with_log(MessageLogConfig::with_capacity(50)));

    if args.dump {
        return dump(engine, &args);
    }

    // ===== Terminal setup =====
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_viewer(&mut terminal, engine, &args).await;

    // ===== Cleanup =====
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    for action in result? {
        println!("{}", action.to_json_line());
    }
    Ok(())
}

/// Logs go to `--log-file` only, since the terminal hosts the UI.
///
/// Filter: `--debug` > `RUST_LOG` > `warn`.
fn init_tracing(args: &Args) -> io::Result<()> {
    let Some(path) = &args.log_file else {
        return Ok(());
    };
    let filter = if args.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let file = File::options().create(true).append(true).open(path)?;
    let layer = fmt::layer()
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file));
    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .init();
    Ok(())
}

fn load_config(path: &Path) -> io::Result<EngineConfig> {
    let text = std::fs::read_to_string(path)?;
    EngineConfig::from_json_str(&text).map_err(|err| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{}: {err}", path.display()),
        )
    })
}

/// The surface to draw: the requested one, or the first with a root.
fn pick_surface(engine: &ViewerEngine, requested: Option<&str>) -> Option<String> {
    if let Some(id) = requested {
        return Some(id.to_string());
    }
    engine
        .surface_ids()
        .into_iter()
        .find(|id| engine.surface(id).is_some_and(|s| s.root().is_some()))
        .map(str::to_string)
}

fn dump(mut engine: ViewerEngine, args: &Args) -> io::Result<()> {
    let stats = match &args.input {
        Some(path) => engine.ingest_reader(BufReader::new(File::open(path)?))?,
        None => engine.ingest_reader(io::stdin().lock())?,
    };
    eprintln!(
        "applied {}, ignored {}, skipped {}",
        stats.applied,
        stats.ignored,
        stats.skipped()
    );
    for err in &stats.errors {
        eprintln!("  {err}");
    }

    let Some(surface_id) = pick_surface(&engine, args.surface.as_deref()) else {
        eprintln!("no surface declared a root");
        return Ok(());
    };
    let registry = tui_registry();
    let Some(tree) = engine.render_tree_with(&surface_id, &registry) else {
        eprintln!("unknown surface `{surface_id}`");
        return Ok(());
    };
    for line in SurfaceView::new().render_to_lines(&tree, args.width, args.height)? {
        println!("{line}");
    }
    Ok(())
}

async fn open_input(path: Option<&Path>) -> io::Result<Box<dyn AsyncBufRead + Unpin + Send>> {
    Ok(match path {
        Some(path) => Box::new(tokio::io::BufReader::new(tokio::fs::File::open(path).await?)),
        None => Box::new(tokio::io::BufReader::new(tokio::io::stdin())),
    })
}

struct Status {
    surface: Option<String>,
    lines: usize,
    skipped: usize,
    last_fault: Option<String>,
}

async fn run_viewer<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut engine: ViewerEngine,
    args: &Args,
) -> io::Result<Vec<UserAction>> {
    let cancel = CancellationToken::new();

    let (line_tx, mut line_rx) = mpsc::unbounded_channel();
    let pace = args.delay_ms.map(Duration::from_millis);
    let reader = spawn_line_reader(
        open_input(args.input.as_deref()).await?,
        line_tx,
        pace,
        cancel.clone(),
    );

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let _poller = spawn_event_poller(
        event_tx,
        Duration::from_millis(10),
        Duration::from_millis(16),
        cancel.clone(),
    );

    let (action_tx, mut action_rx) = mpsc::unbounded_channel();
    engine.on_action(action_tx);

    let last_fault = Arc::new(Mutex::new(None::<String>));
    let fault_slot = last_fault.clone();
    engine.on_fault(move |fault| {
        if let Ok(mut slot) = fault_slot.lock() {
            *slot = Some(fault.to_string());
        }
    });

    let registry = tui_registry();
    let mut view = SurfaceView::new();
    let mut status = Status {
        surface: args.surface.clone(),
        lines: 0,
        skipped: 0,
        last_fault: None,
    };
    let mut lines_open = true;

    loop {
        let tree = status
            .surface
            .as_deref()
            .and_then(|id| engine.render_tree_with(id, &registry));
        status.last_fault = last_fault.lock().ok().and_then(|slot| slot.clone());
        terminal.draw(|frame| draw(frame, &mut view, tree.as_ref(), &engine, &status))?;

        tokio::select! {
            line = line_rx.recv(), if lines_open => {
                let Some(line) = line else {
                    lines_open = false;
                    continue;
                };
                status.lines += 1;
                match engine.ingest_bytes(&line) {
                    IngestOutcome::Applied(_) if status.surface.is_none() => {
                        status.surface = pick_surface(&engine, None);
                    }
                    IngestOutcome::Skipped(_) => status.skipped += 1,
                    _ => {}
                }
            }
            Some(raw) = event_rx.recv() => {
                let event = process_raw_event(raw);
                if event.is_quit() {
                    break;
                }
                let Some(tree) = tree else { continue };
                let events: Vec<_> = view
                    .handle_event(&event, SurfaceViewProps { tree: &tree })
                    .into_iter()
                    .collect();
                for event in events {
                    if let Err(err) =
                        engine.interact(&event.surface_id, &event.component_id, event.interaction)
                    {
                        tracing::warn!(error = %err, "interaction rejected");
                    }
                }
            }
        }
    }

    cancel.cancel();
    if let Ok(Err(err)) = reader.await {
        tracing::warn!(error = %err, "input stream failed");
    }

    let mut actions = Vec::new();
    while let Ok(action) = action_rx.try_recv() {
        actions.push(action);
    }
    Ok(actions)
}

fn draw(
    frame: &mut Frame,
    view: &mut SurfaceView,
    tree: Option<&surface_dispatch::RenderTree<TuiWidget>>,
    engine: &ViewerEngine,
    status: &Status,
) {
    let [body, footer] =
        Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(frame.area());

    match tree {
        Some(tree) => view.render(frame, body, SurfaceViewProps { tree }),
        None => frame.render_widget(
            Paragraph::new("waiting for a surface...").style(Style::default().fg(Color::DarkGray)),
            body,
        ),
    }

    let last = engine
        .middleware()
        .log()
        .and_then(|log| log.recent(1).next())
        .map(|entry| entry.summary.clone())
        .unwrap_or_default();
    let mut text = format!(
        " {} | {} lines | {} skipped | {last}",
        status.surface.as_deref().unwrap_or("-"),
        status.lines,
        status.skipped,
    );
    if let Some(fault) = &status.last_fault {
        text.push_str(&format!(" | {fault}"));
    }
    text.push_str(" | Tab focus, Enter press, Esc quit");
    frame.render_widget(
        Paragraph::new(text).style(Style::default().fg(Color::Black).bg(Color::Gray)),
        footer,
    );
}
