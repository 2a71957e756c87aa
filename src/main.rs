use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::Parser;
use crossterm::{
    cursor,
    event::{
        DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyModifiers,
        MouseButton, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{Terminal, backend::CrosstermBackend};

use pane_deck::commands::{CommandRegistry, builtin};
use pane_deck::config::EngineConfig;
use pane_deck::drag::{DragOutcome, create_drag_preview, update_preview_position};
use pane_deck::error::ConfigError;
use pane_deck::event_loop::{ConsoleDriver, ControlFlow, EventLoop};
use pane_deck::store::Dispatch;
use pane_deck::tracing_sub;
use pane_deck::tree::{Action, Gutter, LayoutTree, SplitDirection};
use pane_deck::view::{self, Chrome, ViewGeometry};
use pane_deck::workspace::Workspace;

const FRAME_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Parser, Debug)]
#[command(
    name = "pane-deck",
    version = env!("CARGO_PKG_VERSION"),
    about = "Split panes, tabs and chord keybindings in the terminal"
)]
struct Cli {
    /// JSON engine config. Flags below override its values.
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    config: Option<PathBuf>,

    /// How long a chord prefix such as Ctrl+K stays armed.
    #[arg(long = "chord-timeout-ms", value_name = "MS")]
    chord_timeout_ms: Option<u64>,

    /// Smallest pane extent, in cells, a gutter drag may leave.
    #[arg(long = "min-pane-cells", value_name = "CELLS")]
    min_pane_cells: Option<u16>,

    /// Append debug logs to this file.
    #[arg(long = "log-file", value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Layout snapshot restored at startup and written back on exit.
    #[arg(short = 'l', long = "layout", value_name = "PATH")]
    layout: Option<PathBuf>,
}

struct AppConfig {
    engine: EngineConfig,
    log_file: Option<PathBuf>,
    layout: Option<PathBuf>,
}

impl TryFrom<&Cli> for AppConfig {
    type Error = ConfigError;

    fn try_from(cli: &Cli) -> Result<Self, Self::Error> {
        let mut engine = match &cli.config {
            Some(path) => EngineConfig::load(path)?,
            None => EngineConfig::default(),
        };
        if let Some(ms) = cli.chord_timeout_ms {
            engine.chord_timeout_ms = ms;
        }
        if let Some(cells) = cli.min_pane_cells {
            engine.min_pane_cells = cells;
        }
        engine.validate()?;
        Ok(Self {
            engine,
            log_file: cli.log_file.clone(),
            layout: cli.layout.clone(),
        })
    }
}

fn main() -> io::Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::try_from(&cli)
        .map_err(|err| io::Error::new(ErrorKind::InvalidInput, err.to_string()))?;
    tracing_sub::init_default(config.log_file.as_deref())?;

    let mut app = App::new(config.engine)?;
    if let Some(path) = &config.layout {
        app.load_layout(path)?;
    }

    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture, cursor::Hide)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut event_loop = EventLoop::new(ConsoleDriver::new(), FRAME_INTERVAL);
    let result = event_loop.run(|event| match event {
        None => {
            app.tick(Instant::now());
            terminal.draw(|frame| {
                app.geometry = view::draw(frame, &app.workspace, &app.chrome);
            })?;
            app.workspace.set_viewport(app.geometry.layout_area);
            Ok(ControlFlow::Continue)
        }
        Some(event) => Ok(app.handle_event(event)),
    });

    terminal.show_cursor()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        cursor::Show
    )?;
    terminal::disable_raw_mode()?;

    result?;
    if let Some(path) = &config.layout {
        app.save_layout(path)?;
    }
    Ok(())
}

struct GutterDrag {
    gutter: Gutter,
    column: u16,
    row: u16,
}

struct TabPress {
    moved: bool,
}

struct App {
    workspace: Workspace,
    registry: CommandRegistry<Workspace>,
    chrome: Chrome,
    geometry: ViewGeometry,
    gutter_drag: Option<GutterDrag>,
    tab_press: Option<TabPress>,
}

impl App {
    fn new(config: EngineConfig) -> io::Result<Self> {
        let mut registry = CommandRegistry::new(config.chord_timeout());
        builtin::register_defaults(&mut registry)
            .map_err(|err| io::Error::new(ErrorKind::InvalidInput, err.to_string()))?;
        Ok(Self {
            workspace: Workspace::new(config),
            registry,
            chrome: Chrome::default(),
            geometry: ViewGeometry::default(),
            gutter_drag: None,
            tab_press: None,
        })
    }

    fn load_layout(&mut self, path: &Path) -> io::Result<()> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(err),
        };
        let tree: LayoutTree = serde_json::from_str(&raw)
            .map_err(|err| io::Error::new(ErrorKind::InvalidData, err))?;
        self.workspace
            .restore(tree)
            .map_err(|err| io::Error::new(ErrorKind::InvalidData, err.to_string()))
    }

    fn save_layout(&self, path: &Path) -> io::Result<()> {
        let tree = self.workspace.tree();
        let raw = serde_json::to_string_pretty(tree.as_ref())
            .map_err(|err| io::Error::new(ErrorKind::InvalidData, err))?;
        fs::write(path, raw)
    }

    fn tick(&mut self, now: Instant) {
        if self.registry.poll_timeout(now) {
            self.chrome.message = Some("chord cancelled".to_string());
        }
        self.chrome.pending_chord = self.registry.pending_chord().map(|chord| chord.to_string());
    }

    fn handle_event(&mut self, event: Event) -> ControlFlow {
        match event {
            Event::Key(key) => return self.handle_key(key),
            Event::Mouse(mouse) => self.handle_mouse(mouse),
            _ => {}
        }
        ControlFlow::Continue
    }

    fn handle_key(&mut self, key: KeyEvent) -> ControlFlow {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q')) {
            return ControlFlow::Quit;
        }
        match key.code {
            KeyCode::F(1) => self.toggle_help(),
            KeyCode::Esc if !self.chrome.help.is_empty() => self.chrome.help.clear(),
            KeyCode::Esc if self.workspace.drag().is_dragging() => {
                self.workspace.drag_mut().cancel_drag();
                self.chrome.preview = None;
                self.tab_press = None;
            }
            _ => {
                self.chrome.message = None;
                self.registry.handle_keyboard_event(&key, &mut self.workspace);
            }
        }
        self.chrome.pending_chord = self.registry.pending_chord().map(|chord| chord.to_string());
        ControlFlow::Continue
    }

    fn toggle_help(&mut self) {
        if !self.chrome.help.is_empty() {
            self.chrome.help.clear();
            return;
        }
        self.chrome.help = self
            .registry
            .commands()
            .map(|command| {
                let binding = command
                    .keybinding()
                    .map(|binding| binding.to_string())
                    .unwrap_or_default();
                (command.label().to_string(), binding)
            })
            .collect();
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        let (column, row) = (mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => self.press(column, row),
            MouseEventKind::Drag(MouseButton::Left) => self.drag_to(column, row),
            MouseEventKind::Up(MouseButton::Left) => self.release(),
            MouseEventKind::Moved => {
                self.chrome.hovered_gutter = self
                    .geometry
                    .gutter_at(column, row)
                    .map(|gutter| (gutter.split_id.clone(), gutter.index));
            }
            _ => {}
        }
    }

    fn press(&mut self, column: u16, row: u16) {
        if let Some(hit) = self.geometry.tab_at(column, row).cloned() {
            self.workspace.dispatch(Action::SetActiveTab {
                tab_id: hit.tab_id.clone(),
            });
            if self.workspace.start_tab_drag(&hit.tab_id) {
                self.tab_press = Some(TabPress { moved: false });
            }
            return;
        }
        if let Some(gutter) = self.geometry.gutter_at(column, row).cloned() {
            self.gutter_drag = Some(GutterDrag {
                gutter,
                column,
                row,
            });
            return;
        }
        if let Some((leaf_id, _)) = self.geometry.leaf_at(column, row) {
            let leaf_id = leaf_id.clone();
            self.workspace.dispatch(Action::SetActiveLeaf { leaf_id });
        }
    }

    fn drag_to(&mut self, column: u16, row: u16) {
        if let Some(drag) = &mut self.gutter_drag {
            let delta = match drag.gutter.direction {
                SplitDirection::Horizontal => i32::from(column) - i32::from(drag.column),
                SplitDirection::Vertical => i32::from(row) - i32::from(drag.row),
            };
            if delta == 0 {
                return;
            }
            let resized = self.workspace.resize_gutter(
                &drag.gutter.split_id,
                drag.gutter.index,
                delta,
                drag.gutter.container_cells,
            );
            if resized {
                drag.column = column;
                drag.row = row;
            }
            return;
        }

        let Some(press) = &mut self.tab_press else {
            return;
        };
        press.moved = true;
        let area = self.geometry.layout_area;
        self.chrome.preview = match &self.chrome.preview {
            Some(preview) => Some(update_preview_position(preview, column, row, area)),
            None => {
                let tree = self.workspace.tree();
                let title = self
                    .workspace
                    .drag()
                    .drag_state()
                    .and_then(|state| tree.tab(&state.tab_id))
                    .map_or_else(String::new, |tab| tab.title.clone());
                Some(create_drag_preview(&title, column, row, area))
            }
        };
        if let Some((leaf_id, bounds)) = self.geometry.leaf_at(column, row) {
            let leaf_id = leaf_id.clone();
            self.workspace
                .drag_mut()
                .update_pointer(&leaf_id, bounds, column, row);
        }
    }

    fn release(&mut self) {
        if self.gutter_drag.take().is_some() {
            return;
        }
        let Some(press) = self.tab_press.take() else {
            return;
        };
        self.chrome.preview = None;
        if !press.moved {
            self.workspace.drag_mut().cancel_drag();
            return;
        }
        self.chrome.message = match self.workspace.end_drag() {
            DragOutcome::SplitRejected => Some("not enough room to split".to_string()),
            DragOutcome::MoveRejected => Some("tab could not be moved".to_string()),
            _ => None,
        };
    }
}
