mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::KeyEvent,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    time::Duration,
};

use splitz::{
    app_dirs::AppDirs,
    clock::{MonotonicSource, TimeSource},
    config::{Config, ConfigStore, FileConfigStore},
    history::HistoryLog,
    keymap::{Action, Keymap},
    layout::{FileLayoutStore, Theme},
    logging,
    runtime::{CrosstermEventSource, EventSource, FixedTicker, Runner, Ticker, TimerEvent},
    session::{Session, SessionError},
    Segment,
};

// Centisecond clock text; redraw often enough that it never looks stuck
const TICK_RATE_MS: u64 = 30;

/// speedrun split timer for the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A speedrun split timer for the terminal: live deltas against your personal best, predicted finish, possible time save and sum of best segments."
)]
pub struct Cli {
    /// run file to open, and to write the run to
    run_file: Option<PathBuf>,

    /// title for a new run, or a new title for the opened one
    #[clap(short = 't', long)]
    title: Option<String>,

    /// goal for a new run, or a new goal for the opened one
    #[clap(short = 'g', long)]
    goal: Option<String>,

    /// segment name, in race order (repeat for each segment)
    #[clap(short = 's', long = "segment")]
    segments: Vec<String>,

    /// layout document with colors and information row placement
    #[clap(short = 'l', long)]
    layout: Option<PathBuf>,
}

impl Cli {
    fn edits_run(&self) -> bool {
        self.title.is_some() || self.goal.is_some() || !self.segments.is_empty()
    }
}

pub struct App<S: TimeSource + Clone = MonotonicSource> {
    pub session: Session<S>,
    pub keymap: Keymap,
    pub theme: Theme,
    /// Shown in place of the key legend until the next action
    pub message: Option<String>,
    config: Config,
    config_store: Option<Box<dyn ConfigStore>>,
}

impl<S: TimeSource + Clone> App<S> {
    pub fn new(cli: &Cli, source: S, config: Config) -> Self {
        let keymap = Keymap::from_bindings(&config.key_bindings).unwrap_or_else(|err| {
            log::warn!("using default key bindings: {err}");
            Keymap::default()
        });
        let mut app = Self {
            session: Session::new(source),
            keymap,
            theme: Theme::default(),
            message: None,
            config,
            config_store: None,
        };
        app.open_run(cli);
        app
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_history(mut self, history: HistoryLog) -> Self {
        self.session.set_history(history);
        self
    }

    pub fn with_config_store(mut self, store: Box<dyn ConfigStore>) -> Self {
        self.config_store = Some(store);
        self
    }

    fn open_run(&mut self, cli: &Cli) {
        let path = cli
            .run_file
            .clone()
            .or_else(|| self.config.last_run_file.clone().filter(|_| !cli.edits_run()));

        if let Some(path) = &path {
            // A new run may name a file that does not exist yet
            if path.exists() || !cli.edits_run() {
                match self.session.load_run(path) {
                    Ok(()) => self.remember_run_file(),
                    Err(err) => self.message = Some(format!("{}: {err}", path.display())),
                }
            }
        }

        if cli.edits_run() {
            if let Err(err) = self.edit_run(cli) {
                self.message = Some(err.to_string());
            } else if self.session.run_path().is_none() {
                if let Some(path) = path {
                    self.session.set_run_path(path);
                }
            }
        }
    }

    /// Segments named on the command line keep the times of a loaded segment with the same name
    fn edit_run(&mut self, cli: &Cli) -> Result<(), SessionError> {
        let current = self.session.run();
        let title = cli
            .title
            .clone()
            .or_else(|| current.map(|run| run.title().to_string()))
            .unwrap_or_else(|| "Untitled".to_string());
        let goal = cli
            .goal
            .clone()
            .or_else(|| current.map(|run| run.goal().to_string()))
            .unwrap_or_default();
        let attempts = current.map_or(0, |run| run.attempts_count());
        let existing = current.map(|run| run.segments()).unwrap_or_default();

        let segments = if cli.segments.is_empty() {
            existing.to_vec()
        } else {
            cli.segments
                .iter()
                .map(|name| match existing.iter().find(|s| s.name() == name) {
                    Some(s) => Segment::with_times(
                        name.clone(),
                        s.split_time(),
                        s.segment_time(),
                        s.best_segment_time(),
                    ),
                    None => Segment::new(name.clone()),
                })
                .collect()
        };
        self.session.edit_run(title, goal, attempts, segments)
    }

    /// Handle one key press. Returns true when the app should quit.
    pub fn on_key(&mut self, key: KeyEvent) -> bool {
        let Some(action) = self.keymap.action_for(&key) else {
            return false;
        };
        self.message = None;

        let result = match action {
            Action::Split => self.split(),
            Action::Unsplit => self.session.unsplit(),
            Action::Skip => self.session.skip(),
            Action::Reset => self.session.reset(),
            Action::Pause => {
                self.session.pause();
                Ok(())
            }
            Action::WriteRunFile => self.write_run_file(),
            Action::Quit => return true,
        };

        match result {
            // Gestures that do not apply right now are ignored; the engine logs them
            Ok(()) | Err(SessionError::Engine(_)) | Err(SessionError::NoRun) => {}
            Err(err) => self.message = Some(err.to_string()),
        }
        false
    }

    fn split(&mut self) -> Result<(), SessionError> {
        let saves_run = self
            .session
            .run()
            .is_some_and(|run| run.status() == splitz::RunStatus::Done);
        self.session.split()?;
        if saves_run {
            if let Some(outcome) = self.session.last_save() {
                self.message = Some(format!(
                    "run saved: {} splits improved, {} new golds",
                    outcome.improved_splits, outcome.new_golds
                ));
            }
        }
        Ok(())
    }

    fn write_run_file(&mut self) -> Result<(), SessionError> {
        let path = self.session.write_run_file(None)?;
        self.message = Some(format!("run written to {}", path.display()));
        self.remember_run_file();
        Ok(())
    }

    fn remember_run_file(&mut self) {
        let path = self.session.run_path().map(|p| p.to_path_buf());
        if path.is_none() || self.config.last_run_file == path {
            return;
        }
        self.config.last_run_file = path;
        self.save_config();
    }

    pub fn remember_layout_file(&mut self, path: PathBuf) {
        if self.config.layout_file.as_ref() != Some(&path) {
            self.config.layout_file = Some(path);
            self.save_config();
        }
    }

    fn save_config(&self) {
        if let Some(store) = &self.config_store {
            if let Err(err) = store.save(&self.config) {
                log::warn!("could not save config: {err}");
            }
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    if let Some(path) = AppDirs::log_path() {
        if let Err(err) = logging::init_file_logger(&path) {
            eprintln!("logging disabled: {err}");
        }
    }

    let store = FileConfigStore::new();
    let config = store.load();
    let layout_path = cli.layout.clone().or_else(|| config.layout_file.clone());

    let mut app = App::new(&cli, MonotonicSource::new(), config)
        .with_config_store(Box::new(store));
    if let Some(path) = layout_path {
        app = app.with_theme(FileLayoutStore::with_path(&path).theme_or_default());
        app.remember_layout_file(path);
    }
    if let Some(path) = AppDirs::history_path() {
        app = app.with_history(HistoryLog::with_path(path));
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );
    let result = start_tui(&mut terminal, &mut app, &mut runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend, S: TimeSource + Clone, E: EventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App<S>,
    runner: &mut Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    loop {
        terminal.draw(|f| ui(app, f))?;

        match runner.step() {
            TimerEvent::Tick | TimerEvent::Resize => {}
            TimerEvent::Key(key) => {
                if app.on_key(key) {
                    break;
                }
            }
        }
    }

    Ok(())
}

fn ui<S: TimeSource + Clone>(app: &App<S>, f: &mut Frame) {
    f.render_widget(app, f.area());
}
