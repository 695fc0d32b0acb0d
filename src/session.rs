//! Host side of the timer: owns the optional run, the two clocks and the
//! bookkeeping the engine leaves to its caller, and maps the five input
//! gestures onto engine commands.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::clock::{Clock, TimeSource};
use crate::format::truncate_centis;
use crate::history::HistoryLog;
use crate::run::{EngineError, Run, RunError, RunStatus, SaveOutcome, Segment};
use crate::run_file::{self, RunFileError};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    RunFile(#[from] RunFileError),
    #[error(transparent)]
    Run(#[from] RunError),
    #[error("no run is loaded")]
    NoRun,
    #[error("the run has no file yet")]
    NoRunFile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    /// Plain stopwatch, no run loaded
    TimerOnly,
    Segments,
}

/// State of a clock as the presentation colors it
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TimerState {
    NotRunning,
    Running,
    Paused,
    /// Main clock: behind the personal best. Segment clock: slower than this segment's PB.
    Behind,
}

/// Values frozen on the final split while the clocks keep running
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionPause {
    pub run_time: f64,
    pub segment_time: f64,
}

/// Contents of the segment timer panel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentTimer {
    pub personal_best: Option<f64>,
    pub best: Option<f64>,
    pub elapsed: f64,
}

pub struct Session<S: TimeSource + Clone> {
    run: Option<Run>,
    run_path: Option<PathBuf>,
    run_clock: Clock<S>,
    segment_clock: Clock<S>,
    // Time already spent in a reopened segment; the segment clock cannot rewind
    time_elapsed_since_split: f64,
    completion: Option<CompletionPause>,
    last_save: Option<SaveOutcome>,
    history: Option<HistoryLog>,
}

impl<S: TimeSource + Clone> Session<S> {
    /// Timer-only session
    pub fn new(source: S) -> Self {
        Self {
            run: None,
            run_path: None,
            run_clock: Clock::new(source.clone()),
            segment_clock: Clock::new(source),
            time_elapsed_since_split: 0.0,
            completion: None,
            last_save: None,
            history: None,
        }
    }

    pub fn with_run(source: S, run: Run, path: Option<PathBuf>) -> Self {
        let mut session = Self::new(source);
        session.replace_run(run, path);
        session
    }

    pub fn with_history(mut self, history: HistoryLog) -> Self {
        self.set_history(history);
        self
    }

    pub fn set_history(&mut self, history: HistoryLog) {
        self.history = Some(history);
    }

    pub fn run(&self) -> Option<&Run> {
        self.run.as_ref()
    }

    pub fn run_path(&self) -> Option<&Path> {
        self.run_path.as_deref()
    }

    pub fn set_run_path(&mut self, path: PathBuf) {
        self.run_path = Some(path);
    }

    pub fn display_mode(&self) -> DisplayMode {
        match self.run {
            Some(_) => DisplayMode::Segments,
            None => DisplayMode::TimerOnly,
        }
    }

    pub fn last_save(&self) -> Option<&SaveOutcome> {
        self.last_save.as_ref()
    }

    pub fn completion(&self) -> Option<&CompletionPause> {
        self.completion.as_ref()
    }

    fn status(&self) -> Option<RunStatus> {
        self.run.as_ref().map(Run::status)
    }

    /// Main clock, truncated to hundredths
    pub fn run_elapsed(&self) -> f64 {
        truncate_centis(self.run_clock.elapsed_secs())
    }

    /// Segment clock including the unsplit carry
    pub fn segment_elapsed(&self) -> f64 {
        truncate_centis(self.segment_clock.elapsed_secs()) + self.time_elapsed_since_split
    }

    /// What the main clock shows; frozen at the final time once the run is done
    pub fn displayed_run_time(&self) -> f64 {
        match (self.status(), self.completion) {
            (Some(RunStatus::Done), Some(pause)) => pause.run_time,
            _ => self.run_elapsed(),
        }
    }

    pub fn segment_timer(&self) -> Option<SegmentTimer> {
        let run = self.run.as_ref()?;
        let (segment, elapsed) = match run.status() {
            RunStatus::Stopped => return None,
            _ if run.previous_segment_was_skipped() => return None,
            RunStatus::OnGoing => (run.current_segment()?, self.segment_elapsed()),
            RunStatus::Done => {
                let elapsed = self
                    .completion
                    .map_or_else(|| self.segment_elapsed(), |pause| pause.segment_time);
                (run.segments().last()?, elapsed)
            }
        };
        Some(SegmentTimer {
            personal_best: segment.segment_time(),
            best: segment.best_segment_time(),
            elapsed,
        })
    }

    pub fn timer_state(&self) -> TimerState {
        if self.status() == Some(RunStatus::Done) {
            return TimerState::Paused;
        }
        if !self.run_clock.is_running() {
            return if self.run_clock.elapsed().is_zero() {
                TimerState::NotRunning
            } else {
                TimerState::Paused
            };
        }
        let behind = self
            .run
            .as_ref()
            .and_then(|run| run.live_run_delta(self.run_elapsed()))
            .is_some_and(|delta| delta > 0.0);
        if behind {
            TimerState::Behind
        } else {
            TimerState::Running
        }
    }

    pub fn segment_timer_state(&self) -> TimerState {
        match self.status() {
            None | Some(RunStatus::Stopped) => TimerState::NotRunning,
            Some(RunStatus::Done) => TimerState::Paused,
            Some(RunStatus::OnGoing) if !self.segment_clock.is_running() => TimerState::Paused,
            Some(RunStatus::OnGoing) => {
                let losing = self
                    .run
                    .as_ref()
                    .is_some_and(|run| run.current_segment_has_live_delta(self.segment_elapsed()));
                if losing {
                    TimerState::Behind
                } else {
                    TimerState::Running
                }
            }
        }
    }

    /// Start the attempt, record a split, or save a finished run.
    /// Without a run it starts and stops the main clock.
    pub fn split(&mut self) -> Result<(), SessionError> {
        let run_elapsed = self.run_elapsed();
        let segment_elapsed = self.segment_elapsed();

        let Some(run) = self.run.as_mut() else {
            toggle(&mut self.run_clock);
            return Ok(());
        };

        match run.status() {
            RunStatus::Stopped => {
                run.start()?;
                self.run_clock.restart();
                self.segment_clock.restart();
                self.last_save = None;
            }
            RunStatus::OnGoing => {
                if !self.run_clock.is_running() {
                    log::debug!("split ignored while paused");
                    return Ok(());
                }
                if run.split(run_elapsed, segment_elapsed)? == RunStatus::Done {
                    let final_time = run.complete()?;
                    self.completion = Some(CompletionPause {
                        run_time: final_time.unwrap_or(run_elapsed),
                        segment_time: segment_elapsed,
                    });
                }
                self.segment_clock.restart();
            }
            RunStatus::Done => {
                let outcome = run.save()?;
                if let Some(history) = &self.history {
                    if let Err(err) = history.append(run, &outcome) {
                        log::warn!("could not record history: {err}");
                    }
                }
                self.last_save = Some(outcome);
                self.completion = None;
                self.run_clock.reset();
                self.segment_clock.reset();
            }
        }
        self.time_elapsed_since_split = 0.0;
        Ok(())
    }

    /// Reopen the previous segment, resuming a finished run if needed
    pub fn unsplit(&mut self) -> Result<(), SessionError> {
        let run = self.run.as_mut().ok_or(SessionError::NoRun)?;
        let was_done = run.status() == RunStatus::Done;
        let carry = run.unsplit()?;

        if was_done {
            self.completion = None;
            self.run_clock.start();
            self.segment_clock.start();
        }
        self.time_elapsed_since_split += carry;
        Ok(())
    }

    pub fn skip(&mut self) -> Result<(), SessionError> {
        let segment_elapsed = self.segment_elapsed();
        let run = self.run.as_mut().ok_or(SessionError::NoRun)?;
        run.skip_segment(segment_elapsed)?;
        self.segment_clock.restart();
        self.time_elapsed_since_split = 0.0;
        Ok(())
    }

    /// Abandon the attempt and zero both clocks
    pub fn reset(&mut self) -> Result<(), SessionError> {
        if let Some(run) = self.run.as_mut() {
            if run.status() != RunStatus::Stopped {
                run.reset()?;
            }
            self.segment_clock.reset();
        }
        self.run_clock.reset();
        self.time_elapsed_since_split = 0.0;
        self.completion = None;
        Ok(())
    }

    /// Pause or resume. The segment clock follows only while an attempt is running.
    pub fn pause(&mut self) {
        if self.status() == Some(RunStatus::OnGoing) {
            toggle(&mut self.segment_clock);
        }
        toggle(&mut self.run_clock);
    }

    /// Load a run file. On failure the current run stays in place.
    pub fn load_run(&mut self, path: &Path) -> Result<(), SessionError> {
        let run = run_file::load_run(path)?;
        self.replace_run(run, Some(path.to_path_buf()));
        Ok(())
    }

    /// Discard the current run, if any, in favour of `run`
    pub fn replace_run(&mut self, run: Run, path: Option<PathBuf>) {
        log::info!("run {} opened with {} segments", run.title(), run.segments().len());
        self.run = Some(run);
        self.run_path = path;
        self.clear_clocks();
    }

    /// Commit edited run details. An already loaded run keeps its completed
    /// count and file; otherwise a new run is created.
    pub fn edit_run(
        &mut self,
        title: impl Into<String>,
        goal: impl Into<String>,
        attempts_count: u32,
        segments: Vec<Segment>,
    ) -> Result<(), SessionError> {
        let (run, path) = match &self.run {
            Some(current) => (
                current.edited(title, goal, attempts_count, segments)?,
                self.run_path.clone(),
            ),
            None => (Run::new(title, goal, attempts_count, 0, segments)?, None),
        };
        self.replace_run(run, path);
        Ok(())
    }

    /// Back to timer-only mode
    pub fn close_run(&mut self) {
        if let Some(run) = self.run.take() {
            log::info!("run {} closed", run.title());
        }
        self.run_path = None;
        self.clear_clocks();
    }

    /// Persist the run to `path`, or to the file it came from.
    /// The written path becomes the run's file.
    pub fn write_run_file(&mut self, path: Option<&Path>) -> Result<PathBuf, SessionError> {
        let run = self.run.as_ref().ok_or(SessionError::NoRun)?;
        let target = path
            .map(Path::to_path_buf)
            .or_else(|| self.run_path.clone())
            .ok_or(SessionError::NoRunFile)?;
        run_file::save_run(&target, run)?;
        self.run_path = Some(target.clone());
        Ok(target)
    }

    fn clear_clocks(&mut self) {
        self.run_clock.reset();
        self.segment_clock.reset();
        self.time_elapsed_since_split = 0.0;
        self.completion = None;
        self.last_save = None;
    }
}

fn toggle<S: TimeSource>(clock: &mut Clock<S>) {
    if clock.is_running() {
        clock.stop();
    } else {
        clock.start();
    }
}
