//! The run engine: an ordered list of segments, the attempt lifecycle and
//! the comparison data that survives between attempts.
//!
//! The engine never reads a clock. Every command that needs a time takes the
//! elapsed seconds sampled by the host, which keeps it deterministic.

pub mod delta;
pub mod segment;
pub mod snapshot;

use serde::{Deserialize, Serialize};

pub use delta::{DeltaStyle, LiveDelta, SegmentComparison};
pub use segment::{LiveTime, Segment};
pub use snapshot::{RunSnapshot, SegmentSnapshot};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RunStatus {
    /// No attempt in progress
    #[default]
    Stopped,
    /// Attempt running; `live_index` is the segment being raced
    OnGoing,
    /// Every segment done; `live_index` is one past the last segment
    Done,
}

/// Engine commands, used to report which one was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Command {
    StartRun,
    Split,
    CompleteRun,
    SkipSegment,
    UnSplit,
    ResetRun,
    SaveRun,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("{command} is not valid while the run is {status} at segment {live_index}")]
    InvalidState {
        command: Command,
        status: RunStatus,
        live_index: usize,
    },
}

/// Structural problems in a run handed to the engine
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RunError {
    #[error("a run needs at least one segment")]
    NoSegments,
    #[error("runs completed ({completed}) exceeds attempts ({attempts})")]
    CompletedExceedsAttempts { completed: u32, attempts: u32 },
    #[error("segment {index} ({name}) has a negative time")]
    NegativeTime { index: usize, name: String },
    #[error("personal best split of segment {index} ({name}) is earlier than the previous one")]
    NonMonotonicSplits { index: usize, name: String },
}

/// What a successful save folded into the stored comparison data
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SaveOutcome {
    pub final_time: Option<f64>,
    pub improved_splits: usize,
    pub new_golds: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    title: String,
    goal: String,
    attempts_count: u32,
    runs_completed: u32,
    segments: Vec<Segment>,
    live_index: usize,
    status: RunStatus,
    completed: bool,
}

impl Run {
    pub fn new(
        title: impl Into<String>,
        goal: impl Into<String>,
        attempts_count: u32,
        runs_completed: u32,
        segments: Vec<Segment>,
    ) -> Result<Self, RunError> {
        validate(attempts_count, runs_completed, &segments)?;
        Ok(Self {
            title: title.into(),
            goal: goal.into(),
            attempts_count,
            runs_completed,
            segments,
            live_index: 0,
            status: RunStatus::Stopped,
            completed: false,
        })
    }

    /// Replace title, goal, attempts and segments the way an edit commit does.
    /// Completed runs carry over; the result starts stopped.
    pub fn edited(
        &self,
        title: impl Into<String>,
        goal: impl Into<String>,
        attempts_count: u32,
        segments: Vec<Segment>,
    ) -> Result<Self, RunError> {
        Self::new(title, goal, attempts_count, self.runs_completed, segments)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn goal(&self) -> &str {
        &self.goal
    }

    pub fn attempts_count(&self) -> u32 {
        self.attempts_count
    }

    pub fn runs_completed(&self) -> u32 {
        self.runs_completed
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn live_index(&self) -> usize {
        self.live_index
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// The segment being raced, if an attempt is running
    pub fn current_segment(&self) -> Option<&Segment> {
        match self.status {
            RunStatus::OnGoing => self.segments.get(self.live_index),
            _ => None,
        }
    }

    pub fn current_split_is_last_split(&self) -> bool {
        self.live_index + 1 == self.segments.len()
    }

    pub fn previous_segment_was_skipped(&self) -> bool {
        self.live_index > 0
            && self
                .segments
                .get(self.live_index - 1)
                .is_some_and(Segment::was_skipped)
    }

    pub fn start(&mut self) -> Result<(), EngineError> {
        if self.status != RunStatus::Stopped {
            return Err(self.reject(Command::StartRun));
        }
        self.clear_attempt();
        self.status = RunStatus::OnGoing;
        self.attempts_count += 1;
        log::debug!("attempt {} of {} started", self.attempts_count, self.title);
        Ok(())
    }

    /// Record the current segment. Splitting the last segment finishes the attempt.
    pub fn split(&mut self, run_elapsed: f64, segment_elapsed: f64) -> Result<RunStatus, EngineError> {
        if self.status != RunStatus::OnGoing || self.live_index >= self.segments.len() {
            return Err(self.reject(Command::Split));
        }

        let index = self.live_index;
        self.segments[index].live = LiveTime::Recorded {
            split_time: run_elapsed,
            segment_time: segment_elapsed,
        };
        self.live_index += 1;
        if self.live_index == self.segments.len() {
            self.status = RunStatus::Done;
        }

        log::debug!(
            "split {} at {:.2} (segment {:.2})",
            self.segments[index].name(),
            run_elapsed,
            segment_elapsed
        );
        Ok(self.status)
    }

    /// Acknowledge the finished attempt once; returns the final run time
    pub fn complete(&mut self) -> Result<Option<f64>, EngineError> {
        if self.status != RunStatus::Done || self.completed {
            return Err(self.reject(Command::CompleteRun));
        }
        self.completed = true;
        Ok(self.final_time())
    }

    /// Leave the current segment without a time and move on.
    /// Not allowed on the last segment: a run can only end with a split.
    pub fn skip_segment(&mut self, segment_elapsed: f64) -> Result<(), EngineError> {
        if self.status != RunStatus::OnGoing || self.live_index + 1 >= self.segments.len() {
            return Err(self.reject(Command::SkipSegment));
        }
        self.segments[self.live_index].live = LiveTime::Skipped {
            elapsed: segment_elapsed,
        };
        self.live_index += 1;
        log::debug!("skipped segment {}", self.live_index - 1);
        Ok(())
    }

    /// Reopen the previous segment. Returns the time that had been spent in it,
    /// which the host adds back onto its segment clock.
    pub fn unsplit(&mut self) -> Result<f64, EngineError> {
        match self.status {
            RunStatus::Done => {
                self.status = RunStatus::OnGoing;
                self.completed = false;
            }
            RunStatus::OnGoing if self.live_index > 0 => {}
            _ => return Err(self.reject(Command::UnSplit)),
        }

        self.live_index -= 1;
        let reopened = &mut self.segments[self.live_index];
        let carry = reopened.time_spent().unwrap_or_default();
        reopened.clear_live();
        log::debug!("unsplit back into {}", reopened.name());
        Ok(carry)
    }

    /// Abandon the attempt; stored comparison data is untouched
    pub fn reset(&mut self) -> Result<(), EngineError> {
        if self.status == RunStatus::Stopped {
            return Err(self.reject(Command::ResetRun));
        }
        self.clear_attempt();
        log::debug!("attempt reset");
        Ok(())
    }

    /// Commit a finished attempt into personal bests and golds, then stop
    pub fn save(&mut self) -> Result<SaveOutcome, EngineError> {
        if self.status != RunStatus::Done {
            return Err(self.reject(Command::SaveRun));
        }

        let final_time = self.final_time();
        let (improved_splits, new_golds) = self
            .segments
            .iter_mut()
            .map(Segment::commit_live)
            .fold((0, 0), |(splits, golds), (split, gold)| {
                (splits + usize::from(split), golds + usize::from(gold))
            });
        self.runs_completed += 1;
        self.clear_attempt();

        log::info!(
            "run {} saved: {} splits improved, {} new golds",
            self.runs_completed,
            improved_splits,
            new_golds
        );
        Ok(SaveOutcome {
            final_time,
            improved_splits,
            new_golds,
        })
    }

    fn final_time(&self) -> Option<f64> {
        self.segments.last().and_then(Segment::live_split_time)
    }

    fn clear_attempt(&mut self) {
        self.segments.iter_mut().for_each(Segment::clear_live);
        self.live_index = 0;
        self.status = RunStatus::Stopped;
        self.completed = false;
    }

    fn reject(&self, command: Command) -> EngineError {
        log::warn!(
            "rejected {} while {} at segment {}",
            command,
            self.status,
            self.live_index
        );
        EngineError::InvalidState {
            command,
            status: self.status,
            live_index: self.live_index,
        }
    }
}

fn validate(attempts_count: u32, runs_completed: u32, segments: &[Segment]) -> Result<(), RunError> {
    if segments.is_empty() {
        return Err(RunError::NoSegments);
    }
    if runs_completed > attempts_count {
        return Err(RunError::CompletedExceedsAttempts {
            completed: runs_completed,
            attempts: attempts_count,
        });
    }

    let mut previous_split: Option<f64> = None;
    for (index, segment) in segments.iter().enumerate() {
        let times = [
            segment.split_time(),
            segment.segment_time(),
            segment.best_segment_time(),
        ];
        if times.iter().flatten().any(|t| *t < 0.0) {
            return Err(RunError::NegativeTime {
                index,
                name: segment.name().to_string(),
            });
        }
        if let Some(split) = segment.split_time() {
            if previous_split.is_some_and(|previous| split < previous) {
                return Err(RunError::NonMonotonicSplits {
                    index,
                    name: segment.name().to_string(),
                });
            }
            previous_split = Some(split);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn three_segment_run() -> Run {
        Run::new(
            "Any%",
            "Sub 25",
            0,
            0,
            vec![
                Segment::with_times("Forest", Some(10.0), Some(10.0), Some(9.0)),
                Segment::with_times("Lake", Some(15.0), Some(5.0), Some(5.0)),
                Segment::with_times("Castle", Some(25.0), Some(10.0), Some(9.0)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn new_run_starts_stopped() {
        let run = three_segment_run();
        assert_eq!(run.status(), RunStatus::Stopped);
        assert_eq!(run.live_index(), 0);
        assert!(run.current_segment().is_none());
    }

    #[test]
    fn rejects_empty_run() {
        assert_eq!(Run::new("t", "g", 0, 0, vec![]), Err(RunError::NoSegments));
    }

    #[test]
    fn rejects_more_completions_than_attempts() {
        let result = Run::new("t", "g", 1, 2, vec![Segment::new("a")]);
        assert_matches!(result, Err(RunError::CompletedExceedsAttempts { .. }));
    }

    #[test]
    fn rejects_decreasing_personal_best_splits() {
        let result = Run::new(
            "t",
            "g",
            0,
            0,
            vec![
                Segment::with_times("a", Some(10.0), Some(10.0), None),
                Segment::with_times("b", Some(9.0), Some(1.0), None),
            ],
        );
        assert_matches!(result, Err(RunError::NonMonotonicSplits { index: 1, .. }));
    }

    #[test]
    fn unset_splits_do_not_break_monotonicity() {
        let result = Run::new(
            "t",
            "g",
            0,
            0,
            vec![
                Segment::with_times("a", Some(10.0), Some(10.0), None),
                Segment::new("b"),
                Segment::with_times("c", Some(30.0), Some(5.0), None),
            ],
        );
        assert!(result.is_ok());
    }

    #[test]
    fn rejects_negative_times() {
        let result = Run::new(
            "t",
            "g",
            0,
            0,
            vec![Segment::with_times("a", Some(-1.0), None, None)],
        );
        assert_matches!(result, Err(RunError::NegativeTime { index: 0, .. }));
    }

    #[test]
    fn start_counts_an_attempt() {
        let mut run = three_segment_run();
        run.start().unwrap();
        assert_eq!(run.status(), RunStatus::OnGoing);
        assert_eq!(run.attempts_count(), 1);
        assert_eq!(run.current_segment().map(Segment::name), Some("Forest"));
    }

    #[test]
    fn start_twice_is_rejected_without_side_effects() {
        let mut run = three_segment_run();
        run.start().unwrap();
        run.split(9.5, 9.5).unwrap();
        let before = run.clone();

        assert_matches!(
            run.start(),
            Err(EngineError::InvalidState {
                command: Command::StartRun,
                status: RunStatus::OnGoing,
                live_index: 1,
            })
        );
        assert_eq!(run, before);
    }

    #[test]
    fn splits_advance_until_done() {
        let mut run = three_segment_run();
        run.start().unwrap();

        assert_eq!(run.split(9.5, 9.5), Ok(RunStatus::OnGoing));
        assert_eq!(run.live_index(), 1);
        assert_eq!(run.split(16.0, 6.5), Ok(RunStatus::OnGoing));
        assert_eq!(run.live_index(), 2);
        assert!(run.current_split_is_last_split());
        assert_eq!(run.split(24.0, 8.0), Ok(RunStatus::Done));
        assert_eq!(run.live_index(), 3);

        assert_matches!(run.split(25.0, 1.0), Err(EngineError::InvalidState { .. }));
    }

    #[test]
    fn split_while_stopped_is_rejected() {
        let mut run = three_segment_run();
        let before = run.clone();
        assert_matches!(
            run.split(1.0, 1.0),
            Err(EngineError::InvalidState {
                command: Command::Split,
                ..
            })
        );
        assert_eq!(run, before);
    }

    #[test]
    fn complete_only_once_per_attempt() {
        let mut run = three_segment_run();
        run.start().unwrap();
        assert_matches!(run.complete(), Err(EngineError::InvalidState { .. }));

        run.split(9.5, 9.5).unwrap();
        run.split(16.0, 6.5).unwrap();
        run.split(24.0, 8.0).unwrap();

        assert_eq!(run.complete(), Ok(Some(24.0)));
        assert_matches!(run.complete(), Err(EngineError::InvalidState { .. }));
        assert_eq!(run.status(), RunStatus::Done);
    }

    #[test]
    fn skip_marks_segment_without_time() {
        let mut run = three_segment_run();
        run.start().unwrap();
        run.skip_segment(3.0).unwrap();

        assert_eq!(run.live_index(), 1);
        assert!(run.previous_segment_was_skipped());
        let skipped = &run.segments()[0];
        assert_eq!(skipped.live_split_time(), None);
        assert_eq!(skipped.live_segment_time(), None);
        assert_eq!(skipped.live(), LiveTime::Skipped { elapsed: 3.0 });
    }

    #[test]
    fn skip_last_segment_is_rejected() {
        let mut run = three_segment_run();
        run.start().unwrap();
        run.split(9.5, 9.5).unwrap();
        run.split(16.0, 6.5).unwrap();
        let before = run.clone();

        assert_matches!(
            run.skip_segment(1.0),
            Err(EngineError::InvalidState {
                command: Command::SkipSegment,
                ..
            })
        );
        assert_eq!(run, before);
    }

    #[test]
    fn unsplit_reopens_previous_segment() {
        let mut run = three_segment_run();
        run.start().unwrap();
        run.split(9.5, 9.5).unwrap();

        assert_eq!(run.unsplit(), Ok(9.5));
        assert_eq!(run.live_index(), 0);
        assert_eq!(run.segments()[0].live(), LiveTime::Pending);
        assert_eq!(run.status(), RunStatus::OnGoing);
    }

    #[test]
    fn unsplit_at_first_segment_is_rejected() {
        let mut run = three_segment_run();
        run.start().unwrap();
        let before = run.clone();
        assert_matches!(
            run.unsplit(),
            Err(EngineError::InvalidState {
                command: Command::UnSplit,
                ..
            })
        );
        assert_eq!(run, before);
    }

    #[test]
    fn unsplit_from_done_resumes() {
        let mut run = three_segment_run();
        run.start().unwrap();
        run.split(9.5, 9.5).unwrap();
        run.split(16.0, 6.5).unwrap();
        run.split(24.0, 8.0).unwrap();
        run.complete().unwrap();

        assert_eq!(run.unsplit(), Ok(8.0));
        assert_eq!(run.status(), RunStatus::OnGoing);
        assert_eq!(run.live_index(), 2);

        // the attempt can be completed again after resuming
        run.split(24.5, 8.5).unwrap();
        assert_eq!(run.complete(), Ok(Some(24.5)));
    }

    #[test]
    fn unsplit_over_skipped_segment_carries_its_elapsed_time() {
        let mut run = three_segment_run();
        run.start().unwrap();
        run.skip_segment(4.25).unwrap();
        assert_eq!(run.unsplit(), Ok(4.25));
        assert!(!run.previous_segment_was_skipped());
    }

    #[test]
    fn reset_discards_live_times_only() {
        let mut run = three_segment_run();
        run.start().unwrap();
        run.split(9.5, 9.5).unwrap();
        run.reset().unwrap();

        assert_eq!(run.status(), RunStatus::Stopped);
        assert_eq!(run.live_index(), 0);
        assert!(run.segments().iter().all(|s| s.live() == LiveTime::Pending));
        assert_eq!(run.segments()[0].split_time(), Some(10.0));
        assert_eq!(run.attempts_count(), 1);
        assert_matches!(run.reset(), Err(EngineError::InvalidState { .. }));
    }

    #[test]
    fn save_requires_done() {
        let mut run = three_segment_run();
        run.start().unwrap();
        run.split(9.5, 9.5).unwrap();
        assert_matches!(
            run.save(),
            Err(EngineError::InvalidState {
                command: Command::SaveRun,
                ..
            })
        );
        assert_eq!(run.runs_completed(), 0);
    }

    #[test]
    fn save_commits_bests_and_stops() {
        let mut run = three_segment_run();
        run.start().unwrap();
        run.split(9.5, 9.5).unwrap();
        run.split(16.0, 6.5).unwrap();
        run.split(24.0, 8.0).unwrap();

        let outcome = run.save().unwrap();
        assert_eq!(outcome.final_time, Some(24.0));
        assert_eq!(outcome.improved_splits, 2);
        assert_eq!(outcome.new_golds, 1);

        let segments = run.segments();
        assert_eq!(segments[0].split_time(), Some(9.5));
        assert_eq!(segments[0].best_segment_time(), Some(9.0));
        assert_eq!(segments[1].split_time(), Some(15.0));
        assert_eq!(segments[1].segment_time(), Some(5.0));
        assert_eq!(segments[2].split_time(), Some(24.0));
        assert_eq!(segments[2].segment_time(), Some(8.0));
        assert_eq!(segments[2].best_segment_time(), Some(8.0));

        assert_eq!(run.runs_completed(), 1);
        assert_eq!(run.status(), RunStatus::Stopped);
        assert_eq!(run.live_index(), 0);
    }

    #[test]
    fn edited_run_keeps_completed_runs() {
        let mut run = three_segment_run();
        run.start().unwrap();
        run.split(9.5, 9.5).unwrap();
        run.split(16.0, 6.5).unwrap();
        run.split(24.0, 8.0).unwrap();
        run.save().unwrap();

        let edited = run
            .edited("Any% NMG", "Sub 24", 5, vec![Segment::new("Everything")])
            .unwrap();
        assert_eq!(edited.title(), "Any% NMG");
        assert_eq!(edited.runs_completed(), 1);
        assert_eq!(edited.attempts_count(), 5);
        assert_eq!(edited.status(), RunStatus::Stopped);
    }

    #[test]
    fn error_messages_name_the_command() {
        let mut run = three_segment_run();
        let err = run.save().unwrap_err();
        assert_eq!(
            err.to_string(),
            "save_run is not valid while the run is stopped at segment 0"
        );
    }
}
