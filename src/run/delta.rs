//! Comparisons against the stored personal best.
//!
//! Every delta is signed seconds: positive means slower than the personal best,
//! negative means faster. `None` means there is nothing to compare against,
//! which is never the same thing as a zero delta.

use serde::{Deserialize, Serialize};

use super::{Run, RunStatus, Segment};

/// How a delta should be presented
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
pub enum DeltaStyle {
    BehindLosing,
    BehindSaving,
    AheadLosing,
    AheadSaving,
    BestSegment,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiveDelta {
    pub delta: f64,
    pub style: DeltaStyle,
}

/// What the "previous segment" information row compares
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SegmentComparison {
    /// Already slower than this segment's personal best pace
    Live(LiveDelta),
    /// Run delta of the most recently completed segment
    Previous(LiveDelta),
    Unavailable,
}

impl Run {
    pub fn segment_has_run_delta(&self, index: usize) -> bool {
        self.segments
            .get(index)
            .is_some_and(|s| s.split_time().is_some())
    }

    pub fn run_delta(&self, index: usize) -> Option<f64> {
        let segment = self.segments.get(index)?;
        Some(segment.live_split_time()? - segment.split_time()?)
    }

    /// Delta of the running attempt against the current segment's personal best split
    pub fn live_run_delta(&self, run_elapsed: f64) -> Option<f64> {
        let pb = self.current_segment()?.split_time()?;
        Some(run_elapsed - pb)
    }

    pub fn previous_segment_delta(&self) -> Option<f64> {
        self.live_index
            .checked_sub(1)
            .and_then(|index| self.run_delta(index))
    }

    pub fn live_segment_delta(&self, segment_elapsed: f64) -> Option<f64> {
        let pb = self.current_segment()?.segment_time()?;
        Some(segment_elapsed - pb)
    }

    /// True once the current segment has taken longer than it did in the personal best
    pub fn current_segment_has_live_delta(&self, segment_elapsed: f64) -> bool {
        self.live_segment_delta(segment_elapsed)
            .is_some_and(|delta| delta > 0.0)
    }

    /// Whether a completed segment tied or beat its gold. A tie counts as best.
    pub fn segment_is_best_segment(&self, index: usize) -> bool {
        self.segments.get(index).is_some_and(|segment| {
            match (segment.live_segment_time(), segment.best_segment_time()) {
                (Some(live), Some(gold)) => live <= gold,
                _ => false,
            }
        })
    }

    pub fn previous_segment_is_best_segment(&self) -> bool {
        self.live_index
            .checked_sub(1)
            .is_some_and(|index| self.segment_is_best_segment(index))
    }

    /// How much the segment at the live index could still give back versus its gold
    pub fn possible_time_save(&self) -> Option<f64> {
        let segment = self.segments.get(self.live_index)?;
        Some(segment.segment_time()? - segment.best_segment_time()?)
    }

    /// Actual time of the segments already behind us plus the personal best
    /// pace of the ones still ahead
    pub fn predicted_time(&self) -> Option<f64> {
        let (done, remaining) = self
            .segments
            .split_at(self.live_index.min(self.segments.len()));
        let actual: Option<f64> = done.iter().map(Segment::time_spent).sum();
        let projected: Option<f64> = remaining.iter().map(Segment::segment_time).sum();
        Some(actual? + projected?)
    }

    pub fn sum_of_best(&self) -> Option<f64> {
        self.segments.iter().map(Segment::best_segment_time).sum()
    }

    /// Run delta and styling for the segment being raced.
    ///
    /// The checks run in a fixed order:
    /// 1. behind the run: losing, unless the previous run delta was larger (catching up)
    /// 2. ahead of the run but worse than the previous run delta: ahead, losing ground
    /// 3. faster than this segment's own personal best pace: ahead and saving
    /// 4. otherwise neutral, which the presentation hides
    pub fn current_segment_delta(&self, run_elapsed: f64, segment_elapsed: f64) -> Option<LiveDelta> {
        if self.status != RunStatus::OnGoing || !self.segment_has_run_delta(self.live_index) {
            return None;
        }
        let delta = self.live_run_delta(run_elapsed)?;
        let previous = self.previous_segment_delta();

        let style = if delta > 0.0 {
            match previous {
                Some(previous) if previous > delta => DeltaStyle::BehindSaving,
                _ => DeltaStyle::BehindLosing,
            }
        } else if previous.is_some_and(|previous| delta > previous) {
            DeltaStyle::AheadLosing
        } else if self
            .current_segment()
            .and_then(Segment::segment_time)
            .is_some_and(|pb| segment_elapsed < pb)
        {
            DeltaStyle::AheadSaving
        } else {
            DeltaStyle::Neutral
        };

        Some(LiveDelta { delta, style })
    }

    /// Run delta and styling for a segment already completed this attempt
    pub fn completed_segment_delta(&self, index: usize) -> Option<LiveDelta> {
        if index >= self.live_index {
            return None;
        }
        let delta = self.run_delta(index)?;
        let previous = index.checked_sub(1).and_then(|i| self.run_delta(i));

        let style = if self.segment_is_best_segment(index) {
            DeltaStyle::BestSegment
        } else if delta > 0.0 {
            match previous {
                Some(previous) if previous > delta => DeltaStyle::BehindSaving,
                _ => DeltaStyle::BehindLosing,
            }
        } else if previous.is_some_and(|previous| delta > previous) {
            DeltaStyle::AheadLosing
        } else {
            DeltaStyle::AheadSaving
        };

        Some(LiveDelta { delta, style })
    }

    /// Live segment delta once the current segment runs over its personal best,
    /// the previous segment's run delta before that
    pub fn segment_comparison(&self, segment_elapsed: f64) -> SegmentComparison {
        if self.current_segment_has_live_delta(segment_elapsed) {
            if let Some(delta) = self.live_segment_delta(segment_elapsed) {
                return SegmentComparison::Live(LiveDelta {
                    delta,
                    style: DeltaStyle::BehindLosing,
                });
            }
        }

        match self.previous_segment_delta() {
            Some(delta) => {
                let style = if self.previous_segment_is_best_segment() {
                    DeltaStyle::BestSegment
                } else if delta > 0.0 {
                    DeltaStyle::BehindLosing
                } else {
                    DeltaStyle::AheadSaving
                };
                SegmentComparison::Previous(LiveDelta { delta, style })
            }
            None => SegmentComparison::Unavailable,
        }
    }
}
