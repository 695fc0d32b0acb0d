use serde::{Deserialize, Serialize};

use super::{Run, RunError, RunStatus, Segment};

/// Plain data view of a run, used for rendering and persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSnapshot {
    pub title: String,
    pub goal: String,
    pub attempts_count: u32,
    pub runs_completed: u32,
    pub status: RunStatus,
    pub live_index: usize,
    pub segments: Vec<SegmentSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentSnapshot {
    pub name: String,
    pub split_time: Option<f64>,
    pub segment_time: Option<f64>,
    pub best_segment_time: Option<f64>,
    pub live_split_time: Option<f64>,
    pub live_segment_time: Option<f64>,
    #[serde(default)]
    pub skipped: bool,
}

impl From<&Segment> for SegmentSnapshot {
    fn from(segment: &Segment) -> Self {
        Self {
            name: segment.name().to_string(),
            split_time: segment.split_time(),
            segment_time: segment.segment_time(),
            best_segment_time: segment.best_segment_time(),
            live_split_time: segment.live_split_time(),
            live_segment_time: segment.live_segment_time(),
            skipped: segment.was_skipped(),
        }
    }
}

impl Run {
    pub fn snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            title: self.title.clone(),
            goal: self.goal.clone(),
            attempts_count: self.attempts_count,
            runs_completed: self.runs_completed,
            status: self.status,
            live_index: self.live_index,
            segments: self.segments.iter().map(SegmentSnapshot::from).collect(),
        }
    }

    /// Rebuild a run from its persisted fields. Live attempt data in the
    /// snapshot is ignored; the rehydrated run is stopped.
    pub fn from_snapshot(snapshot: RunSnapshot) -> Result<Self, RunError> {
        let segments = snapshot
            .segments
            .into_iter()
            .map(|s| Segment::with_times(s.name, s.split_time, s.segment_time, s.best_segment_time))
            .collect();
        Run::new(
            snapshot.title,
            snapshot.goal,
            snapshot.attempts_count,
            snapshot.runs_completed,
            segments,
        )
    }
}
