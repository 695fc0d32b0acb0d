//! Information rows shown around the segment list.

use serde::{Deserialize, Serialize};

use crate::format;
use crate::run::{DeltaStyle, Run, SegmentComparison};

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
pub enum InfoRowKind {
    Title,
    Goal,
    PreviousSegment,
    PossibleTimeSave,
    PredictedTime,
    SumOfBest,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InfoRow {
    pub kind: InfoRowKind,
    pub primary: String,
    pub secondary: Option<String>,
    pub style: DeltaStyle,
}

impl InfoRowKind {
    pub const ALL: [InfoRowKind; 6] = [
        InfoRowKind::Title,
        InfoRowKind::Goal,
        InfoRowKind::PreviousSegment,
        InfoRowKind::PossibleTimeSave,
        InfoRowKind::PredictedTime,
        InfoRowKind::SumOfBest,
    ];

    pub fn row(self, run: &Run, segment_elapsed: f64) -> InfoRow {
        let (primary, secondary, style) = match self {
            InfoRowKind::Title => (
                run.title().to_string(),
                Some(format!("{}/{}", run.runs_completed(), run.attempts_count())),
                DeltaStyle::Neutral,
            ),
            InfoRowKind::Goal => (format!("Goal: {}", run.goal()), None, DeltaStyle::Neutral),
            InfoRowKind::PreviousSegment => match run.segment_comparison(segment_elapsed) {
                SegmentComparison::Live(live) => (
                    "Live segment: ".to_string(),
                    Some(format::delta(live.delta)),
                    live.style,
                ),
                SegmentComparison::Previous(previous) => (
                    "Previous segment: ".to_string(),
                    Some(format::delta(previous.delta)),
                    previous.style,
                ),
                SegmentComparison::Unavailable => (
                    "Previous segment: ".to_string(),
                    Some(format::PLACEHOLDER.to_string()),
                    DeltaStyle::Neutral,
                ),
            },
            InfoRowKind::PossibleTimeSave => (
                "Possible time save: ".to_string(),
                Some(format::optional_time(run.possible_time_save())),
                DeltaStyle::Neutral,
            ),
            InfoRowKind::PredictedTime => (
                "Predicted time: ".to_string(),
                Some(format::optional_time(run.predicted_time())),
                DeltaStyle::Neutral,
            ),
            InfoRowKind::SumOfBest => (
                "Sum of best: ".to_string(),
                Some(format::optional_time(run.sum_of_best())),
                DeltaStyle::Neutral,
            ),
        };
        InfoRow {
            kind: self,
            primary,
            secondary,
            style,
        }
    }
}
