/// What happened to a segment during the current attempt
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LiveTime {
    /// Not reached yet, or reopened by an unsplit
    Pending,
    /// Skipped; `elapsed` is the time spent in it, which never counts as a comparable time
    Skipped { elapsed: f64 },
    Recorded { split_time: f64, segment_time: f64 },
}

/// One leg of the run. Comparison times are `None` when there is no data.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    name: String,
    split_time: Option<f64>,
    segment_time: Option<f64>,
    best_segment_time: Option<f64>,
    pub(crate) live: LiveTime,
}

impl Segment {
    /// A segment with no comparison data yet
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_times(name, None, None, None)
    }

    pub fn with_times(
        name: impl Into<String>,
        split_time: Option<f64>,
        segment_time: Option<f64>,
        best_segment_time: Option<f64>,
    ) -> Self {
        Self {
            name: name.into(),
            split_time,
            segment_time,
            best_segment_time,
            live: LiveTime::Pending,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cumulative personal best time at the end of this segment
    pub fn split_time(&self) -> Option<f64> {
        self.split_time
    }

    /// Duration of this segment in the personal best run
    pub fn segment_time(&self) -> Option<f64> {
        self.segment_time
    }

    /// Fastest this segment has ever been completed (gold)
    pub fn best_segment_time(&self) -> Option<f64> {
        self.best_segment_time
    }

    pub fn live(&self) -> LiveTime {
        self.live
    }

    pub fn live_split_time(&self) -> Option<f64> {
        match self.live {
            LiveTime::Recorded { split_time, .. } => Some(split_time),
            _ => None,
        }
    }

    pub fn live_segment_time(&self) -> Option<f64> {
        match self.live {
            LiveTime::Recorded { segment_time, .. } => Some(segment_time),
            _ => None,
        }
    }

    pub fn was_skipped(&self) -> bool {
        matches!(self.live, LiveTime::Skipped { .. })
    }

    /// Time actually spent in the segment this attempt, skipped or not
    pub(crate) fn time_spent(&self) -> Option<f64> {
        match self.live {
            LiveTime::Pending => None,
            LiveTime::Skipped { elapsed } => Some(elapsed),
            LiveTime::Recorded { segment_time, .. } => Some(segment_time),
        }
    }

    /// Fold this attempt's recorded time into the stored bests.
    /// Returns (personal best updated, gold updated).
    pub(crate) fn commit_live(&mut self) -> (bool, bool) {
        let LiveTime::Recorded {
            split_time,
            segment_time,
        } = self.live
        else {
            return (false, false);
        };

        let improved_split = self.split_time.map_or(true, |pb| split_time <= pb);
        if improved_split {
            self.split_time = Some(split_time);
            self.segment_time = Some(segment_time);
        }

        let new_gold = self
            .best_segment_time
            .map_or(true, |gold| segment_time < gold);
        if new_gold {
            self.best_segment_time = Some(segment_time);
        }

        (improved_split, new_gold)
    }

    pub(crate) fn clear_live(&mut self) {
        self.live = LiveTime::Pending;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_segment_has_no_data() {
        let segment = Segment::new("Forest");
        assert_eq!(segment.name(), "Forest");
        assert_eq!(segment.split_time(), None);
        assert_eq!(segment.segment_time(), None);
        assert_eq!(segment.best_segment_time(), None);
        assert_eq!(segment.live(), LiveTime::Pending);
    }

    #[test]
    fn zero_duration_is_distinct_from_no_data() {
        let mut segment = Segment::new("Warp");
        segment.live = LiveTime::Recorded {
            split_time: 0.0,
            segment_time: 0.0,
        };
        assert_eq!(segment.live_segment_time(), Some(0.0));

        segment.live = LiveTime::Skipped { elapsed: 0.0 };
        assert_eq!(segment.live_segment_time(), None);
        assert!(segment.was_skipped());
        assert_eq!(segment.time_spent(), Some(0.0));
    }

    #[test]
    fn commit_keeps_better_stored_values() {
        let mut segment = Segment::with_times("Castle", Some(20.0), Some(8.0), Some(7.0));
        segment.live = LiveTime::Recorded {
            split_time: 21.0,
            segment_time: 7.5,
        };

        assert_eq!(segment.commit_live(), (false, false));
        assert_eq!(segment.split_time(), Some(20.0));
        assert_eq!(segment.segment_time(), Some(8.0));
        assert_eq!(segment.best_segment_time(), Some(7.0));
    }

    #[test]
    fn commit_tie_updates_personal_best_but_not_gold() {
        let mut segment = Segment::with_times("Castle", Some(20.0), Some(8.0), Some(7.0));
        segment.live = LiveTime::Recorded {
            split_time: 20.0,
            segment_time: 7.0,
        };

        assert_eq!(segment.commit_live(), (true, false));
        assert_eq!(segment.segment_time(), Some(7.0));
        assert_eq!(segment.best_segment_time(), Some(7.0));
    }

    #[test]
    fn commit_skipped_segment_is_a_no_op() {
        let mut segment = Segment::new("Skip me");
        segment.live = LiveTime::Skipped { elapsed: 0.01 };
        assert_eq!(segment.commit_live(), (false, false));
        assert_eq!(segment.best_segment_time(), None);
    }
}
