use chrono::prelude::*;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use crate::format;
use crate::run::{Run, SaveOutcome};

const HEADER: [&str; 8] = [
    "date",
    "title",
    "final_time",
    "sum_of_best",
    "runs_completed",
    "attempts",
    "improved_splits",
    "new_golds",
];

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("history i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("history csv failed: {0}")]
    Csv(#[from] csv::Error),
}

/// Append-only CSV log with one row per saved run
#[derive(Debug, Clone)]
pub struct HistoryLog {
    path: PathBuf,
}

impl HistoryLog {
    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `run` is the run right after the save, so its bests already include the attempt
    pub fn append(&self, run: &Run, outcome: &SaveOutcome) -> Result<(), HistoryError> {
        self.append_at(Local::now(), run, outcome)
    }

    pub fn append_at<Tz: TimeZone>(
        &self,
        at: DateTime<Tz>,
        run: &Run,
        outcome: &SaveOutcome,
    ) -> Result<(), HistoryError>
    where
        Tz::Offset: std::fmt::Display,
    {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        // Header goes in only when the file is new
        let needs_header = !self.path.exists();
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;
        let mut writer = csv::Writer::from_writer(file);

        if needs_header {
            writer.write_record(HEADER)?;
        }
        writer.write_record([
            at.to_rfc3339(),
            run.title().to_string(),
            format::optional_time(outcome.final_time),
            format::optional_time(run.sum_of_best()),
            run.runs_completed().to_string(),
            run.attempts_count().to_string(),
            outcome.improved_splits.to_string(),
            outcome.new_golds.to_string(),
        ])?;
        writer.flush()?;

        log::debug!("history row appended to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run::Segment;
    use tempfile::tempdir;

    fn saved_run() -> (Run, SaveOutcome) {
        let mut run = Run::new(
            "Any%, glitchless",
            "Sub 20",
            0,
            0,
            vec![
                Segment::new("Forest"),
                Segment::new("Lake"),
            ],
        )
        .unwrap();
        run.start().unwrap();
        run.split(9.5, 9.5).unwrap();
        run.split(16.0, 6.5).unwrap();
        let outcome = run.save().unwrap();
        (run, outcome)
    }

    #[test]
    fn header_is_written_once() {
        let dir = tempdir().unwrap();
        let log = HistoryLog::with_path(dir.path().join("state").join("history.csv"));
        let (run, outcome) = saved_run();
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

        log.append_at(at, &run, &outcome).unwrap();
        log.append_at(at, &run, &outcome).unwrap();

        let text = fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("date,title,final_time"));
        assert_eq!(
            lines[1],
            "2024-05-01T12:00:00+00:00,\"Any%, glitchless\",16.00,16.00,1,1,2,2"
        );
    }

    #[test]
    fn rows_parse_back_as_csv() {
        let dir = tempdir().unwrap();
        let log = HistoryLog::with_path(dir.path().join("history.csv"));
        let (run, outcome) = saved_run();
        log.append(&run, &outcome).unwrap();

        let mut reader = csv::Reader::from_path(log.path()).unwrap();
        let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(records.len(), 1);
        assert_eq!(&records[0][1], "Any%, glitchless");
        assert_eq!(&records[0][2], "16.00");
    }
}
