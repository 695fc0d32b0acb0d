//! The flat run file:
//!
//! ```text
//! <title>
//! <goal>
//! <attempts>
//! <runs completed>
//! <name>-<pb split>-<pb segment>-<best segment>
//! ...
//! ```
//!
//! Times are decimal seconds and a bare `0` stands for "no data". A recorded
//! zero-length time is written as `0.00` so it survives a reload. Clock text
//! such as `1:02:05.50` is accepted when reading.

use std::fs;
use std::path::Path;

use crate::run::{Run, RunError, RunSnapshot, RunStatus, SegmentSnapshot};

pub const EXTENSION: &str = "fss";

const FIELD_SEPARATOR: char = '-';
const HEADER_LINES: usize = 4;
const NO_DATA: &str = "0";

#[derive(Debug, thiserror::Error)]
pub enum RunFileError {
    #[error("run file i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("not a recognized run file (line {line}): {reason}")]
    Malformed { line: usize, reason: String },
    #[error("not a recognized run file: {0}")]
    Invalid(#[from] RunError),
    #[error("segment name {0:?} cannot contain '-' or line breaks")]
    InvalidSegmentName(String),
    #[error("{0} cannot contain line breaks")]
    MultilineField(&'static str),
}

impl RunFileError {
    /// Whether the file was read but is not a run file (as opposed to an i/o failure)
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. } | Self::Invalid(_))
    }
}

fn malformed(line: usize, reason: impl Into<String>) -> RunFileError {
    RunFileError::Malformed {
        line,
        reason: reason.into(),
    }
}

pub fn parse_run(text: &str) -> Result<Run, RunFileError> {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() < HEADER_LINES {
        return Err(malformed(lines.len() + 1, "missing header lines"));
    }

    let title = lines[0].to_string();
    let goal = lines[1].to_string();
    let attempts_count = parse_count(lines[2], 3)?;
    let runs_completed = parse_count(lines[3], 4)?;

    let segments = lines
        .iter()
        .enumerate()
        .skip(HEADER_LINES)
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| parse_segment(line, index + 1))
        .collect::<Result<Vec<_>, _>>()?;
    if segments.is_empty() {
        return Err(malformed(lines.len() + 1, "no segments"));
    }

    let snapshot = RunSnapshot {
        title,
        goal,
        attempts_count,
        runs_completed,
        status: RunStatus::Stopped,
        live_index: 0,
        segments,
    };
    Ok(Run::from_snapshot(snapshot)?)
}

fn parse_count(field: &str, line: usize) -> Result<u32, RunFileError> {
    field
        .trim()
        .parse()
        .map_err(|_| malformed(line, format!("expected a count, found {field:?}")))
}

fn parse_segment(text: &str, line: usize) -> Result<SegmentSnapshot, RunFileError> {
    let fields: Vec<&str> = text.split(FIELD_SEPARATOR).collect();
    let [name, split_time, segment_time, best_segment_time] = fields.as_slice() else {
        return Err(malformed(
            line,
            format!("expected 4 fields, found {}", fields.len()),
        ));
    };
    if name.trim().is_empty() {
        return Err(malformed(line, "empty segment name"));
    }

    Ok(SegmentSnapshot {
        name: name.to_string(),
        split_time: parse_time(split_time, line)?,
        segment_time: parse_time(segment_time, line)?,
        best_segment_time: parse_time(best_segment_time, line)?,
        live_split_time: None,
        live_segment_time: None,
        skipped: false,
    })
}

fn parse_time(field: &str, line: usize) -> Result<Option<f64>, RunFileError> {
    let field = field.trim();
    let secs = if field.contains(':') {
        parse_clock_text(field)
    } else {
        field.parse::<f64>().ok()
    }
    .filter(|secs| secs.is_finite() && *secs >= 0.0)
    .ok_or_else(|| malformed(line, format!("expected a time, found {field:?}")))?;

    Ok((field != NO_DATA).then_some(secs))
}

fn parse_clock_text(field: &str) -> Option<f64> {
    let parts: Vec<&str> = field.split(':').collect();
    if parts.len() > 3 {
        return None;
    }
    let (seconds, whole) = parts.split_last()?;
    let seconds: f64 = seconds.parse().ok()?;
    let whole = whole.iter().try_fold(0u64, |acc, part| {
        let value = part.parse::<u64>().ok()?;
        acc.checked_mul(60)?.checked_add(value)
    })?;
    Some(whole as f64 * 60.0 + seconds)
}

pub fn render_run(run: &Run) -> Result<String, RunFileError> {
    let snapshot = run.snapshot();
    if snapshot.title.contains('\n') {
        return Err(RunFileError::MultilineField("title"));
    }
    if snapshot.goal.contains('\n') {
        return Err(RunFileError::MultilineField("goal"));
    }

    let mut out = format!(
        "{}\n{}\n{}\n{}\n",
        snapshot.title, snapshot.goal, snapshot.attempts_count, snapshot.runs_completed
    );
    for segment in &snapshot.segments {
        if segment.name.contains([FIELD_SEPARATOR, '\n', '\r']) {
            return Err(RunFileError::InvalidSegmentName(segment.name.clone()));
        }
        out.push_str(&format!(
            "{name}{sep}{}{sep}{}{sep}{}\n",
            render_time(segment.split_time),
            render_time(segment.segment_time),
            render_time(segment.best_segment_time),
            name = segment.name,
            sep = FIELD_SEPARATOR,
        ));
    }
    Ok(out)
}

fn render_time(secs: Option<f64>) -> String {
    match secs {
        None => NO_DATA.to_string(),
        Some(secs) if secs == 0.0 => "0.00".to_string(),
        Some(secs) => secs.to_string(),
    }
}

pub fn load_run(path: &Path) -> Result<Run, RunFileError> {
    let text = fs::read_to_string(path)?;
    let run = parse_run(&text)?;
    log::info!(
        "loaded {} ({} segments) from {}",
        run.title(),
        run.segments().len(),
        path.display()
    );
    Ok(run)
}

pub fn save_run(path: &Path, run: &Run) -> Result<(), RunFileError> {
    let text = render_run(run)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, text)?;
    log::info!("saved {} to {}", run.title(), path.display());
    Ok(())
}
