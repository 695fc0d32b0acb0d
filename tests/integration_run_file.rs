use assert_matches::assert_matches;
use tempfile::tempdir;

use splitz::clock::ManualSource;
use splitz::run_file::{self, RunFileError};
use splitz::session::{Session, SessionError};
use splitz::{Run, Segment};

fn run() -> Run {
    Run::new(
        "Glitchless",
        "Sub 1:05",
        7,
        2,
        vec![
            Segment::with_times("Tutorial", Some(12.34), Some(12.34), Some(11.9)),
            Segment::new("Boss"),
            Segment::with_times("Escape", Some(65.0), Some(20.0), Some(18.5)),
        ],
    )
    .unwrap()
}

#[test]
fn written_run_loads_back_with_missing_times() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("runs").join("glitchless.fss");

    let mut session = Session::with_run(ManualSource::new(), run(), None);
    let written = session.write_run_file(Some(&path)).unwrap();
    assert_eq!(written, path);
    assert_eq!(session.run_path(), Some(path.as_path()));

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("\nBoss-0-0-0\n"));

    let loaded = run_file::load_run(&path).unwrap();
    assert_eq!(loaded.segments()[1].split_time(), None);
    assert_eq!(loaded.segments()[0].best_segment_time(), Some(11.9));
    assert_eq!(loaded.runs_completed(), 2);
    assert_eq!(loaded.goal(), "Sub 1:05");
}

#[test]
fn failed_load_keeps_the_current_run() {
    let dir = tempdir().unwrap();
    let bad = dir.path().join("bad.fss");
    std::fs::write(&bad, "Title\nGoal\nmany\n0\nA-1-1-1\n").unwrap();

    let mut session = Session::with_run(ManualSource::new(), run(), None);
    let err = session.load_run(&bad).unwrap_err();
    assert_matches!(&err, SessionError::RunFile(e) if e.is_malformed());
    assert_eq!(session.run().unwrap().title(), "Glitchless");

    let missing = session.load_run(&dir.path().join("nope.fss")).unwrap_err();
    assert_matches!(missing, SessionError::RunFile(RunFileError::Io(_)));
}

#[test]
fn clock_text_times_are_accepted() {
    let run = run_file::parse_run("Any%\n\n0\n0\nLevel 1-1:02:03.50-1:02:03.50-0:59.99\n").unwrap();
    assert_eq!(run.segments()[0].split_time(), Some(3723.5));
    assert_eq!(run.segments()[0].best_segment_time(), Some(59.99));
}

#[test]
fn names_with_separators_are_refused_on_save() {
    let dir = tempdir().unwrap();
    let run = Run::new("Any%", "", 0, 0, vec![Segment::new("1-1")]).unwrap();
    let mut session = Session::with_run(ManualSource::new(), run, Some(dir.path().join("a.fss")));

    assert_matches!(
        session.write_run_file(None),
        Err(SessionError::RunFile(RunFileError::InvalidSegmentName(name))) if name == "1-1"
    );
    assert!(!dir.path().join("a.fss").exists());
}
