//! The layout document: colors for every delta style and clock state, and
//! which information rows sit above or below the segment list.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ratatui::style::Color;
use serde::{Deserialize, Serialize};

use crate::info::InfoRowKind;
use crate::run::DeltaStyle;
use crate::session::TimerState;

#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("layout i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("layout is not valid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{key}: {value:?} is not a color")]
    Color { key: String, value: String },
    #[error("information row {0} is placed more than once")]
    DuplicateRow(InfoRowKind),
}

/// The document as stored on disk. Colors are ratatui color names, indexes
/// or `#rrggbb`; keys left out keep their default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutDocument {
    pub above: Vec<InfoRowKind>,
    pub below: Vec<InfoRowKind>,
    pub delta_colors: BTreeMap<DeltaStyle, String>,
    pub timer_colors: BTreeMap<TimerState, String>,
    pub segment_timer_colors: BTreeMap<TimerState, String>,
    pub current_segment: String,
    pub text: String,
}

fn colors<K: Ord>(entries: impl IntoIterator<Item = (K, &'static str)>) -> BTreeMap<K, String> {
    entries
        .into_iter()
        .map(|(key, color)| (key, color.to_string()))
        .collect()
}

impl Default for LayoutDocument {
    fn default() -> Self {
        Self {
            above: vec![InfoRowKind::Title, InfoRowKind::Goal],
            below: vec![
                InfoRowKind::PreviousSegment,
                InfoRowKind::PossibleTimeSave,
                InfoRowKind::PredictedTime,
                InfoRowKind::SumOfBest,
            ],
            delta_colors: colors([
                (DeltaStyle::BehindLosing, "red"),
                (DeltaStyle::BehindSaving, "lightred"),
                (DeltaStyle::AheadLosing, "lightgreen"),
                (DeltaStyle::AheadSaving, "green"),
                (DeltaStyle::BestSegment, "yellow"),
                (DeltaStyle::Neutral, "white"),
            ]),
            timer_colors: colors([
                (TimerState::NotRunning, "gray"),
                (TimerState::Running, "green"),
                (TimerState::Paused, "blue"),
                (TimerState::Behind, "red"),
            ]),
            segment_timer_colors: colors([
                (TimerState::NotRunning, "darkgray"),
                (TimerState::Running, "green"),
                (TimerState::Paused, "blue"),
                (TimerState::Behind, "red"),
            ]),
            current_segment: "#1e3a5f".to_string(),
            text: "white".to_string(),
        }
    }
}

/// A checked layout document with resolved colors
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub above: Vec<InfoRowKind>,
    pub below: Vec<InfoRowKind>,
    delta_colors: BTreeMap<DeltaStyle, Color>,
    timer_colors: BTreeMap<TimerState, Color>,
    segment_timer_colors: BTreeMap<TimerState, Color>,
    pub current_segment: Color,
    pub text: Color,
}

impl Theme {
    pub fn from_document(doc: &LayoutDocument) -> Result<Self, LayoutError> {
        let mut placed = BTreeSet::new();
        if let Some(kind) = doc.above.iter().chain(&doc.below).find(|kind| !placed.insert(**kind)) {
            return Err(LayoutError::DuplicateRow(*kind));
        }

        let defaults = LayoutDocument::default();
        Ok(Self {
            above: doc.above.clone(),
            below: doc.below.clone(),
            delta_colors: resolve_map("delta_colors", &defaults.delta_colors, &doc.delta_colors)?,
            timer_colors: resolve_map("timer_colors", &defaults.timer_colors, &doc.timer_colors)?,
            segment_timer_colors: resolve_map(
                "segment_timer_colors",
                &defaults.segment_timer_colors,
                &doc.segment_timer_colors,
            )?,
            current_segment: parse_color("current_segment", &doc.current_segment)?,
            text: parse_color("text", &doc.text)?,
        })
    }

    pub fn delta_color(&self, style: DeltaStyle) -> Color {
        self.delta_colors.get(&style).copied().unwrap_or(self.text)
    }

    pub fn timer_color(&self, state: TimerState) -> Color {
        self.timer_colors.get(&state).copied().unwrap_or(self.text)
    }

    pub fn segment_timer_color(&self, state: TimerState) -> Color {
        self.segment_timer_colors
            .get(&state)
            .copied()
            .unwrap_or(self.text)
    }
}

impl Default for Theme {
    fn default() -> Self {
        let doc = LayoutDocument::default();
        // the default document only names valid colors
        Self::from_document(&doc).unwrap_or_else(|_| Self {
            above: doc.above,
            below: doc.below,
            delta_colors: BTreeMap::new(),
            timer_colors: BTreeMap::new(),
            segment_timer_colors: BTreeMap::new(),
            current_segment: Color::Blue,
            text: Color::White,
        })
    }
}

fn parse_color(key: &str, value: &str) -> Result<Color, LayoutError> {
    Color::from_str(value).map_err(|_| LayoutError::Color {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn resolve_map<K: Ord + Copy + std::fmt::Display>(
    name: &str,
    defaults: &BTreeMap<K, String>,
    overrides: &BTreeMap<K, String>,
) -> Result<BTreeMap<K, Color>, LayoutError> {
    defaults
        .iter()
        .chain(overrides)
        .map(|(key, value)| -> Result<(K, Color), LayoutError> {
            Ok((*key, parse_color(&format!("{name}.{key}"), value)?))
        })
        .collect()
}

pub trait LayoutStore {
    fn load(&self) -> Result<LayoutDocument, LayoutError>;
    fn save(&self, doc: &LayoutDocument) -> Result<(), LayoutError>;
}

#[derive(Debug, Clone)]
pub struct FileLayoutStore {
    path: PathBuf,
}

impl FileLayoutStore {
    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored theme, or the default one if the document is missing or invalid
    pub fn theme_or_default(&self) -> Theme {
        match self.load().and_then(|doc| Theme::from_document(&doc)) {
            Ok(theme) => theme,
            Err(err) => {
                log::warn!("using default layout, {}: {err}", self.path.display());
                Theme::default()
            }
        }
    }
}

impl LayoutStore for FileLayoutStore {
    fn load(&self) -> Result<LayoutDocument, LayoutError> {
        let bytes = fs::read(&self.path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn save(&self, doc: &LayoutDocument) -> Result<(), LayoutError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(doc)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    #[test]
    fn default_theme_resolves_every_style() {
        let theme = Theme::default();
        assert_eq!(theme.delta_color(DeltaStyle::BehindLosing), Color::Red);
        assert_eq!(theme.delta_color(DeltaStyle::BestSegment), Color::Yellow);
        assert_eq!(theme.timer_color(TimerState::Running), Color::Green);
        assert_eq!(theme.segment_timer_color(TimerState::NotRunning), Color::DarkGray);
        assert_eq!(theme.current_segment, Color::Rgb(0x1e, 0x3a, 0x5f));
        assert_eq!(theme.above, vec![InfoRowKind::Title, InfoRowKind::Goal]);
    }

    #[test]
    fn partial_document_keeps_other_defaults() {
        let doc: LayoutDocument =
            serde_json::from_str(r##"{ "delta_colors": { "best_segment": "#ffd700" } }"##).unwrap();
        let theme = Theme::from_document(&doc).unwrap();
        assert_eq!(
            theme.delta_color(DeltaStyle::BestSegment),
            Color::Rgb(0xff, 0xd7, 0x00)
        );
        assert_eq!(theme.delta_color(DeltaStyle::AheadSaving), Color::Green);
        assert_eq!(theme.below.len(), 4);
    }

    #[test]
    fn rejects_unknown_color() {
        let mut doc = LayoutDocument::default();
        doc.timer_colors.insert(TimerState::Paused, "blurple".into());
        assert_matches!(
            Theme::from_document(&doc),
            Err(LayoutError::Color { key, .. }) if key == "timer_colors.paused"
        );
    }

    #[test]
    fn rejects_row_placed_twice() {
        let doc = LayoutDocument {
            above: vec![InfoRowKind::Title],
            below: vec![InfoRowKind::SumOfBest, InfoRowKind::Title],
            ..LayoutDocument::default()
        };
        assert_matches!(
            Theme::from_document(&doc),
            Err(LayoutError::DuplicateRow(InfoRowKind::Title))
        );
    }

    #[test]
    fn rows_can_be_hidden_or_moved() {
        let doc = LayoutDocument {
            above: vec![InfoRowKind::Title, InfoRowKind::SumOfBest],
            below: vec![],
            ..LayoutDocument::default()
        };
        let theme = Theme::from_document(&doc).unwrap();
        assert_eq!(theme.above, vec![InfoRowKind::Title, InfoRowKind::SumOfBest]);
        assert!(theme.below.is_empty());
    }

    #[test]
    fn store_roundtrip_and_fallback() {
        let dir = tempdir().unwrap();
        let store = FileLayoutStore::with_path(dir.path().join("layouts").join("dark.json"));
        assert_eq!(store.theme_or_default(), Theme::default());

        let doc = LayoutDocument {
            text: "lightcyan".into(),
            ..LayoutDocument::default()
        };
        store.save(&doc).unwrap();
        assert_eq!(store.load().unwrap(), doc);
        assert_eq!(store.theme_or_default().text, Color::LightCyan);

        fs::write(store.path(), "<layout/>").unwrap();
        assert_matches!(store.load(), Err(LayoutError::Json(_)));
        assert_eq!(store.theme_or_default(), Theme::default());
    }
}
