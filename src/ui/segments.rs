use ratatui::{
    layout::Constraint,
    style::{Modifier, Style},
    text::Line,
    widgets::{Cell, Row, Table},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use splitz::{
    format,
    layout::Theme,
    run::{DeltaStyle, LiveDelta},
    Run, RunStatus,
};

pub const DELTA_WIDTH: u16 = 10;
pub const TIME_WIDTH: u16 = 11;
const COLUMN_SPACING: u16 = 1;

/// Pure data for one segment row
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentRowData {
    pub name: String,
    pub delta: Option<LiveDelta>,
    /// This attempt's split once recorded, the personal best split before that
    pub time: Option<f64>,
    pub is_current: bool,
}

pub fn row_data(run: &Run, index: usize, run_elapsed: f64, segment_elapsed: f64) -> SegmentRowData {
    let segment = &run.segments()[index];
    let is_current = run.status() == RunStatus::OnGoing && index == run.live_index();
    let delta = if is_current {
        run.current_segment_delta(run_elapsed, segment_elapsed)
            .filter(|live| live.style != DeltaStyle::Neutral)
    } else {
        run.completed_segment_delta(index)
    };

    SegmentRowData {
        name: segment.name().to_string(),
        delta,
        time: segment.live_split_time().or(segment.split_time()),
        is_current,
    }
}

/// Pure presenter mapping row data to a table Row
pub fn present_row(data: &SegmentRowData, theme: &Theme, name_width: usize) -> Row<'static> {
    let text = Style::default().fg(theme.text);
    let delta_cell = match data.delta {
        Some(live) => Cell::from(
            Line::from(format::delta(live.delta)).right_aligned(),
        )
        .style(Style::default().fg(theme.delta_color(live.style))),
        None => Cell::from(""),
    };

    let row = Row::new(vec![
        Cell::from(truncate_to_width(&data.name, name_width)).style(text),
        delta_cell,
        Cell::from(Line::from(format::optional_time(data.time)).right_aligned()).style(text),
    ]);
    if data.is_current {
        row.style(
            Style::default()
                .bg(theme.current_segment)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        row
    }
}

pub fn table(rows: Vec<Row<'static>>) -> Table<'static> {
    Table::new(rows, widths()).column_spacing(COLUMN_SPACING)
}

fn widths() -> [Constraint; 3] {
    [
        Constraint::Fill(1),
        Constraint::Length(DELTA_WIDTH),
        Constraint::Length(TIME_WIDTH),
    ]
}

/// Room left for segment names once the delta and time columns are placed
pub fn name_width(total: u16) -> usize {
    total.saturating_sub(DELTA_WIDTH + TIME_WIDTH + 2 * COLUMN_SPACING) as usize
}

/// Cut `text` to `width` display columns, marking the cut with an ellipsis
pub fn truncate_to_width(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }

    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width - 1 {
            break;
        }
        used += w;
        out.push(c);
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::Color;
    use splitz::Segment;

    fn run() -> Run {
        Run::new(
            "Any%",
            "",
            2,
            1,
            vec![
                Segment::with_times("Forest", Some(10.0), Some(10.0), Some(9.0)),
                Segment::with_times("Lake", Some(15.0), Some(5.0), Some(5.0)),
                Segment::with_times("Castle", Some(25.0), Some(10.0), Some(9.0)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn rows_before_the_attempt_show_personal_best() {
        let run = run();
        let data = row_data(&run, 1, 0.0, 0.0);
        assert_eq!(
            data,
            SegmentRowData {
                name: "Lake".into(),
                delta: None,
                time: Some(15.0),
                is_current: false,
            }
        );
    }

    #[test]
    fn completed_and_current_rows() {
        let mut run = run();
        run.start().unwrap();
        run.split(8.5, 8.5).unwrap();

        let done = row_data(&run, 0, 12.0, 3.5);
        assert_eq!(done.time, Some(8.5));
        assert_eq!(
            done.delta,
            Some(LiveDelta {
                delta: -1.5,
                style: DeltaStyle::BestSegment
            })
        );

        // behind the run already
        let current = row_data(&run, 1, 16.0, 7.5);
        assert!(current.is_current);
        assert_eq!(current.delta.unwrap().style, DeltaStyle::BehindLosing);

        // still gaining on the run, but slower than this segment's own pace
        let hidden = row_data(&run, 1, 13.0, 5.5);
        assert_eq!(hidden.delta, None);
    }

    #[test]
    fn present_row_colors_delta() {
        let theme = Theme::default();
        let data = SegmentRowData {
            name: "Forest".into(),
            delta: Some(LiveDelta {
                delta: 1.25,
                style: DeltaStyle::BehindLosing,
            }),
            time: Some(11.25),
            is_current: true,
        };
        let table = table(vec![present_row(&data, &theme, 20)]);

        let area = ratatui::layout::Rect::new(0, 0, 40, 1);
        let mut buf = ratatui::buffer::Buffer::empty(area);
        ratatui::widgets::Widget::render(table, area, &mut buf);

        let line: String = (0..40).map(|x| buf[(x, 0)].symbol().to_string()).collect();
        assert!(line.starts_with("Forest"));
        assert!(line.contains("+1.25"));
        assert!(line.ends_with("11.25"));
        assert_eq!(buf[(0, 0)].bg, theme.current_segment);

        let plus = line.find('+').unwrap() as u16;
        assert_eq!(buf[(plus, 0)].fg, Color::Red);
    }

    #[test]
    fn truncates_wide_names() {
        assert_eq!(truncate_to_width("Forest", 10), "Forest");
        assert_eq!(truncate_to_width("Forest Temple", 8), "Forest …");
        assert_eq!(truncate_to_width("森の神殿", 5), "森の…");
        assert_eq!(truncate_to_width("Lake", 0), "");
    }

    #[test]
    fn name_width_leaves_room_for_times() {
        assert_eq!(name_width(40), 40 - 10 - 11 - 2);
        assert_eq!(name_width(5), 0);
    }
}
