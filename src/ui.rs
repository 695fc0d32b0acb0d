pub mod segments;

use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, StatefulWidget, TableState, Widget},
};

use splitz::{
    clock::TimeSource,
    format,
    info::{InfoRow, InfoRowKind},
    keymap::Action,
    run::DeltaStyle,
    Run, RunStatus,
};

use crate::App;

const HORIZONTAL_MARGIN: u16 = 2;
const VERTICAL_MARGIN: u16 = 1;
const SEGMENT_TIMER_LINES: u16 = 2;

const RUN_LEGEND: [(Action, &str); 7] = [
    (Action::Split, "split"),
    (Action::Unsplit, "unsplit"),
    (Action::Skip, "skip"),
    (Action::Pause, "pause"),
    (Action::Reset, "reset"),
    (Action::WriteRunFile, "save"),
    (Action::Quit, "quit"),
];

const TIMER_LEGEND: [(Action, &str); 4] = [
    (Action::Split, "start/stop"),
    (Action::Pause, "pause"),
    (Action::Reset, "reset"),
    (Action::Quit, "quit"),
];

impl<S: TimeSource + Clone> Widget for &App<S> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.session.run() {
            Some(run) => render_run(self, run, area, buf),
            None => render_timer_only(self, area, buf),
        }
    }
}

fn render_timer_only<S: TimeSource + Clone>(app: &App<S>, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .split(area);

    main_clock(app)
        .alignment(Alignment::Center)
        .render(chunks[1], buf);
    footer(app, &TIMER_LEGEND).render(chunks[3], buf);
}

fn render_run<S: TimeSource + Clone>(app: &App<S>, run: &Run, area: Rect, buf: &mut Buffer) {
    let theme = &app.theme;
    let segment_elapsed = app.session.segment_elapsed();
    let run_elapsed = app.session.run_elapsed();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(theme.above.len() as u16),
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(SEGMENT_TIMER_LINES),
            Constraint::Length(theme.below.len() as u16),
            Constraint::Length(1),
        ])
        .split(area);

    let info_rows = |kinds: &[InfoRowKind]| {
        kinds
            .iter()
            .map(|kind| kind.row(run, segment_elapsed))
            .collect_vec()
    };
    render_info_rows(app, &info_rows(&theme.above), chunks[0], buf);

    let name_width = segments::name_width(chunks[1].width);
    let rows = (0..run.segments().len())
        .map(|index| segments::row_data(run, index, run_elapsed, segment_elapsed))
        .map(|data| segments::present_row(&data, theme, name_width))
        .collect_vec();
    // keep the segment being raced on screen when the list is taller than the panel
    let selected = match run.status() {
        RunStatus::Stopped => None,
        RunStatus::OnGoing => Some(run.live_index()),
        RunStatus::Done => Some(run.segments().len().saturating_sub(1)),
    };
    let mut state = TableState::default().with_selected(selected);
    StatefulWidget::render(segments::table(rows), chunks[1], buf, &mut state);

    main_clock(app)
        .alignment(Alignment::Right)
        .render(chunks[2], buf);
    render_segment_timer(app, chunks[3], buf);
    render_info_rows(app, &info_rows(&theme.below), chunks[4], buf);
    footer(app, &RUN_LEGEND).render(chunks[5], buf);
}

fn main_clock<S: TimeSource + Clone>(app: &App<S>) -> Paragraph<'static> {
    let style = Style::default()
        .fg(app.theme.timer_color(app.session.timer_state()))
        .add_modifier(Modifier::BOLD);
    Paragraph::new(Span::styled(
        format::clock(app.session.displayed_run_time()),
        style,
    ))
}

fn render_segment_timer<S: TimeSource + Clone>(app: &App<S>, area: Rect, buf: &mut Buffer) {
    let Some(timer) = app.session.segment_timer() else {
        return;
    };
    let text = Style::default().fg(app.theme.text);
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Fill(1), Constraint::Length(segments::TIME_WIDTH)])
        .split(area);

    Paragraph::new(vec![
        Line::styled(format!("PB: {}", format::optional_time(timer.personal_best)), text),
        Line::styled(format!("BEST: {}", format::optional_time(timer.best)), text),
    ])
    .render(chunks[0], buf);

    let elapsed_style = Style::default()
        .fg(app.theme.segment_timer_color(app.session.segment_timer_state()))
        .add_modifier(Modifier::BOLD);
    Paragraph::new(Span::styled(format::time(timer.elapsed), elapsed_style))
        .alignment(Alignment::Right)
        .render(chunks[1], buf);
}

fn render_info_rows<S: TimeSource + Clone>(
    app: &App<S>,
    rows: &[InfoRow],
    area: Rect,
    buf: &mut Buffer,
) {
    let theme = &app.theme;
    for (row, y) in rows.iter().zip(area.top()..area.bottom()) {
        let line = Rect::new(area.x, y, area.width, 1);
        let mut primary = Style::default().fg(theme.text);
        if row.kind == InfoRowKind::Title {
            primary = primary.add_modifier(Modifier::BOLD);
        }
        Paragraph::new(Span::styled(row.primary.clone(), primary)).render(line, buf);

        if let Some(secondary) = &row.secondary {
            let color = match row.kind {
                InfoRowKind::PreviousSegment => theme.delta_color(row.style),
                _ => theme.text,
            };
            Paragraph::new(Span::styled(secondary.clone(), Style::default().fg(color)))
                .alignment(Alignment::Right)
                .render(line, buf);
        }
    }
}

/// The last message, or the key legend when there is none
fn footer<S: TimeSource + Clone>(app: &App<S>, legend: &[(Action, &str)]) -> Paragraph<'static> {
    if let Some(message) = &app.message {
        return Paragraph::new(Span::styled(
            message.clone(),
            Style::default()
                .fg(app.theme.delta_color(DeltaStyle::BestSegment))
                .add_modifier(Modifier::ITALIC),
        ));
    }

    let text = legend
        .iter()
        .filter_map(|(action, label)| {
            app.keymap
                .key_for(*action)
                .map(|key| format!("({key}) {label}"))
        })
        .join("  ");
    Paragraph::new(Span::styled(
        text,
        Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM),
    ))
}
