//! Dashboard rendering
//!
//! `compose` lays the current view out as positioned text rows; `draw` paints
//! them with ratatui. Keeping layout free of the terminal makes it testable.

use activity_stream_core::timeline::most_recent_first;
use activity_stream_core::{ActivityRecord, AggregatedState, Component, StreamFilter};
use chrono::{DateTime, Local, TimeZone};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

pub const TITLE: &str = "Activity Stream";
pub const HEARTBEAT_TEXT: &str = "System active - no events";
pub const FOOTER_TEXT: &str = "q quit  c clear";
pub const EMERGENCY_MARKER: &str = "!!! ";
pub const STALE_LABEL: &str = "stale";
const ELLIPSIS: &str = "...";

/// Rows from `height - BOTTOM_MARGIN` down are never used for the timeline.
pub const BOTTOM_MARGIN: u16 = 2;
const SUMMARY_ROW: u16 = 2;
const BODY_START: u16 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Title,
    Notice,
    Summary,
    Record(Component),
    Heartbeat,
    Footer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub y: u16,
    pub text: String,
    pub kind: RowKind,
}

/// Everything one frame needs.
pub struct View<'a> {
    pub filter: StreamFilter,
    pub state: &'a AggregatedState,
    /// Wall-clock time of the last heartbeat while the view has been empty.
    pub heartbeat_at: Option<DateTime<Local>>,
    /// One-line error from a failed cycle, shown in place of the title.
    pub notice: Option<&'a str>,
    pub max_rows: usize,
}

pub fn compose(view: &View<'_>, width: u16, height: u16) -> Vec<Row> {
    let mut rows = Vec::new();
    if width == 0 || height == 0 {
        return rows;
    }
    let width = width as usize;

    let header = match view.notice {
        Some(notice) => Row {
            y: 0,
            text: fit(&format!("Error: {notice}"), width),
            kind: RowKind::Notice,
        },
        None => Row {
            y: 0,
            text: fit(&format!("{TITLE} - {}", view.filter.label()), width),
            kind: RowKind::Title,
        },
    };
    rows.push(header);

    if SUMMARY_ROW < height {
        let m = &view.state.metrics;
        let mut summary = format!("System: CPU {:.1}% | Memory {:.1}% | Disk {:.1}%", m.cpu, m.memory, m.disk);
        if !view.state.stale.is_empty() {
            let names: Vec<&str> = view.state.stale.iter().map(|c| c.as_str()).collect();
            summary.push_str(&format!(" | {STALE_LABEL}: {}", names.join(", ")));
        }
        rows.push(Row {
            y: SUMMARY_ROW,
            text: fit(&summary, width),
            kind: RowKind::Summary,
        });
    }

    let limit = height.saturating_sub(BOTTOM_MARGIN);
    let timeline = view.state.timeline();
    let mut y = BODY_START;

    if timeline.is_empty() {
        if let Some(at) = view.heartbeat_at.filter(|_| y < limit) {
            rows.push(Row {
                y,
                text: fit(&format!("{HEARTBEAT_TEXT} ({})", at.format("%H:%M:%S")), width),
                kind: RowKind::Heartbeat,
            });
        }
    } else {
        for record in most_recent_first(&timeline, view.max_rows) {
            if y >= limit {
                break;
            }
            rows.push(Row {
                y,
                text: fit(&record_line(record, &Local), width),
                kind: RowKind::Record(record.component),
            });
            y += 1;
        }
    }

    // never on top of the summary row
    if height > SUMMARY_ROW + 1 {
        rows.push(Row {
            y: height - 1,
            text: fit(FOOTER_TEXT, width),
            kind: RowKind::Footer,
        });
    }
    rows
}

/// `HH:MM:SS [component] description`, with the emergency marker in front.
pub fn record_line<Tz: TimeZone>(record: &ActivityRecord, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let line = format!(
        "{} [{}] {}",
        clock_label(record.time, tz),
        record.component,
        single_line(&record.description)
    );
    if record.component.is_emergency() {
        format!("{EMERGENCY_MARKER}{line}")
    } else {
        line
    }
}

pub fn clock_label<Tz: TimeZone>(secs: f64, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let whole = secs.floor();
    // a fraction just below 1 can round up to a full second
    let nanos = (((secs - whole) * 1e9) as u32).min(999_999_999);
    match DateTime::from_timestamp(whole as i64, nanos) {
        Some(t) => t.with_timezone(tz).format("%H:%M:%S").to_string(),
        None => "--:--:--".to_string(),
    }
}

fn single_line(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_control() { ' ' } else { c })
        .collect()
}

/// Cut `text` to `width` characters, ending in an ellipsis when shortened.
pub fn fit(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    if width <= ELLIPSIS.len() {
        return text.chars().take(width).collect();
    }
    let mut out: String = text.chars().take(width - ELLIPSIS.len()).collect();
    out.push_str(ELLIPSIS);
    out
}

/// Fixed component → color table.
pub fn component_color(component: Component) -> Color {
    match component {
        Component::Cognitive => Color::Green,
        Component::Sensory => Color::Cyan,
        Component::Ml => Color::Magenta,
        Component::Browser => Color::Blue,
        Component::Terminal => Color::Yellow,
        Component::Personality => Color::Magenta,
        Component::Emergency => Color::Red,
    }
}

pub fn row_style(kind: RowKind) -> Style {
    match kind {
        RowKind::Title => Style::default().add_modifier(Modifier::BOLD),
        RowKind::Notice => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        RowKind::Summary | RowKind::Heartbeat => Style::default().add_modifier(Modifier::DIM),
        RowKind::Record(Component::Emergency) => Style::default()
            .fg(Color::Red)
            .add_modifier(Modifier::BOLD),
        RowKind::Record(c) => Style::default().fg(component_color(c)),
        RowKind::Footer => Style::default().fg(Color::DarkGray),
    }
}

pub fn draw(frame: &mut Frame, rows: &[Row]) {
    let area = frame.area();
    for row in rows {
        if row.y >= area.height {
            continue;
        }
        let line = Line::from(Span::styled(row.text.as_str(), row_style(row.kind)));
        frame.render_widget(
            Paragraph::new(line),
            Rect::new(area.x, area.y + row.y, area.width, 1),
        );
    }
}
