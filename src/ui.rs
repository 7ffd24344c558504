use chrono::{DateTime, Local};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph, Wrap};
use ratatui::Frame;
use std::time::SystemTime;

use crate::app::App;
use crate::model::AircraftRecord;

pub const TITLE: &str = "OpenSky AI Cybersecurity Monitor";
pub const SUBTITLE: &str = "Real-time aircraft tracking and security analysis";
pub const NO_DATA_MESSAGE: &str = "No aircraft data available";
pub const PLACEHOLDER: &str = "N/A";

const CARD_MIN_WIDTH: u16 = 36;
const CARD_HEIGHT: u16 = 9;
const BUTTON_WIDTH: u16 = 18;

const ACCENT: Color = Color::Cyan;
const DIM: Color = Color::DarkGray;
const DANGER: Color = Color::Red;

pub fn ui(f: &mut Frame, app: &mut App) {
    let error_height = if app.error.is_some() { 3 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(error_height),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(f.area());

    render_header(f, chunks[0]);
    render_controls(f, chunks[1], app);
    if let Some(err) = &app.error {
        render_error(f, chunks[2], err);
    }
    render_grid(f, chunks[3], app);
    render_footer(f, chunks[4], app);
}

fn render_header(f: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(Span::styled(
            TITLE,
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(SUBTITLE, Style::default().fg(DIM))),
    ];
    let header = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::BOTTOM));
    f.render_widget(header, area);
}

fn render_controls(f: &mut Frame, area: Rect, app: &mut App) {
    let row = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(BUTTON_WIDTH), Constraint::Min(0)])
        .split(area);

    let button_style = if app.loading {
        Style::default().fg(DIM)
    } else {
        Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
    };
    let button = Paragraph::new(app.button_label())
        .alignment(Alignment::Center)
        .style(button_style)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(button_style),
        );
    f.render_widget(button, row[0]);
    app.set_button_area(row[0]);

    let last = app
        .last_update
        .map(format_system_time)
        .unwrap_or_else(|| "--".to_string());
    let mut spans = vec![
        Span::styled(
            format!("AIRCRAFT {}", app.records.len()),
            Style::default().fg(ACCENT),
        ),
        Span::raw(" | "),
        Span::raw(format!("LAST {last}")),
    ];
    if !app.auto_refresh.is_zero() {
        spans.push(Span::raw(" | "));
        spans.push(Span::raw(format!("AUTO {}s", app.auto_refresh.as_secs())));
    }
    spans.push(Span::raw(" | "));
    spans.push(Span::styled(
        format!("SRC {}", app.url),
        Style::default().fg(DIM),
    ));
    let status = Paragraph::new(vec![Line::raw(""), Line::from(spans)]);
    f.render_widget(status, row[1]);
}

fn render_error(f: &mut Frame, area: Rect, err: &str) {
    let style = Style::default().fg(DANGER).add_modifier(Modifier::BOLD);
    let banner = Paragraph::new(format!("Error: {err}"))
        .style(style)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(DANGER)),
        );
    f.render_widget(banner, area);
}

fn render_grid(f: &mut Frame, area: Rect, app: &mut App) {
    let columns = grid_columns(area.width);
    let visible_rows = (area.height / CARD_HEIGHT).max(1) as usize;
    let total_rows = app.records.len().div_ceil(columns);
    app.set_grid_extent(total_rows, visible_rows);

    if app.show_no_data() {
        let message = Paragraph::new(NO_DATA_MESSAGE)
            .alignment(Alignment::Center)
            .style(Style::default().fg(DIM));
        f.render_widget(message, area);
        return;
    }

    let card_width = area.width / columns as u16;
    let start = app.scroll * columns;
    for (slot, record) in app
        .records
        .iter()
        .skip(start)
        .take(visible_rows * columns)
        .enumerate()
    {
        let row = (slot / columns) as u16;
        let col = (slot % columns) as u16;
        let rect = Rect::new(
            area.x + col * card_width,
            area.y + row * CARD_HEIGHT,
            card_width,
            CARD_HEIGHT,
        )
        .intersection(area);
        if rect.is_empty() {
            continue;
        }
        render_card(f, rect, record);
    }
}

fn render_card(f: &mut Frame, area: Rect, record: &AircraftRecord) {
    let fields = card_fields(record);
    let mut lines = vec![
        field_line("ICAO24", fields.icao24),
        field_line("Country", fields.country),
        field_line("Altitude", fields.altitude),
        field_line("Velocity", fields.velocity),
        field_line("Position", fields.position),
        field_line("Last Contact", fields.last_contact),
    ];
    if let Some(status) = fields.status {
        lines.push(Line::from(Span::styled(status, Style::default().fg(DIM))));
    }
    let card = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .title(Span::styled(
                fields.title,
                Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
            )),
    );
    f.render_widget(card, area);
}

fn field_line(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("{label}: "),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(value),
    ])
}

fn render_footer(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![Span::styled(
        "r/Enter refresh  up/down scroll  PgUp/PgDn page  q quit",
        Style::default().fg(DIM),
    )];
    if app.max_scroll() > 0 {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!("ROW {}/{}", app.scroll + 1, app.max_scroll() + 1),
            Style::default().fg(ACCENT),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn grid_columns(width: u16) -> usize {
    (width / CARD_MIN_WIDTH).max(1) as usize
}

#[derive(Debug, PartialEq)]
struct CardFields {
    title: String,
    icao24: String,
    country: String,
    altitude: String,
    velocity: String,
    position: String,
    last_contact: String,
    status: Option<String>,
}

fn card_fields(record: &AircraftRecord) -> CardFields {
    CardFields {
        title: format_title(record.callsign.as_deref()),
        icao24: fmt_text(record.icao24.as_deref()),
        country: fmt_text(record.origin_country.as_deref()),
        altitude: format_altitude(record.baro_altitude),
        velocity: format_velocity(record.velocity),
        position: format_position(record.position()),
        last_contact: format_last_contact(record.time_position),
        status: format_status(record.on_ground, record.squawk.as_deref()),
    }
}

fn format_title(callsign: Option<&str>) -> String {
    match callsign.map(str::trim).filter(|v| !v.is_empty()) {
        Some(callsign) => format!("Aircraft {callsign}"),
        None => "Aircraft Unknown".to_string(),
    }
}

fn fmt_text(value: Option<&str>) -> String {
    value.unwrap_or(PLACEHOLDER).to_string()
}

fn format_altitude(value: Option<f64>) -> String {
    value
        .map(|v| format!("{v}m"))
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

fn format_velocity(value: Option<f64>) -> String {
    value
        .map(|v| format!("{v} m/s"))
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

fn format_position(position: Option<(f64, f64)>) -> String {
    position
        .map(|(lat, lon)| format!("{}, {}", fixed4(lat), fixed4(lon)))
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Four decimals, rounding exact ties away from zero. `-0.0` prints unsigned.
fn fixed4(value: f64) -> String {
    let mut magnitude = value.abs();
    // A value sits exactly on a fifth-decimal tie only if it is an odd
    // multiple of 1/32; std formatting would round those to even.
    let scaled = magnitude * 32.0;
    if scaled.fract() == 0.0 && scaled % 2.0 == 1.0 {
        magnitude = f64::from_bits(magnitude.to_bits() + 1);
    }
    let text = format!("{magnitude:.4}");
    if value < 0.0 {
        format!("-{text}")
    } else {
        text
    }
}

fn format_last_contact(ts: Option<i64>) -> String {
    ts.and_then(|ts| DateTime::from_timestamp(ts, 0))
        .map(|dt| {
            dt.with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        })
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

fn format_status(on_ground: Option<bool>, squawk: Option<&str>) -> Option<String> {
    let mut parts = Vec::new();
    match on_ground {
        Some(true) => parts.push("On Ground".to_string()),
        Some(false) => parts.push("Airborne".to_string()),
        None => {}
    }
    if let Some(code) = squawk.map(str::trim).filter(|v| !v.is_empty()) {
        parts.push(format!("Squawk {code}"));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" | "))
    }
}

fn format_system_time(time: SystemTime) -> String {
    let dt: DateTime<Local> = time.into();
    dt.format("%H:%M:%S").to_string()
}
