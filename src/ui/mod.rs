//! UI rendering module

mod detail;
mod fleet;

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::app::AppState;

/// Render the dashboard
pub fn render(frame: &mut Frame, state: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(frame.area());

    render_header(frame, chunks[0], state);

    if state.detail.is_some() {
        detail::render(frame, chunks[1], state);
    } else {
        fleet::render(frame, chunks[1], state);
    }

    render_footer(frame, chunks[2], state);
}

fn render_header(frame: &mut Frame, area: Rect, state: &AppState) {
    let refreshed = state
        .fleet
        .refreshed_at
        .map(|t| format!("last refresh {}", t.format("%H:%M:%S")))
        .unwrap_or_else(|| "waiting for first poll".to_string());

    let title = match &state.detail {
        Some((server_id, _)) => format!("Fleetwatch - {server_id}"),
        None => "Fleetwatch".to_string(),
    };

    let header = Paragraph::new(Line::from(vec![
        Span::styled(title, Style::default().fg(Color::Cyan)),
        Span::raw(" | "),
        Span::styled(refreshed, Style::default().fg(Color::DarkGray)),
    ]))
    .block(Block::default().borders(Borders::ALL));

    frame.render_widget(header, area);
}

fn render_footer(frame: &mut Frame, area: Rect, state: &AppState) {
    let mut footer_text = vec![
        Span::raw("Select: "),
        Span::styled("↑/↓", Style::default().fg(Color::Yellow)),
        Span::raw(" | Detail: "),
        Span::styled("Enter", Style::default().fg(Color::Yellow)),
        Span::raw(" | Back: "),
        Span::styled("Esc", Style::default().fg(Color::Yellow)),
        Span::raw(" | Refresh: "),
        Span::styled("R", Style::default().fg(Color::Yellow)),
        Span::raw(" | Quit: "),
        Span::styled("Q", Style::default().fg(Color::Yellow)),
    ];

    // The active view's error wins the footer slot.
    let error = match &state.detail {
        Some((_, snapshot)) => snapshot.error.as_ref(),
        None => state.fleet.error.as_ref(),
    };

    if let Some(error) = error {
        footer_text.push(Span::raw(" | "));
        footer_text.push(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red),
        ));
    }

    let footer =
        Paragraph::new(Line::from(footer_text)).block(Block::default().borders(Borders::ALL));

    frame.render_widget(footer, area);
}
