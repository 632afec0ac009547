//! Fleet view - one row per server with its liveness badge

use ratatui::{
    Frame,
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
};

use crate::app::AppState;

/// Render the fleet table, or the empty/error placeholder
pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
    if state.fleet.servers.is_empty() {
        let message = match &state.fleet.error {
            Some(error) => error.clone(),
            None => "No servers reported yet".to_string(),
        };

        let placeholder = Paragraph::new(message)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title("Servers"));

        frame.render_widget(placeholder, area);
        return;
    }

    let rows: Vec<Row> = state
        .fleet
        .servers
        .iter()
        .enumerate()
        .map(|(i, server)| {
            let (badge, badge_color) = if server.alive {
                ("● ALIVE", Color::Green)
            } else {
                ("○ DEAD", Color::Red)
            };

            let last_seen = server
                .last_seen
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "never".to_string());

            let mut style = Style::default();
            if i == state.selected_server {
                style = style.bg(Color::DarkGray).add_modifier(Modifier::BOLD);
            }

            Row::new(vec![
                Cell::from(server.server_id.clone()),
                Cell::from(server.ip_address.clone()),
                Cell::from(last_seen),
                Cell::from(badge).style(Style::default().fg(badge_color)),
            ])
            .style(style)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(30),
            Constraint::Percentage(25),
            Constraint::Percentage(30),
            Constraint::Percentage(15),
        ],
    )
    .header(
        Row::new(vec!["Server", "IP", "Last seen", "Status"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Servers ({})", state.fleet.servers.len())),
    );

    frame.render_widget(table, area);
}
