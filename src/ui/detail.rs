//! Server detail view - metric charts plus service status table

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    widgets::{Axis, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph, Row, Table},
};

use crate::ServiceStatusRecord;
use crate::app::AppState;
use crate::series::PlotSeries;

/// Render the detail view for the currently open server
pub fn render(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some((_, snapshot)) = &state.detail else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(35), // CPU chart
            Constraint::Percentage(35), // Memory chart
            Constraint::Min(0),         // Services
        ])
        .split(area);

    if snapshot.series.is_empty() {
        let message = match &snapshot.error {
            Some(error) => error.clone(),
            None => "No metrics reported yet".to_string(),
        };

        let placeholder = Paragraph::new(message)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title("Metrics"));

        frame.render_widget(placeholder, chunks[0]);
    } else {
        render_series_chart(
            frame,
            chunks[0],
            "CPU Usage (%)",
            Color::Cyan,
            &snapshot.series,
            &snapshot.series.cpu,
        );
        render_series_chart(
            frame,
            chunks[1],
            "Memory (MB)",
            Color::Magenta,
            &snapshot.series,
            &snapshot.series.memory,
        );
    }

    render_services(frame, chunks[2], &snapshot.services);
}

/// Render one numeric series as a line chart, x-axis labeled from the
/// series' time labels
fn render_series_chart(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    color: Color,
    series: &PlotSeries,
    values: &[f64],
) {
    if values.is_empty() {
        return;
    }

    let data: Vec<(f64, f64)> = values
        .iter()
        .enumerate()
        .map(|(i, v)| (i as f64, *v))
        .collect();

    let max_value = values.iter().copied().fold(0.0, f64::max).max(1.0);
    let x_max = data.len().max(10) as f64;

    // labels track the cpu series; the memory series may be a different
    // length, so guard the lookup instead of assuming alignment.
    let first_label = series.labels.first().cloned().unwrap_or_default();
    let last_label = series
        .labels
        .get(values.len().saturating_sub(1))
        .cloned()
        .unwrap_or_default();

    let datasets = vec![
        Dataset::default()
            .name(title.to_string())
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(color))
            .data(&data),
    ];

    let chart = Chart::new(datasets)
        .block(Block::default().borders(Borders::ALL).title(title.to_string()))
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .labels(vec![first_label, last_label])
                .bounds([0.0, x_max]),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::Gray))
                .labels(vec![
                    "0".to_string(),
                    format!("{:.0}", max_value / 2.0),
                    format!("{:.0}", max_value),
                ])
                .bounds([0.0, max_value]),
        );

    frame.render_widget(chart, area);
}

fn render_services(frame: &mut Frame, area: Rect, services: &[ServiceStatusRecord]) {
    let rows: Vec<Row> = services
        .iter()
        .map(|service| {
            let (label, color) = if service.status == 0 {
                ("down", Color::Red)
            } else {
                ("up", Color::Green)
            };

            let last_seen = service
                .last_seen
                .map(|t| t.format("%H:%M:%S").to_string())
                .unwrap_or_else(|| "never".to_string());

            Row::new(vec![
                Cell::from(service.service_name.clone()),
                Cell::from(label).style(Style::default().fg(color)),
                Cell::from(last_seen),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(50),
            Constraint::Percentage(20),
            Constraint::Percentage(30),
        ],
    )
    .header(
        Row::new(vec!["Service", "Status", "Last seen"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("Services ({})", services.len())),
    );

    frame.render_widget(table, area);
}
