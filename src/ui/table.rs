use ratatui::prelude::*;
use ratatui::widgets::*;

use stt_layout::geometry;
use stt_layout::{Channel, Component, Field};

use super::preview::component_color;
use crate::app::{column_field, App};

const HEADERS: [&str; 7] = ["Ch", "Cmp", "negX", "negY", "posX", "posY", "Dip (m)"];

const HEADER: Color = Color::Rgb(80, 200, 255);
const VALUE: Color = Color::Rgb(220, 220, 230);
const MUTED: Color = Color::Rgb(100, 100, 130);
const ROW_BG: Color = Color::Rgb(25, 30, 45);
const CURSOR_BG: Color = Color::Rgb(255, 220, 80);
const CURSOR_FG: Color = Color::Rgb(15, 15, 25);

fn coordinate_text(ch: &Channel, field: Field) -> String {
    match ch.component() {
        Component::Off => String::new(),
        _ if ch.is_editable(field) => format!("{:.3}", ch.coordinate(field)),
        _ => "n/a".to_string(),
    }
}

fn channel_row(ch: &Channel, row: usize, app: &App) -> Row<'static> {
    let selected = row == app.selected_row;
    let cursor = |col: usize, style: Style| {
        if selected && app.selected_col == col {
            Style::default().fg(CURSOR_FG).bg(CURSOR_BG).add_modifier(Modifier::BOLD)
        } else {
            style
        }
    };

    let component = ch.component();
    let cmp_style = if component == Component::Off {
        Style::default().fg(MUTED)
    } else {
        Style::default().fg(component_color(component)).add_modifier(Modifier::BOLD)
    };

    let mut cells = vec![
        Cell::from(format!("{}", ch.index())).style(Style::default().fg(MUTED)),
        Cell::from(component.as_str()).style(cursor(0, cmp_style)),
    ];
    for col in 1..=4 {
        let Some(field) = column_field(col) else { continue };
        let style = if ch.is_editable(field) {
            Style::default().fg(VALUE)
        } else {
            Style::default().fg(MUTED)
        };
        cells.push(Cell::from(coordinate_text(ch, field)).style(cursor(col, style)));
    }

    let mut dip = ch.dipole_length_display();
    if geometry::is_remote_tx(ch) {
        dip.push_str(" ⇢");
    }
    cells.push(Cell::from(dip).style(Style::default().fg(MUTED)));

    let row_style = if selected { Style::default().bg(ROW_BG) } else { Style::default() };
    Row::new(cells).style(row_style)
}

pub fn render_table(frame: &mut Frame, area: Rect, app: &App) {
    let doc = &app.document;
    let header = Row::new(HEADERS.iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(HEADER).add_modifier(Modifier::BOLD))
    }))
    .bottom_margin(1);

    let rows: Vec<Row> = doc
        .channels()
        .iter()
        .enumerate()
        .map(|(i, ch)| channel_row(ch, i, app))
        .collect();

    let widths = [
        Constraint::Length(3),
        Constraint::Length(4),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Min(8),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(Color::Rgb(60, 150, 200)))
                .title(format!(" Channels ({}) ", doc.len()))
                .title_style(Style::default().fg(Color::Rgb(200, 120, 255)).add_modifier(Modifier::BOLD)),
        );

    let mut state = TableState::default().with_selected(Some(app.selected_row));
    frame.render_stateful_widget(table, area, &mut state);
}
