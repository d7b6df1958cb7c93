use ratatui::prelude::*;
use ratatui::widgets::*;

use stt_layout::serialize;

use crate::app::App;

const TAG: Color = Color::Rgb(200, 120, 255);
const KEY: Color = Color::Rgb(80, 200, 255);
const VALUE: Color = Color::Rgb(220, 220, 230);

/// One styled line of template text; tab indents become four spaces.
fn styled_line(raw: &str) -> Line<'static> {
    let text = raw.replace('\t', "    ");
    let trimmed = text.trim_start();
    if trimmed.starts_with('<') {
        return Line::from(Span::styled(text, Style::default().fg(TAG).add_modifier(Modifier::BOLD)));
    }
    match text.split_once('=') {
        Some((key, value)) => Line::from(vec![
            Span::styled(key.to_string(), Style::default().fg(KEY)),
            Span::styled("=", Style::default().fg(Color::Rgb(100, 100, 130))),
            Span::styled(value.to_string(), Style::default().fg(VALUE)),
        ]),
        None => Line::from(Span::styled(text.clone(), Style::default().fg(VALUE))),
    }
}

pub fn render_template(frame: &mut Frame, area: Rect, app: &App) {
    let text = serialize(&app.document);
    let lines: Vec<Line> = text.lines().map(styled_line).collect();
    let total = lines.len();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Rgb(60, 150, 200)))
        .title(format!(" {}.stt ", app.document.display_name()))
        .title_style(Style::default().fg(TAG).add_modifier(Modifier::BOLD))
        .title_bottom(Line::from(format!(" {} lines ", total)).right_aligned());

    let p = Paragraph::new(lines)
        .block(block)
        .scroll((app.template_scroll, 0));
    frame.render_widget(p, area);
}
