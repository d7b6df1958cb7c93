pub mod braille;
pub mod preview;
pub mod table;
pub mod tabs;
pub mod template_view;

use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::app::{App, Prompt, PromptKind, Tab};

const KEY_HINT: Color = Color::Rgb(80, 200, 255);
const HINT: Color = Color::Rgb(100, 100, 130);
const OVERLAY_BG: Color = Color::Rgb(15, 15, 25);

pub fn render(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tab bar
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Status / help
        ])
        .split(frame.area());

    tabs::render_tabs(frame, app, chunks[0]);

    match app.current_tab {
        Tab::Editor => {
            let cols = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Length(64), Constraint::Min(20)])
                .split(chunks[1]);
            table::render_table(frame, cols[0], app);
            preview::render_preview(frame, cols[1], &app.document);
        }
        Tab::Template => template_view::render_template(frame, chunks[1], app),
    }

    render_status(frame, chunks[2], app);

    // Prompt overlay (renders on top of everything)
    if let Some(prompt) = &app.prompt {
        render_prompt(frame, frame.area(), prompt);
    }
}

fn hint_spans(pairs: &[(&'static str, &'static str)]) -> Vec<Span<'static>> {
    pairs
        .iter()
        .flat_map(|(key, what)| {
            [
                Span::styled(*key, Style::default().fg(KEY_HINT).add_modifier(Modifier::BOLD)),
                Span::styled(format!(" {}  ", what), Style::default().fg(HINT)),
            ]
        })
        .collect()
}

fn render_status(frame: &mut Frame, area: Rect, app: &App) {
    let line = match &app.status {
        Some(status) => {
            let color = if status.is_error { Color::Rgb(255, 90, 90) } else { Color::Rgb(120, 220, 120) };
            Line::from(Span::styled(
                format!(" {}", status.text),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ))
        }
        None => {
            let mut spans = vec![Span::raw(" ")];
            let pairs: &[(&str, &str)] = match app.current_tab {
                Tab::Editor => &[
                    ("↑↓←→", "move"),
                    ("Enter", "edit/cycle"),
                    ("+/-", "channels"),
                    ("x", "off"),
                    ("z", "+Z"),
                    ("n", "name"),
                    ("o", "open"),
                    ("s", "save"),
                    ("Tab", "view"),
                    ("q", "quit"),
                ],
                Tab::Template => &[
                    ("↑↓ PgUp PgDn", "scroll"),
                    ("s", "save"),
                    ("Tab", "view"),
                    ("q", "quit"),
                ],
            };
            spans.extend(hint_spans(pairs));
            Line::from(spans)
        }
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn render_prompt(frame: &mut Frame, area: Rect, prompt: &Prompt) {
    let overlay_w = 54u16.min(area.width.saturating_sub(4));
    let overlay_h = 7u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(overlay_w)) / 2;
    let y = area.y + (area.height.saturating_sub(overlay_h)) / 2;
    let overlay_area = Rect::new(x, y, overlay_w, overlay_h);

    // Clear background
    frame.render_widget(Clear, overlay_area);

    let accent = Color::Rgb(255, 220, 80);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(accent))
        .title(prompt.kind.title())
        .title_style(Style::default().fg(accent).add_modifier(Modifier::BOLD))
        .style(Style::default().bg(OVERLAY_BG));
    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    // Keep the tail of long paths visible
    let room = (inner.width as usize).saturating_sub(8);
    let count = prompt.buffer.chars().count();
    let shown: String = prompt.buffer.chars().skip(count.saturating_sub(room)).collect();

    let confirm = match prompt.kind {
        PromptKind::Open => "open",
        _ => "confirm",
    };
    let lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  [ ", Style::default().fg(HINT)),
            Span::styled(shown, Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
            Span::styled("_", Style::default().fg(accent).add_modifier(Modifier::SLOW_BLINK)),
            Span::styled(" ]", Style::default().fg(HINT)),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Enter", Style::default().fg(KEY_HINT).add_modifier(Modifier::BOLD)),
            Span::styled(format!(" {}  ", confirm), Style::default().fg(HINT)),
            Span::styled("Esc", Style::default().fg(KEY_HINT).add_modifier(Modifier::BOLD)),
            Span::styled(" cancel", Style::default().fg(HINT)),
        ]),
    ];

    let p = Paragraph::new(lines).style(Style::default().bg(OVERLAY_BG));
    frame.render_widget(p, inner);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    use crate::config::Config;

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buf = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buf.area.height {
            for x in 0..buf.area.width {
                out.push_str(buf[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn test_render_both_tabs_and_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = App::new(&Config {
            output_dir: dir.path().to_path_buf(),
            log_file: dir.path().join("test.log"),
            tick_rate: Duration::from_millis(250),
        });
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();

        terminal.draw(|f| render(f, &mut app)).unwrap();
        let text = screen_text(&terminal);
        assert!(text.contains("Channels (6)"));
        assert!(text.contains("Ex1"));
        assert!(text.contains("X (along line)"));

        app.on_key(KeyEvent::new(KeyCode::Tab, KeyModifiers::NONE));
        terminal.draw(|f| render(f, &mut app)).unwrap();
        let text = screen_text(&terminal);
        assert!(text.contains("RX.ZPOSITIVE=UP"));
        assert!(text.contains("<TEMPLATE>"));

        app.on_key(KeyEvent::new(KeyCode::Char('n'), KeyModifiers::NONE));
        terminal.draw(|f| render(f, &mut app)).unwrap();
        assert!(screen_text(&terminal).contains("Template name"));

        // Degenerate sizes must not panic
        let mut tiny = Terminal::new(TestBackend::new(6, 3)).unwrap();
        tiny.draw(|f| render(f, &mut app)).unwrap();
    }
}
