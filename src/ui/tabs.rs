use ratatui::prelude::*;
use ratatui::widgets::*;

use stt_layout::{Component, TemplateDocument, ZPolarity};

use crate::app::{App, Tab};

const ACTIVE: Color = Color::Rgb(255, 220, 80);
const INACTIVE: Color = Color::Rgb(120, 120, 140);
const FRAME: Color = Color::Rgb(60, 150, 200);
const NAME: Color = Color::Rgb(200, 120, 255);

fn polarity_color(z: ZPolarity) -> Color {
    match z {
        ZPolarity::Up => Color::Rgb(120, 220, 120),
        ZPolarity::Down => Color::Rgb(255, 150, 80),
    }
}

/// `name │ +Z UP ↑ │ 6 ch (2 active)` for the header's right side.
fn document_summary(doc: &TemplateDocument) -> Line<'static> {
    let sep = || Span::styled(" │ ", Style::default().fg(Color::Rgb(60, 60, 80)));
    let z = doc.z_polarity();
    let active = doc
        .channels()
        .iter()
        .filter(|ch| ch.component() != Component::Off)
        .count();
    Line::from(vec![
        Span::raw(" "),
        Span::styled(
            doc.display_name().to_string(),
            Style::default().fg(NAME).add_modifier(Modifier::BOLD),
        ),
        sep(),
        Span::styled(
            format!("+Z {} {}", z, z.arrow()),
            Style::default().fg(polarity_color(z)).add_modifier(Modifier::BOLD),
        ),
        sep(),
        Span::styled(
            format!("{} ch ({} active) ", doc.len(), active),
            Style::default().fg(INACTIVE),
        ),
    ])
}

pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = Tab::all()
        .iter()
        .map(|t| {
            let color = if *t == app.current_tab { ACTIVE } else { INACTIVE };
            Line::from(Span::styled(t.title(), Style::default().fg(color)))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(FRAME))
        .border_type(BorderType::Rounded)
        .title(Line::from(Span::styled(
            " stt layout ",
            Style::default().fg(ACTIVE).add_modifier(Modifier::BOLD),
        )))
        .title(document_summary(&app.document).right_aligned());

    let tabs = Tabs::new(titles)
        .block(block)
        .select(app.current_tab.index())
        .highlight_style(Style::default().fg(ACTIVE).add_modifier(Modifier::BOLD | Modifier::UNDERLINED))
        .divider(Span::styled(" │ ", Style::default().fg(Color::Rgb(60, 60, 80))));

    frame.render_widget(tabs, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_counts_active_channels() {
        let mut doc = TemplateDocument::default();
        doc.set_name("site 4");
        doc.toggle_z_polarity();
        let text: String = document_summary(&doc)
            .spans
            .iter()
            .map(|s| s.content.as_ref())
            .collect();
        assert_eq!(text, " site 4 │ +Z DOWN ↓ │ 6 ch (1 active) ");
    }
}
