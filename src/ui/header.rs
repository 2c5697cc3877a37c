//! Title bar and footer

use super::WizardView;
use crate::theme::{Styles, UiText};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
};

pub fn render_header(f: &mut Frame, area: Rect) {
    if area.width == 0 || area.height == 0 {
        return;
    }

    let title = Paragraph::new(UiText::TITLE.trim())
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Styles::border_active()),
        )
        .alignment(Alignment::Center)
        .style(Styles::title());
    f.render_widget(title, area);
}

/// Progress gauge over the key hint line
pub fn render_footer(f: &mut Frame, area: Rect, view: &WizardView) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(1)])
        .split(area);

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Styles::border_inactive())
                .title(UiText::PROGRESS_TITLE),
        )
        .gauge_style(Styles::progress())
        .ratio(view.progress_ratio())
        .label(view.progress_label());
    f.render_widget(gauge, chunks[0]);

    let mut spans = Vec::new();
    for (i, item) in view.hints.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled("  ", Styles::nav_hint()));
        }
        spans.push(Span::styled(item.key_display.clone(), Styles::key_hint()));
        spans.push(Span::styled(format!(" {}", item.action_label), Styles::nav_hint()));
    }
    f.render_widget(
        Paragraph::new(Line::from(spans)).alignment(Alignment::Center),
        chunks[1],
    );
}
