//! Wizard panels
//!
//! Left column: every question id with its current answer. Right column: the
//! active question (or the review panel once every question is answered).

use super::WizardView;
use crate::catalog::QuestionKind;
use crate::theme::{Styles, UiText};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};

pub fn render_answers(f: &mut Frame, area: Rect, view: &WizardView) {
    let items: Vec<ListItem> = view
        .rows
        .iter()
        .map(|row| {
            let line = Line::from(vec![
                Span::styled(format!("{}: ", row.id), Styles::answer_key()),
                Span::styled(row.value.clone(), Styles::answer_value()),
            ]);
            ListItem::new(line)
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Styles::border_inactive())
                .title(UiText::ANSWERS_TITLE),
        )
        .highlight_style(Styles::current_row());

    let mut state = ListState::default();
    state.select(view.rows.iter().position(|row| row.current));
    f.render_stateful_widget(list, area, &mut state);
}

pub fn render_question(f: &mut Frame, area: Rect, view: &WizardView) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Styles::border_active())
        .title(UiText::QUESTION_TITLE);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let Some(question) = view.question else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(inner);

    f.render_widget(
        Paragraph::new(question.prompt)
            .style(Styles::prompt())
            .wrap(Wrap { trim: true }),
        chunks[0],
    );

    match question.kind {
        QuestionKind::Text | QuestionKind::Secret => {
            let line = Line::from(vec![
                Span::styled("> ", Styles::text_muted()),
                Span::styled(format!("{}_", view.input), Styles::input()),
            ]);
            f.render_widget(Paragraph::new(line), chunks[1]);
        }
        QuestionKind::Select => {
            let items: Vec<ListItem> = question
                .options
                .iter()
                .map(|option| ListItem::new(option.as_str()).style(Styles::unselected()))
                .collect();
            let list = List::new(items)
                .highlight_style(Styles::selected())
                .highlight_symbol("> ");
            let mut state = ListState::default();
            state.select(Some(view.selection));
            f.render_stateful_widget(list, chunks[1], &mut state);
        }
        QuestionKind::YesNo => {
            f.render_widget(
                Paragraph::new(UiText::YES_NO_CHOICES).style(Styles::text()),
                chunks[1],
            );
        }
    }

    render_error(f, chunks[2], view);
}

/// Review panel shown while confirming
pub fn render_review(f: &mut Frame, area: Rect, view: &WizardView) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Styles::border_active())
        .title(UiText::REVIEW_TITLE);
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(2)])
        .split(inner);

    let lines = vec![
        Line::from(Span::styled(
            format!("All {} questions answered.", view.total),
            Styles::success(),
        )),
        Line::from(""),
        Line::from(Span::styled(UiText::REVIEW_PROMPT, Styles::prompt())),
        Line::from(Span::styled(UiText::REVIEW_CHOICES, Styles::text())),
    ];
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), chunks[0]);

    render_error(f, chunks[1], view);
}

fn render_error(f: &mut Frame, area: Rect, view: &WizardView) {
    if let Some(error) = view.error {
        f.render_widget(
            Paragraph::new(error)
                .style(Styles::error())
                .wrap(Wrap { trim: true }),
            area,
        );
    }
}
