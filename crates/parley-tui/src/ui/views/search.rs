use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::ui::layout::{centered, SEARCH_MODAL_HEIGHT, SEARCH_MODAL_WIDTH};
use crate::ui::modal::{RoomSearchState, SearchHit};
use crate::ui::theme;

pub fn render_room_search(f: &mut Frame, area: Rect, state: &RoomSearchState) {
    let modal = centered(area, SEARCH_MODAL_WIDTH, SEARCH_MODAL_HEIGHT);
    f.render_widget(Clear, modal);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme::border_focused())
        .title(Span::styled(" Search rooms ", theme::tag_header()))
        .style(Style::default().bg(theme::BG_MODAL));
    let inner = block.inner(modal);
    f.render_widget(block, modal);

    let mut lines = vec![Line::from(vec![
        Span::styled("> ", theme::text_muted()),
        Span::styled(state.query.clone(), theme::text_primary()),
    ])];
    let rows = (inner.height as usize).saturating_sub(1);
    // Keep the highlighted hit on screen
    let skip = (state.selected_index + 1).saturating_sub(rows);
    for (i, hit) in state.hits().iter().enumerate().skip(skip).take(rows) {
        lines.push(hit_line(hit, i == state.selected_index));
    }
    if state.hits().is_empty() {
        lines.push(Line::from(Span::styled("No matching rooms", theme::text_dim())));
    }
    f.render_widget(Paragraph::new(lines), inner);

    f.set_cursor_position((
        inner.x + 2 + state.query.chars().count().min(inner.width.saturating_sub(3) as usize) as u16,
        inner.y,
    ));
}

/// Title with the matched characters emphasized.
fn hit_line(hit: &SearchHit, selected: bool) -> Line<'static> {
    let base = if selected {
        theme::text_primary().bg(theme::BG_SELECTED).add_modifier(Modifier::BOLD)
    } else {
        theme::text_primary()
    };
    let matched = theme::search_match().patch(if selected {
        Style::default().bg(theme::BG_SELECTED)
    } else {
        Style::default()
    });
    let spans: Vec<Span<'static>> = hit
        .title
        .chars()
        .enumerate()
        .map(|(i, c)| {
            let style = if hit.positions.contains(&i) { matched } else { base };
            Span::styled(c.to_string(), style)
        })
        .collect();
    Line::from(spans)
}
