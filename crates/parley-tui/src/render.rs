use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Paragraph},
    Frame,
};

use crate::ui;
use crate::ui::hotkeys::{get_binding, HotkeyContext, HotkeyId};
use crate::ui::modal::ModalState;
use crate::ui::App;

pub(crate) fn render(f: &mut Frame, app: &mut App) {
    // Fill entire frame with app background (pure black)
    let bg_block = Block::default().style(Style::default().bg(ui::theme::BG_APP));
    f.render_widget(bg_block, f.area());

    if f.area() != app.frame_area() {
        app.reflow(f.area().width, f.area().height);
    }
    let areas = app.areas();

    if let Some(area) = areas.room_list {
        ui::views::render_room_list(f, app, area);
    }
    if let Some(area) = areas.conversation {
        ui::views::render_conversation(f, app, area);
    }
    render_statusbar(f, app, areas.statusbar);

    if let ModalState::RoomSearch(state) = &app.modal_state {
        ui::views::render_room_search(f, f.area(), state);
    }
}

fn render_statusbar(f: &mut Frame, app: &App, area: Rect) {
    if app.pending_quit {
        let warning = Paragraph::new("⚠ Press Ctrl+C again to quit")
            .style(Style::default().fg(ui::theme::ACCENT_ERROR));
        f.render_widget(warning, area);
        return;
    }

    let core = app.core();
    let rooms = core.rooms().all();
    let indexed = rooms.iter().filter(|r| core.index().contains(r.id()));
    let unread = indexed
        .clone()
        .filter(|r| core.activity().has_unread(r.id()))
        .count();
    let summary = format!("{} rooms · {} unread", indexed.count(), unread);

    let hints = statusbar_hints(app.hotkey_context())
        .iter()
        .filter_map(|id| get_binding(*id))
        .map(|b| format!("{} {}", b.key_display(), b.label))
        .collect::<Vec<_>>()
        .join(" · ");

    let summary_style = if unread > 0 {
        Style::default().fg(ui::theme::ACCENT_WARNING)
    } else {
        ui::theme::text_muted()
    };
    let line = Line::from(vec![
        Span::styled(summary, summary_style),
        Span::styled("  ", ui::theme::text_dim()),
        Span::styled(hints, ui::theme::text_dim()),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn statusbar_hints(context: HotkeyContext) -> &'static [HotkeyId] {
    match context {
        HotkeyContext::SearchModal => &[HotkeyId::ModalConfirm, HotkeyId::ModalClose],
        HotkeyContext::Conversation => &[
            HotkeyId::SendMessage,
            HotkeyId::Back,
            HotkeyId::NextActiveRoom,
            HotkeyId::SearchRooms,
        ],
        HotkeyContext::RoomList | HotkeyContext::Global => &[
            HotkeyId::SelectRoom,
            HotkeyId::NextActiveRoom,
            HotkeyId::SearchRooms,
            HotkeyId::Quit,
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::app::tests::{add_rooms, test_app};
    use parley_core::roomlist::ListStrategy;
    use ratatui::{backend::TestBackend, Terminal};

    fn screen(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[tokio::test]
    async fn test_first_draw_reflows_to_frame() {
        let (mut app, _) = test_app(ListStrategy::TagGrouped);
        add_rooms(&app, &[("!a", ""), ("!b", "")]);

        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|f| render(f, &mut app)).unwrap();
        assert_eq!(app.frame_area(), Rect::new(0, 0, 120, 30));
        assert!(screen(&terminal).contains("2 rooms · 0 unread"));
    }

    #[tokio::test]
    async fn test_pending_quit_replaces_statusbar() {
        let (mut app, _) = test_app(ListStrategy::TagGrouped);
        app.pending_quit = true;

        let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
        terminal.draw(|f| render(f, &mut app)).unwrap();
        assert!(screen(&terminal).contains("Press Ctrl+C again to quit"));
    }

    #[tokio::test]
    async fn test_search_modal_drawn_on_top() {
        let (mut app, _) = test_app(ListStrategy::TagGrouped);
        add_rooms(&app, &[("!a", "")]);
        app.open_room_search();

        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| render(f, &mut app)).unwrap();
        let text = screen(&terminal);
        assert!(text.contains("Search rooms"));
        assert!(text.contains("Enter open"));
    }
}
