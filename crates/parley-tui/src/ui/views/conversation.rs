use chrono::Local;
use parley_core::models::{MessageKind, TimelineEvent};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::ui::format::{format_message_time, truncate_with_ellipsis, typing_text, wrap_text};
use crate::ui::layout::{COMPOSER_HEIGHT, CONVERSATION_HEADER_HEIGHT};
use crate::ui::{theme, App, FocusTarget};

const COMPOSER_PROMPT: &str = "> ";
const LOADING_TEXT: &str = "Loading more messages...";

pub fn render_conversation(f: &mut Frame, app: &mut App, area: Rect) {
    let [header_area, messages_area, composer_area] = Layout::vertical([
        Constraint::Length(CONVERSATION_HEADER_HEIGHT),
        Constraint::Min(0),
        Constraint::Length(COMPOSER_HEIGHT),
    ])
    .areas(area);

    let Some(room) = app.selected_room() else {
        app.set_conversation_max_scroll(0);
        let empty = Paragraph::new(Line::from(Span::styled(
            "No conversation selected",
            theme::text_dim(),
        )));
        f.render_widget(empty, messages_area);
        return;
    };
    let buffer = app.core().buffers().get_or_create(room.id());

    // Header: title, then who is typing
    let width = area.width as usize;
    let header = vec![
        Line::from(Span::styled(
            truncate_with_ellipsis(&room.title(), width),
            theme::text_bold(),
        )),
        Line::from(Span::styled(
            truncate_with_ellipsis(&typing_text(&buffer.typing()), width),
            theme::text_dim(),
        )),
    ];
    f.render_widget(Paragraph::new(header), header_area);

    // Messages, bottom-aligned
    let loading = buffer.is_loading();
    let height = messages_area.height as usize - usize::from(loading && messages_area.height > 0);
    let lines = message_lines(&buffer.events(), messages_area.width as usize);
    let max_scroll = lines.len().saturating_sub(height);
    app.set_conversation_max_scroll(max_scroll);
    let visible = visible_window(lines, height, buffer.scroll_offset().min(max_scroll));

    let mut rendered = Vec::with_capacity(messages_area.height as usize);
    if loading {
        rendered.push(Line::from(Span::styled(LOADING_TEXT, theme::text_dim())));
    }
    rendered.extend(std::iter::repeat(Line::default()).take(height.saturating_sub(visible.len())));
    rendered.extend(visible);
    f.render_widget(Paragraph::new(rendered), messages_area);

    // Composer
    let composer = Line::from(vec![
        Span::styled(COMPOSER_PROMPT, theme::text_muted()),
        Span::styled(app.composer.text().to_string(), theme::text_primary()),
    ]);
    f.render_widget(
        Paragraph::new(composer).style(Style::default().bg(theme::BG_INPUT)),
        composer_area,
    );
    if app.focus() == FocusTarget::Conversation && !app.modal_state.is_open() {
        let column = (COMPOSER_PROMPT.width() + app.composer.cursor_column())
            .min(composer_area.width.saturating_sub(1) as usize);
        f.set_cursor_position((composer_area.x + column as u16, composer_area.y));
    }
}

/// The `height` lines ending `offset` lines above the newest one.
fn visible_window(lines: Vec<Line<'static>>, height: usize, offset: usize) -> Vec<Line<'static>> {
    let end = lines.len().saturating_sub(offset);
    let start = end.saturating_sub(height);
    lines.into_iter().skip(start).take(end - start).collect()
}

/// Wrapped display lines for a timeline, oldest first.
pub fn message_lines(events: &[TimelineEvent], width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for event in events {
        let time = format_message_time(event.timestamp.with_timezone(&Local).naive_local());
        let prefix = format!("{} ", time);
        let (sender, body, body_style) = match event.kind {
            MessageKind::Service => (String::new(), event.body.clone(), theme::service_message()),
            MessageKind::Membership => (String::new(), event.body.clone(), theme::text_dim()),
            MessageKind::Emote => (
                format!("* {} ", event.notification_sender()),
                event.body.clone(),
                theme::text_primary().add_modifier(Modifier::ITALIC),
            ),
            MessageKind::Text | MessageKind::Notice => (
                format!("{} ", event.notification_sender()),
                event.body.clone(),
                if event.kind == MessageKind::Notice {
                    theme::text_muted()
                } else {
                    theme::text_primary()
                },
            ),
        };

        let indent = prefix.width() + sender.width();
        let wrapped = wrap_text(&body, width.saturating_sub(indent).max(1));
        for (i, chunk) in wrapped.into_iter().enumerate() {
            if i == 0 {
                lines.push(Line::from(vec![
                    Span::styled(prefix.clone(), theme::text_dim()),
                    Span::styled(
                        sender.clone(),
                        Style::default()
                            .fg(theme::user_color(&event.sender))
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(chunk, body_style),
                ]));
            } else {
                lines.push(Line::from(vec![
                    Span::raw(" ".repeat(indent)),
                    Span::styled(chunk, body_style),
                ]));
            }
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::app::tests::{add_rooms, test_app};
    use chrono::DateTime;
    use parley_core::roomlist::ListStrategy;
    use ratatui::{backend::TestBackend, Terminal};

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    fn event(id: &str, sender: &str, body: &str) -> TimelineEvent {
        TimelineEvent::text(id, sender, body, DateTime::from_timestamp(0, 0).unwrap())
    }

    #[test]
    fn test_message_lines_wrap_under_body() {
        let lines = message_lines(&[event("$1", "al", "abcdefghij")], 15);
        assert_eq!(lines.len(), 2);
        let first = text(&lines[0]);
        assert!(first.ends_with("al abcdef"), "{first}");
        assert_eq!(text(&lines[1]), "         ghij");
    }

    #[test]
    fn test_service_lines_have_no_sender() {
        let service = TimelineEvent::service("Failed to fetch history", DateTime::from_timestamp(0, 0).unwrap());
        let lines = message_lines(&[service], 80);
        assert!(text(&lines[0]).ends_with(" Failed to fetch history"));
        assert_eq!(lines[0].spans[1].content, "");
    }

    #[test]
    fn test_visible_window_scrolls_from_bottom() {
        let lines: Vec<Line<'static>> = (0..10).map(|i| Line::from(i.to_string())).collect();
        let window = visible_window(lines.clone(), 3, 0);
        assert_eq!(window.iter().map(text).collect::<Vec<_>>(), vec!["7", "8", "9"]);
        let window = visible_window(lines, 3, 7);
        assert_eq!(window.iter().map(text).collect::<Vec<_>>(), vec!["0", "1", "2"]);
    }

    #[tokio::test]
    async fn test_render_records_max_scroll() {
        let (mut app, _) = test_app(ListStrategy::TagGrouped);
        add_rooms(&app, &[("!a", "")]);
        let buffer = app.core().buffers().get_or_create(&"!a".into());
        for i in 0..20 {
            buffer.push(event(&format!("${i}"), "bob", "hello"));
        }
        app.reflow(40, 10);

        let mut terminal = Terminal::new(TestBackend::new(40, 10)).unwrap();
        terminal
            .draw(|f| render_conversation(f, &mut app, Rect::new(0, 0, 40, 9)))
            .unwrap();
        // 9 rows minus header and composer leaves 6 message rows
        app.scroll_conversation(100, std::time::Instant::now());
        assert_eq!(buffer.scroll_offset(), 14);
    }
}
