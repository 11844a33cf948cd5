use chrono::{Local, NaiveDateTime};
use parley_core::models::{MessagePreview, RoomHandle};
use parley_core::roomlist::ListRow;
use parley_core::store::ActivityLevel;
use parley_core::CoreRuntime;
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::ui::format::{format_banner, format_room_timestamp, preview_line, truncate_with_ellipsis};
use crate::ui::{theme, App};

const COLLAPSED_MARKER: &str = "▸ ";
const EXPANDED_MARKER: &str = "▾ ";

pub fn render_room_list(f: &mut Frame, app: &App, area: Rect) {
    let now = Local::now().naive_local();
    let lines = room_list_lines(app.core(), area.width as usize, area.height as usize, now);
    let list = Paragraph::new(lines).style(Style::default().bg(theme::BG_SIDEBAR));
    f.render_widget(list, area);
}

/// Lines for the visible part of the list, top to bottom.
pub fn room_list_lines(
    core: &CoreRuntime,
    width: usize,
    height: usize,
    now: NaiveDateTime,
) -> Vec<Line<'static>> {
    let mut lines = Vec::with_capacity(height);
    for row in core.index().rows() {
        if lines.len() >= height {
            break;
        }
        match row {
            ListRow::Banner => {
                lines.push(Line::from(Span::styled(
                    truncate_with_ellipsis(&format_banner(now), width),
                    theme::text_muted(),
                )));
            }
            ListRow::Header {
                name,
                collapsed,
                total,
                ..
            } => {
                let marker = if collapsed { COLLAPSED_MARKER } else { EXPANDED_MARKER };
                let label = format!("{}{} ({})", marker, name, total);
                lines.push(Line::from(Span::styled(
                    truncate_with_ellipsis(&label, width),
                    theme::tag_header(),
                )));
            }
            ListRow::Room {
                room,
                selected,
                detailed: false,
                ..
            } => lines.push(room_line(core, &room, selected, width)),
            ListRow::Room {
                room,
                selected,
                detailed: true,
                ..
            } => {
                let preview = room_preview(core, &room);
                lines.push(detailed_title_line(core, &room, selected, preview.as_ref(), width, now));
                lines.push(Line::from(Span::styled(
                    truncate_with_ellipsis(&format!("  {}", preview_line(preview.as_ref())), width),
                    theme::text_dim(),
                )));
            }
            ListRow::Footer {
                has_more, has_less, ..
            } => lines.push(footer_line(has_more, has_less, width)),
        }
    }
    lines.truncate(height);
    lines
}

fn room_line(core: &CoreRuntime, room: &RoomHandle, selected: bool, width: usize) -> Line<'static> {
    let entry = core.activity().entry(room.id());
    let style = theme::room_title(entry.level(), selected);
    let badge = match entry.level() {
        ActivityLevel::Highlight | ActivityLevel::Unread if entry.notify_count > 0 => {
            format!(" ({})", entry.notify_count)
        }
        _ => String::new(),
    };
    let title_width = width.saturating_sub(2 + badge.width());
    let title = truncate_with_ellipsis(&room.title(), title_width);
    let pad = width.saturating_sub(2 + title.width() + badge.width());
    Line::from(vec![
        Span::styled(format!("  {}{}", title, " ".repeat(pad)), style),
        Span::styled(badge, style),
    ])
}

fn detailed_title_line(
    core: &CoreRuntime,
    room: &RoomHandle,
    selected: bool,
    preview: Option<&MessagePreview>,
    width: usize,
    now: NaiveDateTime,
) -> Line<'static> {
    let style = theme::room_title(core.activity().level(room.id()), selected);
    let timestamp = preview
        .map(|p| p.timestamp)
        .unwrap_or_else(|| room.last_activity())
        .with_timezone(&Local)
        .naive_local();
    let stamp = format_room_timestamp(timestamp, now);
    let title = truncate_with_ellipsis(&room.title(), width.saturating_sub(stamp.width() + 1));
    let pad = width.saturating_sub(title.width() + stamp.width());
    Line::from(vec![
        Span::styled(format!("{}{}", title, " ".repeat(pad)), style),
        Span::styled(stamp, theme::text_muted()),
    ])
}

/// Last message of a conversation. A conversation with a short buffer gets
/// its first history page requested the first time it is drawn.
fn room_preview(core: &CoreRuntime, room: &RoomHandle) -> Option<MessagePreview> {
    core.history().ensure_initial_history(room.id());
    if let Some(preview) = core.activity().preview(room.id()) {
        return Some(preview);
    }
    core.buffers().get(room.id()).and_then(|buffer| {
        buffer
            .events()
            .iter()
            .rev()
            .find(|e| e.is_text())
            .map(MessagePreview::from)
    })
}

fn footer_line(has_more: bool, has_less: bool, width: usize) -> Line<'static> {
    let less = if has_less { "less" } else { "" };
    let more = if has_more { "more" } else { "" };
    let pad = width.saturating_sub(less.width() + more.width());
    Line::from(Span::styled(
        format!("{}{}{}", less, " ".repeat(pad), more),
        theme::list_footer(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::app::tests::{add_rooms, test_app};
    use chrono::NaiveDate;
    use parley_core::roomlist::ListStrategy;

    fn text(lines: &[Line]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect::<String>())
            .collect()
    }

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 10)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_tag_list_lines() {
        let (app, _) = test_app(ListStrategy::TagGrouped);
        add_rooms(&app, &[("!a", "m.favourite"), ("!b", "")]);
        app.core().index().set_viewport(10, 20);
        let lines = text(&room_list_lines(app.core(), 20, 10, noon()));
        assert_eq!(lines[0], "▾ Favorites (1)");
        assert_eq!(lines[1].trim_end(), "  !a");
        assert_eq!(lines[2], "▾ Rooms (1)");
        assert_eq!(lines[3].trim_end(), "  !b");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_lines_fit_height() {
        let (app, _) = test_app(ListStrategy::TagGrouped);
        add_rooms(&app, &[("!a", ""), ("!b", ""), ("!c", "")]);
        let lines = room_list_lines(app.core(), 20, 2, noon());
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_footer_line_layout() {
        let line = footer_line(true, true, 12);
        let rendered: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(rendered, "less    more");
    }

    #[tokio::test]
    async fn test_recency_rows_request_preview_history() {
        let (app, client) = test_app(ListStrategy::Recency);
        add_rooms(&app, &[("!a", ""), ("!b", "")]);
        let lines = room_list_lines(app.core(), 30, 10, noon());
        // Banner plus two lines per room
        assert_eq!(lines.len(), 5);
        tokio::task::yield_now().await;
        assert_eq!(client.history_requests.lock().len(), 2);

        // Only once per room
        room_list_lines(app.core(), 30, 10, noon());
        tokio::task::yield_now().await;
        assert_eq!(client.history_requests.lock().len(), 2);
    }
}
