//! Routes terminal input to the component that owns it.
//!
//! A modal owns all input while open. Otherwise hotkeys are resolved for the
//! focused pane and anything unbound goes to the composer (conversation
//! focus) or passes through.

use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use parley_core::constants::WHEEL_SCROLL_ROWS;
use parley_core::roomlist::ClickOutcome;
use tracing::debug;

use crate::ui::hotkeys::{resolve_hotkey, HotkeyId};
use crate::ui::layout;
use crate::ui::modal::ModalState;
use crate::ui::{App, EventOutcome, FocusTarget};

pub(crate) fn handle_key(app: &mut App, key: KeyEvent, now: Instant) -> EventOutcome {
    let context = app.hotkey_context();
    if let Some(hotkey) = resolve_hotkey(key.code, key.modifiers, context) {
        return handle_hotkey(app, hotkey, now);
    }

    if app.modal_state.is_open() {
        handle_modal_text(app, key);
        return EventOutcome::Consumed;
    }

    match app.focus() {
        FocusTarget::Conversation => handle_composer_key(app, key),
        FocusTarget::RoomList => EventOutcome::PassThrough,
    }
}

fn handle_hotkey(app: &mut App, hotkey: HotkeyId, now: Instant) -> EventOutcome {
    let index = app.core().index().clone();
    match hotkey {
        HotkeyId::Quit => app.quit(),
        HotkeyId::NextRoom | HotkeyId::ListDown => app.switch_room(index.next(), now),
        HotkeyId::PrevRoom | HotkeyId::ListUp => app.switch_room(index.previous(), now),
        HotkeyId::NextActiveRoom => {
            let target = index.next_with_activity(app.core().activity());
            app.switch_room(target, now);
        }
        HotkeyId::SearchRooms => app.open_room_search(),
        HotkeyId::PageUp | HotkeyId::PageDown => {
            let forward = hotkey == HotkeyId::PageDown;
            page(app, forward, now);
        }
        HotkeyId::SelectRoom => app.select_room(now),
        HotkeyId::SendMessage => app.send_composer(),
        HotkeyId::Back => app.back(),
        HotkeyId::ModalClose => app.hide_modal(),
        HotkeyId::ModalConfirm => {
            let selection = match &app.modal_state {
                ModalState::RoomSearch(search) => search.selection(),
                ModalState::None => None,
            };
            app.hide_modal();
            app.switch_room(selection, now);
        }
        HotkeyId::ModalUp => {
            if let ModalState::RoomSearch(search) = &mut app.modal_state {
                search.move_up();
            }
        }
        HotkeyId::ModalDown => {
            if let ModalState::RoomSearch(search) = &mut app.modal_state {
                search.move_down();
            }
        }
    }
    EventOutcome::Consumed
}

/// Pages the focused pane. The recency list pages its selection, the tag
/// list scrolls.
fn page(app: &mut App, forward: bool, now: Instant) {
    match app.focus() {
        FocusTarget::RoomList => {
            let index = app.core().index().clone();
            if let Some(selection) = index.page(forward) {
                app.switch_room(Some(selection), now);
            } else {
                let height = app.areas().room_list.map_or(1, |r| r.height as isize);
                index.scroll_by(if forward { height } else { -height });
            }
        }
        FocusTarget::Conversation => {
            let height = app
                .areas()
                .conversation
                .map_or(1, |r| (r.height as isize - 4).max(1));
            app.scroll_conversation(if forward { -height } else { height }, now);
        }
    }
}

fn handle_modal_text(app: &mut App, key: KeyEvent) {
    let ModalState::RoomSearch(search) = &mut app.modal_state else {
        return;
    };
    match key.code {
        KeyCode::Char(c) if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
            search.push_char(c)
        }
        KeyCode::Backspace => search.pop_char(),
        _ => {}
    }
}

fn handle_composer_key(app: &mut App, key: KeyEvent) -> EventOutcome {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let composer = &mut app.composer;
    match key.code {
        KeyCode::Char('a') if ctrl => composer.move_to_start(),
        KeyCode::Char('e') if ctrl => composer.move_to_end(),
        KeyCode::Char('u') if ctrl => composer.kill_to_start(),
        KeyCode::Char(c) if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
            composer.insert_char(c)
        }
        KeyCode::Backspace => composer.delete_char_before(),
        KeyCode::Delete => composer.delete_char_at(),
        KeyCode::Left => composer.move_left(),
        KeyCode::Right => composer.move_right(),
        KeyCode::Home => composer.move_to_start(),
        KeyCode::End => composer.move_to_end(),
        _ => return EventOutcome::PassThrough,
    }
    app.update_typing();
    EventOutcome::Consumed
}

pub(crate) fn handle_mouse(app: &mut App, mouse: MouseEvent, now: Instant) -> EventOutcome {
    if app.modal_state.is_open() {
        return EventOutcome::Consumed;
    }
    let areas = app.areas();
    let wheel = WHEEL_SCROLL_ROWS as isize;

    if let Some(list) = areas
        .room_list
        .filter(|r| layout::contains(*r, mouse.column, mouse.row))
    {
        let index = app.core().index().clone();
        match mouse.kind {
            MouseEventKind::ScrollUp => index.scroll_by(-wheel),
            MouseEventKind::ScrollDown => index.scroll_by(wheel),
            MouseEventKind::Down(MouseButton::Left) => {
                let ctrl = mouse.modifiers.contains(KeyModifiers::CONTROL);
                let line = (mouse.row - list.y) as usize;
                let column = (mouse.column - list.x) as usize;
                match index.click(line, column, ctrl) {
                    ClickOutcome::Select(selection) => app.switch_room(Some(selection), now),
                    ClickOutcome::ToggledTag(tag) => debug!(tag, "toggled tag collapse"),
                    ClickOutcome::ResizedWindow(tag) => debug!(tag, "resized tag window"),
                    ClickOutcome::Ignored => return EventOutcome::PassThrough,
                }
            }
            _ => return EventOutcome::PassThrough,
        }
        return EventOutcome::Consumed;
    }

    if areas
        .conversation
        .is_some_and(|r| layout::contains(r, mouse.column, mouse.row))
    {
        match mouse.kind {
            MouseEventKind::ScrollUp => app.scroll_conversation(wheel, now),
            MouseEventKind::ScrollDown => app.scroll_conversation(-wheel, now),
            _ => return EventOutcome::PassThrough,
        }
        return EventOutcome::Consumed;
    }

    EventOutcome::PassThrough
}

pub(crate) fn handle_paste(app: &mut App, text: &str) -> EventOutcome {
    if let ModalState::RoomSearch(search) = &mut app.modal_state {
        search.push_str(text);
        return EventOutcome::Consumed;
    }
    if app.focus() == FocusTarget::Conversation {
        app.composer.handle_paste(text);
        app.update_typing();
        return EventOutcome::Consumed;
    }
    EventOutcome::PassThrough
}
