// Layout constants and the pane split for each display state

use ratatui::layout::{Constraint, Layout, Rect};

use crate::ui::app::DisplayState;

// =============================================================================
// PANE CONSTANTS
// =============================================================================

/// Room list width in the side-by-side layout
pub const ROOM_LIST_WIDTH: u16 = 30;

/// Conversation header (title + typing line)
pub const CONVERSATION_HEADER_HEIGHT: u16 = 2;

/// Composer line at the bottom of the conversation
pub const COMPOSER_HEIGHT: u16 = 1;

/// Status bar height (single line at very bottom of app)
pub const STATUSBAR_HEIGHT: u16 = 1;

// =============================================================================
// MODAL CONSTANTS
// =============================================================================

pub const SEARCH_MODAL_WIDTH: u16 = 40;

pub const SEARCH_MODAL_HEIGHT: u16 = 14;

/// Screen areas of the two panes; an absent pane is not drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaneAreas {
    pub room_list: Option<Rect>,
    pub conversation: Option<Rect>,
    pub statusbar: Rect,
}

/// Splits the frame for a display state.
pub fn split(area: Rect, state: DisplayState, hide_room_list: bool) -> PaneAreas {
    let [main, statusbar] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(STATUSBAR_HEIGHT)]).areas(area);

    match state {
        DisplayState::CompactList => PaneAreas {
            room_list: Some(main),
            conversation: None,
            statusbar,
        },
        DisplayState::CompactConversation => PaneAreas {
            room_list: None,
            conversation: Some(main),
            statusbar,
        },
        DisplayState::Full if hide_room_list => PaneAreas {
            room_list: None,
            conversation: Some(main),
            statusbar,
        },
        DisplayState::Full => {
            let [list, conversation] = Layout::horizontal([
                Constraint::Length(ROOM_LIST_WIDTH),
                Constraint::Min(0),
            ])
            .areas(main);
            PaneAreas {
                room_list: Some(list),
                conversation: Some(conversation),
                statusbar,
            }
        }
    }
}

/// Centered rectangle of at most `width` x `height` inside `area`.
pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

/// Whether a terminal cell lies inside `area`.
pub fn contains(area: Rect, column: u16, row: u16) -> bool {
    column >= area.x
        && column < area.x.saturating_add(area.width)
        && row >= area.y
        && row < area.y.saturating_add(area.height)
}
