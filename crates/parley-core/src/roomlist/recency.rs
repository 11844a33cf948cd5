use tracing::debug;

use crate::constants::TAG_UNTAGGED;
use crate::models::{RoomHandle, RoomId};
use crate::roomlist::{ClickOutcome, ListRow, RoomList, Selection};
use crate::store::{ActivityLevel, ActivityTracker};

/// Rows taken by one conversation (title line and preview line).
const ROWS_PER_ROOM: usize = 2;
/// Clock banner above the first conversation.
const BANNER_ROWS: usize = 1;

/// Single list ordered by last activity, newest first. Tags are ignored and
/// every selection carries the untagged tag.
#[derive(Debug, Default)]
pub struct RecencyRoomList {
    rooms: Vec<RoomHandle>,
    selected: Option<RoomHandle>,
    /// Index of the first conversation drawn.
    render_start: usize,
    height: usize,
}

impl RecencyRoomList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rooms(&self) -> &[RoomHandle] {
        &self.rooms
    }

    pub fn render_start(&self) -> usize {
        self.render_start
    }

    fn index_of(&self, room: &RoomId) -> Option<usize> {
        self.rooms.iter().position(|r| r.id() == room)
    }

    fn selection_at(&self, index: usize) -> Option<Selection> {
        self.rooms
            .get(index)
            .map(|room| Selection::new(TAG_UNTAGGED, room.clone()))
    }

    fn selected_index(&self) -> Option<usize> {
        self.selected.as_ref().and_then(|r| self.index_of(r.id()))
    }

    /// Conversations that fit under the banner.
    fn per_page(&self) -> usize {
        (self.height.saturating_sub(BANNER_ROWS) / ROWS_PER_ROOM).max(1)
    }

    fn max_render_start(&self) -> usize {
        self.rooms.len().saturating_sub(self.per_page())
    }

    fn scroll_to_selection(&mut self) {
        if let Some(index) = self.selected_index() {
            let per_page = self.per_page();
            if index < self.render_start {
                self.render_start = index;
            } else if index >= self.render_start + per_page {
                self.render_start = index + 1 - per_page;
            }
        }
        self.render_start = self.render_start.min(self.max_render_start());
    }
}

impl RoomList for RecencyRoomList {
    fn contains(&self, room: &RoomId) -> bool {
        self.index_of(room).is_some()
    }

    fn add(&mut self, room: &RoomHandle) {
        if room.is_replaced() || self.contains(room.id()) {
            return;
        }
        let activity = room.last_activity();
        let at = self
            .rooms
            .iter()
            .position(|r| activity > r.last_activity())
            .unwrap_or(self.rooms.len());
        debug!(room = %room.id(), index = at, "adding room to recency list");
        self.rooms.insert(at, room.clone());
    }

    fn remove(&mut self, room: &RoomId) {
        let Some(index) = self.index_of(room) else {
            return;
        };
        self.rooms.remove(index);

        if self.selected.as_ref().is_some_and(|s| s.id() == room) {
            let repaired = if index < self.rooms.len() {
                Some(index)
            } else {
                index.checked_sub(1)
            };
            self.selected = repaired.and_then(|i| self.rooms.get(i).cloned());
        }
        self.scroll_to_selection();
    }

    fn bump(&mut self, room: &RoomHandle) {
        if !self.contains(room.id()) {
            return;
        }
        // Removal would repair the selection onto a neighbour
        let selected = self.selected.take();
        self.remove(room.id());
        self.add(room);
        self.selected = selected;
        self.scroll_to_selection();
    }

    fn clear(&mut self) {
        self.rooms.clear();
        self.selected = None;
        self.render_start = 0;
    }

    fn first(&self) -> Option<Selection> {
        self.selection_at(0)
    }

    fn last(&self) -> Option<Selection> {
        self.rooms.len().checked_sub(1).and_then(|i| self.selection_at(i))
    }

    fn next(&self) -> Option<Selection> {
        match self.selected_index() {
            Some(index) if index + 1 < self.rooms.len() => self.selection_at(index + 1),
            _ => self.first(),
        }
    }

    fn previous(&self) -> Option<Selection> {
        match self.selected_index() {
            Some(index) if index > 0 => self.selection_at(index - 1),
            Some(_) => self.last(),
            None => self.first(),
        }
    }

    fn next_with_activity(&self, activity: &ActivityTracker) -> Option<Selection> {
        let count = self.rooms.len();
        // Scan starts just below the selection and wraps around
        let start = self.selected_index().map_or(0, |index| index + 1);
        let mut best: Option<(ActivityLevel, usize)> = None;
        for i in 0..count {
            let index = (start + i) % count;
            let level = activity.level(self.rooms[index].id());
            if level == ActivityLevel::None {
                continue;
            }
            if best.map_or(true, |(b, _)| level > b) {
                best = Some((level, index));
            }
        }
        best.and_then(|(_, index)| self.selection_at(index))
    }

    fn page(&self, forward: bool) -> Option<Selection> {
        let index = self.selected_index()?;
        let per_page = self.per_page();
        let target = if forward {
            (index + per_page).min(self.rooms.len().saturating_sub(1))
        } else {
            index.saturating_sub(per_page)
        };
        self.selection_at(target)
    }

    fn set_selected(&mut self, _tag: &str, room: &RoomHandle) {
        if !self.contains(room.id()) {
            debug!(room = %room.id(), "ignoring selection of unknown room");
            return;
        }
        self.selected = Some(room.clone());
        self.scroll_to_selection();
        debug!(room = %room.id(), render_start = self.render_start, "selected room");
    }

    fn selected(&self) -> Option<Selection> {
        self.selected_index().and_then(|i| self.selection_at(i))
    }

    fn set_viewport(&mut self, height: usize, _width: usize) {
        self.height = height;
        self.scroll_to_selection();
    }

    fn scroll_by(&mut self, rows: isize) {
        let step = rows.unsigned_abs().div_ceil(ROWS_PER_ROOM);
        self.render_start = if rows < 0 {
            self.render_start.saturating_sub(step)
        } else {
            (self.render_start + step).min(self.max_render_start())
        };
    }

    fn scroll_offset(&self) -> usize {
        self.render_start * ROWS_PER_ROOM
    }

    fn content_height(&self) -> usize {
        BANNER_ROWS + self.rooms.len() * ROWS_PER_ROOM
    }

    fn rows(&self) -> Vec<ListRow> {
        let selected = self.selected.as_ref().map(|r| r.id());
        std::iter::once(ListRow::Banner)
            .chain(self.rooms.iter().skip(self.render_start).map(|room| ListRow::Room {
                tag: TAG_UNTAGGED.to_string(),
                room: room.clone(),
                selected: selected == Some(room.id()),
                detailed: true,
            }))
            .collect()
    }

    fn click(&mut self, line: usize, _column: usize, _ctrl: bool) -> ClickOutcome {
        if line < BANNER_ROWS {
            return ClickOutcome::Ignored;
        }
        let index = self.render_start + (line - BANNER_ROWS) / ROWS_PER_ROOM;
        match self.selection_at(index) {
            Some(selection) => ClickOutcome::Select(selection),
            None => ClickOutcome::Ignored,
        }
    }
}
