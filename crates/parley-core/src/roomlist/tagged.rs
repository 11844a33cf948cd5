use std::collections::HashMap;

use tracing::debug;

use crate::constants::{WINDOW_STEP, WINDOW_STEP_LARGE};
use crate::models::{RoomHandle, RoomId};
use crate::roomlist::group::OrderedGroup;
use crate::roomlist::tags;
use crate::roomlist::{ClickOutcome, ListRow, RoomList, Selection};
use crate::store::{ActivityLevel, ActivityTracker};

/// Columns at each edge of a footer row that act as "less" / "more" buttons.
const FOOTER_BUTTON_WIDTH: usize = 6;

/// Conversations grouped by tag, groups in tag priority order.
#[derive(Debug, Default)]
pub struct TagRoomList {
    /// Non-empty tags in display order.
    tags: Vec<String>,
    groups: HashMap<String, OrderedGroup>,
    selected: Option<Selection>,
    scroll_offset: usize,
    height: usize,
    width: usize,
}

impl TagRoomList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tags in display order.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn group(&self, tag: &str) -> Option<&OrderedGroup> {
        self.groups.get(tag)
    }

    fn index_tag(&self, tag: &str) -> Option<usize> {
        self.tags.iter().position(|t| t == tag)
    }

    /// Keeps `tags` in step with `groups`: a tag is listed exactly when its
    /// group has members.
    fn check_tag(&mut self, tag: &str) {
        let populated = match self.groups.get(tag) {
            Some(group) if group.is_empty() => {
                self.groups.remove(tag);
                false
            }
            Some(_) => true,
            None => false,
        };
        match (populated, self.index_tag(tag)) {
            (true, None) => tags::insert_sorted(&mut self.tags, tag),
            (false, Some(index)) => {
                self.tags.remove(index);
            }
            _ => {}
        }
    }

    fn add_to_tag(&mut self, tag: &str, order: crate::models::OrderKey, room: &RoomHandle) {
        self.groups
            .entry(tag.to_string())
            .or_insert_with(|| OrderedGroup::new(tag))
            .insert(order, room.clone());
        self.check_tag(tag);
    }

    fn remove_from_tag(&mut self, tag: &str, room: &RoomId) {
        let Some(group) = self.groups.get_mut(tag) else {
            return;
        };
        let Some(index) = group.remove(room) else {
            return;
        };

        let was_selected = self
            .selected
            .as_ref()
            .is_some_and(|s| s.tag == tag && s.room.id() == room);
        // Neighbour below on screen, or the new bottom row when the removed
        // room was the bottom one.
        let neighbour = if was_selected && !group.is_empty() {
            let at = index.saturating_sub(1);
            group.expand_to_index(at);
            group.entries().get(at).map(|e| e.room.clone())
        } else {
            None
        };

        self.check_tag(tag);

        if was_selected {
            self.selected = neighbour
                .map(|room| Selection::new(tag, room))
                .or_else(|| self.first());
            self.scroll_to_selection();
        }
    }

    /// Selection, if it still points at an indexed conversation.
    fn valid_selection(&self) -> Option<&Selection> {
        self.selected
            .as_ref()
            .filter(|s| self.groups.get(&s.tag).is_some_and(|g| g.contains(s.room.id())))
    }

    /// Row of the room counted from the top of the content.
    fn row_of(&self, tag: &str, room: &RoomId) -> Option<usize> {
        let tag_index = self.index_tag(tag)?;
        let group = self.groups.get(tag)?;
        if group.is_hidden() || group.is_collapsed() {
            return None;
        }
        let stored = group.index(room)?;
        if group.index_visible(room).is_none() {
            return None;
        }
        let above: usize = self.tags[..tag_index]
            .iter()
            .filter_map(|t| self.groups.get(t))
            .map(OrderedGroup::render_height)
            .sum();
        Some(above + 1 + (group.len() - 1 - stored))
    }

    fn max_scroll(&self) -> usize {
        self.content_height().saturating_sub(self.height)
    }

    fn scroll_to_selection(&mut self) {
        let row = self
            .selected
            .as_ref()
            .and_then(|s| self.row_of(&s.tag, s.room.id()));
        if let Some(row) = row {
            if row <= self.scroll_offset {
                // Keep the group header in view as well
                self.scroll_offset = row.saturating_sub(1);
            } else if self.height > 0 && row >= self.scroll_offset + self.height {
                self.scroll_offset = row + 1 - self.height;
            }
        }
        self.scroll_offset = self.scroll_offset.min(self.max_scroll());
    }
}

impl RoomList for TagRoomList {
    fn contains(&self, room: &RoomId) -> bool {
        self.groups.values().any(|g| g.contains(room))
    }

    fn add(&mut self, room: &RoomHandle) {
        if let Some(successor) = room.replaced_by() {
            debug!(room = %room.id(), %successor, "room is replaced, not adding to list");
            return;
        }
        debug!(room = %room.id(), title = %room.title(), "adding room to list");
        for tag in room.tags() {
            self.add_to_tag(&tag.tag, tag.order, room);
        }
    }

    fn remove(&mut self, room: &RoomId) {
        for tag in self.tags.clone() {
            self.remove_from_tag(&tag, room);
        }
    }

    fn bump(&mut self, room: &RoomHandle) {
        for tag in room.tags() {
            if let Some(group) = self.groups.get_mut(&tag.tag) {
                group.bump(room);
            }
        }
        self.scroll_offset = self.scroll_offset.min(self.max_scroll());
    }

    fn clear(&mut self) {
        self.tags.clear();
        self.groups.clear();
        self.selected = None;
        self.scroll_offset = 0;
    }

    fn first(&self) -> Option<Selection> {
        self.tags.iter().find_map(|tag| {
            let group = self.groups.get(tag)?;
            if !group.has_visible_rooms() {
                return None;
            }
            group
                .first_visible()
                .map(|room| Selection::new(tag.clone(), room.clone()))
        })
    }

    fn last(&self) -> Option<Selection> {
        self.tags.iter().rev().find_map(|tag| {
            let group = self.groups.get(tag)?;
            if !group.has_visible_rooms() {
                return None;
            }
            group
                .last_visible()
                .map(|room| Selection::new(tag.clone(), room.clone()))
        })
    }

    fn next(&self) -> Option<Selection> {
        if self.groups.is_empty() {
            return None;
        }
        let Some(selected) = self.valid_selection() else {
            return self.first();
        };
        let tag_index = self.index_tag(&selected.tag)?;
        let group = self.groups.get(&selected.tag)?;
        let stored = group.index(selected.room.id())?;

        // The row below lives at the next lower storage index, possibly
        // outside the window.
        if group.has_visible_rooms() && stored > 0 {
            group.expand_to_index(stored - 1);
            let room = group.entries()[stored - 1].room.clone();
            return Some(Selection::new(selected.tag.clone(), room));
        }

        self.tags[tag_index + 1..]
            .iter()
            .find_map(|tag| {
                let group = self.groups.get(tag)?;
                if !group.has_visible_rooms() {
                    return None;
                }
                group
                    .first_visible()
                    .map(|room| Selection::new(tag.clone(), room.clone()))
            })
            .or_else(|| self.first())
    }

    fn previous(&self) -> Option<Selection> {
        if self.groups.is_empty() {
            return None;
        }
        let Some(selected) = self.valid_selection() else {
            return self.first();
        };
        let tag_index = self.index_tag(&selected.tag)?;
        let group = self.groups.get(&selected.tag)?;
        let stored = group.index(selected.room.id())?;

        if group.has_visible_rooms() && stored + 1 < group.len() {
            group.expand_to_index(stored + 1);
            let room = group.entries()[stored + 1].room.clone();
            return Some(Selection::new(selected.tag.clone(), room));
        }

        self.tags[..tag_index]
            .iter()
            .rev()
            .find_map(|tag| {
                let group = self.groups.get(tag)?;
                if !group.has_visible_rooms() {
                    return None;
                }
                group
                    .last_visible()
                    .map(|room| Selection::new(tag.clone(), room.clone()))
            })
            .or_else(|| self.last())
    }

    fn next_with_activity(&self, activity: &ActivityTracker) -> Option<Selection> {
        let candidates: Vec<Selection> = self
            .tags
            .iter()
            .filter_map(|tag| self.groups.get(tag).filter(|g| !g.is_hidden()).map(|g| (tag, g)))
            .flat_map(|(tag, group)| {
                group
                    .entries()
                    .iter()
                    .rev()
                    .map(move |entry| Selection::new(tag.clone(), entry.room.clone()))
            })
            .collect();
        // Scan starts just below the selection and wraps around
        let start = self
            .valid_selection()
            .and_then(|selected| candidates.iter().position(|c| c == selected))
            .map_or(0, |position| position + 1);

        let mut best: Option<(ActivityLevel, &Selection)> = None;
        for i in 0..candidates.len() {
            let candidate = &candidates[(start + i) % candidates.len()];
            let level = activity.level(candidate.room_id());
            if level == ActivityLevel::None {
                continue;
            }
            if best.map_or(true, |(b, _)| level > b) {
                best = Some((level, candidate));
            }
        }
        best.map(|(_, selection)| selection.clone())
    }

    fn page(&self, _forward: bool) -> Option<Selection> {
        None
    }

    fn set_selected(&mut self, tag: &str, room: &RoomHandle) {
        let Some(group) = self.groups.get(tag) else {
            debug!(tag, room = %room.id(), "ignoring selection in unknown tag");
            return;
        };
        if !group.contains(room.id()) {
            debug!(tag, room = %room.id(), "ignoring selection of room outside its tag");
            return;
        }
        group.expand_to_include(room.id());
        self.selected = Some(Selection::new(tag, room.clone()));
        self.scroll_to_selection();
        debug!(
            title = %room.title(),
            tag_name = %tags::display_name(tag).unwrap_or_default(),
            offset = self.scroll_offset,
            "selected room"
        );
    }

    fn selected(&self) -> Option<Selection> {
        self.valid_selection().cloned()
    }

    fn set_viewport(&mut self, height: usize, width: usize) {
        self.height = height;
        self.width = width;
        self.scroll_offset = self.scroll_offset.min(self.max_scroll());
    }

    fn scroll_by(&mut self, rows: isize) {
        let offset = self.scroll_offset as isize + rows;
        self.scroll_offset = (offset.max(0) as usize).min(self.max_scroll());
    }

    fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    fn content_height(&self) -> usize {
        self.tags
            .iter()
            .filter_map(|t| self.groups.get(t))
            .map(OrderedGroup::render_height)
            .sum()
    }

    fn rows(&self) -> Vec<ListRow> {
        let selected = self.valid_selection();
        let mut rows = Vec::with_capacity(self.content_height());
        for tag in &self.tags {
            let Some(group) = self.groups.get(tag) else {
                continue;
            };
            let Some(name) = tags::display_name(tag) else {
                continue;
            };
            if group.is_empty() {
                continue;
            }
            rows.push(ListRow::Header {
                tag: tag.clone(),
                name,
                collapsed: group.is_collapsed(),
                total: group.len(),
            });
            if group.is_collapsed() {
                continue;
            }
            for entry in group.visible().iter().rev() {
                let is_selected =
                    selected.is_some_and(|s| &s.tag == tag && s.room.id() == entry.room.id());
                rows.push(ListRow::Room {
                    tag: tag.clone(),
                    room: entry.room.clone(),
                    selected: is_selected,
                    detailed: false,
                });
            }
            if group.has_footer() {
                rows.push(ListRow::Footer {
                    tag: tag.clone(),
                    has_more: group.has_invisible_rooms(),
                    has_less: group.visible_count() > WINDOW_STEP,
                });
            }
        }
        rows.into_iter().skip(self.scroll_offset).collect()
    }

    fn click(&mut self, line: usize, column: usize, ctrl: bool) -> ClickOutcome {
        let mut line = line + self.scroll_offset;
        for tag in &self.tags {
            let Some(group) = self.groups.get(tag) else {
                continue;
            };
            if group.render_height() == 0 {
                continue;
            }
            if line == 0 {
                group.toggle_collapse();
                return ClickOutcome::ToggledTag(tag.clone());
            }
            line -= 1;
            if group.is_collapsed() {
                continue;
            }

            let visible = group.visible();
            if line < visible.len() {
                let room = visible[visible.len() - 1 - line].room.clone();
                return ClickOutcome::Select(Selection::new(tag.clone(), room));
            }
            line -= visible.len();

            if group.has_footer() {
                if line == 0 {
                    let step = if ctrl { WINDOW_STEP_LARGE } else { WINDOW_STEP } as isize;
                    let has_less = group.visible_count() > WINDOW_STEP;
                    if column <= FOOTER_BUTTON_WIDTH && has_less {
                        group.resize_window(-step);
                    } else if column + FOOTER_BUTTON_WIDTH >= self.width
                        && group.has_invisible_rooms()
                    {
                        group.resize_window(step);
                    } else {
                        return ClickOutcome::Ignored;
                    }
                    let tag = tag.clone();
                    self.scroll_offset = self.scroll_offset.min(self.max_scroll());
                    return ClickOutcome::ResizedWindow(tag);
                }
                line -= 1;
            }
        }
        ClickOutcome::Ignored
    }
}
