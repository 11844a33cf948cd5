//! Conversation-list state engine.
//!
//! [`ConversationIndex`] wraps one [`RoomList`] strategy behind a single
//! reader/writer lock. Every public call takes the lock for its own duration
//! and never hands a guard to the caller. Navigation only needs the shared
//! lock; the window growth it may trigger is an atomic rendering hint on the
//! group, not a membership change.

pub mod group;
pub mod recency;
pub mod tagged;
pub mod tags;

use parking_lot::RwLock;

use crate::models::{RoomHandle, RoomId};
use crate::store::ActivityTracker;

pub use group::{next_window_size, GroupEntry, OrderedGroup};
pub use recency::RecencyRoomList;
pub use tagged::TagRoomList;

/// The selected (tag, conversation) pair.
#[derive(Debug, Clone)]
pub struct Selection {
    pub tag: String,
    pub room: RoomHandle,
}

impl Selection {
    pub fn new(tag: impl Into<String>, room: RoomHandle) -> Self {
        Self {
            tag: tag.into(),
            room,
        }
    }

    pub fn room_id(&self) -> &RoomId {
        self.room.id()
    }
}

impl PartialEq for Selection {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag && self.room.id() == other.room.id()
    }
}

/// One row of the list as the renderer should draw it, top to bottom,
/// starting at the current scroll position.
#[derive(Debug, Clone)]
pub enum ListRow {
    /// Clock banner at the top of the recency list.
    Banner,
    Header {
        tag: String,
        name: String,
        collapsed: bool,
        total: usize,
    },
    Room {
        tag: String,
        room: RoomHandle,
        selected: bool,
        /// Two-line row with a last-message preview.
        detailed: bool,
    },
    Footer {
        tag: String,
        has_more: bool,
        has_less: bool,
    },
}

impl ListRow {
    pub fn height(&self) -> usize {
        match self {
            ListRow::Room { detailed: true, .. } => 2,
            _ => 1,
        }
    }
}

/// What a mouse click on the list did.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    Ignored,
    ToggledTag(String),
    ResizedWindow(String),
    Select(Selection),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListStrategy {
    TagGrouped,
    Recency,
}

/// Navigation contract shared by both list strategies.
pub trait RoomList: Send + Sync {
    fn contains(&self, room: &RoomId) -> bool;
    fn add(&mut self, room: &RoomHandle);
    fn remove(&mut self, room: &RoomId);
    fn bump(&mut self, room: &RoomHandle);
    fn clear(&mut self);

    fn first(&self) -> Option<Selection>;
    fn last(&self) -> Option<Selection>;
    fn next(&self) -> Option<Selection>;
    fn previous(&self) -> Option<Selection>;
    /// Highlights first, then unread messages, then other traffic; display
    /// order breaks ties.
    fn next_with_activity(&self, activity: &ActivityTracker) -> Option<Selection>;
    /// Selection one viewport away, for strategies that page by selection.
    fn page(&self, forward: bool) -> Option<Selection>;

    fn set_selected(&mut self, tag: &str, room: &RoomHandle);
    fn selected(&self) -> Option<Selection>;

    fn set_viewport(&mut self, height: usize, width: usize);
    fn scroll_by(&mut self, rows: isize);
    fn scroll_offset(&self) -> usize;
    fn content_height(&self) -> usize;
    fn rows(&self) -> Vec<ListRow>;
    fn click(&mut self, line: usize, column: usize, ctrl: bool) -> ClickOutcome;
}

/// Thread-safe owner of the active list strategy.
pub struct ConversationIndex {
    strategy: ListStrategy,
    inner: RwLock<Box<dyn RoomList>>,
}

impl ConversationIndex {
    pub fn new(strategy: ListStrategy) -> Self {
        let inner: Box<dyn RoomList> = match strategy {
            ListStrategy::TagGrouped => Box::new(TagRoomList::new()),
            ListStrategy::Recency => Box::new(RecencyRoomList::new()),
        };
        Self {
            strategy,
            inner: RwLock::new(inner),
        }
    }

    pub fn strategy(&self) -> ListStrategy {
        self.strategy
    }

    pub fn contains(&self, room: &RoomId) -> bool {
        self.inner.read().contains(room)
    }

    pub fn add(&self, room: &RoomHandle) {
        self.inner.write().add(room);
    }

    pub fn remove(&self, room: &RoomId) {
        self.inner.write().remove(room);
    }

    pub fn bump(&self, room: &RoomHandle) {
        self.inner.write().bump(room);
    }

    pub fn clear(&self) {
        self.inner.write().clear();
    }

    /// Re-indexes a conversation after its tags changed, keeping it selected
    /// under its first tag if it was selected before.
    pub fn update_tags(&self, room: &RoomHandle) {
        let mut inner = self.inner.write();
        if !inner.contains(room.id()) {
            return;
        }
        let reselect = inner
            .selected()
            .is_some_and(|s| s.room.id() == room.id());
        inner.remove(room.id());
        inner.add(room);
        if reselect {
            if let Some(tag) = room.tags().first() {
                inner.set_selected(&tag.tag, room);
            }
        }
    }

    pub fn first(&self) -> Option<Selection> {
        self.inner.read().first()
    }

    pub fn last(&self) -> Option<Selection> {
        self.inner.read().last()
    }

    pub fn next(&self) -> Option<Selection> {
        self.inner.read().next()
    }

    pub fn previous(&self) -> Option<Selection> {
        self.inner.read().previous()
    }

    pub fn next_with_activity(&self, activity: &ActivityTracker) -> Option<Selection> {
        self.inner.read().next_with_activity(activity)
    }

    pub fn page(&self, forward: bool) -> Option<Selection> {
        self.inner.read().page(forward)
    }

    pub fn set_selected(&self, tag: &str, room: &RoomHandle) {
        self.inner.write().set_selected(tag, room);
    }

    pub fn selected(&self) -> Option<Selection> {
        self.inner.read().selected()
    }

    pub fn selected_room(&self) -> Option<RoomHandle> {
        self.selected().map(|s| s.room)
    }

    pub fn set_viewport(&self, height: usize, width: usize) {
        self.inner.write().set_viewport(height, width);
    }

    pub fn scroll_by(&self, rows: isize) {
        self.inner.write().scroll_by(rows);
    }

    pub fn scroll_offset(&self) -> usize {
        self.inner.read().scroll_offset()
    }

    pub fn content_height(&self) -> usize {
        self.inner.read().content_height()
    }

    pub fn rows(&self) -> Vec<ListRow> {
        self.inner.read().rows()
    }

    pub fn click(&self, line: usize, column: usize, ctrl: bool) -> ClickOutcome {
        self.inner.write().click(line, column, ctrl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Room, RoomInfo, RoomTag};
    use std::sync::Arc;
    use std::thread;

    fn tagged_room(id: &str, tag: &str, order: f64) -> RoomHandle {
        let mut info = RoomInfo::new(id, id);
        info.tags = vec![RoomTag::new(tag, order)];
        Room::new(info)
    }

    #[test]
    fn test_strategies_share_contract() {
        for strategy in [ListStrategy::TagGrouped, ListStrategy::Recency] {
            let index = ConversationIndex::new(strategy);
            let a = tagged_room("!a", "", 0.5);
            let b = tagged_room("!b", "", 0.5);
            index.add(&a);
            index.add(&b);
            assert!(index.contains(a.id()));

            let first = index.first().unwrap();
            index.set_selected(&first.tag, &first.room);
            let next = index.next().unwrap();
            assert_ne!(next.room_id(), first.room_id());
            index.set_selected(&next.tag, &next.room);
            assert_eq!(index.previous().unwrap(), first);

            index.remove(a.id());
            index.remove(b.id());
            assert!(index.first().is_none());
            assert!(index.selected().is_none());
        }
    }

    #[test]
    fn test_update_tags_reselects_under_new_tag() {
        let index = ConversationIndex::new(ListStrategy::TagGrouped);
        let room = tagged_room("!a", "", 0.5);
        index.add(&room);
        index.set_selected("", &room);

        room.set_tags(vec![RoomTag::new("m.favourite", 0.1)]);
        index.update_tags(&room);

        let selected = index.selected().unwrap();
        assert_eq!(selected.tag, "m.favourite");
        assert_eq!(selected.room_id(), room.id());
        let headers: Vec<String> = index
            .rows()
            .into_iter()
            .filter_map(|r| match r {
                ListRow::Header { tag, .. } => Some(tag),
                _ => None,
            })
            .collect();
        assert_eq!(headers, vec!["m.favourite".to_string()]);
    }

    #[test]
    fn test_update_tags_ignores_unknown_room() {
        let index = ConversationIndex::new(ListStrategy::TagGrouped);
        let room = tagged_room("!a", "", 0.5);
        index.update_tags(&room);
        assert!(!index.contains(room.id()));
    }

    #[test]
    fn test_concurrent_readers_and_writers() {
        let index = Arc::new(ConversationIndex::new(ListStrategy::TagGrouped));
        let writers: Vec<_> = (0..4)
            .map(|w| {
                let index = index.clone();
                thread::spawn(move || {
                    for i in 0..25 {
                        let room = tagged_room(&format!("!w{}r{}", w, i), "", i as f64);
                        index.add(&room);
                        index.bump(&room);
                    }
                })
            })
            .collect();
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let index = index.clone();
                thread::spawn(move || {
                    for _ in 0..50 {
                        let _ = index.next();
                        let _ = index.rows();
                    }
                })
            })
            .collect();
        for handle in writers.into_iter().chain(readers) {
            handle.join().unwrap();
        }
        let rooms = index
            .rows()
            .into_iter()
            .filter(|r| matches!(r, ListRow::Room { .. }))
            .count();
        // 100 members, default window of 10
        assert_eq!(rooms, 10);
    }
}
