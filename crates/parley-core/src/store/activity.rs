use std::collections::HashMap;

use parking_lot::RwLock;

use crate::models::{EventId, MessagePreview, RoomId};

/// How much a conversation wants attention, in increasing order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum ActivityLevel {
    #[default]
    None,
    /// Joins, leaves and other state traffic.
    Traffic,
    Unread,
    Highlight,
}

/// Per-conversation read state. Moves forward only, except `mark_read`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityEntry {
    pub has_unread: bool,
    pub highlighted: bool,
    /// Unread messages the push rules asked to notify about.
    pub notify_count: usize,
    pub highlight_count: usize,
    pub other_traffic: bool,
    pub newest_event: Option<EventId>,
    pub last_read: Option<EventId>,
}

impl ActivityEntry {
    pub fn level(&self) -> ActivityLevel {
        if self.highlighted {
            ActivityLevel::Highlight
        } else if self.has_unread {
            ActivityLevel::Unread
        } else if self.other_traffic {
            ActivityLevel::Traffic
        } else {
            ActivityLevel::None
        }
    }
}

/// Unread/highlight counters and last-message previews, shared between the
/// event pipeline and the renderer.
#[derive(Debug, Default)]
pub struct ActivityTracker {
    entries: RwLock<HashMap<RoomId, ActivityEntry>>,
    previews: RwLock<HashMap<RoomId, MessagePreview>>,
}

impl ActivityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_unread(&self, room: &RoomId, event: EventId, notify: bool, highlight: bool) {
        let mut entries = self.entries.write();
        let entry = entries.entry(room.clone()).or_default();
        entry.has_unread = true;
        if notify {
            entry.notify_count += 1;
        }
        if highlight {
            entry.highlighted = true;
            entry.highlight_count += 1;
        }
        entry.newest_event = Some(event);
    }

    pub fn note_traffic(&self, room: &RoomId) {
        self.entries
            .write()
            .entry(room.clone())
            .or_default()
            .other_traffic = true;
    }

    /// Resets the conversation to read up to `event`.
    /// Returns true if the read marker moved.
    pub fn mark_read(&self, room: &RoomId, event: &EventId) -> bool {
        let mut entries = self.entries.write();
        let entry = entries.entry(room.clone()).or_default();
        let moved = entry.last_read.as_ref() != Some(event);
        *entry = ActivityEntry {
            last_read: Some(event.clone()),
            newest_event: Some(event.clone()),
            ..Default::default()
        };
        moved
    }

    pub fn entry(&self, room: &RoomId) -> ActivityEntry {
        self.entries.read().get(room).cloned().unwrap_or_default()
    }

    pub fn level(&self, room: &RoomId) -> ActivityLevel {
        self.entries
            .read()
            .get(room)
            .map(ActivityEntry::level)
            .unwrap_or_default()
    }

    pub fn has_unread(&self, room: &RoomId) -> bool {
        self.entries
            .read()
            .get(room)
            .map(|e| e.has_unread)
            .unwrap_or(false)
    }

    /// Stores the preview unless a newer one is already cached.
    pub fn set_preview(&self, room: &RoomId, preview: MessagePreview) {
        let mut previews = self.previews.write();
        match previews.get(room) {
            Some(existing) if existing.timestamp > preview.timestamp => {}
            _ => {
                previews.insert(room.clone(), preview);
            }
        }
    }

    pub fn preview(&self, room: &RoomId) -> Option<MessagePreview> {
        self.previews.read().get(room).cloned()
    }

    pub fn remove(&self, room: &RoomId) {
        self.entries.write().remove(room);
        self.previews.write().remove(room);
    }

    pub fn clear(&self) {
        self.entries.write().clear();
        self.previews.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn rid(id: &str) -> RoomId {
        RoomId::new(id)
    }

    #[test]
    fn test_unknown_room_is_read() {
        let tracker = ActivityTracker::new();
        assert_eq!(tracker.level(&rid("!a")), ActivityLevel::None);
        assert!(!tracker.has_unread(&rid("!a")));
    }

    #[test]
    fn test_transitions_only_forward() {
        let tracker = ActivityTracker::new();
        let room = rid("!a");

        tracker.add_unread(&room, EventId::new("$1"), true, false);
        assert_eq!(tracker.level(&room), ActivityLevel::Unread);

        tracker.add_unread(&room, EventId::new("$2"), true, true);
        assert_eq!(tracker.level(&room), ActivityLevel::Highlight);

        // A plain message does not drop the highlight
        tracker.add_unread(&room, EventId::new("$3"), false, false);
        let entry = tracker.entry(&room);
        assert_eq!(entry.level(), ActivityLevel::Highlight);
        assert_eq!(entry.notify_count, 2);
        assert_eq!(entry.highlight_count, 1);
        assert_eq!(entry.newest_event, Some(EventId::new("$3")));
    }

    #[test]
    fn test_mark_read_resets() {
        let tracker = ActivityTracker::new();
        let room = rid("!a");
        tracker.add_unread(&room, EventId::new("$1"), true, true);
        tracker.note_traffic(&room);

        assert!(tracker.mark_read(&room, &EventId::new("$1")));
        let entry = tracker.entry(&room);
        assert_eq!(entry.level(), ActivityLevel::None);
        assert_eq!(entry.last_read, Some(EventId::new("$1")));

        // Same marker again does not move
        assert!(!tracker.mark_read(&room, &EventId::new("$1")));
    }

    #[test]
    fn test_level_ordering() {
        assert!(ActivityLevel::Highlight > ActivityLevel::Unread);
        assert!(ActivityLevel::Unread > ActivityLevel::Traffic);
        assert!(ActivityLevel::Traffic > ActivityLevel::None);
    }

    #[test]
    fn test_preview_keeps_newest() {
        let tracker = ActivityTracker::new();
        let room = rid("!a");
        let newer = MessagePreview {
            sender_name: "bob".into(),
            body: "newer".into(),
            timestamp: DateTime::from_timestamp(200, 0).unwrap_or_default(),
        };
        let older = MessagePreview {
            sender_name: "bob".into(),
            body: "older".into(),
            timestamp: DateTime::from_timestamp(100, 0).unwrap_or_default(),
        };
        tracker.set_preview(&room, newer);
        tracker.set_preview(&room, older);
        assert_eq!(tracker.preview(&room).unwrap().body, "newer");

        tracker.remove(&room);
        assert!(tracker.preview(&room).is_none());
    }
}
