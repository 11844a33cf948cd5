use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;

use crate::models::{EventId, MessageKind, RoomId, TimelineEvent};

#[derive(Debug, Default)]
struct BufferState {
    events: Vec<TimelineEvent>,
    typing: Vec<String>,
    /// Pagination token for the next (older) history page.
    cursor: Option<String>,
    reached_start: bool,
    /// Rows scrolled up from the newest message; 0 means pinned to bottom.
    scroll_offset: usize,
}

/// Timeline of one conversation as shown in its view.
#[derive(Debug)]
pub struct MessageBuffer {
    room: RoomId,
    state: RwLock<BufferState>,
    loading: AtomicBool,
    initial_history_requested: AtomicBool,
}

/// Held while a history page is in flight. Dropping it clears the loading
/// flag, on success and failure alike.
#[derive(Debug)]
pub struct LoadGuard {
    buffer: Arc<MessageBuffer>,
}

impl LoadGuard {
    pub fn buffer(&self) -> &Arc<MessageBuffer> {
        &self.buffer
    }
}

impl Drop for LoadGuard {
    fn drop(&mut self) {
        self.buffer.loading.store(false, Ordering::Release);
    }
}

impl MessageBuffer {
    pub fn new(room: RoomId) -> Self {
        Self {
            room,
            state: RwLock::new(BufferState::default()),
            loading: AtomicBool::new(false),
            initial_history_requested: AtomicBool::new(false),
        }
    }

    pub fn room(&self) -> &RoomId {
        &self.room
    }

    pub fn events(&self) -> Vec<TimelineEvent> {
        self.state.read().events.clone()
    }

    /// Messages counted towards the initial history threshold.
    pub fn message_count(&self) -> usize {
        self.state
            .read()
            .events
            .iter()
            .filter(|e| e.kind != MessageKind::Service)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().events.is_empty()
    }

    /// Appends a live event. Events already buffered are ignored.
    pub fn push(&self, event: TimelineEvent) -> bool {
        let mut state = self.state.write();
        if !event.id.as_str().is_empty() && state.events.iter().any(|e| e.id == event.id) {
            return false;
        }
        state.events.push(event);
        true
    }

    pub fn push_service(&self, body: impl Into<String>) {
        self.state
            .write()
            .events
            .push(TimelineEvent::service(body, Utc::now()));
    }

    /// Prepends an older page, oldest first. A missing cursor means the
    /// start of the conversation was reached. Returns the number added.
    pub fn prepend(&self, page: Vec<TimelineEvent>, cursor: Option<String>) -> usize {
        let mut state = self.state.write();
        let known: HashSet<EventId> = state
            .events
            .iter()
            .filter(|e| !e.id.as_str().is_empty())
            .map(|e| e.id.clone())
            .collect();
        let mut older: Vec<TimelineEvent> =
            page.into_iter().filter(|e| !known.contains(&e.id)).collect();
        let added = older.len();
        older.append(&mut state.events);
        state.events = older;
        state.reached_start = cursor.is_none();
        state.cursor = cursor;
        added
    }

    pub fn cursor(&self) -> Option<String> {
        self.state.read().cursor.clone()
    }

    pub fn reached_start(&self) -> bool {
        self.state.read().reached_start
    }

    /// Newest event a read marker can point at.
    pub fn newest_event_id(&self) -> Option<EventId> {
        self.state
            .read()
            .events
            .iter()
            .rev()
            .find(|e| e.kind != MessageKind::Service && !e.id.as_str().is_empty())
            .map(|e| e.id.clone())
    }

    pub fn set_typing(&self, users: Vec<String>) {
        self.state.write().typing = users;
    }

    pub fn typing(&self) -> Vec<String> {
        self.state.read().typing.clone()
    }

    pub fn scroll_offset(&self) -> usize {
        self.state.read().scroll_offset
    }

    /// Positive values scroll towards older messages.
    pub fn scroll_by(&self, rows: isize) {
        let mut state = self.state.write();
        let offset = state.scroll_offset as isize + rows;
        state.scroll_offset = offset.max(0) as usize;
    }

    pub fn scroll_to_bottom(&self) {
        self.state.write().scroll_offset = 0;
    }

    pub fn is_at_bottom(&self) -> bool {
        self.scroll_offset() == 0
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// Claims the loading flag. Returns `None` if a load is already running.
    pub fn try_begin_load(self: &Arc<Self>) -> Option<LoadGuard> {
        self.loading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| LoadGuard {
                buffer: Arc::clone(self),
            })
    }

    pub fn initial_history_requested(&self) -> bool {
        self.initial_history_requested.load(Ordering::Acquire)
    }

    /// Returns true for the single caller that gets to request the first page.
    pub fn claim_initial_history(&self) -> bool {
        self.initial_history_requested
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Message buffers keyed by conversation, created on first use.
#[derive(Debug, Default)]
pub struct BufferStore {
    buffers: RwLock<HashMap<RoomId, Arc<MessageBuffer>>>,
}

impl BufferStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, room: &RoomId) -> Option<Arc<MessageBuffer>> {
        self.buffers.read().get(room).cloned()
    }

    pub fn get_or_create(&self, room: &RoomId) -> Arc<MessageBuffer> {
        if let Some(buffer) = self.get(room) {
            return buffer;
        }
        self.buffers
            .write()
            .entry(room.clone())
            .or_insert_with(|| Arc::new(MessageBuffer::new(room.clone())))
            .clone()
    }

    pub fn remove(&self, room: &RoomId) {
        self.buffers.write().remove(room);
    }

    pub fn clear(&self) {
        self.buffers.write().clear();
    }

    pub fn len(&self) -> usize {
        self.buffers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn event(id: &str, secs: i64) -> TimelineEvent {
        TimelineEvent::text(
            id,
            "@bob:example.org",
            format!("body {}", id),
            DateTime::from_timestamp(secs, 0).unwrap_or_default(),
        )
    }

    fn buffer() -> Arc<MessageBuffer> {
        Arc::new(MessageBuffer::new(RoomId::new("!a")))
    }

    #[test]
    fn test_push_dedupes_by_id() {
        let buffer = buffer();
        assert!(buffer.push(event("$1", 1)));
        assert!(!buffer.push(event("$1", 1)));
        buffer.push_service("hello");
        buffer.push_service("hello again");
        assert_eq!(buffer.events().len(), 3);
        assert_eq!(buffer.message_count(), 1);
    }

    #[test]
    fn test_prepend_keeps_order_and_tracks_cursor() {
        let buffer = buffer();
        buffer.push(event("$3", 3));
        let added = buffer.prepend(
            vec![event("$1", 1), event("$2", 2), event("$3", 3)],
            Some("t1".into()),
        );
        assert_eq!(added, 2);
        let ids: Vec<_> = buffer.events().iter().map(|e| e.id.to_string()).collect();
        assert_eq!(ids, vec!["$1", "$2", "$3"]);
        assert_eq!(buffer.cursor().as_deref(), Some("t1"));
        assert!(!buffer.reached_start());

        buffer.prepend(Vec::new(), None);
        assert!(buffer.reached_start());
    }

    #[test]
    fn test_newest_event_skips_service_lines() {
        let buffer = buffer();
        assert!(buffer.newest_event_id().is_none());
        buffer.push(event("$1", 1));
        buffer.push_service("Failed to fetch history");
        assert_eq!(buffer.newest_event_id(), Some(EventId::new("$1")));
    }

    #[test]
    fn test_load_guard_is_exclusive_and_released_on_drop() {
        let buffer = buffer();
        let guard = buffer.try_begin_load();
        assert!(guard.is_some());
        assert!(buffer.is_loading());
        assert!(buffer.try_begin_load().is_none());

        drop(guard);
        assert!(!buffer.is_loading());
        assert!(buffer.try_begin_load().is_some());
    }

    #[test]
    fn test_initial_history_claimed_once() {
        let buffer = buffer();
        assert!(!buffer.initial_history_requested());
        assert!(buffer.claim_initial_history());
        assert!(!buffer.claim_initial_history());
        assert!(buffer.initial_history_requested());
    }

    #[test]
    fn test_scroll_never_negative() {
        let buffer = buffer();
        buffer.scroll_by(5);
        assert!(!buffer.is_at_bottom());
        buffer.scroll_by(-10);
        assert!(buffer.is_at_bottom());
    }

    #[test]
    fn test_store_reuses_buffers() {
        let store = BufferStore::new();
        let room = RoomId::new("!a");
        let first = store.get_or_create(&room);
        first.push(event("$1", 1));
        let again = store.get_or_create(&room);
        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(store.len(), 1);

        store.remove(&room);
        assert!(store.get(&room).is_none());
        assert!(store.is_empty());
    }
}
