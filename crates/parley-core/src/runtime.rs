use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::client::MatrixClient;
use crate::events::{CoreEvent, InboundMessage, SyncEvent};
use crate::history::HistoryLoader;
use crate::models::{RoomHandle, RoomId};
use crate::notify::{AlertSettings, Alerter, FocusClock, NotificationArbiter, Verdict};
use crate::roomlist::{ConversationIndex, ListStrategy};
use crate::store::{ActivityTracker, BufferStore, RoomRegistry};

/// Shared state of a running client and the entry point for sync updates.
///
/// Every structure here is internally synchronized, so the runtime can be
/// shared between the UI loop and background tasks behind an `Arc`.
pub struct CoreRuntime {
    rooms: Arc<RoomRegistry>,
    index: Arc<ConversationIndex>,
    activity: Arc<ActivityTracker>,
    buffers: Arc<BufferStore>,
    client: Arc<dyn MatrixClient>,
    arbiter: NotificationArbiter,
    history: HistoryLoader,
    events: UnboundedSender<CoreEvent>,
}

impl CoreRuntime {
    pub fn new(
        strategy: ListStrategy,
        client: Arc<dyn MatrixClient>,
        alerter: Arc<dyn Alerter>,
        settings: AlertSettings,
        events: UnboundedSender<CoreEvent>,
    ) -> Self {
        let rooms = Arc::new(RoomRegistry::new());
        let index = Arc::new(ConversationIndex::new(strategy));
        let activity = Arc::new(ActivityTracker::new());
        let buffers = Arc::new(BufferStore::new());
        let arbiter = NotificationArbiter::new(
            index.clone(),
            activity.clone(),
            client.clone(),
            alerter,
            Arc::new(FocusClock::new()),
            settings,
        );
        let history = HistoryLoader::new(client.clone(), buffers.clone(), events.clone());
        Self {
            rooms,
            index,
            activity,
            buffers,
            client,
            arbiter,
            history,
            events,
        }
    }

    pub fn rooms(&self) -> &Arc<RoomRegistry> {
        &self.rooms
    }

    pub fn index(&self) -> &Arc<ConversationIndex> {
        &self.index
    }

    pub fn activity(&self) -> &Arc<ActivityTracker> {
        &self.activity
    }

    pub fn buffers(&self) -> &Arc<BufferStore> {
        &self.buffers
    }

    pub fn client(&self) -> &Arc<dyn MatrixClient> {
        &self.client
    }

    pub fn arbiter(&self) -> &NotificationArbiter {
        &self.arbiter
    }

    pub fn history(&self) -> &HistoryLoader {
        &self.history
    }

    pub fn focus(&self) -> &Arc<FocusClock> {
        self.arbiter.focus_clock()
    }

    pub fn room(&self, id: &RoomId) -> Option<RoomHandle> {
        self.rooms.get(id)
    }

    /// Applies one sync update. Returns the arbiter's verdict for messages.
    pub fn handle_sync_event(&self, event: SyncEvent, now: Instant) -> Option<Verdict> {
        let verdict = match event {
            SyncEvent::SetRooms(rooms) => {
                self.set_rooms(rooms);
                None
            }
            SyncEvent::AddRoom(room) => {
                self.add_room(room);
                None
            }
            SyncEvent::RemoveRoom(id) => {
                self.remove_room(&id);
                None
            }
            SyncEvent::UpdateTags { room, tags } => {
                if let Some(handle) = self.rooms.get(&room) {
                    handle.set_tags(tags);
                    self.index.update_tags(&handle);
                }
                None
            }
            SyncEvent::Message(message) => self.handle_message(message, now),
            SyncEvent::Traffic { room, event } => {
                if self.rooms.get(&room).is_some() {
                    self.buffers.get_or_create(&room).push(event);
                    let is_open = self
                        .index
                        .selected()
                        .is_some_and(|s| s.room_id() == &room);
                    if !is_open {
                        self.activity.note_traffic(&room);
                    }
                }
                None
            }
            SyncEvent::Typing { room, users } => {
                if self.rooms.get(&room).is_some() {
                    self.buffers.get_or_create(&room).set_typing(users);
                }
                None
            }
        };
        self.request_redraw();
        verdict
    }

    /// Replaces the conversation set. Rooms are added oldest activity first,
    /// so among equal order keys the most recent ends up on top.
    pub fn set_rooms(&self, mut rooms: Vec<RoomHandle>) {
        info!(count = rooms.len(), "loading conversation list");
        self.index.clear();
        self.rooms.clear();
        rooms.sort_by_key(|r| r.last_activity());
        for room in rooms {
            self.add_room(room);
        }
        if let Some(first) = self.index.first() {
            self.index.set_selected(&first.tag, &first.room);
        }
    }

    pub fn add_room(&self, room: RoomHandle) {
        self.rooms.insert(room.clone());
        if room.has_left() {
            debug!(room = %room.id(), "not indexing left room");
            return;
        }
        self.index.add(&room);
    }

    pub fn remove_room(&self, id: &RoomId) {
        self.index.remove(id);
        self.rooms.remove(id);
        self.activity.remove(id);
        self.buffers.remove(id);
    }

    fn handle_message(&self, message: InboundMessage, now: Instant) -> Option<Verdict> {
        let Some(room) = self.rooms.get(&message.room) else {
            debug!(room = %message.room, "message for unknown room");
            return None;
        };
        self.buffers
            .get_or_create(room.id())
            .push(message.event.clone());
        Some(
            self.arbiter
                .on_message(&room, &message.event, &message.push, now),
        )
    }

    /// Marks a conversation read up to its newest buffered event if it has
    /// unread messages and its view is scrolled to the bottom.
    pub fn mark_read_if_viewed(&self, room: &RoomHandle) -> bool {
        if !self.activity.has_unread(room.id()) {
            return false;
        }
        let Some(buffer) = self.buffers.get(room.id()) else {
            return false;
        };
        if !buffer.is_at_bottom() {
            return false;
        }
        let Some(newest) = buffer.newest_event_id() else {
            return false;
        };
        self.activity.mark_read(room.id(), &newest);
        self.client.mark_read(room.id(), &newest);
        true
    }

    pub fn request_redraw(&self) {
        // The UI loop may already be gone during shutdown
        let _ = self.events.send(CoreEvent::Redraw);
    }

    /// Sends a message in the background. The echo arrives through the sync
    /// stream; a failure is shown inline in the conversation.
    pub fn send_message(&self, room: RoomId, body: String) {
        let request = self.client.send_message(&room, &body);
        let buffers = self.buffers.clone();
        let events = self.events.clone();
        tokio::spawn(async move {
            match request.await {
                Ok(event) => debug!(%room, %event, "message sent"),
                Err(e) => {
                    buffers
                        .get_or_create(&room)
                        .push_service(format!("Failed to send message: {}", e));
                    warn!("Failed to send message to {}: {}", room, e);
                    let _ = events.send(CoreEvent::Redraw);
                }
            }
        });
    }
}
