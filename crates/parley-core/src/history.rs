//! Background history pagination and member-list loading.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

use crate::client::MatrixClient;
use crate::constants::{HISTORY_PAGE_SIZE, INITIAL_HISTORY_THRESHOLD};
use crate::events::CoreEvent;
use crate::models::{RoomHandle, RoomId};
use crate::store::BufferStore;

#[derive(Clone)]
pub struct HistoryLoader {
    client: Arc<dyn MatrixClient>,
    buffers: Arc<BufferStore>,
    events: UnboundedSender<CoreEvent>,
}

impl HistoryLoader {
    pub fn new(
        client: Arc<dyn MatrixClient>,
        buffers: Arc<BufferStore>,
        events: UnboundedSender<CoreEvent>,
    ) -> Self {
        Self {
            client,
            buffers,
            events,
        }
    }

    fn signal(&self, event: CoreEvent) {
        // The UI loop may already be gone during shutdown
        let _ = self.events.send(event);
    }

    /// Fetches one page of older messages. Returns false without doing
    /// anything if a load for this conversation is already in flight.
    pub async fn load_history(&self, room: &RoomId) -> bool {
        let buffer = self.buffers.get_or_create(room);
        let Some(_guard) = buffer.try_begin_load() else {
            debug!(%room, "history load already in flight");
            return false;
        };
        // Shows the loading indicator
        self.signal(CoreEvent::Redraw);

        let cursor = buffer.cursor();
        match self
            .client
            .get_history(room, HISTORY_PAGE_SIZE, cursor)
            .await
        {
            Ok(page) => {
                let count = buffer.prepend(page.events, page.next_cursor);
                debug!(%room, count, "loaded history");
                self.signal(CoreEvent::HistoryLoaded {
                    room: room.clone(),
                    count,
                });
            }
            Err(e) => {
                buffer.push_service("Failed to fetch history");
                warn!("Failed to fetch history for {}: {}", room, e);
                self.signal(CoreEvent::Redraw);
            }
        }
        true
    }

    /// Claims the first history load for a conversation with a short buffer.
    /// Returns true exactly once per conversation, when a load is due.
    pub fn claim_initial_history(&self, room: &RoomId) -> bool {
        let buffer = self.buffers.get_or_create(room);
        buffer.message_count() < INITIAL_HISTORY_THRESHOLD && buffer.claim_initial_history()
    }

    /// Starts the first history load in the background if one is due.
    pub fn ensure_initial_history(&self, room: &RoomId) {
        if self.claim_initial_history(room) {
            self.spawn_load(room.clone());
        }
    }

    pub fn spawn_load(&self, room: RoomId) {
        let loader = self.clone();
        tokio::spawn(async move {
            loader.load_history(&room).await;
        });
    }

    /// Loads the member list once per conversation.
    pub async fn fetch_members(&self, room: &RoomHandle) {
        if room.members_fetched() {
            return;
        }
        match self.client.fetch_members(room.id()).await {
            Ok(()) => {
                room.set_members_fetched(true);
                self.signal(CoreEvent::MembersFetched {
                    room: room.id().clone(),
                });
            }
            Err(e) => {
                self.buffers
                    .get_or_create(room.id())
                    .push_service(format!("Failed to load members: {}", e));
                warn!("Failed to fetch members for {}: {}", room.id(), e);
                self.signal(CoreEvent::Redraw);
            }
        }
    }

    pub fn spawn_fetch_members(&self, room: RoomHandle) {
        if room.members_fetched() {
            return;
        }
        let loader = self.clone();
        tokio::spawn(async move {
            loader.fetch_members(&room).await;
        });
    }
}
