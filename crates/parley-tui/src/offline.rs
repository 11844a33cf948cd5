//! Offline session collaborator.
//!
//! A session file lists rooms with their history and a script of timed sync
//! events. [`ReplayClient`] answers the client calls from that data and
//! [`spawn_replay`] feeds the script into the sync stream, so the whole
//! client runs without a network stack.
//!
//! ```json
//! {
//!   "user_id": "@me:example.org",
//!   "rooms": [
//!     { "id": "!a", "title": "General", "tags": [{ "tag": "m.favourite", "order": 0.1 }],
//!       "history": [{ "id": "$1", "sender": "@bob:example.org", "body": "hi" }] }
//!   ],
//!   "script": [
//!     { "delay_ms": 2000,
//!       "event": { "type": "message", "room": "!a",
//!                  "event": { "id": "$2", "sender": "@bob:example.org", "body": "ping" },
//!                  "push": { "notify": true } } }
//!   ]
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use futures::future::{BoxFuture, FutureExt};
use parley_core::client::{ClientError, HistoryPage, MatrixClient};
use parley_core::events::{InboundMessage, SyncEvent};
use parley_core::models::{EventId, PushActions, Room, RoomId, RoomInfo, RoomTag, TimelineEvent};
use serde::Deserialize;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, info};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Session {
    /// Own user id, used as the sender of sent messages.
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub rooms: Vec<SessionRoom>,
    #[serde(default)]
    pub script: Vec<ScriptStep>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionRoom {
    #[serde(flatten)]
    pub info: RoomInfo,
    /// Server-side history, oldest first.
    #[serde(default)]
    pub history: Vec<TimelineEvent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScriptStep {
    /// Wait before this step, counted from the previous one.
    #[serde(default)]
    pub delay_ms: u64,
    pub event: ScriptEvent,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScriptEvent {
    Message {
        room: RoomId,
        event: TimelineEvent,
        #[serde(default)]
        push: PushActions,
    },
    Traffic {
        room: RoomId,
        event: TimelineEvent,
    },
    Typing {
        room: RoomId,
        #[serde(default)]
        users: Vec<String>,
    },
    Tags {
        room: RoomId,
        #[serde(default)]
        tags: Vec<RoomTag>,
    },
    Join {
        room: RoomInfo,
    },
    Leave {
        room: RoomId,
    },
}

impl From<ScriptEvent> for SyncEvent {
    fn from(event: ScriptEvent) -> Self {
        match event {
            ScriptEvent::Message { room, event, push } => {
                SyncEvent::Message(InboundMessage { room, event, push })
            }
            ScriptEvent::Traffic { room, event } => SyncEvent::Traffic { room, event },
            ScriptEvent::Typing { room, users } => SyncEvent::Typing { room, users },
            ScriptEvent::Tags { room, tags } => SyncEvent::UpdateTags { room, tags },
            ScriptEvent::Join { room } => SyncEvent::AddRoom(Room::new(room)),
            ScriptEvent::Leave { room } => SyncEvent::RemoveRoom(room),
        }
    }
}

impl Session {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read session file {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Invalid session file {}", path.display()))
    }
}

/// Answers client calls from a loaded session.
pub struct ReplayClient {
    user_id: String,
    history: HashMap<RoomId, Vec<TimelineEvent>>,
    sync_tx: UnboundedSender<SyncEvent>,
    next_local_id: AtomicU64,
}

impl ReplayClient {
    pub fn new(session: &Session, sync_tx: UnboundedSender<SyncEvent>) -> Self {
        let history = session
            .rooms
            .iter()
            .map(|r| (r.info.id.clone(), r.history.clone()))
            .collect();
        Self {
            user_id: session.user_id.clone(),
            history,
            sync_tx,
            next_local_id: AtomicU64::new(1),
        }
    }
}

impl MatrixClient for ReplayClient {
    /// Pages backwards through the room's history. The cursor is the index
    /// one past the newest event of the next page.
    fn get_history(
        &self,
        room: &RoomId,
        limit: usize,
        cursor: Option<String>,
    ) -> BoxFuture<'static, Result<HistoryPage, ClientError>> {
        let result = match self.history.get(room) {
            Some(events) => {
                let end = cursor
                    .and_then(|c| c.parse::<usize>().ok())
                    .unwrap_or(events.len())
                    .min(events.len());
                let start = end.saturating_sub(limit);
                Ok(HistoryPage {
                    events: events[start..end].to_vec(),
                    next_cursor: (start > 0).then(|| start.to_string()),
                })
            }
            None => Err(ClientError::NotFound(room.clone())),
        };
        async move { result }.boxed()
    }

    fn fetch_members(&self, room: &RoomId) -> BoxFuture<'static, Result<(), ClientError>> {
        let result = if self.history.contains_key(room) {
            Ok(())
        } else {
            Err(ClientError::NotFound(room.clone()))
        };
        async move { result }.boxed()
    }

    fn mark_read(&self, room: &RoomId, event: &EventId) {
        debug!(%room, %event, "read marker");
    }

    fn send_typing(&self, room: &RoomId, typing: bool) {
        debug!(%room, typing, "typing notification");
    }

    /// Echoes the message back through the sync stream, like a server would.
    fn send_message(
        &self,
        room: &RoomId,
        body: &str,
    ) -> BoxFuture<'static, Result<EventId, ClientError>> {
        let result = if self.history.contains_key(room) {
            let n = self.next_local_id.fetch_add(1, Ordering::Relaxed);
            let event = TimelineEvent::text(format!("$local-{}", n), &self.user_id, body, Utc::now());
            let id = event.id.clone();
            self.sync_tx
                .send(SyncEvent::Message(InboundMessage {
                    room: room.clone(),
                    event,
                    push: PushActions::default(),
                }))
                .map(|_| id)
                .map_err(|_| ClientError::Network("sync stream closed".to_string()))
        } else {
            Err(ClientError::NotFound(room.clone()))
        };
        async move { result }.boxed()
    }
}

/// Sends the initial room set, then plays the script.
pub fn spawn_replay(session: Session, sync_tx: UnboundedSender<SyncEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let rooms = session
            .rooms
            .into_iter()
            .map(|r| Room::new(r.info))
            .collect();
        if sync_tx.send(SyncEvent::SetRooms(rooms)).is_err() {
            return;
        }
        for step in session.script {
            if step.delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(step.delay_ms)).await;
            }
            if sync_tx.send(step.event.into()).is_err() {
                return;
            }
        }
        info!("session script finished");
    })
}
