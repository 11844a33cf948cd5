//! Calls the list engine makes into the sync/protocol collaborator.

use futures::future::BoxFuture;

use crate::models::{EventId, RoomId, TimelineEvent};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Room not found: {0}")]
    NotFound(RoomId),

    #[error("Request rejected: {0}")]
    Rejected(String),
}

/// One page of back-paginated history.
#[derive(Debug, Clone, Default)]
pub struct HistoryPage {
    /// Events in chronological order, oldest first.
    pub events: Vec<TimelineEvent>,
    /// Cursor to pass to the next request, `None` once the start is reached.
    pub next_cursor: Option<String>,
}

pub trait MatrixClient: Send + Sync {
    fn get_history(
        &self,
        room: &RoomId,
        limit: usize,
        cursor: Option<String>,
    ) -> BoxFuture<'static, Result<HistoryPage, ClientError>>;

    fn fetch_members(&self, room: &RoomId) -> BoxFuture<'static, Result<(), ClientError>>;

    /// Advances the server-side read marker.
    fn mark_read(&self, room: &RoomId, event: &EventId);

    fn send_typing(&self, room: &RoomId, typing: bool);

    fn send_message(
        &self,
        room: &RoomId,
        body: &str,
    ) -> BoxFuture<'static, Result<EventId, ClientError>>;
}
