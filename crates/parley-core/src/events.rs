use crate::models::{PushActions, RoomHandle, RoomId, RoomTag, TimelineEvent};

/// A message delivered by sync together with its push-rule verdict.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub room: RoomId,
    pub event: TimelineEvent,
    pub push: PushActions,
}

/// Updates pushed by the sync collaborator.
#[derive(Debug, Clone)]
pub enum SyncEvent {
    /// Replaces the whole conversation set (initial sync).
    SetRooms(Vec<RoomHandle>),
    AddRoom(RoomHandle),
    RemoveRoom(RoomId),
    UpdateTags { room: RoomId, tags: Vec<RoomTag> },
    Message(InboundMessage),
    /// State traffic such as joins and leaves; never notifies.
    Traffic { room: RoomId, event: TimelineEvent },
    Typing { room: RoomId, users: Vec<String> },
}

/// Signals from background work back to the UI loop.
#[derive(Debug, Clone, PartialEq)]
pub enum CoreEvent {
    Redraw,
    HistoryLoaded { room: RoomId, count: usize },
    MembersFetched { room: RoomId },
}
