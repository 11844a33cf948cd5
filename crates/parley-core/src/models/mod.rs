pub mod message;
pub mod room;

pub use message::{EventId, MessageKind, MessagePreview, PushActions, TimelineEvent};
pub use room::{OrderKey, Room, RoomHandle, RoomId, RoomInfo, RoomTag};
