pub mod activity;
pub mod buffers;
pub mod rooms;

pub use activity::{ActivityEntry, ActivityLevel, ActivityTracker};
pub use buffers::{BufferStore, LoadGuard, MessageBuffer};
pub use rooms::RoomRegistry;
