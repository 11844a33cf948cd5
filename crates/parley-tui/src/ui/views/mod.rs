pub mod conversation;
pub mod room_list;
pub mod search;

pub use conversation::render_conversation;
pub use room_list::render_room_list;
pub use search::render_room_search;
