use std::time::Duration;

/// Tag used for conversations that carry no tags at all.
pub const TAG_UNTAGGED: &str = "";
pub const TAG_FAVOURITE: &str = "m.favourite";
pub const TAG_LOW_PRIORITY: &str = "m.lowpriority";
pub const TAG_SERVER_NOTICE: &str = "m.server_notice";

// Client-side pseudo tags for membership-derived groups.
pub const TAG_INVITE: &str = "org.parley.fake.invite";
pub const TAG_DIRECT: &str = "org.parley.fake.direct";
pub const TAG_LEAVE: &str = "org.parley.fake.leave";

/// Prefix marking a user-defined tag; the remainder is the display name.
pub const USER_TAG_PREFIX: &str = "u.";

/// Window granularity for tag groups. Also the smallest window.
pub const WINDOW_STEP: usize = 10;

/// Window step used for "more/less" clicks while Ctrl is held.
pub const WINDOW_STEP_LARGE: usize = 100;

/// Rows scrolled per mouse wheel tick.
pub const WHEEL_SCROLL_ROWS: usize = 3;

/// Input within this window counts as actively reading the open conversation.
pub const ACTIVE_READ_WINDOW: Duration = Duration::from_secs(5);

/// No desktop alert is raised if input happened within this window.
pub const ALERT_SUPPRESS_WINDOW: Duration = Duration::from_secs(30);

/// Events requested per history page.
pub const HISTORY_PAGE_SIZE: usize = 50;

/// Conversations with fewer buffered messages than this get an initial history load.
pub const INITIAL_HISTORY_THRESHOLD: usize = 20;

/// Push rule sound name that the client is willing to play.
pub const DEFAULT_SOUND_NAME: &str = "default";
