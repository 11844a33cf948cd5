pub mod app;
pub mod composer;
pub mod format;
pub mod hotkeys;
pub mod layout;
pub mod modal;
pub mod terminal;
pub mod theme;
pub mod views;

pub use app::{App, EventOutcome, FocusTarget};
pub use terminal::{init as init_terminal, restore as restore_terminal, Tui};
