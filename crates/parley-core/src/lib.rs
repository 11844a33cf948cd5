pub mod client;
pub mod config;
pub mod constants;
pub mod events;
pub mod history;
pub mod models;
pub mod notify;
pub mod roomlist;
pub mod runtime;
pub mod store;
pub mod tracing_setup;

pub use client::{ClientError, HistoryPage, MatrixClient};
pub use config::{ConfigError, CoreConfig, Preferences};
pub use events::{CoreEvent, InboundMessage, SyncEvent};
pub use history::HistoryLoader;
pub use roomlist::{ConversationIndex, ListStrategy};
pub use runtime::CoreRuntime;
