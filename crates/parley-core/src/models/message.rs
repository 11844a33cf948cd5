use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    #[default]
    Text,
    Notice,
    Emote,
    /// Joins, leaves, renames and other state traffic.
    Membership,
    /// Client-generated line shown inline, never sent.
    Service,
}

/// A decoded timeline event, as much of it as the list engine needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub id: EventId,
    #[serde(default)]
    pub sender: String,
    #[serde(default)]
    pub sender_name: String,
    #[serde(default)]
    pub kind: MessageKind,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub timestamp: DateTime<Utc>,
}

impl TimelineEvent {
    pub fn text(
        id: impl Into<String>,
        sender: impl Into<String>,
        body: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let sender = sender.into();
        Self {
            id: EventId::new(id),
            sender_name: sender.clone(),
            sender,
            kind: MessageKind::Text,
            body: body.into(),
            timestamp,
        }
    }

    pub fn service(body: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: EventId::default(),
            sender: String::new(),
            sender_name: String::new(),
            kind: MessageKind::Service,
            body: body.into(),
            timestamp,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self.kind, MessageKind::Text | MessageKind::Emote | MessageKind::Notice)
    }

    /// Name shown as the alert sender.
    pub fn notification_sender(&self) -> &str {
        if self.sender_name.is_empty() {
            &self.sender
        } else {
            &self.sender_name
        }
    }

    pub fn notification_content(&self) -> String {
        match self.kind {
            MessageKind::Emote => format!("* {} {}", self.notification_sender(), self.body),
            _ => self.body.clone(),
        }
    }
}

/// Result of push-rule evaluation for one inbound event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushActions {
    #[serde(default)]
    pub notify: bool,
    #[serde(default)]
    pub highlight: bool,
    #[serde(default)]
    pub play_sound: bool,
    #[serde(default)]
    pub sound_name: Option<String>,
}

impl PushActions {
    pub fn notify() -> Self {
        Self {
            notify: true,
            ..Default::default()
        }
    }

    pub fn highlight(mut self) -> Self {
        self.highlight = true;
        self
    }

    pub fn with_sound(mut self, name: impl Into<String>) -> Self {
        self.play_sound = true;
        self.sound_name = Some(name.into());
        self
    }
}

/// Cached "last message" line for list previews.
#[derive(Debug, Clone, PartialEq)]
pub struct MessagePreview {
    pub sender_name: String,
    pub body: String,
    pub timestamp: DateTime<Utc>,
}

impl From<&TimelineEvent> for MessagePreview {
    fn from(event: &TimelineEvent) -> Self {
        Self {
            sender_name: event.notification_sender().to_string(),
            body: event.body.clone(),
            timestamp: event.timestamp,
        }
    }
}
