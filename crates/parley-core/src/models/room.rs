use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::constants::TAG_UNTAGGED;

/// Opaque conversation identity assigned by the sync collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Position key of a conversation inside one tag group.
///
/// Higher keys sort earlier in group storage, which puts them *below* lower
/// keys on screen. Compared with `f64::total_cmp`, so every value (NaN
/// included) has a place.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderKey(f64);

impl OrderKey {
    /// Key used when a tag carries no explicit order.
    pub const DEFAULT: OrderKey = OrderKey(0.5);

    pub fn new(value: f64) -> Self {
        Self(value)
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl Default for OrderKey {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl PartialEq for OrderKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OrderKey {}

impl PartialOrd for OrderKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl From<f64> for OrderKey {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

/// A (tag, order key) pair attached to a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomTag {
    pub tag: String,
    #[serde(default)]
    pub order: OrderKey,
}

impl RoomTag {
    pub fn new(tag: impl Into<String>, order: impl Into<OrderKey>) -> Self {
        Self {
            tag: tag.into(),
            order: order.into(),
        }
    }

    pub fn untagged() -> Self {
        Self::new(TAG_UNTAGGED, OrderKey::DEFAULT)
    }
}

/// Serializable snapshot of a conversation, as delivered by the sync collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoomInfo {
    pub id: RoomId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub last_activity: DateTime<Utc>,
    #[serde(default)]
    pub members_fetched: bool,
    #[serde(default)]
    pub tags: Vec<RoomTag>,
    #[serde(default)]
    pub replaced_by: Option<RoomId>,
    #[serde(default)]
    pub has_left: bool,
}

impl RoomInfo {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: RoomId::new(id),
            title: title.into(),
            ..Default::default()
        }
    }
}

/// A conversation shared between the sync collaborator, the index and the UI.
///
/// The index never creates or destroys rooms. It holds handles and reads the
/// mutable parts through the room's own lock.
#[derive(Debug)]
pub struct Room {
    id: RoomId,
    info: RwLock<RoomInfo>,
}

pub type RoomHandle = Arc<Room>;

impl Room {
    pub fn new(info: RoomInfo) -> RoomHandle {
        Arc::new(Self {
            id: info.id.clone(),
            info: RwLock::new(info),
        })
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn title(&self) -> String {
        let info = self.info.read();
        if info.title.is_empty() {
            self.id.to_string()
        } else {
            info.title.clone()
        }
    }

    pub fn set_title(&self, title: impl Into<String>) {
        self.info.write().title = title.into();
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.info.read().last_activity
    }

    /// Moves the activity timestamp forward; older timestamps are ignored.
    pub fn touch(&self, at: DateTime<Utc>) {
        let mut info = self.info.write();
        if at > info.last_activity {
            info.last_activity = at;
        }
    }

    /// Tags of the room, or the untagged pseudo tag when it has none.
    pub fn tags(&self) -> Vec<RoomTag> {
        let info = self.info.read();
        if info.tags.is_empty() {
            vec![RoomTag::untagged()]
        } else {
            info.tags.clone()
        }
    }

    pub fn set_tags(&self, tags: Vec<RoomTag>) {
        self.info.write().tags = tags;
    }

    pub fn members_fetched(&self) -> bool {
        self.info.read().members_fetched
    }

    pub fn set_members_fetched(&self, fetched: bool) {
        self.info.write().members_fetched = fetched;
    }

    pub fn replaced_by(&self) -> Option<RoomId> {
        self.info.read().replaced_by.clone()
    }

    pub fn is_replaced(&self) -> bool {
        self.info.read().replaced_by.is_some()
    }

    pub fn has_left(&self) -> bool {
        self.info.read().has_left
    }

    pub fn snapshot(&self) -> RoomInfo {
        self.info.read().clone()
    }
}
