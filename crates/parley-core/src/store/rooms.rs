use std::collections::HashMap;

use parking_lot::RwLock;

use crate::models::{RoomHandle, RoomId};

/// Every conversation known to the client, indexed or not.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: RwLock<HashMap<RoomId, RoomHandle>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, room: &RoomId) -> Option<RoomHandle> {
        self.rooms.read().get(room).cloned()
    }

    pub fn insert(&self, room: RoomHandle) {
        self.rooms.write().insert(room.id().clone(), room);
    }

    pub fn remove(&self, room: &RoomId) -> Option<RoomHandle> {
        self.rooms.write().remove(room)
    }

    pub fn clear(&self) {
        self.rooms.write().clear();
    }

    /// Snapshot sorted by title, for searching.
    pub fn all(&self) -> Vec<RoomHandle> {
        let mut rooms: Vec<RoomHandle> = self.rooms.read().values().cloned().collect();
        rooms.sort_by_cached_key(|r| r.title().to_lowercase());
        rooms
    }

    pub fn len(&self) -> usize {
        self.rooms.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Room, RoomInfo};

    #[test]
    fn test_all_sorted_by_title() {
        let registry = RoomRegistry::new();
        registry.insert(Room::new(RoomInfo::new("!b", "beta")));
        registry.insert(Room::new(RoomInfo::new("!a", "Alpha")));
        let titles: Vec<String> = registry.all().iter().map(|r| r.title()).collect();
        assert_eq!(titles, vec!["Alpha", "beta"]);

        assert!(registry.remove(&RoomId::new("!a")).is_some());
        assert!(registry.remove(&RoomId::new("!a")).is_none());
        assert_eq!(registry.len(), 1);
    }
}
