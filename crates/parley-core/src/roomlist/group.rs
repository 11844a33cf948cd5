use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::constants::WINDOW_STEP;
use crate::models::{OrderKey, RoomHandle, RoomId};
use crate::roomlist::tags;

/// Smallest multiple of [`WINDOW_STEP`] that is at least `target_distance`,
/// never shrinking below `current_size` or the minimum window.
pub fn next_window_size(current_size: usize, target_distance: usize) -> usize {
    let needed = target_distance.div_ceil(WINDOW_STEP) * WINDOW_STEP;
    needed.max(current_size).max(WINDOW_STEP)
}

#[derive(Debug, Clone)]
pub struct GroupEntry {
    pub order: OrderKey,
    pub room: RoomHandle,
}

/// The conversations carrying one tag.
///
/// Entries are stored by descending order key. The screen shows them in
/// reverse, so the last stored entry is the top row. Only the trailing
/// `visible_count` entries are shown; the window grows downwards.
///
/// `visible_count` and `collapsed` are rendering hints and may be adjusted
/// through a shared reference while navigation holds the index read lock.
#[derive(Debug)]
pub struct OrderedGroup {
    tag: String,
    hidden: bool,
    entries: Vec<GroupEntry>,
    visible_count: AtomicUsize,
    collapsed: AtomicBool,
}

impl OrderedGroup {
    pub fn new(tag: impl Into<String>) -> Self {
        let tag = tag.into();
        Self {
            hidden: tags::display_name(&tag).is_none(),
            tag,
            entries: Vec::new(),
            visible_count: AtomicUsize::new(WINDOW_STEP),
            collapsed: AtomicBool::new(false),
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Namespaced tags without a display name are indexed but never drawn.
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[GroupEntry] {
        &self.entries
    }

    pub fn index(&self, room: &RoomId) -> Option<usize> {
        self.entries.iter().position(|e| e.room.id() == room)
    }

    pub fn contains(&self, room: &RoomId) -> bool {
        self.index(room).is_some()
    }

    /// Inserts keeping descending key order. Equal keys land after the
    /// existing ones, i.e. above them on screen. Returns false for duplicates.
    pub fn insert(&mut self, order: OrderKey, room: RoomHandle) -> bool {
        if self.contains(room.id()) {
            return false;
        }
        let pos = self.entries.partition_point(|e| e.order >= order);
        self.entries.insert(pos, GroupEntry { order, room });
        true
    }

    pub fn remove_at(&mut self, index: usize) -> Option<GroupEntry> {
        if index < self.entries.len() {
            Some(self.entries.remove(index))
        } else {
            None
        }
    }

    pub fn remove(&mut self, room: &RoomId) -> Option<usize> {
        let index = self.index(room)?;
        self.entries.remove(index);
        Some(index)
    }

    /// Re-inserts the room with its current key for this tag.
    pub fn bump(&mut self, room: &RoomHandle) -> bool {
        let Some(index) = self.index(room.id()) else {
            return false;
        };
        let previous = self.entries.remove(index);
        let order = room
            .tags()
            .into_iter()
            .find(|t| t.tag == self.tag)
            .map(|t| t.order)
            .unwrap_or(previous.order);
        self.insert(order, room.clone())
    }

    pub fn visible_count(&self) -> usize {
        self.visible_count.load(Ordering::Relaxed)
    }

    pub fn visible_len(&self) -> usize {
        self.visible_count().min(self.entries.len())
    }

    /// The suffix window of stored entries.
    pub fn visible(&self) -> &[GroupEntry] {
        let start = self.entries.len() - self.visible_len();
        &self.entries[start..]
    }

    /// Index of the room inside [`Self::visible`].
    pub fn index_visible(&self, room: &RoomId) -> Option<usize> {
        self.visible().iter().position(|e| e.room.id() == room)
    }

    pub fn has_invisible_rooms(&self) -> bool {
        self.entries.len() > self.visible_count()
    }

    /// Whether navigation may land in this group.
    pub fn has_visible_rooms(&self) -> bool {
        !self.is_empty() && !self.is_collapsed() && !self.hidden
    }

    /// Top row on screen.
    pub fn first_visible(&self) -> Option<&RoomHandle> {
        self.visible().last().map(|e| &e.room)
    }

    /// Bottom row of the window.
    pub fn last_visible(&self) -> Option<&RoomHandle> {
        self.visible().first().map(|e| &e.room)
    }

    /// Grows the window so the stored entry at `index` is shown.
    pub fn expand_to_index(&self, index: usize) -> bool {
        let total = self.entries.len();
        if index >= total || index >= total - self.visible_len() {
            return false;
        }
        let size = next_window_size(self.visible_count(), total - index);
        self.visible_count.fetch_max(size, Ordering::Relaxed);
        true
    }

    pub fn expand_to_include(&self, room: &RoomId) -> bool {
        match self.index(room) {
            Some(index) => self.expand_to_index(index),
            None => false,
        }
    }

    /// Grows or shrinks the window by `delta`, keeping it at least one step.
    pub fn resize_window(&self, delta: isize) {
        let current = self.visible_count() as isize;
        let size = (current + delta).max(WINDOW_STEP as isize) as usize;
        self.visible_count.store(size, Ordering::Relaxed);
    }

    pub fn is_collapsed(&self) -> bool {
        self.collapsed.load(Ordering::Relaxed)
    }

    pub fn toggle_collapse(&self) {
        self.collapsed.fetch_xor(true, Ordering::Relaxed);
    }

    /// Whether a "more/less" footer row is drawn.
    pub fn has_footer(&self) -> bool {
        !self.is_collapsed() && (self.has_invisible_rooms() || self.visible_count() > WINDOW_STEP)
    }

    pub fn render_height(&self) -> usize {
        if self.is_empty() || self.hidden {
            return 0;
        }
        if self.is_collapsed() {
            return 1;
        }
        1 + self.visible_len() + usize::from(self.has_footer())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Room, RoomInfo, RoomTag};

    fn room(id: &str) -> RoomHandle {
        Room::new(RoomInfo::new(id, id))
    }

    fn keys(group: &OrderedGroup) -> Vec<f64> {
        group.entries().iter().map(|e| e.order.value()).collect()
    }

    fn group_with(count: usize) -> OrderedGroup {
        let mut group = OrderedGroup::new("m.favourite");
        for key in 1..=count {
            group.insert(OrderKey::new(key as f64), room(&format!("!r{}", key)));
        }
        group
    }

    #[test]
    fn test_next_window_size() {
        assert_eq!(next_window_size(10, 0), 10);
        assert_eq!(next_window_size(10, 10), 10);
        assert_eq!(next_window_size(10, 11), 20);
        assert_eq!(next_window_size(10, 20), 20);
        assert_eq!(next_window_size(10, 21), 30);
        assert_eq!(next_window_size(40, 11), 40);
        assert_eq!(next_window_size(0, 1), 10);
    }

    #[test]
    fn test_next_window_size_is_step_multiple() {
        for current in (10..=50).step_by(10) {
            for distance in 0..120 {
                let size = next_window_size(current, distance);
                assert_eq!(size % WINDOW_STEP, 0);
                assert!(size >= current);
                assert!(size >= distance);
            }
        }
    }

    #[test]
    fn test_insert_keeps_descending_order() {
        let mut group = OrderedGroup::new("");
        for (i, key) in [3.0, 9.0, 1.0, 5.0, 9.0, 0.5].iter().enumerate() {
            group.insert(OrderKey::new(*key), room(&format!("!r{}", i)));
        }
        assert_eq!(keys(&group), vec![9.0, 9.0, 5.0, 3.0, 1.0, 0.5]);
    }

    #[test]
    fn test_sorted_after_mixed_insert_remove() {
        let mut group = OrderedGroup::new("");
        let mut next = 0;
        for round in 0..40 {
            let key = ((round * 37) % 11) as f64;
            group.insert(OrderKey::new(key), room(&format!("!r{}", next)));
            next += 1;
            if round % 3 == 0 {
                let victim = format!("!r{}", round / 2);
                group.remove(&RoomId::new(victim));
            }
            let k = keys(&group);
            assert!(k.windows(2).all(|w| w[0] >= w[1]), "unsorted: {:?}", k);
        }
    }

    #[test]
    fn test_equal_keys_are_insertion_stable() {
        let mut group = OrderedGroup::new("");
        group.insert(OrderKey::DEFAULT, room("!a"));
        group.insert(OrderKey::DEFAULT, room("!b"));
        group.insert(OrderKey::DEFAULT, room("!c"));

        let ids: Vec<_> = group.entries().iter().map(|e| e.room.id().to_string()).collect();
        assert_eq!(ids, vec!["!a", "!b", "!c"]);
        // Latest insert is the top row
        assert_eq!(group.first_visible().unwrap().id().as_str(), "!c");
    }

    #[test]
    fn test_duplicate_insert_is_noop() {
        let mut group = OrderedGroup::new("");
        let r = room("!a");
        assert!(group.insert(OrderKey::new(1.0), r.clone()));
        assert!(!group.insert(OrderKey::new(2.0), r));
        assert_eq!(group.len(), 1);
        assert_eq!(keys(&group), vec![1.0]);
    }

    #[test]
    fn test_visible_is_suffix_window() {
        let group = group_with(12);
        assert_eq!(group.visible_count(), 10);
        assert_eq!(group.visible().len(), 10);
        let visible: Vec<f64> = group.visible().iter().map(|e| e.order.value()).collect();
        assert_eq!(visible, vec![10.0, 9.0, 8.0, 7.0, 6.0, 5.0, 4.0, 3.0, 2.0, 1.0]);
        assert!(group.has_invisible_rooms());
    }

    #[test]
    fn test_visible_shorter_than_window() {
        let group = group_with(4);
        assert_eq!(group.visible().len(), 4);
        assert!(!group.has_invisible_rooms());
        assert!(!group.has_footer());
    }

    #[test]
    fn test_expand_to_include_hidden_entry() {
        let group = group_with(12);
        let eleven = RoomId::new("!r11");
        assert!(group.index_visible(&eleven).is_none());

        assert!(group.expand_to_include(&eleven));
        assert_eq!(group.visible_count(), 20);
        assert!(group.index_visible(&eleven).is_some());

        // Already visible: no growth
        assert!(!group.expand_to_include(&eleven));
        assert_eq!(group.visible_count(), 20);
    }

    #[test]
    fn test_expand_far_entry_rounds_up() {
        let group = group_with(35);
        assert!(group.expand_to_include(&RoomId::new("!r35")));
        assert_eq!(group.visible_count(), 40);
        assert_eq!(group.visible().len(), 35);
    }

    #[test]
    fn test_render_height() {
        assert_eq!(OrderedGroup::new("").render_height(), 0);

        let small = group_with(3);
        assert_eq!(small.render_height(), 1 + 3);

        let big = group_with(12);
        assert_eq!(big.render_height(), 1 + 10 + 1);

        big.expand_to_include(&RoomId::new("!r12"));
        // Grown window keeps the footer for "less"
        assert_eq!(big.render_height(), 1 + 12 + 1);

        big.toggle_collapse();
        assert_eq!(big.render_height(), 1);
    }

    #[test]
    fn test_hidden_tag_has_no_rows() {
        let mut group = OrderedGroup::new("com.example.private");
        group.insert(OrderKey::DEFAULT, room("!a"));
        assert!(group.is_hidden());
        assert_eq!(group.render_height(), 0);
        assert!(!group.has_visible_rooms());
    }

    #[test]
    fn test_resize_window_never_below_step() {
        let group = group_with(30);
        group.resize_window(10);
        assert_eq!(group.visible_count(), 20);
        group.resize_window(-100);
        assert_eq!(group.visible_count(), 10);
    }

    #[test]
    fn test_bump_moves_to_top_of_equal_keys() {
        let mut group = OrderedGroup::new("");
        let a = room("!a");
        let b = room("!b");
        group.insert(OrderKey::DEFAULT, a.clone());
        group.insert(OrderKey::DEFAULT, b);
        assert_eq!(group.first_visible().unwrap().id().as_str(), "!b");

        assert!(group.bump(&a));
        assert_eq!(group.first_visible().unwrap().id().as_str(), "!a");
        assert_eq!(group.len(), 2);
    }

    #[test]
    fn test_bump_picks_up_new_order() {
        let mut group = OrderedGroup::new("m.favourite");
        let a = room("!a");
        a.set_tags(vec![RoomTag::new("m.favourite", 0.9)]);
        group.insert(OrderKey::new(0.9), a.clone());
        group.insert(OrderKey::new(0.5), room("!b"));
        assert_eq!(group.first_visible().unwrap().id().as_str(), "!b");

        a.set_tags(vec![RoomTag::new("m.favourite", 0.1)]);
        group.bump(&a);
        assert_eq!(group.first_visible().unwrap().id().as_str(), "!a");
    }
}
