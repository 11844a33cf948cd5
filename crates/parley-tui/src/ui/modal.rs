use parley_core::models::RoomHandle;
use parley_core::roomlist::Selection;

use crate::ui::format::fuzzy_match;

/// One room matching the search query.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub room: RoomHandle,
    pub title: String,
    /// Char positions in `title` that matched the query
    pub positions: Vec<usize>,
}

/// State for the room search modal (Ctrl+K)
#[derive(Debug, Clone, Default)]
pub struct RoomSearchState {
    pub query: String,
    pub selected_index: usize,
    candidates: Vec<RoomHandle>,
    hits: Vec<SearchHit>,
}

impl RoomSearchState {
    /// Starts a search over `candidates`, expected sorted by title.
    pub fn new(candidates: Vec<RoomHandle>) -> Self {
        let mut state = Self {
            candidates,
            ..Default::default()
        };
        state.refresh();
        state
    }

    pub fn hits(&self) -> &[SearchHit] {
        &self.hits
    }

    pub fn push_char(&mut self, c: char) {
        self.query.push(c);
        self.refresh();
    }

    pub fn pop_char(&mut self) {
        self.query.pop();
        self.refresh();
    }

    pub fn push_str(&mut self, text: &str) {
        self.query.extend(text.chars().filter(|c| !c.is_control()));
        self.refresh();
    }

    pub fn move_up(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        if self.selected_index + 1 < self.hits.len() {
            self.selected_index += 1;
        }
    }

    /// Selection for the highlighted hit, under the room's first tag.
    pub fn selection(&self) -> Option<Selection> {
        let hit = self.hits.get(self.selected_index)?;
        let tag = hit.room.tags().into_iter().next()?.tag;
        Some(Selection::new(tag, hit.room.clone()))
    }

    fn refresh(&mut self) {
        let query = self.query.trim();
        self.hits = self
            .candidates
            .iter()
            .filter_map(|room| {
                let title = room.title();
                let positions = fuzzy_match(query, &title)?;
                Some(SearchHit {
                    room: room.clone(),
                    title,
                    positions,
                })
            })
            .collect();
        // Shorter titles first: tighter matches
        if !query.is_empty() {
            self.hits.sort_by_key(|hit| hit.title.chars().count());
        }
        self.selected_index = self.selected_index.min(self.hits.len().saturating_sub(1));
    }
}

#[derive(Debug, Clone, Default)]
pub enum ModalState {
    #[default]
    None,
    RoomSearch(RoomSearchState),
}

impl ModalState {
    pub fn is_open(&self) -> bool {
        !matches!(self, ModalState::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::models::{Room, RoomInfo, RoomTag};

    fn rooms() -> Vec<RoomHandle> {
        let mut fav = RoomInfo::new("!f", "Friends");
        fav.tags = vec![RoomTag::new("m.favourite", 0.1)];
        vec![
            Room::new(RoomInfo::new("!a", "Announcements")),
            Room::new(fav),
            Room::new(RoomInfo::new("!r", "Rust")),
        ]
    }

    #[test]
    fn test_empty_query_lists_everything() {
        let state = RoomSearchState::new(rooms());
        assert_eq!(state.hits().len(), 3);
        assert_eq!(state.hits()[0].title, "Announcements");
    }

    #[test]
    fn test_query_filters_and_ranks() {
        let mut state = RoomSearchState::new(rooms());
        state.push_str("ns");
        let titles: Vec<&str> = state.hits().iter().map(|h| h.title.as_str()).collect();
        assert_eq!(titles, vec!["Friends", "Announcements"]);

        state.push_char('z');
        assert!(state.hits().is_empty());
        assert!(state.selection().is_none());

        state.pop_char();
        assert_eq!(state.hits().len(), 2);
    }

    #[test]
    fn test_selection_uses_first_tag() {
        let mut state = RoomSearchState::new(rooms());
        state.push_str("fri");
        let selection = state.selection().unwrap();
        assert_eq!(selection.tag, "m.favourite");
        assert_eq!(selection.room_id().as_str(), "!f");

        let mut state = RoomSearchState::new(rooms());
        state.push_str("rust");
        assert_eq!(state.selection().unwrap().tag, "");
    }

    #[test]
    fn test_move_clamps() {
        let mut state = RoomSearchState::new(rooms());
        state.move_up();
        assert_eq!(state.selected_index, 0);
        for _ in 0..5 {
            state.move_down();
        }
        assert_eq!(state.selected_index, 2);
        state.push_str("rust");
        assert_eq!(state.selected_index, 0);
    }
}
