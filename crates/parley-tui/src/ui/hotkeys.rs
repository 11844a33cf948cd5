//! Hotkey registry
//!
//! Every keyboard shortcut is declared once in [`HOTKEYS`]. Input handling
//! resolves a key event against the active [`HotkeyContext`]; keys with no
//! binding pass through to the focused widget (the composer, the search
//! query).

use crossterm::event::{KeyCode, KeyModifiers};

/// Action triggered by a hotkey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HotkeyId {
    // === Global ===
    Quit,
    NextRoom,
    PrevRoom,
    NextActiveRoom,
    SearchRooms,

    // === Room list ===
    ListUp,
    ListDown,
    PageUp,
    PageDown,
    SelectRoom,

    // === Conversation ===
    SendMessage,
    Back,

    // === Modal ===
    ModalClose,
    ModalConfirm,
    ModalUp,
    ModalDown,
}

/// Where a hotkey is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HotkeyContext {
    /// Active everywhere
    Global,
    RoomList,
    Conversation,
    SearchModal,
}

#[derive(Debug, Clone)]
pub struct HotkeyBinding {
    pub id: HotkeyId,
    pub key: KeyCode,
    pub modifiers: KeyModifiers,
    /// Short label for the status bar hint
    pub label: &'static str,
    pub contexts: &'static [HotkeyContext],
    /// Higher is checked first
    pub priority: u8,
}

impl HotkeyBinding {
    pub const fn new(
        id: HotkeyId,
        key: KeyCode,
        label: &'static str,
        contexts: &'static [HotkeyContext],
    ) -> Self {
        Self::with_modifiers(id, key, KeyModifiers::NONE, label, contexts)
    }

    pub const fn with_modifiers(
        id: HotkeyId,
        key: KeyCode,
        modifiers: KeyModifiers,
        label: &'static str,
        contexts: &'static [HotkeyContext],
    ) -> Self {
        Self {
            id,
            key,
            modifiers,
            label,
            contexts,
            priority: 0,
        }
    }

    pub const fn ctrl(
        id: HotkeyId,
        key: KeyCode,
        label: &'static str,
        contexts: &'static [HotkeyContext],
    ) -> Self {
        Self::with_modifiers(id, key, KeyModifiers::CONTROL, label, contexts)
    }

    pub const fn alt(
        id: HotkeyId,
        key: KeyCode,
        label: &'static str,
        contexts: &'static [HotkeyContext],
    ) -> Self {
        Self::with_modifiers(id, key, KeyModifiers::ALT, label, contexts)
    }

    pub const fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    pub fn matches(&self, key: KeyCode, modifiers: KeyModifiers) -> bool {
        self.key == key && self.modifiers == modifiers
    }

    /// Global bindings apply everywhere except under the search modal,
    /// which owns all input while open.
    pub fn is_active_in(&self, context: HotkeyContext) -> bool {
        self.contexts.contains(&context)
            || (self.contexts.contains(&HotkeyContext::Global)
                && context != HotkeyContext::SearchModal)
    }

    /// Display string for the key combination, e.g. `Ctrl+k`.
    pub fn key_display(&self) -> String {
        let mut parts = Vec::new();
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            parts.push("Ctrl".to_string());
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            parts.push("Alt".to_string());
        }
        let key = match self.key {
            KeyCode::Char(c) => c.to_string(),
            KeyCode::Enter => "Enter".to_string(),
            KeyCode::Esc => "Esc".to_string(),
            KeyCode::Up => "↑".to_string(),
            KeyCode::Down => "↓".to_string(),
            KeyCode::PageUp => "PgUp".to_string(),
            KeyCode::PageDown => "PgDn".to_string(),
            _ => "?".to_string(),
        };
        parts.push(key);
        parts.join("+")
    }
}

const GLOBAL: &[HotkeyContext] = &[HotkeyContext::Global];
const ROOM_LIST: &[HotkeyContext] = &[HotkeyContext::RoomList];
const CONVERSATION: &[HotkeyContext] = &[HotkeyContext::Conversation];
const LIST_AND_CONVERSATION: &[HotkeyContext] =
    &[HotkeyContext::RoomList, HotkeyContext::Conversation];
const SEARCH_MODAL: &[HotkeyContext] = &[HotkeyContext::SearchModal];

// Conventions:
// - Esc always goes back or closes
// - Enter always confirms, selects or sends
// - Ctrl/Alt + arrows switch rooms from anywhere
pub static HOTKEYS: &[HotkeyBinding] = &[
    // Global
    HotkeyBinding::ctrl(HotkeyId::Quit, KeyCode::Char('q'), "quit", GLOBAL),
    HotkeyBinding::ctrl(HotkeyId::NextRoom, KeyCode::Down, "next room", GLOBAL),
    HotkeyBinding::alt(HotkeyId::NextRoom, KeyCode::Down, "next room", GLOBAL),
    HotkeyBinding::ctrl(HotkeyId::PrevRoom, KeyCode::Up, "previous room", GLOBAL),
    HotkeyBinding::alt(HotkeyId::PrevRoom, KeyCode::Up, "previous room", GLOBAL),
    HotkeyBinding::alt(HotkeyId::NextActiveRoom, KeyCode::Char('a'), "next active", GLOBAL),
    HotkeyBinding::ctrl(HotkeyId::SearchRooms, KeyCode::Char('k'), "search", GLOBAL),
    // Room list
    HotkeyBinding::new(HotkeyId::ListUp, KeyCode::Up, "up", ROOM_LIST),
    HotkeyBinding::new(HotkeyId::ListUp, KeyCode::Char('k'), "up", ROOM_LIST),
    HotkeyBinding::new(HotkeyId::ListDown, KeyCode::Down, "down", ROOM_LIST),
    HotkeyBinding::new(HotkeyId::ListDown, KeyCode::Char('j'), "down", ROOM_LIST),
    HotkeyBinding::new(HotkeyId::SelectRoom, KeyCode::Enter, "open", ROOM_LIST),
    HotkeyBinding::new(HotkeyId::PageUp, KeyCode::PageUp, "page up", LIST_AND_CONVERSATION),
    HotkeyBinding::new(HotkeyId::PageDown, KeyCode::PageDown, "page down", LIST_AND_CONVERSATION),
    // Conversation
    HotkeyBinding::new(HotkeyId::SendMessage, KeyCode::Enter, "send", CONVERSATION),
    HotkeyBinding::new(HotkeyId::Back, KeyCode::Esc, "back", LIST_AND_CONVERSATION),
    // Search modal
    HotkeyBinding::new(HotkeyId::ModalClose, KeyCode::Esc, "close", SEARCH_MODAL).with_priority(10),
    HotkeyBinding::new(HotkeyId::ModalConfirm, KeyCode::Enter, "open", SEARCH_MODAL).with_priority(10),
    HotkeyBinding::new(HotkeyId::ModalUp, KeyCode::Up, "up", SEARCH_MODAL).with_priority(10),
    HotkeyBinding::new(HotkeyId::ModalDown, KeyCode::Down, "down", SEARCH_MODAL).with_priority(10),
];

pub struct HotkeyResolver {
    /// Sorted by priority, highest first
    bindings: Vec<&'static HotkeyBinding>,
}

impl Default for HotkeyResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl HotkeyResolver {
    pub fn new() -> Self {
        let mut bindings: Vec<&'static HotkeyBinding> = HOTKEYS.iter().collect();
        bindings.sort_by(|a, b| b.priority.cmp(&a.priority));
        Self { bindings }
    }

    pub fn resolve(
        &self,
        key: KeyCode,
        modifiers: KeyModifiers,
        context: HotkeyContext,
    ) -> Option<HotkeyId> {
        self.bindings
            .iter()
            .find(|b| b.matches(key, modifiers) && b.is_active_in(context))
            .map(|b| b.id)
    }

    /// Pairs of bindings that share a key combination in an overlapping context.
    pub fn find_conflicts(&self) -> Vec<(HotkeyId, HotkeyId)> {
        let mut conflicts = Vec::new();
        for (i, a) in self.bindings.iter().enumerate() {
            for b in self.bindings.iter().skip(i + 1) {
                if a.key != b.key || a.modifiers != b.modifiers || a.priority != b.priority {
                    continue;
                }
                let overlap = a.contexts.iter().any(|ca| {
                    b.contexts.iter().any(|cb| {
                        ca == cb || *ca == HotkeyContext::Global || *cb == HotkeyContext::Global
                    })
                });
                if overlap {
                    conflicts.push((a.id, b.id));
                }
            }
        }
        conflicts
    }
}

pub fn resolver() -> &'static HotkeyResolver {
    use std::sync::OnceLock;
    static RESOLVER: OnceLock<HotkeyResolver> = OnceLock::new();
    RESOLVER.get_or_init(HotkeyResolver::new)
}

pub fn resolve_hotkey(
    key: KeyCode,
    modifiers: KeyModifiers,
    context: HotkeyContext,
) -> Option<HotkeyId> {
    resolver().resolve(key, modifiers, context)
}

/// First binding for an action, for hint text.
pub fn get_binding(id: HotkeyId) -> Option<&'static HotkeyBinding> {
    HOTKEYS.iter().find(|b| b.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hotkey_matching() {
        let binding =
            HotkeyBinding::ctrl(HotkeyId::SearchRooms, KeyCode::Char('k'), "search", GLOBAL);
        assert!(binding.matches(KeyCode::Char('k'), KeyModifiers::CONTROL));
        assert!(!binding.matches(KeyCode::Char('k'), KeyModifiers::NONE));
        assert!(!binding.matches(KeyCode::Char('x'), KeyModifiers::CONTROL));
    }

    #[test]
    fn test_global_context_skips_search_modal() {
        let binding = HotkeyBinding::ctrl(HotkeyId::Quit, KeyCode::Char('q'), "quit", GLOBAL);
        assert!(binding.is_active_in(HotkeyContext::RoomList));
        assert!(binding.is_active_in(HotkeyContext::Conversation));
        assert!(!binding.is_active_in(HotkeyContext::SearchModal));
        assert_eq!(
            resolve_hotkey(KeyCode::Down, KeyModifiers::ALT, HotkeyContext::SearchModal),
            None
        );
    }

    #[test]
    fn test_room_switching_works_everywhere() {
        for context in [HotkeyContext::RoomList, HotkeyContext::Conversation] {
            assert_eq!(
                resolve_hotkey(KeyCode::Down, KeyModifiers::ALT, context),
                Some(HotkeyId::NextRoom)
            );
            assert_eq!(
                resolve_hotkey(KeyCode::Up, KeyModifiers::CONTROL, context),
                Some(HotkeyId::PrevRoom)
            );
        }
    }

    #[test]
    fn test_enter_depends_on_context() {
        let enter = |ctx| resolve_hotkey(KeyCode::Enter, KeyModifiers::NONE, ctx);
        assert_eq!(enter(HotkeyContext::RoomList), Some(HotkeyId::SelectRoom));
        assert_eq!(enter(HotkeyContext::Conversation), Some(HotkeyId::SendMessage));
        assert_eq!(enter(HotkeyContext::SearchModal), Some(HotkeyId::ModalConfirm));
    }

    #[test]
    fn test_plain_chars_pass_through_in_text_contexts() {
        assert_eq!(
            resolve_hotkey(KeyCode::Char('j'), KeyModifiers::NONE, HotkeyContext::Conversation),
            None
        );
        assert_eq!(
            resolve_hotkey(KeyCode::Char('j'), KeyModifiers::NONE, HotkeyContext::SearchModal),
            None
        );
        assert_eq!(
            resolve_hotkey(KeyCode::Char('j'), KeyModifiers::NONE, HotkeyContext::RoomList),
            Some(HotkeyId::ListDown)
        );
    }

    #[test]
    fn test_no_conflicts() {
        assert!(HotkeyResolver::new().find_conflicts().is_empty());
    }

    #[test]
    fn test_key_display() {
        assert_eq!(get_binding(HotkeyId::SearchRooms).unwrap().key_display(), "Ctrl+k");
        assert_eq!(get_binding(HotkeyId::ListUp).unwrap().key_display(), "↑");
    }
}
