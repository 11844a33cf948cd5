use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use parley_core::config::Preferences;
use parley_core::events::CoreEvent;
use parley_core::models::{RoomHandle, RoomId};
use parley_core::roomlist::Selection;
use parley_core::CoreRuntime;
use ratatui::layout::Rect;
use tracing::{debug, info, warn};

use crate::ui::composer::Composer;
use crate::ui::hotkeys::HotkeyContext;
use crate::ui::layout::{self, PaneAreas};
use crate::ui::modal::{ModalState, RoomSearchState};

/// Which panes are on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayState {
    /// Room list only
    CompactList,
    /// Conversation only
    CompactConversation,
    /// Room list and conversation side by side
    Full,
}

/// Component that receives keyboard input when no modal is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusTarget {
    RoomList,
    Conversation,
}

/// Whether an input event was handled or should fall through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Consumed,
    PassThrough,
}

/// Layout, focus and modal state. Owned by the UI loop only; background
/// tasks reach it through `CoreEvent`s.
pub struct App {
    pub running: bool,
    core: Arc<CoreRuntime>,
    pub prefs: Preferences,
    prefs_path: PathBuf,

    display_state: DisplayState,
    focus: FocusTarget,
    pub modal_state: ModalState,
    /// Focus to restore when the modal closes
    focus_below_modal: Option<FocusTarget>,

    pub composer: Composer,
    /// Room we last told the server we are typing in
    typing_sent: Option<RoomId>,

    areas: PaneAreas,
    /// Largest scroll offset of the open conversation at the last draw
    conversation_max_scroll: usize,
    /// First Ctrl+C shows a warning, the second quits
    pub pending_quit: bool,
}

impl App {
    pub fn new(core: Arc<CoreRuntime>, prefs: Preferences, prefs_path: PathBuf) -> Self {
        Self {
            running: true,
            core,
            prefs,
            prefs_path,
            display_state: DisplayState::Full,
            focus: FocusTarget::RoomList,
            modal_state: ModalState::None,
            focus_below_modal: None,
            composer: Composer::new(),
            typing_sent: None,
            areas: PaneAreas::default(),
            conversation_max_scroll: 0,
            pending_quit: false,
        }
    }

    pub fn core(&self) -> &Arc<CoreRuntime> {
        &self.core
    }

    pub fn display_state(&self) -> DisplayState {
        self.display_state
    }

    pub fn focus(&self) -> FocusTarget {
        self.focus
    }

    pub fn areas(&self) -> PaneAreas {
        self.areas
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn conversation_visible(&self) -> bool {
        self.areas.conversation.is_some()
    }

    pub fn selected_room(&self) -> Option<RoomHandle> {
        self.core.index().selected_room()
    }

    /// Hotkey context for the component that currently owns input.
    pub fn hotkey_context(&self) -> HotkeyContext {
        if self.modal_state.is_open() {
            return HotkeyContext::SearchModal;
        }
        match self.focus {
            FocusTarget::RoomList => HotkeyContext::RoomList,
            FocusTarget::Conversation => HotkeyContext::Conversation,
        }
    }

    // =========================================================================
    // Layout
    // =========================================================================

    /// Recomputes the display state and pane areas for a terminal size.
    ///
    /// Wide terminals get the full layout and narrow ones the conversation
    /// pane. The list-only state is reached by the user, never by a resize.
    pub fn reflow(&mut self, width: u16, height: u16) {
        let state = if width > self.prefs.compact_width {
            DisplayState::Full
        } else {
            DisplayState::CompactConversation
        };
        if state != self.display_state {
            debug!(?state, width, "display state changed");
        }
        self.display_state = state;
        self.areas = layout::split(
            Rect::new(0, 0, width, height),
            state,
            self.prefs.hide_room_list,
        );

        if let Some(list) = self.areas.room_list {
            self.core
                .index()
                .set_viewport(list.height as usize, list.width as usize);
        }

        let focus = match (self.areas.room_list, self.areas.conversation) {
            (Some(_), None) => FocusTarget::RoomList,
            (None, Some(_)) => FocusTarget::Conversation,
            _ => self.focus,
        };
        if self.modal_state.is_open() {
            self.focus_below_modal = Some(focus);
        } else {
            self.focus = focus;
        }
    }

    // =========================================================================
    // Modals
    // =========================================================================

    pub fn show_modal(&mut self, modal: ModalState) {
        if !self.modal_state.is_open() {
            self.focus_below_modal = Some(self.focus);
        }
        self.modal_state = modal;
    }

    pub fn hide_modal(&mut self) {
        self.modal_state = ModalState::None;
        if let Some(focus) = self.focus_below_modal.take() {
            self.focus = focus;
        }
    }

    /// Opens the room search over every indexed conversation.
    pub fn open_room_search(&mut self) {
        let index = self.core.index();
        let candidates = self
            .core
            .rooms()
            .all()
            .into_iter()
            .filter(|room| index.contains(room.id()))
            .collect();
        self.show_modal(ModalState::RoomSearch(RoomSearchState::new(candidates)));
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Makes `selection` the current conversation. `None` is ignored, which
    /// lets navigation results be passed straight through.
    pub fn switch_room(&mut self, selection: Option<Selection>, now: Instant) {
        let Some(selection) = selection else {
            return;
        };
        let index = self.core.index();
        index.set_selected(&selection.tag, &selection.room);
        let Some(room) = index
            .selected_room()
            .filter(|room| room.id() == selection.room_id())
        else {
            return;
        };

        if self.typing_sent.as_ref() != Some(room.id()) {
            self.stop_typing();
        }
        if self.conversation_visible() {
            self.core.focus().focus(now);
            self.core.mark_read_if_viewed(&room);
        }
        self.core.history().ensure_initial_history(room.id());
        self.core.history().spawn_fetch_members(room.clone());
        self.prefs.last_room = Some(room.id().to_string());
        debug!(room = %room.id(), "switched room");
    }

    /// Reselects the conversation that was open when the client last ran.
    pub fn restore_last_room(&mut self, now: Instant) {
        let Some(last) = self.prefs.last_room.clone() else {
            return;
        };
        let Some(room) = self.core.room(&RoomId::new(last)) else {
            return;
        };
        let Some(tag) = room.tags().into_iter().next() else {
            return;
        };
        self.switch_room(Some(Selection::new(tag.tag, room)), now);
    }

    /// Opens the selected conversation (Enter on the room list).
    pub fn select_room(&mut self, now: Instant) {
        if self.display_state == DisplayState::CompactList {
            self.display_state = DisplayState::CompactConversation;
            self.areas = layout::split(
                self.frame_area(),
                self.display_state,
                self.prefs.hide_room_list,
            );
        }
        if self.conversation_visible() {
            self.focus = FocusTarget::Conversation;
            if let Some(room) = self.selected_room() {
                self.core.focus().focus(now);
                self.core.mark_read_if_viewed(&room);
            }
        }
    }

    /// Goes back to the room list (Esc).
    pub fn back(&mut self) {
        if self.display_state == DisplayState::CompactConversation {
            self.display_state = DisplayState::CompactList;
            self.areas = layout::split(
                self.frame_area(),
                self.display_state,
                self.prefs.hide_room_list,
            );
            if let Some(list) = self.areas.room_list {
                self.core
                    .index()
                    .set_viewport(list.height as usize, list.width as usize);
            }
        }
        if self.areas.room_list.is_some() {
            self.focus = FocusTarget::RoomList;
        }
    }

    /// Terminal area the panes were last laid out for.
    pub fn frame_area(&self) -> Rect {
        let status = self.areas.statusbar;
        Rect::new(0, 0, status.width, status.y + status.height)
    }

    pub fn set_conversation_max_scroll(&mut self, max: usize) {
        self.conversation_max_scroll = max;
    }

    /// Scrolls the open conversation. Scrolling up past the top loads older
    /// history; reaching the bottom marks it read.
    pub fn scroll_conversation(&mut self, rows: isize, now: Instant) {
        let Some(room) = self.selected_room() else {
            return;
        };
        let buffer = self.core.buffers().get_or_create(room.id());
        let max = self.conversation_max_scroll;
        let offset = (buffer.scroll_offset() as isize + rows).clamp(0, max as isize);
        buffer.scroll_by(offset - buffer.scroll_offset() as isize);

        if rows > 0 && offset as usize == max && !buffer.reached_start() {
            self.core.history().spawn_load(room.id().clone());
        }
        if buffer.is_at_bottom() {
            self.core.focus().focus(now);
            self.core.mark_read_if_viewed(&room);
        }
    }

    // =========================================================================
    // Composer
    // =========================================================================

    pub fn send_composer(&mut self) {
        let Some(room) = self.selected_room() else {
            return;
        };
        let Some(body) = self.composer.take() else {
            return;
        };
        self.stop_typing();
        self.core.buffers().get_or_create(room.id()).scroll_to_bottom();
        self.core.send_message(room.id().clone(), body);
    }

    /// Tells the server whether we are typing, after every composer edit.
    pub fn update_typing(&mut self) {
        if self.prefs.disable_typing_notifs {
            return;
        }
        let typing = !self.composer.is_empty() && !self.composer.is_command();
        if !typing {
            self.stop_typing();
            return;
        }
        let Some(room) = self.selected_room() else {
            return;
        };
        if self.typing_sent.as_ref() != Some(room.id()) {
            self.stop_typing();
            self.core.client().send_typing(room.id(), true);
            self.typing_sent = Some(room.id().clone());
        }
    }

    fn stop_typing(&mut self) {
        if let Some(room) = self.typing_sent.take() {
            self.core.client().send_typing(&room, false);
        }
    }

    // =========================================================================
    // Runtime hooks
    // =========================================================================

    /// Any key, mouse or paste event counts as the user being present.
    pub fn note_input(&self, now: Instant) {
        self.core.focus().focus(now);
    }

    pub fn on_focus_gained(&mut self, now: Instant) {
        self.core.focus().set_terminal_focus(true, now);
        if self.conversation_visible() {
            if let Some(room) = self.selected_room() {
                self.core.mark_read_if_viewed(&room);
            }
        }
    }

    pub fn on_focus_lost(&mut self, now: Instant) {
        self.core.focus().set_terminal_focus(false, now);
    }

    pub fn handle_core_event(&mut self, event: CoreEvent) {
        match event {
            CoreEvent::Redraw => {}
            CoreEvent::HistoryLoaded { room, count } => {
                debug!(%room, count, "history page arrived");
            }
            CoreEvent::MembersFetched { room } => {
                debug!(%room, "members loaded");
            }
        }
    }

    pub fn save_preferences(&self) {
        match self.prefs.save(&self.prefs_path) {
            Ok(()) => info!(path = %self.prefs_path.display(), "saved preferences"),
            Err(e) => warn!("Failed to save preferences: {}", e),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::DateTime;
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use parking_lot::Mutex;
    use parley_core::client::{ClientError, HistoryPage, MatrixClient};
    use parley_core::models::{EventId, PushActions, Room, RoomInfo, RoomTag, TimelineEvent};
    use parley_core::notify::{AlertSettings, LogAlerter};
    use parley_core::roomlist::ListStrategy;
    use parley_core::{InboundMessage, SyncEvent};
    use tokio::sync::mpsc;

    #[derive(Default)]
    pub(crate) struct FakeClient {
        pub marked: Mutex<Vec<EventId>>,
        pub typing: Mutex<Vec<(RoomId, bool)>>,
        pub history_requests: Mutex<Vec<RoomId>>,
    }

    impl MatrixClient for FakeClient {
        fn get_history(
            &self,
            room: &RoomId,
            _limit: usize,
            _cursor: Option<String>,
        ) -> BoxFuture<'static, Result<HistoryPage, ClientError>> {
            self.history_requests.lock().push(room.clone());
            async { Ok(HistoryPage::default()) }.boxed()
        }

        fn fetch_members(&self, _room: &RoomId) -> BoxFuture<'static, Result<(), ClientError>> {
            async { Ok(()) }.boxed()
        }

        fn mark_read(&self, _room: &RoomId, event: &EventId) {
            self.marked.lock().push(event.clone());
        }

        fn send_typing(&self, room: &RoomId, typing: bool) {
            self.typing.lock().push((room.clone(), typing));
        }

        fn send_message(
            &self,
            _room: &RoomId,
            _body: &str,
        ) -> BoxFuture<'static, Result<EventId, ClientError>> {
            async { Ok(EventId::new("$sent")) }.boxed()
        }
    }

    pub(crate) fn test_app(strategy: ListStrategy) -> (App, Arc<FakeClient>) {
        let client = Arc::new(FakeClient::default());
        let (tx, _rx) = mpsc::unbounded_channel();
        let core = Arc::new(CoreRuntime::new(
            strategy,
            client.clone(),
            Arc::new(LogAlerter),
            AlertSettings::default(),
            tx,
        ));
        let dir = std::env::temp_dir().join("parley-test-unused");
        let app = App::new(core, Preferences::default(), dir.join("preferences.json"));
        (app, client)
    }

    pub(crate) fn add_rooms(app: &App, rooms: &[(&str, &str)]) -> Vec<RoomHandle> {
        let handles: Vec<RoomHandle> = rooms
            .iter()
            .enumerate()
            .map(|(i, (id, tag))| {
                let mut info = RoomInfo::new(*id, *id);
                info.tags = vec![RoomTag::new(*tag, i as f64)];
                info.last_activity = DateTime::from_timestamp(i as i64 * 60, 0).unwrap();
                Room::new(info)
            })
            .collect();
        app.core()
            .handle_sync_event(SyncEvent::SetRooms(handles.clone()), Instant::now());
        handles
    }

    #[test]
    fn test_reflow_wide_is_full() {
        let (mut app, _) = test_app(ListStrategy::TagGrouped);
        app.reflow(120, 40);
        assert_eq!(app.display_state(), DisplayState::Full);
        assert!(app.areas().room_list.is_some());
        assert!(app.conversation_visible());
    }

    #[test]
    fn test_reflow_narrow_shows_conversation() {
        let (mut app, _) = test_app(ListStrategy::TagGrouped);
        app.reflow(120, 40);
        app.reflow(60, 40);
        assert_eq!(app.display_state(), DisplayState::CompactConversation);
        assert_eq!(app.focus(), FocusTarget::Conversation);

        app.back();
        assert_eq!(app.display_state(), DisplayState::CompactList);
        assert_eq!(app.focus(), FocusTarget::RoomList);
        // A narrow resize goes back to the conversation pane
        app.reflow(70, 30);
        assert_eq!(app.display_state(), DisplayState::CompactConversation);
        assert_eq!(app.focus(), FocusTarget::Conversation);

        app.reflow(81, 30);
        assert_eq!(app.display_state(), DisplayState::Full);
        assert_eq!(app.focus(), FocusTarget::Conversation);
    }

    #[test]
    fn test_reflow_keeps_focus_in_full() {
        let (mut app, _) = test_app(ListStrategy::TagGrouped);
        app.reflow(120, 40);
        app.select_room(Instant::now());
        assert_eq!(app.focus(), FocusTarget::Conversation);
        app.reflow(100, 30);
        assert_eq!(app.focus(), FocusTarget::Conversation);
    }

    #[test]
    fn test_compact_select_and_back() {
        let (mut app, _) = test_app(ListStrategy::TagGrouped);
        app.reflow(60, 20);
        app.back();
        app.select_room(Instant::now());
        assert_eq!(app.display_state(), DisplayState::CompactConversation);
        assert_eq!(app.focus(), FocusTarget::Conversation);
        assert!(app.areas().room_list.is_none());
        assert_eq!(app.areas().conversation.unwrap().width, 60);
    }

    #[test]
    fn test_modal_restores_focus() {
        let (mut app, _) = test_app(ListStrategy::TagGrouped);
        app.reflow(120, 40);
        app.select_room(Instant::now());
        assert_eq!(app.focus(), FocusTarget::Conversation);

        app.open_room_search();
        assert_eq!(app.hotkey_context(), HotkeyContext::SearchModal);
        app.hide_modal();
        assert_eq!(app.focus(), FocusTarget::Conversation);
        assert_eq!(app.hotkey_context(), HotkeyContext::Conversation);
    }

    #[test]
    fn test_resize_under_modal_updates_restored_focus() {
        let (mut app, _) = test_app(ListStrategy::TagGrouped);
        app.reflow(120, 40);
        app.open_room_search();
        app.reflow(60, 40);
        app.hide_modal();
        assert_eq!(app.focus(), FocusTarget::Conversation);
    }

    #[tokio::test]
    async fn test_switch_room_marks_viewed_room_read() {
        let (mut app, client) = test_app(ListStrategy::TagGrouped);
        app.reflow(120, 40);
        let rooms = add_rooms(&app, &[("!a", "m.favourite"), ("!b", "m.favourite")]);

        let event = TimelineEvent::text("$1", "@bob:x", "hi", DateTime::from_timestamp(500, 0).unwrap());
        // Long unfocused, so the message stays unread
        app.core().handle_sync_event(
            SyncEvent::Message(InboundMessage {
                room: RoomId::new("!b"),
                event,
                push: PushActions::notify(),
            }),
            Instant::now(),
        );
        assert!(app.core().activity().has_unread(&RoomId::new("!b")));

        app.switch_room(Some(Selection::new("m.favourite", rooms[1].clone())), Instant::now());
        assert_eq!(app.selected_room().unwrap().id().as_str(), "!b");
        assert!(!app.core().activity().has_unread(&RoomId::new("!b")));
        assert_eq!(client.marked.lock().as_slice(), &[EventId::new("$1")]);
        assert_eq!(app.prefs.last_room.as_deref(), Some("!b"));
    }

    #[tokio::test]
    async fn test_switch_room_ignores_unindexed_room() {
        let (mut app, _) = test_app(ListStrategy::TagGrouped);
        add_rooms(&app, &[("!a", "m.favourite")]);
        let stranger = Room::new(RoomInfo::new("!zz", "stranger"));
        app.switch_room(Some(Selection::new("", stranger)), Instant::now());
        assert_eq!(app.selected_room().unwrap().id().as_str(), "!a");
        assert_eq!(app.prefs.last_room, None);
    }

    #[tokio::test]
    async fn test_restore_last_room() {
        let (mut app, _) = test_app(ListStrategy::Recency);
        add_rooms(&app, &[("!a", ""), ("!b", ""), ("!c", "")]);
        app.prefs.last_room = Some("!a".to_string());
        app.restore_last_room(Instant::now());
        assert_eq!(app.selected_room().unwrap().id().as_str(), "!a");
    }

    #[tokio::test]
    async fn test_typing_notifications() {
        let (mut app, client) = test_app(ListStrategy::TagGrouped);
        add_rooms(&app, &[("!a", "")]);
        let room = RoomId::new("!a");

        app.composer.insert_char('h');
        app.update_typing();
        app.composer.insert_char('i');
        app.update_typing();
        assert_eq!(client.typing.lock().as_slice(), &[(room.clone(), true)]);

        app.send_composer();
        assert_eq!(
            client.typing.lock().as_slice(),
            &[(room.clone(), true), (room.clone(), false)]
        );
        assert!(app.composer.is_empty());
    }

    #[test]
    fn test_commands_and_disabled_pref_never_type() {
        let (mut app, client) = test_app(ListStrategy::TagGrouped);
        add_rooms(&app, &[("!a", "")]);
        app.composer.handle_paste("/me waves");
        app.update_typing();
        assert!(client.typing.lock().is_empty());

        app.composer.take();
        app.prefs.disable_typing_notifs = true;
        app.composer.insert_char('x');
        app.update_typing();
        assert!(client.typing.lock().is_empty());
    }

    #[tokio::test]
    async fn test_scroll_to_top_requests_history() {
        let (mut app, client) = test_app(ListStrategy::TagGrouped);
        add_rooms(&app, &[("!a", "")]);
        app.set_conversation_max_scroll(5);
        app.scroll_conversation(3, Instant::now());
        assert_eq!(app.core().buffers().get(&RoomId::new("!a")).unwrap().scroll_offset(), 3);

        app.scroll_conversation(10, Instant::now());
        let buffer = app.core().buffers().get(&RoomId::new("!a")).unwrap();
        assert_eq!(buffer.scroll_offset(), 5);
        tokio::task::yield_now().await;
        assert_eq!(client.history_requests.lock().as_slice(), &[RoomId::new("!a")]);

        app.scroll_conversation(-100, Instant::now());
        assert!(buffer.is_at_bottom());
    }

    #[test]
    fn test_save_preferences_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        let (app, _) = test_app(ListStrategy::TagGrouped);
        let mut app = App::new(app.core().clone(), Preferences::default(), path.clone());
        app.prefs.last_room = Some("!a".into());
        app.save_preferences();
        assert_eq!(
            Preferences::load(&path).unwrap().last_room.as_deref(),
            Some("!a")
        );
    }
}
