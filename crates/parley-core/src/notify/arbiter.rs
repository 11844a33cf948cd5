use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::client::MatrixClient;
use crate::config::Preferences;
use crate::constants::{ACTIVE_READ_WINDOW, ALERT_SUPPRESS_WINDOW, DEFAULT_SOUND_NAME};
use crate::models::{MessagePreview, PushActions, RoomHandle, TimelineEvent};
use crate::notify::alert::{Alert, Alerter};
use crate::roomlist::ConversationIndex;
use crate::store::ActivityTracker;

#[derive(Debug, Default)]
struct FocusState {
    terminal_focused: bool,
    last_focus: Option<Instant>,
}

/// Whether the terminal has focus, and when the user last interacted.
#[derive(Debug, Default)]
pub struct FocusClock {
    state: Mutex<FocusState>,
}

impl FocusClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records user input at `now`.
    pub fn focus(&self, now: Instant) {
        self.state.lock().last_focus = Some(now);
    }

    /// Terminal focus change. Losing focus starts the windows from `now`.
    pub fn set_terminal_focus(&self, focused: bool, now: Instant) {
        let mut state = self.state.lock();
        state.terminal_focused = focused;
        state.last_focus = Some(now);
    }

    pub fn is_focused(&self) -> bool {
        self.state.lock().terminal_focused
    }

    pub fn last_focus(&self) -> Option<Instant> {
        self.state.lock().last_focus
    }

    /// A focused terminal is inside every window. Never-focused counts as
    /// focused long ago.
    pub fn focused_within(&self, window: Duration, now: Instant) -> bool {
        let state = self.state.lock();
        state.terminal_focused
            || state
                .last_focus
                .is_some_and(|at| now.saturating_duration_since(at) < window)
    }
}

/// User settings the arbiter consults for every message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertSettings {
    pub user_id: String,
    pub disable_notifications: bool,
    pub notify_sound: bool,
}

impl From<&Preferences> for AlertSettings {
    fn from(prefs: &Preferences) -> Self {
        Self {
            user_id: prefs.user_id.clone(),
            disable_notifications: prefs.disable_notifications,
            notify_sound: prefs.notify_sound,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    /// Sent by the local user; position bumped, nothing else.
    OwnMessage,
    /// Open and actively watched: read marker advanced.
    MarkedRead,
    MarkedUnread { highlight: bool },
}

/// What the arbiter decided for one inbound message.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub read: ReadOutcome,
    pub alert: Option<Alert>,
}

/// Decides, per inbound message, between read, unread, highlight and alert.
pub struct NotificationArbiter {
    index: Arc<ConversationIndex>,
    activity: Arc<ActivityTracker>,
    client: Arc<dyn MatrixClient>,
    alerter: Arc<dyn Alerter>,
    focus: Arc<FocusClock>,
    settings: RwLock<AlertSettings>,
}

impl NotificationArbiter {
    pub fn new(
        index: Arc<ConversationIndex>,
        activity: Arc<ActivityTracker>,
        client: Arc<dyn MatrixClient>,
        alerter: Arc<dyn Alerter>,
        focus: Arc<FocusClock>,
        settings: AlertSettings,
    ) -> Self {
        Self {
            index,
            activity,
            client,
            alerter,
            focus,
            settings: RwLock::new(settings),
        }
    }

    pub fn focus_clock(&self) -> &Arc<FocusClock> {
        &self.focus
    }

    pub fn set_settings(&self, settings: AlertSettings) {
        *self.settings.write() = settings;
    }

    pub fn settings(&self) -> AlertSettings {
        self.settings.read().clone()
    }

    pub fn on_message(
        &self,
        room: &RoomHandle,
        event: &TimelineEvent,
        push: &PushActions,
        now: Instant,
    ) -> Verdict {
        room.touch(event.timestamp);
        self.index.bump(room);
        if event.is_text() {
            self.activity
                .set_preview(room.id(), MessagePreview::from(event));
        }

        let settings = self.settings();
        if !settings.user_id.is_empty() && event.sender == settings.user_id {
            return Verdict {
                read: ReadOutcome::OwnMessage,
                alert: None,
            };
        }

        let is_current = self
            .index
            .selected_room()
            .is_some_and(|open| open.id() == room.id());
        let focused = self.focus.focused_within(ACTIVE_READ_WINDOW, now);
        let recently_focused = self.focus.focused_within(ALERT_SUPPRESS_WINDOW, now);

        let read = if is_current && focused {
            self.activity.mark_read(room.id(), &event.id);
            self.client.mark_read(room.id(), &event.id);
            ReadOutcome::MarkedRead
        } else {
            self.activity
                .add_unread(room.id(), event.id.clone(), push.notify, push.highlight);
            ReadOutcome::MarkedUnread {
                highlight: push.highlight,
            }
        };

        let alert = (push.notify && !recently_focused && !settings.disable_notifications)
            .then(|| build_alert(room, event, push, &settings));
        if let Some(alert) = &alert {
            debug!(
                room = %room.id(),
                title = %alert.title,
                critical = alert.critical,
                sound = alert.sound,
                "raising alert"
            );
            if let Err(e) = self.alerter.raise_alert(alert) {
                warn!("Failed to raise alert for {}: {}", room.id(), e);
            }
        }

        Verdict { read, alert }
    }
}

fn build_alert(
    room: &RoomHandle,
    event: &TimelineEvent,
    push: &PushActions,
    settings: &AlertSettings,
) -> Alert {
    let sender = event.notification_sender();
    let room_title = room.title();
    let title = if sender == room_title {
        sender.to_string()
    } else {
        format!("{} ({})", sender, room_title)
    };
    Alert {
        title,
        body: event.notification_content(),
        critical: push.highlight,
        sound: push.play_sound
            && push.sound_name.as_deref() == Some(DEFAULT_SOUND_NAME)
            && settings.notify_sound,
    }
}
