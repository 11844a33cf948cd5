use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{Event, EventStream, KeyCode, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use parley_core::events::{CoreEvent, SyncEvent};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};

use crate::input::{handle_key, handle_mouse, handle_paste};
use crate::render::render;
use crate::ui::{App, Tui};

/// Redraw cadence for clocks and relative timestamps.
const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// How often preferences are written back to disk.
const AUTOSAVE_INTERVAL: Duration = Duration::from_secs(60);

pub(crate) async fn run_app(
    terminal: &mut Tui,
    app: &mut App,
    mut sync_rx: UnboundedReceiver<SyncEvent>,
    mut core_rx: UnboundedReceiver<CoreEvent>,
) -> Result<()> {
    // Create async event stream for terminal events
    let mut event_stream = EventStream::new();

    let mut tick_interval = tokio::time::interval(TICK_INTERVAL);
    let start = tokio::time::Instant::now() + AUTOSAVE_INTERVAL;
    let mut autosave_interval = tokio::time::interval_at(start, AUTOSAVE_INTERVAL);

    // The last open room can only be restored once the first room set arrives
    let mut restored_last_room = false;

    while app.running {
        terminal.draw(|f| render(f, app))?;

        tokio::select! {
            // Terminal UI events
            maybe_event = event_stream.next() => {
                match maybe_event {
                    Some(Ok(event)) => handle_terminal_event(app, event, Instant::now()),
                    Some(Err(e)) => return Err(e.into()),
                    None => {
                        info!("terminal event stream closed");
                        app.quit();
                    }
                }
            }

            // Updates from the sync collaborator
            Some(event) = sync_rx.recv() => {
                let set_rooms = matches!(event, SyncEvent::SetRooms(_));
                let now = Instant::now();
                app.core().handle_sync_event(event, now);
                if set_rooms && !restored_last_room {
                    restored_last_room = true;
                    app.restore_last_room(now);
                }
            }

            // Background work finished
            Some(event) = core_rx.recv() => {
                app.handle_core_event(event);
            }

            _ = tick_interval.tick() => {}

            _ = autosave_interval.tick() => {
                debug!("autosave");
                app.save_preferences();
            }
        }
    }

    Ok(())
}

/// Applies one terminal event. Ctrl+C must be pressed twice to quit; any
/// other key cancels the first press.
fn handle_terminal_event(app: &mut App, event: Event, now: Instant) {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
            app.note_input(now);
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                if app.pending_quit {
                    app.quit();
                } else {
                    app.pending_quit = true;
                }
            } else {
                app.pending_quit = false;
                handle_key(app, key, now);
            }
        }
        Event::Mouse(mouse) => {
            app.note_input(now);
            handle_mouse(app, mouse, now);
        }
        Event::Paste(text) => {
            app.note_input(now);
            handle_paste(app, &text);
        }
        Event::FocusGained => app.on_focus_gained(now),
        Event::FocusLost => app.on_focus_lost(now),
        Event::Resize(width, height) => app.reflow(width, height),
        _ => {}
    }
}
