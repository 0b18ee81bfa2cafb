//! Unix signal handling.
//!
//! Signals are translated into [`CoreEvent`]s on the coordinator's channel so
//! the main loop has a single place where it waits.

use anyhow::{Context, Result};
use signal_hook::{
    consts::signal::{SIGHUP, SIGINT, SIGTERM, SIGUSR2},
    iterator::Signals,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::thread;

use crate::core::CoreEvent;

/// What a received signal asks the daemon to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    Shutdown,
    Reload,
    Ignore,
}

pub fn classify_signal(signal: i32) -> SignalAction {
    match signal {
        SIGINT | SIGTERM | SIGHUP => SignalAction::Shutdown,
        SIGUSR2 => SignalAction::Reload,
        _ => SignalAction::Ignore,
    }
}

/// Spawn the signal thread.
///
/// Shutdown signals clear `running` before posting the event so that loops
/// polling the flag stop even if the channel is momentarily full of work.
pub fn setup_signal_handler(
    sender: Sender<CoreEvent>,
    running: Arc<AtomicBool>,
    debug_enabled: bool,
) -> Result<()> {
    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP, SIGUSR2])
        .context("failed to register signal handlers")?;

    thread::spawn(move || {
        for sig in signals.forever() {
            let event = match classify_signal(sig) {
                SignalAction::Shutdown => {
                    if debug_enabled {
                        log_pipe!();
                        log_debug!("Received signal {sig}, shutting down");
                    }
                    running.store(false, Ordering::SeqCst);
                    CoreEvent::Shutdown
                }
                SignalAction::Reload => {
                    log_block_start!("Received reload signal");
                    CoreEvent::Reload
                }
                SignalAction::Ignore => continue,
            };

            let shutting_down = matches!(event, CoreEvent::Shutdown);
            if sender.send(event).is_err() || shutting_down {
                break;
            }
        }
    });

    Ok(())
}
