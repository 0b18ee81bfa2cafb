//! Structured logging with box-drawing output.
//!
//! Every line salahshield prints goes through this module so that the daemon,
//! the one-shot commands and the simulator share one visual style:
//!
//! ```text
//! ┏ salahshield v0.3.0 ━━╸
//! ┃
//! ┣ Loaded configuration
//! ┃   Method: ISNA (user)
//! ┣[INFO] Shield started for Maghrib
//! ╹
//! ```
//!
//! ## Conventions
//!
//! - `log_block_start!` opens a new conceptual block (prints a spacer pipe first).
//! - `log_decorated!` continues a block on its own `┣` line.
//! - `log_indented!` prints nested details under the current line.
//! - `log_pipe!` inserts a bare spacer, mostly before `log_warning!`/`log_error!`
//!   when they start a block of their own.
//! - `log_version!` / `log_end!` bracket the whole session.
//! - `log_info!`, `log_warning!`, `log_error!`, `log_debug!`, `log_critical!`
//!   carry a coloured `[LEVEL]` tag.
//!
//! When simulated time is active every line is prefixed with the simulated
//! wall-clock, shown in the prayer set's zone and the local zone when they differ.

use std::io::Write;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Sender, channel};

static LOGGING_ENABLED: AtomicBool = AtomicBool::new(true);

// Zone of the active prayer set, used for simulation timestamps
static PRAYER_TIMEZONE: OnceLock<Option<chrono_tz::Tz>> = OnceLock::new();

// Present when output is redirected to a file (simulate --log)
static LOG_CHANNEL: OnceLock<Option<Sender<LogMessage>>> = OnceLock::new();

enum LogMessage {
    Formatted(String),
    Shutdown,
}

/// Logger control surface. The macros below are the writing surface.
pub struct Log;

impl Log {
    /// Enable or disable all output.
    pub fn set_enabled(enabled: bool) {
        LOGGING_ENABLED.store(enabled, Ordering::SeqCst);
    }

    pub fn is_enabled() -> bool {
        LOGGING_ENABLED.load(Ordering::SeqCst)
    }

    /// Record the zone prayer times are calculated in. Only the first call wins.
    pub fn set_prayer_timezone(tz: Option<chrono_tz::Tz>) {
        let _ = PRAYER_TIMEZONE.set(tz);
    }

    fn prayer_timezone() -> Option<chrono_tz::Tz> {
        PRAYER_TIMEZONE.get().and_then(|tz| *tz)
    }

    /// Route all further output to `file_path` until the guard is dropped.
    pub fn start_file_logging(file_path: String) -> anyhow::Result<LoggerGuard> {
        let (tx, rx) = channel();

        LOG_CHANNEL
            .set(Some(tx.clone()))
            .map_err(|_| anyhow::anyhow!("Logger channel already initialized"))?;

        let handle = std::thread::spawn(move || {
            let mut file = std::fs::File::create(&file_path)?;
            loop {
                match rx.recv() {
                    Ok(LogMessage::Formatted(text)) => file.write_all(text.as_bytes())?,
                    Ok(LogMessage::Shutdown) | Err(_) => {
                        file.flush()?;
                        break;
                    }
                }
            }
            Ok::<(), anyhow::Error>(())
        });

        Ok(LoggerGuard {
            tx,
            handle: Some(handle),
        })
    }

    /// Timestamp prefix shown while simulated time is running, empty otherwise.
    pub fn timestamp_prefix() -> String {
        if !(crate::time_source::is_initialized() && crate::time_source::is_simulated()) {
            return String::new();
        }

        let local_now = crate::time_source::now_local();
        let local_str = local_now.format("%H:%M:%S").to_string();

        match Self::prayer_timezone() {
            Some(tz) => {
                let prayer_str = local_now.with_timezone(&tz).format("%H:%M:%S").to_string();
                if prayer_str != local_str {
                    format!("[{prayer_str}P] [{local_str}L] ")
                } else {
                    format!("[{local_str}] ")
                }
            }
            None => format!("[{local_str}] "),
        }
    }

    /// Format one logical line with the given decoration and send it out.
    ///
    /// `lead` is placed before the message (for example `"┣ "`), and
    /// `spacer` adds a bare pipe line before it.
    #[doc(hidden)]
    pub fn emit(lead: &str, message: &str, spacer: bool) {
        if !Self::is_enabled() {
            return;
        }
        let prefix = Self::timestamp_prefix();
        let text = if spacer {
            format!("{prefix}┃\n{prefix}{lead}{message}\n")
        } else {
            format!("{prefix}{lead}{message}\n")
        };
        write_output(&text);
    }
}

/// Keeps the file logger thread alive; flushes and joins on drop.
pub struct LoggerGuard {
    tx: Sender<LogMessage>,
    handle: Option<std::thread::JoinHandle<anyhow::Result<()>>>,
}

impl Drop for LoggerGuard {
    fn drop(&mut self) {
        let _ = self.tx.send(LogMessage::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Remove `ESC [ ... m` colour sequences.
fn strip_ansi_codes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\x1b' && chars.peek() == Some(&'[') {
            chars.next();
            for ch in chars.by_ref() {
                if ch == 'm' {
                    break;
                }
            }
        } else {
            result.push(ch);
        }
    }

    result
}

/// Send formatted text to the file logger if active, stdout otherwise.
pub fn write_output(text: &str) {
    if let Some(Some(tx)) = LOG_CHANNEL.get() {
        let _ = tx.send(LogMessage::Formatted(strip_ansi_codes(text)));
    } else {
        print!("{text}");
        let _ = std::io::stdout().flush();
    }
}

// # Logging Macros

#[doc(hidden)]
#[macro_export]
macro_rules! __log_line {
    ($lead:expr, $spacer:expr, $fmt:literal $($arg:tt)*) => {{
        if $crate::common::logger::Log::is_enabled() {
            let message = format!($fmt $($arg)*);
            $crate::common::logger::Log::emit($lead, &message, $spacer);
        }
    }};
    ($lead:expr, $spacer:expr, $expr:expr) => {{
        if $crate::common::logger::Log::is_enabled() {
            let message = format!("{}", $expr);
            $crate::common::logger::Log::emit($lead, &message, $spacer);
        }
    }};
}

/// Continue the current block with a `┣` line.
#[macro_export]
macro_rules! log_decorated {
    ($($t:tt)*) => { $crate::__log_line!("┣ ", false, $($t)*) };
}

/// Nested detail line under the current entry.
#[macro_export]
macro_rules! log_indented {
    ($($t:tt)*) => { $crate::__log_line!("┃   ", false, $($t)*) };
}

/// Bare spacer pipe.
#[macro_export]
macro_rules! log_pipe {
    () => {{
        if $crate::common::logger::Log::is_enabled() {
            let prefix = $crate::common::logger::Log::timestamp_prefix();
            $crate::common::logger::write_output(&format!("{prefix}┃\n"));
        }
    }};
}

/// Start a new block: spacer pipe, then a `┣` line.
#[macro_export]
macro_rules! log_block_start {
    ($($t:tt)*) => { $crate::__log_line!("┣ ", true, $($t)*) };
}

/// Session header.
#[macro_export]
macro_rules! log_version {
    () => {
        $crate::__log_line!(
            "┏ ",
            false,
            "salahshield v{} ━━╸",
            env!("CARGO_PKG_VERSION")
        )
    };
}

/// Session terminator.
#[macro_export]
macro_rules! log_end {
    () => {{
        if $crate::common::logger::Log::is_enabled() {
            let prefix = $crate::common::logger::Log::timestamp_prefix();
            $crate::common::logger::write_output(&format!("{prefix}╹\n"));
        }
    }};
}

#[macro_export]
macro_rules! log_warning {
    ($($t:tt)*) => { $crate::__log_line!("┣[\x1b[33mWARNING\x1b[0m] ", false, $($t)*) };
}

#[macro_export]
macro_rules! log_error {
    ($($t:tt)*) => { $crate::__log_line!("┣[\x1b[31mERROR\x1b[0m] ", false, $($t)*) };
}

/// Error that ends the session: spacer, then a `┗` corner.
#[macro_export]
macro_rules! log_error_exit {
    ($($t:tt)*) => { $crate::__log_line!("┗[\x1b[31mERROR\x1b[0m] ", true, $($t)*) };
}

#[macro_export]
macro_rules! log_info {
    ($($t:tt)*) => { $crate::__log_line!("┣[\x1b[32mINFO\x1b[0m] ", false, $($t)*) };
}

#[macro_export]
macro_rules! log_debug {
    ($($t:tt)*) => { $crate::__log_line!("┣[\x1b[32mDEBUG\x1b[0m] ", false, $($t)*) };
}

#[macro_export]
macro_rules! log_critical {
    ($($t:tt)*) => { $crate::__log_line!("┣[\x1b[31mCRITICAL\x1b[0m] ", false, $($t)*) };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_ansi_codes() {
        let colored = "┣[\x1b[33mWARNING\x1b[0m] careful";
        assert_eq!(strip_ansi_codes(colored), "┣[WARNING] careful");
    }

    #[test]
    fn test_strip_ansi_keeps_plain_text() {
        assert_eq!(strip_ansi_codes("┃   Fajr 05:20"), "┃   Fajr 05:20");
    }
}
