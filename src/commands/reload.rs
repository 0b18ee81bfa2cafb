//! `reload`: ask the running daemon to re-read its configuration.

use anyhow::Result;

use crate::common::utils::signal_reload;
use crate::config::Config;
use crate::io::lock::read_running_pid;

pub fn handle_reload_command(debug_enabled: bool) -> Result<()> {
    log_version!();

    // Fail here with the parse error instead of letting the daemon reject it
    let config = Config::load()?;
    if debug_enabled {
        config.log_config();
    }

    match read_running_pid() {
        Some(pid) => {
            signal_reload(pid)?;
            log_block_start!("Sent reload signal to salahshield (PID: {pid})");
        }
        None => {
            log_block_start!("salahshield is not running");
            log_indented!("Start it with: salahshield");
        }
    }

    log_end!();
    Ok(())
}
