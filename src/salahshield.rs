//! Daemon lifecycle: resource acquisition, startup and hand-off to [`Core`].
//!
//! The `Salahshield` builder covers the two ways the daemon starts:
//! - Normal startup: `Salahshield::new(debug_enabled).run()`
//! - Simulation: `Salahshield::new(debug_enabled).simulated().run()`, which
//!   skips the instance lock, the config watcher and any real shield.

use anyhow::Result;

use crate::config::{self, Config};
use crate::core::{Core, CoreParams};
use crate::io::lock::acquire_lock;
use crate::io::signals::setup_signal_handler;
use crate::shield::{LogShield, Shield, create_shield};

/// Builder for running the blocking daemon.
///
/// ```no_run
/// use salahshield::Salahshield;
///
/// # fn main() -> anyhow::Result<()> {
/// Salahshield::new(false).run()?;
/// # Ok(())
/// # }
/// ```
pub struct Salahshield {
    debug_enabled: bool,
    create_lock: bool,
    show_headers: bool,
    simulated: bool,
}

impl Salahshield {
    pub fn new(debug_enabled: bool) -> Self {
        Self {
            debug_enabled,
            create_lock: true,
            show_headers: true,
            simulated: false,
        }
    }

    /// Skip the single-instance lock.
    pub fn without_lock(mut self) -> Self {
        self.create_lock = false;
        self
    }

    /// Skip the version header, e.g. when the caller already printed one.
    pub fn without_headers(mut self) -> Self {
        self.show_headers = false;
        self
    }

    /// Run against the simulated clock: no lock, no watcher, log shield only.
    pub fn simulated(mut self) -> Self {
        self.simulated = true;
        self.without_lock().without_headers()
    }

    pub fn run(self) -> Result<()> {
        if self.show_headers {
            log_version!();
            if self.debug_enabled {
                log_pipe!();
                log_debug!("Debug mode enabled");
            }
        }

        let config_path = Config::get_config_path()?;
        let config = Config::load()?;
        config.log_config();

        let lock = if self.create_lock {
            Some(acquire_lock()?)
        } else {
            None
        };

        let shield: Box<dyn Shield> = if self.simulated {
            log_block_start!("Simulation uses the log shield");
            Box::new(LogShield::new(config.blocklist()?))
        } else {
            create_shield(&config)?
        };

        let core = Core::new(CoreParams {
            config,
            config_path: config_path.clone(),
            shield,
            debug_enabled: self.debug_enabled,
            lock,
        });

        setup_signal_handler(core.sender(), core.running(), self.debug_enabled)?;

        if !self.simulated
            && let Err(e) =
                config::start_config_watcher(core.sender(), config_path, self.debug_enabled)
        {
            log_pipe!();
            log_warning!("Config hot reload unavailable: {e:#}");
            log_indented!("Use `salahshield reload` after editing the config");
        }

        core.execute()
    }
}
