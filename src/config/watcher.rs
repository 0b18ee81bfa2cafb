//! Hot reload: watch the config file and post a reload event on change.

use anyhow::{Context, Result};
use notify::{
    Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::{Duration, Instant};

use crate::common::constants::{CONFIG_FILE_NAME, CONFIG_WATCH_DEBOUNCE_MS};
use crate::common::utils::private_path;
use crate::core::CoreEvent;

pub struct ConfigWatcher {
    sender: Sender<CoreEvent>,
    config_path: PathBuf,
    debug_enabled: bool,
}

impl ConfigWatcher {
    pub fn new(sender: Sender<CoreEvent>, config_path: PathBuf, debug_enabled: bool) -> Self {
        Self {
            sender,
            config_path,
            debug_enabled,
        }
    }

    /// Spawn the watcher thread. The watcher lives as long as the thread,
    /// which ends when the event channel closes.
    pub fn start(self) -> Result<()> {
        // Watch the directory: editors often replace the file instead of writing it
        let Some(dir) = self.config_path.parent().map(Path::to_path_buf) else {
            return Ok(());
        };
        if !dir.is_dir() {
            return Ok(());
        }

        let (tx, rx) = std::sync::mpsc::channel();
        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                if let Ok(event) = res
                    && matches!(
                        event.kind,
                        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                    )
                {
                    let _ = tx.send(event);
                }
            },
            NotifyConfig::default(),
        )
        .context("Failed to create file watcher")?;

        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch directory: {}", private_path(&dir)))?;

        if self.debug_enabled {
            log_pipe!();
            log_debug!("Watching {} for changes", private_path(&self.config_path));
        }

        thread::spawn(move || {
            let _watcher = watcher;
            let mut last_reload: Option<Instant> = None;

            for event in rx {
                if !event.paths.iter().any(|p| is_config_file(p)) {
                    continue;
                }
                if last_reload
                    .is_some_and(|at| at.elapsed() < Duration::from_millis(CONFIG_WATCH_DEBOUNCE_MS))
                {
                    continue;
                }

                if self.debug_enabled {
                    log_pipe!();
                    log_info!("Configuration file change detected");
                }
                if self.sender.send(CoreEvent::Reload).is_err() {
                    break;
                }
                last_reload = Some(Instant::now());
            }
        });

        Ok(())
    }
}

/// The config file itself or an editor's temporary copy of it.
fn is_config_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(CONFIG_FILE_NAME) || name.ends_with(CONFIG_FILE_NAME))
}

pub fn start_config_watcher(
    sender: Sender<CoreEvent>,
    config_path: PathBuf,
    debug_enabled: bool,
) -> Result<()> {
    ConfigWatcher::new(sender, config_path, debug_enabled).start()
}
