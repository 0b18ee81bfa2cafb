//! Lock file management for single-instance enforcement.
//!
//! The lock lives in the runtime directory and holds the daemon's PID, which
//! `salahshield reload` and `status` use to find the running instance.

use anyhow::{Context, Result, bail};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::PathBuf;

use crate::common::constants::LOCK_FILE_NAME;
use crate::common::utils::{self, private_path};

/// Held for the lifetime of the daemon. Dropping it releases the lock and
/// removes the file.
#[derive(Debug)]
pub struct InstanceLock {
    file: File,
    path: PathBuf,
}

impl InstanceLock {
    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
        let _ = std::fs::remove_file(&self.path);
    }
}

/// `$XDG_RUNTIME_DIR/salahshield.lock`, or under `/tmp` without a runtime dir.
pub fn lock_path() -> PathBuf {
    let runtime_dir = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(runtime_dir).join(LOCK_FILE_NAME)
}

/// Acquire the exclusive instance lock.
///
/// A lock left behind by a dead process is removed and acquisition retried
/// once. If another live instance holds it, this returns an error naming its PID.
pub fn acquire_lock() -> Result<InstanceLock> {
    acquire_lock_at(lock_path())
}

pub(crate) fn acquire_lock_at(path: PathBuf) -> Result<InstanceLock> {
    if let Some(lock) = try_lock(&path)? {
        return Ok(lock);
    }

    handle_lock_conflict(&path)?;

    match try_lock(&path)? {
        Some(lock) => Ok(lock),
        None => bail!(
            "Failed to acquire lock at {} after cleanup attempt",
            private_path(&path)
        ),
    }
}

fn try_lock(path: &PathBuf) -> Result<Option<InstanceLock>> {
    // Open without truncating so a running instance's PID stays readable
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .with_context(|| format!("Failed to open lock file {}", private_path(path)))?;

    if file.try_lock_exclusive().is_err() {
        return Ok(None);
    }

    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    writeln!(&file, "{}", std::process::id())?;
    file.flush()?;

    Ok(Some(InstanceLock {
        file,
        path: path.clone(),
    }))
}

/// Remove a stale lock, or fail if its owner is still alive.
fn handle_lock_conflict(path: &PathBuf) -> Result<()> {
    let Ok(content) = std::fs::read_to_string(path) else {
        // Already cleaned up by its owner
        return Ok(());
    };

    let Ok(pid) = content.trim().parse::<u32>() else {
        log_warning!("Lock file contains invalid PID, removing stale lock");
        let _ = std::fs::remove_file(path);
        return Ok(());
    };

    if !utils::is_process_running(pid) {
        log_warning!("Removing stale lock file (process {pid} no longer running)");
        let _ = std::fs::remove_file(path);
        return Ok(());
    }

    bail!("salahshield is already running (PID {pid})")
}

/// PID of the running daemon, if the lock file names a live process.
pub fn read_running_pid() -> Option<u32> {
    read_running_pid_at(&lock_path())
}

pub(crate) fn read_running_pid_at(path: &PathBuf) -> Option<u32> {
    let pid = std::fs::read_to_string(path).ok()?.trim().parse::<u32>().ok()?;
    utils::is_process_running(pid).then_some(pid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_lock_records_pid_and_cleans_up() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(LOCK_FILE_NAME);

        let lock = acquire_lock_at(path.clone()).unwrap();
        assert_eq!(read_running_pid_at(&path), Some(std::process::id()));

        drop(lock);
        assert!(!path.exists());
        assert_eq!(read_running_pid_at(&path), None);
    }

    #[test]
    fn test_garbage_lock_file_is_replaced() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(LOCK_FILE_NAME);
        std::fs::write(&path, "not a pid\n").unwrap();

        let lock = acquire_lock_at(path.clone()).unwrap();
        assert_eq!(lock.path(), &path);
    }

    #[test]
    fn test_dead_pid_is_not_running() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(LOCK_FILE_NAME);
        // PIDs this large are above the kernel's pid_max
        std::fs::write(&path, "4194305\n").unwrap();
        assert_eq!(read_running_pid_at(&path), None);
    }
}
