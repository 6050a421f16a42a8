//! Single-instance guard backed by a pid file.

use std::fs;
use std::path::{Path, PathBuf};
use sysinfo::{Pid, ProcessesToUpdate, System};
use thiserror::Error;

use crate::utils::logger::*;

pub const LOCK_FILE: &str = "app.lock";

#[derive(Debug, Error)]
pub enum LockError {
    #[error("Lexia is already running (pid {0}). Close the existing instance first.")]
    AlreadyRunning(u32),

    #[error("Failed to write lock file: {0}")]
    Io(#[from] std::io::Error),
}

/// Held for the life of the process; the lock file is removed on drop
#[derive(Debug)]
pub struct InstanceLock {
    path: PathBuf,
    pid: u32,
}

impl InstanceLock {
    pub fn acquire(path: impl AsRef<Path>) -> Result<Self, LockError> {
        let path = path.as_ref().to_path_buf();
        let own_pid = std::process::id();

        match fs::read_to_string(&path) {
            Ok(contents) => match contents.trim().parse::<u32>() {
                Ok(pid) if pid != own_pid && process_is_running(pid) => {
                    log::warn!("Another instance holds {:?} (pid {})", path, pid);
                    return Err(LockError::AlreadyRunning(pid));
                }
                Ok(pid) => log::info!("Replacing stale lock file (pid {})", pid),
                Err(_) => log::info!("Replacing unreadable lock file {:?}", path),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, own_pid.to_string())?;
        log_file_operation("ACQUIRE_LOCK", &path.to_string_lossy(), true, None, None);

        Ok(Self { path, pid: own_pid })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        // Only remove the file if it still names us
        let ours = fs::read_to_string(&self.path)
            .map(|c| c.trim() == self.pid.to_string())
            .unwrap_or(false);
        if ours {
            if let Err(e) = fs::remove_file(&self.path) {
                log::warn!("Failed to remove lock file {:?}: {}", self.path, e);
            }
        }
    }
}

pub fn process_is_running(pid: u32) -> bool {
    let pid = Pid::from_u32(pid);
    let mut system = System::new();
    system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
    system.process(pid).is_some()
}
