use std::fs;
use tempfile::TempDir;

use crate::instance_lock::{InstanceLock, LockError, LOCK_FILE};

// Above the largest pid Linux hands out
const DEAD_PID: u32 = 4_194_400;

#[test]
fn test_acquire_writes_own_pid_and_drop_removes_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join(LOCK_FILE);

    let lock = InstanceLock::acquire(&path).unwrap();
    assert_eq!(lock.pid(), std::process::id());
    assert_eq!(lock.path(), path.as_path());
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        std::process::id().to_string()
    );

    drop(lock);
    assert!(!path.exists());
}

#[test]
fn test_stale_pid_is_replaced() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(LOCK_FILE);
    fs::write(&path, DEAD_PID.to_string()).unwrap();

    let lock = InstanceLock::acquire(&path).unwrap();
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        std::process::id().to_string()
    );
    drop(lock);
}

#[test]
fn test_garbage_lock_file_is_replaced() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(LOCK_FILE);
    fs::write(&path, "not a pid").unwrap();

    assert!(InstanceLock::acquire(&path).is_ok());
}

#[test]
fn test_own_pid_in_file_is_not_a_conflict() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(LOCK_FILE);
    fs::write(&path, std::process::id().to_string()).unwrap();

    assert!(InstanceLock::acquire(&path).is_ok());
}

#[test]
fn test_drop_leaves_file_taken_over_by_another_pid() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(LOCK_FILE);

    let lock = InstanceLock::acquire(&path).unwrap();
    fs::write(&path, DEAD_PID.to_string()).unwrap();
    drop(lock);

    assert_eq!(fs::read_to_string(&path).unwrap(), DEAD_PID.to_string());
}

#[cfg(unix)]
#[test]
fn test_live_process_blocks_acquire() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(LOCK_FILE);

    let mut child = std::process::Command::new("sleep")
        .arg("30")
        .spawn()
        .expect("failed to spawn sleep");
    fs::write(&path, child.id().to_string()).unwrap();

    let result = InstanceLock::acquire(&path);
    let _ = child.kill();
    let _ = child.wait();

    match result {
        Err(LockError::AlreadyRunning(pid)) => assert_eq!(pid, child.id()),
        other => panic!("expected AlreadyRunning, got {:?}", other),
    }
    assert_eq!(fs::read_to_string(&path).unwrap(), child.id().to_string());
}
