//! A LIFO stack of file snapshots used to undo a task's changes.
//!
//! This plays the role the teacher's `vcs::reset_hard_to`/`reset_hard_head_minus_one`
//! play for the git-backed orchestrator, but at file granularity and without
//! a VCS dependency: the pipeline snapshots a file before a task touches it,
//! and can revert that one task's edits without needing a commit to reset to.

use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// A captured byte-for-byte copy of a file's contents at a point in time.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
    pub timestamp: DateTime<Utc>,
}

/// Stack of file snapshots. `snapshot` pushes, `revert_last`/`revert_all` pop
/// and restore, `commit` discards everything without touching the filesystem.
#[derive(Debug, Default)]
pub struct BackupStore {
    stack: Vec<Snapshot>,
}

impl BackupStore {
    pub fn new() -> Self {
        Self { stack: Vec::new() }
    }

    /// Reads the current bytes of `path` and pushes a new snapshot record.
    /// Snapshots of the same path are never deduplicated: a second snapshot
    /// of an already-snapshotted path pushes its own independent record.
    pub fn snapshot(&mut self, path: &Path) -> std::io::Result<()> {
        let bytes = std::fs::read(path)?;
        self.stack.push(Snapshot {
            path: path.to_path_buf(),
            bytes,
            timestamp: Utc::now(),
        });
        Ok(())
    }

    /// Pops the top snapshot and writes its bytes back to its recorded path.
    /// No-op on an empty stack.
    pub fn revert_last(&mut self) -> std::io::Result<()> {
        if let Some(snap) = self.stack.pop() {
            std::fs::write(&snap.path, &snap.bytes)?;
        }
        Ok(())
    }

    /// Pops snapshots until the stack is empty, writing each back in turn.
    /// Because the stack is LIFO, the oldest recorded state for a given path
    /// is the one left on disk when multiple snapshots share a path.
    pub fn revert_all(&mut self) -> std::io::Result<()> {
        while !self.stack.is_empty() {
            self.revert_last()?;
        }
        Ok(())
    }

    /// Discards all snapshots without writing anything back. No-op on an
    /// empty stack.
    pub fn commit(&mut self) {
        self.stack.clear();
    }

    /// Current stack depth, exposed for tests.
    pub fn count(&self) -> usize {
        self.stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn revert_last_restores_pre_snapshot_bytes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, b"original").unwrap();

        let mut store = BackupStore::new();
        store.snapshot(&path).unwrap();
        fs::write(&path, b"modified").unwrap();
        store.revert_last().unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"original");
    }

    #[test]
    fn revert_all_restores_oldest_state_for_repeated_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, b"v0").unwrap();

        let mut store = BackupStore::new();
        store.snapshot(&path).unwrap();
        fs::write(&path, b"v1").unwrap();
        store.snapshot(&path).unwrap();
        fs::write(&path, b"v2").unwrap();

        store.revert_all().unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"v0");
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn commit_discards_without_writing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, b"original").unwrap();

        let mut store = BackupStore::new();
        store.snapshot(&path).unwrap();
        fs::write(&path, b"modified").unwrap();
        store.commit();
        store.revert_last().unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"modified");
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn operations_on_empty_stack_are_no_ops() {
        let mut store = BackupStore::new();
        assert!(store.revert_last().is_ok());
        assert!(store.revert_all().is_ok());
        store.commit();
        assert_eq!(store.count(), 0);
    }
}
