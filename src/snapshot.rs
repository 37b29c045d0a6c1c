//! A bounded-history undo/redo ring buffer over any `Clone` state. Generic and self-contained: the
//! façade in `state.rs` does its own transactional snapshot/restore around a single call and never
//! touches this type, but an embedder (a GUI, a REPL, a test harness) can attach one over a
//! `State` to get multi-step undo/redo for free.

use crate::error::Error;

/// Ring buffer of up to `history_size` snapshots, with a cursor pair tracking the currently
/// restorable snapshot and the furthest one still reachable by redo.
#[derive(Debug, Clone)]
pub struct Snapshotter<T: Clone> {
    snapshots: Vec<Option<T>>,
    current_snapshot: isize,
    last_valid: isize,
    history_size: usize,
}

impl<T: Clone> Snapshotter<T> {
    /// # Errors
    /// `Error::RuntimeError` if `history_size` is less than 2.
    pub fn new(history_size: usize) -> Result<Self, Error> {
        if history_size < 2 {
            return Err(Error::runtime("history_size should be at least 2"));
        }
        Ok(Self { snapshots: vec![None; history_size], current_snapshot: -1, last_valid: -1, history_size })
    }

    /// Store a new snapshot of `obj`, becoming the current one. Creating a snapshot after one or
    /// more `undo` calls invalidates every slot that was still reachable by `redo`: history is a
    /// single branching timeline, not a tree.
    pub fn create_snapshot(&mut self, obj: T) {
        if self.current_snapshot == self.history_size as isize - 1 {
            self.snapshots.push(Some(obj));
            let len = self.snapshots.len();
            self.snapshots = self.snapshots.split_off(len - self.history_size);
        } else {
            self.current_snapshot += 1;
            self.snapshots[self.current_snapshot as usize] = Some(obj);
        }
        self.last_valid = self.current_snapshot;
    }

    /// Step back one snapshot and return a copy of it.
    ///
    /// # Errors
    /// `Error::RuntimeError` if there is no previous snapshot.
    pub fn undo(&mut self) -> Result<T, Error> {
        if self.current_snapshot <= 0 {
            return Err(Error::runtime("cannot undo: no previous snapshot available"));
        }
        self.current_snapshot -= 1;
        self.current_slot()
    }

    /// Step forward one snapshot (only valid after `undo`, and only until a new snapshot is
    /// created) and return a copy of it.
    ///
    /// # Errors
    /// `Error::RuntimeError` if there is no valid next snapshot.
    pub fn redo(&mut self) -> Result<T, Error> {
        if self.current_snapshot >= self.last_valid {
            return Err(Error::runtime("cannot redo: no valid next snapshot available"));
        }
        self.current_snapshot += 1;
        self.current_slot()
    }

    /// Return a copy of the current snapshot without moving the cursor.
    ///
    /// # Errors
    /// `Error::RuntimeError` if no snapshot has been created yet.
    pub fn restore(&self) -> Result<T, Error> {
        if self.current_snapshot == -1 {
            return Err(Error::runtime("cannot restore: no valid current snapshot available"));
        }
        self.snapshots[self.current_snapshot as usize].clone().ok_or_else(|| Error::runtime("snapshot slot is empty"))
    }

    fn current_slot(&self) -> Result<T, Error> {
        self.snapshots[self.current_snapshot as usize].clone().ok_or_else(|| Error::runtime("snapshot slot is empty"))
    }
}
