use std::sync::mpsc;

use crate::CollectionChange;

/// Producer handle for the change queue.
///
/// Cloneable and sendable; collection code may push descriptors from any
/// thread. Enqueueing never touches layout state, so it is always safe to
/// call from a notification context.
#[derive(Clone, Debug)]
pub struct ChangeSender {
    tx: mpsc::Sender<CollectionChange>,
}

impl ChangeSender {
    /// Appends a change descriptor. Returns `false` when the consumer side
    /// has been dropped (the notification is then discarded).
    pub fn send(&self, change: CollectionChange) -> bool {
        self.tx.send(change).is_ok()
    }
}

/// FIFO of pending structural changes, drained on the UI thread once per
/// frame.
///
/// The queue is the only piece of engine state touched outside the per-frame
/// pass. Producers hold [`ChangeSender`] clones; draining is all-or-nothing
/// (the strategy processes to empty, then lays out once).
#[derive(Debug)]
pub struct ChangeQueue {
    tx: mpsc::Sender<CollectionChange>,
    rx: mpsc::Receiver<CollectionChange>,
}

impl ChangeQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    /// Creates a new producer handle for this queue.
    pub fn sender(&self) -> ChangeSender {
        ChangeSender {
            tx: self.tx.clone(),
        }
    }

    /// Pops the oldest pending descriptor, if any.
    pub fn pop(&mut self) -> Option<CollectionChange> {
        self.rx.try_recv().ok()
    }
}

impl Default for ChangeQueue {
    fn default() -> Self {
        Self::new()
    }
}
