use recycler::{ChangeSender, CollectionChange};

/// An ordered, countable collection that reports structural changes.
///
/// The engine never reads item data; it observes the collection through the
/// change descriptors pushed into subscribed senders and through `len`.
/// Notifications must describe the mutation that was just applied, in the
/// coordinates of the post-mutation collection.
pub trait ObservableCollection {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registers a producer handle to push change descriptors into. Clones
    /// of the sender may be moved to any thread.
    fn subscribe(&mut self, sender: ChangeSender);
}

/// A plain vector with change notifications: the simplest useful
/// [`ObservableCollection`].
///
/// Every mutator applies the change and then notifies subscribers with the
/// matching descriptor. Senders whose consumer is gone are pruned lazily.
#[derive(Debug, Default)]
pub struct VecCollection<T> {
    items: Vec<T>,
    subscribers: Vec<ChangeSender>,
}

impl<T> VecCollection<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            subscribers: Vec::new(),
        }
    }

    pub fn from_vec(items: Vec<T>) -> Self {
        Self {
            items,
            subscribers: Vec::new(),
        }
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.items.get(index)
    }

    pub fn iter(&self) -> core::slice::Iter<'_, T> {
        self.items.iter()
    }

    fn notify(&mut self, change: CollectionChange) {
        self.subscribers.retain(|sender| sender.send(change));
    }

    pub fn push(&mut self, item: T) {
        let start = self.items.len();
        self.items.push(item);
        self.notify(CollectionChange::Insert { start, count: 1 });
    }

    pub fn insert(&mut self, index: usize, item: T) {
        self.items.insert(index, item);
        self.notify(CollectionChange::Insert {
            start: index,
            count: 1,
        });
    }

    pub fn insert_many(&mut self, index: usize, items: impl IntoIterator<Item = T>) {
        let before = self.items.len();
        self.items.splice(index..index, items);
        let count = self.items.len() - before;
        if count > 0 {
            self.notify(CollectionChange::Insert {
                start: index,
                count,
            });
        }
    }

    pub fn remove(&mut self, index: usize) -> T {
        let item = self.items.remove(index);
        self.notify(CollectionChange::Remove {
            start: index,
            count: 1,
        });
        item
    }

    pub fn remove_range(&mut self, start: usize, count: usize) {
        if count == 0 {
            return;
        }
        self.items.drain(start..start + count);
        self.notify(CollectionChange::Remove { start, count });
    }

    pub fn replace(&mut self, index: usize, item: T) {
        self.items[index] = item;
        self.notify(CollectionChange::Replace {
            start: index,
            old_count: 1,
            new_count: 1,
        });
    }

    /// Replaces `old_count` items starting at `start` with `items`.
    pub fn splice(&mut self, start: usize, old_count: usize, items: impl IntoIterator<Item = T>) {
        let before = self.items.len();
        self.items.splice(start..start + old_count, items);
        let new_count = self.items.len() + old_count - before;
        self.notify(CollectionChange::Replace {
            start,
            old_count,
            new_count,
        });
    }

    /// Moves `count` items from `old_start` so the block begins at
    /// `new_start` (in post-move coordinates).
    pub fn move_range(&mut self, old_start: usize, new_start: usize, count: usize) {
        if count == 0 || old_start == new_start {
            return;
        }
        let block: Vec<T> = self.items.drain(old_start..old_start + count).collect();
        self.items.splice(new_start..new_start, block);
        self.notify(CollectionChange::Move {
            old_start,
            new_start,
            count,
        });
    }

    /// Replaces the whole contents and signals a reset.
    pub fn reset(&mut self, items: Vec<T>) {
        self.items = items;
        self.notify(CollectionChange::Reset);
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.notify(CollectionChange::Reset);
    }
}

impl<T> ObservableCollection for VecCollection<T> {
    fn len(&self) -> usize {
        self.items.len()
    }

    fn subscribe(&mut self, sender: ChangeSender) {
        self.subscribers.push(sender);
    }
}
