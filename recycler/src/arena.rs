use crate::{Extents, ItemAnimation, PoolSlot, RendererKind, SizeEasing};

/// One bound renderer slot (current or previous) of a visible item.
///
/// `kind` is `None` until the item has been classified; `renderer` stays
/// `None` when the pool was empty and the host declined to manufacture — a
/// renderer-less occupant contributes zero extent and is skipped by the draw
/// surface.
#[derive(Debug)]
pub struct Occupant<R> {
    pub kind: Option<RendererKind>,
    pub renderer: Option<R>,
    pub slot: PoolSlot,
    pub size: Option<Extents>,
    pub animation: Option<ItemAnimation>,
}

impl<R> Occupant<R> {
    pub fn empty() -> Self {
        Self {
            kind: None,
            renderer: None,
            slot: 0,
            size: None,
            animation: None,
        }
    }
}

/// Per-item transient layout state.
///
/// `removed` marks an entry whose data item is gone but whose exit animation
/// is still playing; it occupies layout space without consuming a collection
/// index.
#[derive(Debug)]
pub struct VisibleItem<R> {
    pub index: usize,
    pub offset: f32,
    pub removed: bool,
    pub(crate) measured: bool,
    pub(crate) outside_viewport: bool,
    pub current: Occupant<R>,
    pub previous: Occupant<R>,
    pub size_easing: Option<SizeEasing>,
    pub(crate) previous_size: Option<Extents>,
}

impl<R> VisibleItem<R> {
    pub(crate) fn new(index: usize) -> Self {
        Self {
            index,
            offset: 0.0,
            removed: false,
            measured: false,
            outside_viewport: false,
            current: Occupant::empty(),
            previous: Occupant::empty(),
            size_easing: None,
            previous_size: None,
        }
    }
}

/// The visible-item set: a slot arena plus a parallel index-sorted order
/// vector.
///
/// Items live in `slots` at stable positions, so nothing holds a live
/// reference across a reallocation; all lookups go through `order`, which is
/// kept sorted by `(index, removed-first)` and binary searched in
/// `O(log v)`. A removed entry sorts before its live replacement at the same
/// index.
#[derive(Debug)]
pub struct VisibleSet<R> {
    slots: Vec<Option<VisibleItem<R>>>,
    free: Vec<usize>,
    order: Vec<usize>,
}

impl<R> Default for VisibleSet<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> VisibleSet<R> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            order: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Item at order position `pos` (ascending `(index, removed-first)`).
    pub fn get(&self, pos: usize) -> &VisibleItem<R> {
        self.slots[self.order[pos]]
            .as_ref()
            .expect("arena slot referenced by order vector is vacant")
    }

    pub fn get_mut(&mut self, pos: usize) -> &mut VisibleItem<R> {
        self.slots[self.order[pos]]
            .as_mut()
            .expect("arena slot referenced by order vector is vacant")
    }

    fn sort_key(&self, slot: usize) -> (usize, u8) {
        let item = self.slots[slot]
            .as_ref()
            .expect("arena slot referenced by order vector is vacant");
        (item.index, if item.removed { 0 } else { 1 })
    }

    /// Order position of the live (non-removed) entry for `index`, if any.
    pub fn find_live(&self, index: usize) -> Option<usize> {
        let pos = self
            .order
            .partition_point(|&slot| self.sort_key(slot) < (index, 1));
        (pos < self.order.len() && self.sort_key(self.order[pos]) == (index, 1)).then_some(pos)
    }

    /// Inserts a fresh live entry for `index` and returns its order
    /// position. Positions at or after it shift up by one.
    pub fn insert_live(&mut self, index: usize) -> usize {
        let slot = match self.free.pop() {
            Some(s) => {
                self.slots[s] = Some(VisibleItem::new(index));
                s
            }
            None => {
                self.slots.push(Some(VisibleItem::new(index)));
                self.slots.len() - 1
            }
        };
        let pos = self
            .order
            .partition_point(|&s| self.sort_key(s) < (index, 1));
        self.order.insert(pos, slot);
        pos
    }

    /// Removes the entry at order position `pos` and returns it (for its
    /// renderers to be released).
    pub fn remove_at(&mut self, pos: usize) -> VisibleItem<R> {
        let slot = self.order.remove(pos);
        self.free.push(slot);
        self.slots[slot]
            .take()
            .expect("arena slot referenced by order vector is vacant")
    }

    /// Re-establishes the order invariant after item indices were mutated by
    /// a diff hook. Stable, so coexisting removed entries keep their relative
    /// order.
    pub fn resort(&mut self) {
        let mut order = std::mem::take(&mut self.order);
        order.sort_by_key(|&slot| self.sort_key(slot));
        self.order = order;
    }

    /// Empties the set, yielding every item for renderer release.
    pub fn take_all(&mut self) -> Vec<VisibleItem<R>> {
        let order = std::mem::take(&mut self.order);
        let mut out = Vec::with_capacity(order.len());
        for slot in order {
            if let Some(item) = self.slots[slot].take() {
                out.push(item);
            }
        }
        self.slots.clear();
        self.free.clear();
        out
    }
}
