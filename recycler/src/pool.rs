use std::collections::HashMap;

use crate::{PoolSlot, RendererKind};

/// A per-kind free list of reusable renderer instances plus slot-id
/// recycling.
///
/// A renderer instance is owned by exactly one of the pool or a visible item
/// at any time; transfer happens only on the UI thread, so no further
/// protocol is needed.
#[derive(Debug)]
pub struct PlaceholderPool<R> {
    free: HashMap<RendererKind, Vec<R>>,
    free_slots: Vec<PoolSlot>,
    next_slot: PoolSlot,
}

impl<R> PlaceholderPool<R> {
    pub fn new() -> Self {
        Self {
            free: HashMap::new(),
            free_slots: Vec::new(),
            next_slot: 0,
        }
    }

    /// Hands a pre-manufactured renderer to the pool.
    pub fn add(&mut self, kind: RendererKind, renderer: R) {
        self.free.entry(kind).or_default().push(renderer);
    }

    /// Number of pooled (unbound) renderers of `kind`.
    pub fn free_len(&self, kind: RendererKind) -> usize {
        self.free.get(&kind).map_or(0, Vec::len)
    }

    /// Pops a pooled instance of `kind`, asking `manufacture` for a fresh one
    /// when the free list is empty.
    ///
    /// Returning `None` is not an error: the host declined to manufacture,
    /// and the caller lays the item out renderer-less.
    pub fn acquire(
        &mut self,
        kind: RendererKind,
        manufacture: impl FnOnce(RendererKind) -> Option<R>,
    ) -> Option<(R, PoolSlot)> {
        let renderer = match self.free.get_mut(&kind).and_then(Vec::pop) {
            Some(r) => r,
            None => {
                rtrace!(kind, "pool empty, asking host to manufacture");
                manufacture(kind)?
            }
        };
        let slot = self.free_slots.pop().unwrap_or_else(|| {
            let s = self.next_slot;
            self.next_slot += 1;
            s
        });
        Some((renderer, slot))
    }

    /// Pushes a renderer back onto its kind's free list and recycles its
    /// slot id.
    pub fn release(&mut self, kind: RendererKind, renderer: R, slot: PoolSlot) {
        self.free.entry(kind).or_default().push(renderer);
        self.free_slots.push(slot);
    }
}

impl<R> Default for PlaceholderPool<R> {
    fn default() -> Self {
        Self::new()
    }
}
