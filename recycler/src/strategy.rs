use crate::{
    AnchorState, Axis, ChangeQueue, CollectionChange, Extents, FrameCtx, Placement, Viewport,
};

/// A layout policy driven once per frame by the host control.
///
/// One concrete strategy covers an orientation family; the orientation
/// itself is a configuration value on the strategy, not a separate
/// implementation per direction.
///
/// The per-frame protocol is: [`drain`](Self::drain) the change queue,
/// forward scroll input, then run [`measure_window`](Self::measure_window)
/// exactly once. Draining reports whether anything was processed so the
/// caller issues at most one re-layout per frame regardless of notification
/// volume.
pub trait LayoutStrategy<R> {
    /// Drains every queued change descriptor in FIFO order and applies it.
    /// Returns whether at least one descriptor was processed.
    fn drain(
        &mut self,
        queue: &mut ChangeQueue,
        ctx: &mut FrameCtx<'_, R>,
        collection_len: usize,
    ) -> bool {
        let mut any = false;
        while let Some(change) = queue.pop() {
            self.handle_change(change, ctx, collection_len);
            any = true;
        }
        any
    }

    /// Dispatches one change descriptor to the diff hooks.
    ///
    /// A replace with unequal counts has no primitive of its own: it is
    /// decomposed into a same-size replace of the overlapping prefix followed
    /// by an insert (grew) or remove (shrank) at `start + overlap`.
    fn handle_change(
        &mut self,
        change: CollectionChange,
        ctx: &mut FrameCtx<'_, R>,
        collection_len: usize,
    ) {
        rtrace!(?change, collection_len, "handle_change");
        match change {
            CollectionChange::Reset => self.on_reset(ctx, collection_len),
            CollectionChange::Insert { start, count } => self.on_insert(ctx, start, count),
            CollectionChange::Remove { start, count } => self.on_remove(ctx, start, count),
            CollectionChange::Replace {
                start,
                old_count,
                new_count,
            } => {
                let overlap = old_count.min(new_count);
                if overlap > 0 {
                    self.on_replace(ctx, start, overlap);
                }
                if new_count > old_count {
                    self.on_insert(ctx, start + overlap, new_count - old_count);
                } else if old_count > new_count {
                    self.on_remove(ctx, start + overlap, old_count - new_count);
                }
            }
            CollectionChange::Move {
                old_start,
                new_start,
                count,
            } => self.on_move(ctx, old_start, new_start, count),
        }
    }

    /// The collection changed wholesale; the visible window is rebuilt on
    /// the next measure.
    fn on_reset(&mut self, ctx: &mut FrameCtx<'_, R>, collection_len: usize);

    fn on_insert(&mut self, ctx: &mut FrameCtx<'_, R>, start: usize, count: usize);

    fn on_remove(&mut self, ctx: &mut FrameCtx<'_, R>, start: usize, count: usize);

    fn on_replace(&mut self, ctx: &mut FrameCtx<'_, R>, start: usize, count: usize);

    fn on_move(
        &mut self,
        ctx: &mut FrameCtx<'_, R>,
        old_start: usize,
        new_start: usize,
        count: usize,
    );

    /// Runs one full measurement pass and returns the resolved content
    /// extents. Pure with respect to current state: with no intervening
    /// mutation or scroll input, a second pass yields identical offsets.
    fn measure_window(
        &mut self,
        ctx: &mut FrameCtx<'_, R>,
        viewport: Viewport,
        collection_len: usize,
    ) -> Extents;

    /// Emits the final placements in ascending index order, outgoing
    /// renderer before incoming per item. Renderer-less items are skipped.
    fn for_each_placement(&self, now_ms: u64, f: impl FnMut(Placement<'_, R>))
    where
        Self: Sized;

    /// Queues an instantaneous scroll by `notches` wheel detents, applied on
    /// the next measure.
    fn scroll_by_notches(&mut self, notches: f32);

    /// Queues an instantaneous scroll by a main-axis pixel distance.
    fn scroll_by_px(&mut self, px: f32);

    /// Scrolls by `notches` through the policy's scroll easing. A second
    /// call while one is in flight folds the remaining fraction of the first
    /// target into the new one instead of discarding it.
    fn smooth_scroll_by(&mut self, notches: f32, now_ms: u64);

    /// Jumps the anchor to `index`, with the viewport reference line
    /// `offset_in_item` pixels into the item. Cancels pending scroll input.
    fn scroll_to(&mut self, index: usize, offset_in_item: f32);

    fn axis(&self) -> Axis;

    fn anchor(&self) -> AnchorState;

    /// Index of the first live visible item, if any.
    fn first_visible(&self) -> Option<usize>;

    /// Index of the last live visible item, if any.
    fn last_visible(&self) -> Option<usize>;

    /// Number of visible entries, including ones playing exit animations.
    fn visible_len(&self) -> usize;

    /// Whether the content overflows the viewport in the main direction.
    fn can_scroll(&self) -> bool;

    /// Whether any scroll, item, or resize animation is still running.
    fn is_animating(&self, now_ms: u64) -> bool;

    /// Whether the last measure moved the anchor (consumed on read; drives
    /// the host's scroll notification).
    fn take_scrolled(&mut self) -> bool;

    /// Releases every live renderer back to the pool and clears all state.
    fn detach(&mut self, ctx: &mut FrameCtx<'_, R>);
}
