use std::sync::Arc;

use crate::{
    AnchorState, AnimationPolicy, AnimationSpec, Axis, ChangeKind, DefaultAnimationPolicy,
    EasingClock, Extents, FrameCtx, ItemAnimation, LayoutStrategy, Occupant, Placement, SizeEasing,
    Viewport, VisibleItem, VisibleSet,
};

/// Inserted items farther than this from the anchor are not tracked for an
/// appear animation; they materialize normally if scrolled to.
const APPEAR_TRACK_RADIUS: usize = 100;

/// Configuration for [`LinearLayout`].
///
/// Cheap to clone: the animation policy is stored behind an `Arc` so options
/// can be copied, tweaked, and reapplied without rebuilding strategies.
pub struct LinearLayoutOptions {
    /// The stacking axis.
    pub axis: Axis,

    /// Fractional placement of the run within a viewport larger than the
    /// content: `0` packs at the start, `1` at the end. Clamped to `[0, 1]`.
    pub gravity: f32,

    /// Where the anchor reference line sits within the viewport, in
    /// `[0, 1]`. `0` keeps the first visible item pinned when surrounding
    /// items change; `1` keeps the last.
    pub anchor_offset_ratio: f32,

    /// Pin the anchor to a terminus on frames without user scroll input when
    /// the run was already flush with that edge. Prevents anchor drift after
    /// the collection shrinks below the viewport size.
    pub stick_to_terminus: bool,

    /// Main-axis distance of one scroll line, in pixels (the host's current
    /// line/font metric).
    pub line_px: f32,

    /// Lines scrolled per wheel notch.
    pub lines_per_notch: f32,

    /// Supplies animations for structural changes, resizes, and smooth
    /// scrolling.
    pub policy: Arc<dyn AnimationPolicy + Send + Sync>,
}

impl LinearLayoutOptions {
    pub fn new(axis: Axis) -> Self {
        Self {
            axis,
            gravity: 0.0,
            anchor_offset_ratio: 0.0,
            stick_to_terminus: false,
            line_px: 16.0,
            lines_per_notch: 3.0,
            policy: Arc::new(DefaultAnimationPolicy),
        }
    }

    pub fn with_gravity(mut self, gravity: f32) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_anchor_offset_ratio(mut self, ratio: f32) -> Self {
        self.anchor_offset_ratio = ratio;
        self
    }

    pub fn with_stick_to_terminus(mut self, stick: bool) -> Self {
        self.stick_to_terminus = stick;
        self
    }

    pub fn with_scroll_metrics(mut self, line_px: f32, lines_per_notch: f32) -> Self {
        self.line_px = line_px;
        self.lines_per_notch = lines_per_notch;
        self
    }

    pub fn with_policy(mut self, policy: impl AnimationPolicy + Send + Sync + 'static) -> Self {
        self.policy = Arc::new(policy);
        self
    }
}

impl Clone for LinearLayoutOptions {
    fn clone(&self) -> Self {
        Self {
            axis: self.axis,
            gravity: self.gravity,
            anchor_offset_ratio: self.anchor_offset_ratio,
            stick_to_terminus: self.stick_to_terminus,
            line_px: self.line_px,
            lines_per_notch: self.lines_per_notch,
            policy: Arc::clone(&self.policy),
        }
    }
}

impl core::fmt::Debug for LinearLayoutOptions {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LinearLayoutOptions")
            .field("axis", &self.axis)
            .field("gravity", &self.gravity)
            .field("anchor_offset_ratio", &self.anchor_offset_ratio)
            .field("stick_to_terminus", &self.stick_to_terminus)
            .field("line_px", &self.line_px)
            .field("lines_per_notch", &self.lines_per_notch)
            .finish_non_exhaustive()
    }
}

/// Single-axis layout strategy with anchor-based incremental measurement.
///
/// Each frame it re-resolves the anchor item, places it at the viewport's
/// reference line, expands the run outward until both viewport edges are
/// covered, applies edge policies (gravity, terminus sticking, clamping),
/// rounds offsets to device pixels once, and re-derives the anchor from the
/// final geometry. Recomputing the anchor from ground truth every frame is
/// what keeps the on-screen position stable across structural mutation
/// elsewhere in the collection.
#[derive(Debug)]
pub struct LinearLayout<R> {
    options: LinearLayoutOptions,
    items: VisibleSet<R>,

    anchor_index: Option<usize>,
    anchor_offset_in_item: f32,
    anchor_offset_in_item_ratio: f32,
    /// `anchor_offset_in_item` holds a pixel value from `scroll_to` that
    /// still needs converting to a ratio once the anchor is measured.
    anchor_offset_is_px: bool,
    /// `scroll_to` pinned the anchor; honored for exactly one measure before
    /// geometric re-derivation resumes.
    anchor_pinned_once: bool,

    pending_notches: f32,
    pending_px: f32,
    smooth_amount: f32,
    scroll_clock: Option<EasingClock>,
    scroll_consumed: f32,

    first_visible: Option<usize>,
    last_visible: Option<usize>,
    can_scroll: bool,
    was_start_visible: bool,
    was_end_visible: bool,
    reset_appear_once: bool,
    scrolled: bool,
}

impl<R> LinearLayout<R> {
    pub fn new(options: LinearLayoutOptions) -> Self {
        rdebug!(
            axis = ?options.axis,
            gravity = options.gravity,
            anchor_offset_ratio = options.anchor_offset_ratio,
            "LinearLayout::new"
        );
        Self {
            options,
            items: VisibleSet::new(),
            anchor_index: None,
            anchor_offset_in_item: 0.0,
            anchor_offset_in_item_ratio: 0.0,
            anchor_offset_is_px: false,
            anchor_pinned_once: false,
            pending_notches: 0.0,
            pending_px: 0.0,
            smooth_amount: 0.0,
            scroll_clock: None,
            scroll_consumed: 0.0,
            first_visible: None,
            last_visible: None,
            can_scroll: false,
            was_start_visible: true,
            was_end_visible: true,
            reset_appear_once: false,
            scrolled: false,
        }
    }

    pub fn options(&self) -> &LinearLayoutOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: LinearLayoutOptions) {
        self.options = options;
    }

    /// Clones the current options, applies `f`, and reapplies them.
    pub fn update_options(&mut self, f: impl FnOnce(&mut LinearLayoutOptions)) {
        let mut next = self.options.clone();
        f(&mut next);
        self.set_options(next);
    }

    fn clear_scroll_state(&mut self) {
        self.pending_notches = 0.0;
        self.pending_px = 0.0;
        self.smooth_amount = 0.0;
        self.scroll_clock = None;
        self.scroll_consumed = 0.0;
    }

    fn clear_all(&mut self, ctx: &mut FrameCtx<'_, R>) {
        for mut item in self.items.take_all() {
            Self::release_occupant(ctx, &mut item.previous);
            Self::release_occupant(ctx, &mut item.current);
        }
        self.anchor_index = None;
        self.anchor_offset_in_item = 0.0;
        self.anchor_offset_in_item_ratio = 0.0;
        self.anchor_offset_is_px = false;
        self.anchor_pinned_once = false;
        self.first_visible = None;
        self.last_visible = None;
        self.can_scroll = false;
        self.was_start_visible = true;
        self.was_end_visible = true;
        self.clear_scroll_state();
    }

    /// Returns an occupant's renderer to the pool, invoking the host's clear
    /// hook exactly once.
    fn release_occupant(ctx: &mut FrameCtx<'_, R>, occupant: &mut Occupant<R>) {
        if let Some(mut renderer) = occupant.renderer.take() {
            if let Some(kind) = occupant.kind {
                ctx.host.clear(kind, &mut renderer);
                ctx.pool.release(kind, renderer, occupant.slot);
            } else {
                debug_assert!(false, "occupant held a renderer without a resolved kind");
            }
        }
        *occupant = Occupant::empty();
    }

    /// Moves an item's current occupant into its previous slot (starting the
    /// given exit animation), releasing whatever the previous slot held.
    fn retire_current(
        ctx: &mut FrameCtx<'_, R>,
        item: &mut VisibleItem<R>,
        exit: Option<AnimationSpec>,
    ) {
        Self::release_occupant(ctx, &mut item.previous);
        item.previous = std::mem::replace(&mut item.current, Occupant::empty());
        item.previous.animation = exit.map(|spec| ItemAnimation::start(spec, ctx.now_ms));
    }

    fn apply_reset_appear(&mut self, pos: usize, now_ms: u64) {
        if !self.reset_appear_once {
            return;
        }
        if let Some(spec) = self.options.policy.enter(ChangeKind::Reset) {
            self.items.get_mut(pos).current.animation = Some(ItemAnimation::start(spec, now_ms));
        }
    }

    fn shift_offsets(&mut self, delta: f32) {
        for pos in 0..self.items.len() {
            self.items.get_mut(pos).offset += delta;
        }
    }

    fn extents_lerped(&self, pos: usize, now_ms: u64) -> Extents {
        let item = self.items.get(pos);
        let size = item
            .current
            .size
            .or(item.previous.size)
            .unwrap_or(Extents::ZERO);
        match item.size_easing {
            Some(se) if !se.is_done(now_ms) => se.lerp(size, now_ms),
            _ => size,
        }
    }

    fn extent_lerped(&self, pos: usize, now_ms: u64) -> f32 {
        self.extents_lerped(pos, now_ms).main
    }

    /// Classifies, acquires, populates, and measures one entry. Runs at most
    /// once per entry per frame; a removed entry keeps its last measurement
    /// for the duration of its exit animation.
    fn measure_item(&mut self, ctx: &mut FrameCtx<'_, R>, pos: usize, limits: Extents) {
        let now_ms = ctx.now_ms;
        let resize_spec = self.options.policy.resize();

        let (index, removed, unresolved) = {
            let item = self.items.get_mut(pos);
            if item.measured {
                return;
            }
            item.measured = true;
            (item.index, item.removed, item.current.kind.is_none())
        };

        if unresolved {
            if removed {
                return;
            }
            let FrameCtx { host, pool, .. } = &mut *ctx;
            let kind = host.resolve_kind(index);
            let acquired = pool.acquire(kind, |k| host.manufacture(k));
            match acquired {
                Some((mut renderer, slot)) => {
                    host.populate(index, kind, &mut renderer);
                    let item = self.items.get_mut(pos);
                    item.current.kind = Some(kind);
                    item.current.slot = slot;
                    item.current.renderer = Some(renderer);
                }
                None => {
                    rdebug!(index, kind, "no renderer available, laying out empty");
                    self.items.get_mut(pos).current.kind = Some(kind);
                }
            }
        }

        let item = self.items.get_mut(pos);
        if let Some(renderer) = item.current.renderer.as_mut() {
            item.current.size = Some(ctx.host.measure(renderer, limits));
        }
        if let Some(renderer) = item.previous.renderer.as_mut() {
            item.previous.size = Some(ctx.host.measure(renderer, limits));
        }

        let size = item.current.size.or(item.previous.size);
        if let Some(size) = size {
            if let Some(prev) = item.previous_size {
                if (prev.main - size.main).abs() > 1e-6 {
                    match item.size_easing.as_mut() {
                        Some(easing) => easing.retarget(size, now_ms),
                        None => {
                            if let Some((curve, duration_ms)) = resize_spec {
                                item.size_easing =
                                    Some(SizeEasing::start(prev, curve, duration_ms, now_ms));
                            }
                        }
                    }
                }
            }
            item.previous_size = Some(size);
        }
    }

    /// Expands the visible run outward from the anchor until both viewport
    /// edges are covered, materializing entries on demand. Entries the walk
    /// does not reach are flagged for trimming.
    ///
    /// Removed entries are woven into the run next to their index so exit
    /// animations keep their place without consuming a collection index.
    fn measure_around_anchor(
        &mut self,
        ctx: &mut FrameCtx<'_, R>,
        anchor_index: usize,
        collection_len: usize,
        main: f32,
        cross_limit: f32,
    ) {
        let now_ms = ctx.now_ms;
        let limits = Extents {
            main: f32::INFINITY,
            cross: cross_limit,
        };

        for pos in 0..self.items.len() {
            self.items.get_mut(pos).outside_viewport = true;
        }
        let Some(a_pos) = self.items.find_live(anchor_index) else {
            debug_assert!(false, "anchor entry missing during expansion");
            return;
        };
        self.items.get_mut(a_pos).outside_viewport = false;

        // Backward: stack upward with decreasing offsets while the run's
        // leading edge is still at or past the viewport start.
        let mut offset = self.items.get(a_pos).offset;
        let mut expected: isize = anchor_index as isize - 1;
        let mut cursor: isize = a_pos as isize - 1;
        loop {
            if offset < 0.0 && main.is_finite() {
                break;
            }
            let reuse = cursor >= 0 && {
                let entry = self.items.get(cursor as usize);
                (expected >= 0 && entry.index as isize == expected)
                    || (entry.removed && entry.index as isize == expected + 1)
            };
            let pos = if reuse {
                cursor as usize
            } else {
                if expected < 0 {
                    break;
                }
                let pos = self.items.insert_live(expected as usize);
                self.apply_reset_appear(pos, now_ms);
                pos
            };
            self.measure_item(ctx, pos, limits);
            let size = self.extent_lerped(pos, now_ms);
            offset -= size;
            {
                let item = self.items.get_mut(pos);
                item.offset = offset;
                item.outside_viewport = false;
            }
            if !self.items.get(pos).removed {
                expected -= 1;
            }
            cursor = pos as isize - 1;
        }

        // Forward: stack downward while the next leading edge is still at or
        // before the viewport end.
        let Some(a_pos) = self.items.find_live(anchor_index) else {
            return;
        };
        let mut offset = self.items.get(a_pos).offset + self.extent_lerped(a_pos, now_ms);
        let mut expected = anchor_index + 1;
        let mut cursor = a_pos + 1;
        loop {
            if main.is_finite() && offset > main {
                break;
            }
            let reuse = cursor < self.items.len() && {
                let entry = self.items.get(cursor);
                if entry.removed {
                    // Removed entries weave into the run (tail ones past the
                    // last live index included) so exit animations keep
                    // their place.
                    entry.index == expected || expected >= collection_len
                } else {
                    // A live entry only matches a valid collection index;
                    // stale ones past the length fall to the trim guard.
                    entry.index == expected && expected < collection_len
                }
            };
            let pos = if reuse {
                cursor
            } else {
                if expected >= collection_len {
                    break;
                }
                let pos = self.items.insert_live(expected);
                self.apply_reset_appear(pos, now_ms);
                pos
            };
            self.measure_item(ctx, pos, limits);
            let size = self.extent_lerped(pos, now_ms);
            {
                let item = self.items.get_mut(pos);
                item.offset = offset;
                item.outside_viewport = false;
            }
            offset += size;
            if !self.items.get(pos).removed {
                expected += 1;
            }
            cursor = pos + 1;
        }
    }

    fn first_last_from_items(&mut self) {
        self.first_visible = None;
        self.last_visible = None;
        for pos in 0..self.items.len() {
            let item = self.items.get(pos);
            if item.removed {
                continue;
            }
            if self.first_visible.is_none() {
                self.first_visible = Some(item.index);
            }
            self.last_visible = Some(item.index);
        }
    }

    /// Visits every visible entry in `(index, removed-first)` order,
    /// including entries mid exit animation. This is the host's inspection
    /// surface (hit testing, debugging overlays).
    pub fn for_each_visible(&self, mut f: impl FnMut(&VisibleItem<R>)) {
        for pos in 0..self.items.len() {
            f(self.items.get(pos));
        }
    }

    /// Index remap for a block move: the moved block shifts by the start
    /// delta, displaced items between the two positions counter-shift.
    fn remap_move(index: usize, old_start: usize, new_start: usize, count: usize) -> usize {
        let old_end = old_start + count;
        if index >= old_start && index < old_end {
            index - old_start + new_start
        } else if new_start > old_start && index >= old_end && index < new_start + count {
            index - count
        } else if new_start < old_start && index >= new_start && index < old_start {
            index + count
        } else {
            index
        }
    }
}

impl<R> LayoutStrategy<R> for LinearLayout<R> {
    fn on_reset(&mut self, ctx: &mut FrameCtx<'_, R>, collection_len: usize) {
        rdebug!(collection_len, "on_reset");
        let exit = self.options.policy.exit(ChangeKind::Reset);
        for pos in 0..self.items.len() {
            let item = self.items.get_mut(pos);
            Self::retire_current(ctx, item, exit);
            item.removed = true;
        }
        if collection_len == 0 {
            self.anchor_index = None;
            return;
        }
        if let Some(anchor) = self.anchor_index {
            if anchor >= collection_len {
                self.anchor_index = Some(collection_len - 1);
            }
        }
        self.reset_appear_once = true;
    }

    fn on_insert(&mut self, ctx: &mut FrameCtx<'_, R>, start: usize, count: usize) {
        rdebug!(start, count, "on_insert");
        if count == 0 {
            return;
        }
        if self.items.is_empty() {
            self.anchor_index = None;
            self.clear_scroll_state();
        }
        for pos in 0..self.items.len() {
            let item = self.items.get_mut(pos);
            if !item.removed && item.index >= start {
                item.index += count;
            }
        }
        self.items.resort();

        let enter = self.options.policy.enter(ChangeKind::Insert);
        let anchor = self.anchor_index;
        for i in 0..count {
            let index = start + i;
            let near_anchor = match anchor {
                Some(a) => a.abs_diff(index) <= APPEAR_TRACK_RADIUS,
                None => index < APPEAR_TRACK_RADIUS,
            };
            if !near_anchor {
                continue;
            }
            let pos = self.items.insert_live(index);
            if let Some(spec) = enter {
                self.items.get_mut(pos).current.animation =
                    Some(ItemAnimation::start(spec, ctx.now_ms));
            }
        }

        if let Some(anchor) = self.anchor_index {
            if anchor >= start {
                self.anchor_index = Some(anchor + count);
            }
        }
    }

    fn on_remove(&mut self, ctx: &mut FrameCtx<'_, R>, start: usize, count: usize) {
        rdebug!(start, count, "on_remove");
        if count == 0 {
            return;
        }
        let end = start + count;
        let exit = self.options.policy.exit(ChangeKind::Remove);
        for pos in 0..self.items.len() {
            let item = self.items.get_mut(pos);
            if item.removed || item.index < start {
                continue;
            }
            if item.index < end {
                Self::retire_current(ctx, item, exit);
                item.removed = true;
            } else {
                item.index -= count;
            }
        }
        self.items.resort();

        if let Some(anchor) = self.anchor_index {
            if anchor >= start {
                self.anchor_index = Some(anchor.saturating_sub(count));
            }
        }
    }

    fn on_replace(&mut self, ctx: &mut FrameCtx<'_, R>, start: usize, count: usize) {
        rdebug!(start, count, "on_replace");
        if count == 0 {
            return;
        }
        let end = start + count;
        let exit = self.options.policy.exit(ChangeKind::Replace);
        let enter = self.options.policy.enter(ChangeKind::Replace);
        for pos in 0..self.items.len() {
            let item = self.items.get_mut(pos);
            if item.removed || item.index < start || item.index >= end {
                continue;
            }
            Self::retire_current(ctx, item, exit);
            item.current.animation = enter.map(|spec| ItemAnimation::start(spec, ctx.now_ms));
        }
    }

    fn on_move(
        &mut self,
        ctx: &mut FrameCtx<'_, R>,
        old_start: usize,
        new_start: usize,
        count: usize,
    ) {
        rdebug!(old_start, new_start, count, "on_move");
        if count == 0 || old_start == new_start {
            return;
        }
        let old_end = old_start + count;
        // Moves are not animated; the policy is still consulted so a custom
        // one can opt in.
        let enter = self.options.policy.enter(ChangeKind::Move);
        for pos in 0..self.items.len() {
            let item = self.items.get_mut(pos);
            if item.removed {
                continue;
            }
            let moved_block = item.index >= old_start && item.index < old_end;
            item.index = Self::remap_move(item.index, old_start, new_start, count);
            if moved_block {
                if let Some(spec) = enter {
                    item.current.animation = Some(ItemAnimation::start(spec, ctx.now_ms));
                }
            }
        }
        self.items.resort();

        if let Some(anchor) = self.anchor_index {
            self.anchor_index = Some(Self::remap_move(anchor, old_start, new_start, count));
        }
    }

    fn measure_window(
        &mut self,
        ctx: &mut FrameCtx<'_, R>,
        viewport: Viewport,
        collection_len: usize,
    ) -> Extents {
        let now_ms = ctx.now_ms;
        let prev_anchor = (self.anchor_index, self.anchor_offset_in_item_ratio);

        // Settle finished animations and reset per-frame flags; entries whose
        // exit animation completed finally return their renderers.
        for pos in (0..self.items.len()).rev() {
            let (removed, previous_done) = {
                let item = self.items.get_mut(pos);
                item.measured = false;
                if item.size_easing.is_some_and(|se| se.is_done(now_ms)) {
                    item.size_easing = None;
                }
                if item.current.animation.is_some_and(|a| a.is_done(now_ms)) {
                    item.current.animation = None;
                }
                let previous_done = item
                    .previous
                    .animation
                    .map_or(true, |a| a.is_done(now_ms));
                (item.removed, previous_done)
            };
            if !previous_done {
                continue;
            }
            if removed {
                let mut gone = self.items.remove_at(pos);
                Self::release_occupant(ctx, &mut gone.previous);
                Self::release_occupant(ctx, &mut gone.current);
            } else {
                let item = self.items.get_mut(pos);
                if item.previous.renderer.is_some() || item.previous.animation.is_some() {
                    Self::release_occupant(ctx, &mut item.previous);
                }
            }
        }

        if self.items.is_empty() && collection_len == 0 {
            self.clear_all(ctx);
            return viewport.extents.or_zero();
        }

        let mut main = viewport.extents.main;
        let cross_suggested = viewport.extents.cross;
        if main <= 0.0 {
            self.clear_all(ctx);
            return viewport.extents.or_zero();
        }

        // Fold smooth-scroll progress into this frame's pending input.
        if let Some(clock) = self.scroll_clock {
            let value = clock.sample(now_ms);
            self.pending_notches += self.smooth_amount * (value - self.scroll_consumed);
            self.scroll_consumed = value;
            if clock.is_done(now_ms) {
                self.scroll_clock = None;
                self.smooth_amount = 0.0;
                self.scroll_consumed = 0.0;
            }
        }

        let mut anchor_ratio = self.options.anchor_offset_ratio.clamp(0.0, 1.0);
        let mut scroll_delta = 0.0f32;
        let had_input = self.pending_notches != 0.0 || self.pending_px != 0.0;
        if had_input {
            scroll_delta = self.pending_notches * self.options.line_px * self.options.lines_per_notch
                + self.pending_px;
            self.pending_notches = 0.0;
            self.pending_px = 0.0;
            rtrace!(scroll_delta, "applying scroll input");
        } else if self.options.stick_to_terminus && collection_len > 0 {
            let prefer_start = anchor_ratio < 0.5;
            if self.was_start_visible && (!self.was_end_visible || prefer_start) {
                self.anchor_index = Some(0);
                self.anchor_offset_in_item = 0.0;
                self.anchor_offset_in_item_ratio = 0.0;
                self.anchor_offset_is_px = false;
                anchor_ratio = 0.0;
            } else if self.was_end_visible {
                self.anchor_index = Some(collection_len - 1);
                self.anchor_offset_in_item = 0.0;
                self.anchor_offset_in_item_ratio = 1.0;
                self.anchor_offset_is_px = false;
                anchor_ratio = 1.0;
            }
        }

        if collection_len > 0 {
            let fallback = (anchor_ratio * collection_len as f32).round() as usize;
            let index = self.anchor_index.unwrap_or(fallback);
            self.anchor_index = Some(index.min(collection_len - 1));
        } else {
            self.anchor_index = None;
        }

        let mut everything_visible = false;

        if let Some(anchor_index) = self.anchor_index {
            let a_pos = match self.items.find_live(anchor_index) {
                Some(pos) => pos,
                None => {
                    let pos = self.items.insert_live(anchor_index);
                    self.apply_reset_appear(pos, now_ms);
                    pos
                }
            };
            let limits = Extents {
                main: f32::INFINITY,
                cross: cross_suggested,
            };
            self.measure_item(ctx, a_pos, limits);
            let extent = self.extent_lerped(a_pos, now_ms);
            if self.anchor_offset_is_px {
                self.anchor_offset_in_item_ratio = if extent > 0.0 {
                    (self.anchor_offset_in_item / extent).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                self.anchor_offset_is_px = false;
            }
            let mut offset = if main.is_finite() {
                viewport.round_to_pixel(main * anchor_ratio)
            } else {
                0.0
            };
            offset -= extent * self.anchor_offset_in_item_ratio;
            offset -= scroll_delta;
            offset = viewport.round_to_pixel(offset);
            self.items.get_mut(a_pos).offset = offset;

            self.measure_around_anchor(ctx, anchor_index, collection_len, main, cross_suggested);

            let mut first_pos = None;
            let mut last_pos = None;
            for pos in 0..self.items.len() {
                if !self.items.get(pos).outside_viewport {
                    if first_pos.is_none() {
                        first_pos = Some(pos);
                    }
                    last_pos = Some(pos);
                }
            }
            let (Some(first_pos), Some(last_pos)) = (first_pos, last_pos) else {
                self.clear_all(ctx);
                return viewport.extents.or_zero();
            };

            let run_top = self.items.get(first_pos).offset;
            let run_bottom = self.items.get(last_pos).offset + self.extent_lerped(last_pos, now_ms);
            let covered = self.items.get(first_pos).index == 0
                && self.items.get(last_pos).index == collection_len - 1;
            everything_visible =
                covered && main.is_finite() && run_top >= 0.0 && run_bottom <= main;

            if main.is_infinite() {
                // Wrap-content main axis: the run is the viewport.
                main = run_bottom - run_top;
                self.shift_offsets(-run_top);
                everything_visible = true;
                self.was_start_visible = true;
                self.was_end_visible = true;
            } else if !everything_visible {
                let mut start_visible = false;
                let mut end_visible = false;
                let mut extend_again = false;
                if self.items.get(first_pos).index == 0 && run_top >= 0.0 {
                    // Over-scrolled past the start: pull the run back flush.
                    if run_top > 0.0 {
                        self.shift_offsets(-run_top);
                        extend_again = true;
                    }
                    start_visible = true;
                }
                if self.items.get(last_pos).index == collection_len - 1
                    && run_bottom - main <= 1.0 / viewport.scale
                {
                    let delta = main - run_bottom;
                    if delta > 0.0 {
                        self.shift_offsets(delta);
                        extend_again = true;
                    }
                    end_visible = true;
                }
                self.was_start_visible = start_visible;
                self.was_end_visible = end_visible;
                if extend_again {
                    self.measure_around_anchor(
                        ctx,
                        anchor_index,
                        collection_len,
                        main,
                        cross_suggested,
                    );
                }
            }

            if everything_visible && !self.anchor_pinned_once {
                let index = (collection_len as f32 * anchor_ratio).round() as usize;
                self.anchor_index = Some(index.min(collection_len - 1));
                self.anchor_offset_in_item = 0.0;
                self.anchor_offset_in_item_ratio = 0.0;
            }
        } else {
            // Only exit animations remain; no anchor to expand from.
            self.clear_scroll_state();
            if main.is_infinite() {
                let last = self.items.len() - 1;
                let top = self.items.get(0).offset;
                let bottom = self.items.get(last).offset + self.extent_lerped(last, now_ms);
                main = bottom - top;
                self.shift_offsets(-top);
            }
        }

        // Trim entries the expansion did not reach, returning their
        // renderers. An entry referencing an index past the collection length
        // means a notification went missing; dropping it here is a safety
        // net, not normal operation.
        for pos in (0..self.items.len()).rev() {
            if !self.items.get(pos).outside_viewport {
                continue;
            }
            let mut gone = self.items.remove_at(pos);
            if !gone.removed && gone.index >= collection_len {
                rwarn!(
                    index = gone.index,
                    collection_len,
                    "dropping desynchronized visible entry"
                );
            }
            Self::release_occupant(ctx, &mut gone.previous);
            Self::release_occupant(ctx, &mut gone.current);
        }

        if self.items.is_empty() {
            self.clear_all(ctx);
            return viewport.extents.or_zero();
        }

        // Gravity: when the whole collection fits, distribute the slack.
        if collection_len > 0 {
            let last = self.items.len() - 1;
            let covered = self.items.get(0).index == 0
                && self.items.get(last).index == collection_len - 1;
            let run_top = self.items.get(0).offset;
            let run_bottom = self.items.get(last).offset + self.extent_lerped(last, now_ms);
            let visible_size = run_bottom - run_top;
            if covered && visible_size <= main {
                let gravity = self.options.gravity.clamp(0.0, 1.0);
                let delta = (main - visible_size) * gravity - run_top;
                self.shift_offsets(delta);
                self.was_start_visible = true;
                self.was_end_visible = true;
                everything_visible = true;
            }
        }

        // Resolve an unbounded cross extent to the widest item, then
        // re-measure under the resolved limit.
        let mut cross = cross_suggested;
        if cross_suggested.is_infinite() {
            let mut resolved = 0.0f32;
            for pos in 0..self.items.len() {
                resolved = resolved.max(self.extents_lerped(pos, now_ms).cross);
            }
            cross = resolved;
            let limits = Extents {
                main: f32::INFINITY,
                cross,
            };
            for pos in 0..self.items.len() {
                self.items.get_mut(pos).measured = false;
                self.measure_item(ctx, pos, limits);
            }
        }

        // One final device-pixel rounding pass over all offsets, after all
        // arithmetic, so no incremental rounding drift accumulates.
        for pos in 0..self.items.len() {
            let item = self.items.get_mut(pos);
            item.offset = viewport.round_to_pixel(item.offset);
        }

        // Re-derive the anchor from the final geometry: the entry containing
        // the reference line wins (half-open, so an item whose leading edge
        // sits exactly on the line beats the one ending there), otherwise the
        // nearest entry. A `scroll_to` pin is honored for this one pass: the
        // requested item stays the anchor even when edge clamping moved the
        // reference line out of it.
        if collection_len > 0 {
            let refline = viewport.round_to_pixel(main * anchor_ratio);
            if std::mem::take(&mut self.anchor_pinned_once) {
                let pinned = (0..self.items.len()).find(|&pos| {
                    let item = self.items.get(pos);
                    !item.removed && Some(item.index) == self.anchor_index
                });
                if let Some(pos) = pinned {
                    let extent = self.extent_lerped(pos, now_ms);
                    let start = self.items.get(pos).offset;
                    let offset_in_item = refline - start;
                    self.anchor_offset_in_item = offset_in_item;
                    self.anchor_offset_in_item_ratio = if extent > 0.0 {
                        (offset_in_item / extent).clamp(0.0, 1.0)
                    } else {
                        0.0
                    };
                    self.first_last_from_items();
                    self.scrolled |=
                        prev_anchor != (self.anchor_index, self.anchor_offset_in_item_ratio);
                    self.can_scroll = !self.items.is_empty() && !everything_visible;
                    self.reset_appear_once = false;
                    return Extents {
                        main,
                        cross: if cross.is_finite() { cross } else { 0.0 },
                    };
                }
            }
            let mut best: Option<(usize, f32, f32, f32)> = None;
            for pos in 0..self.items.len() {
                let extent = self.extent_lerped(pos, now_ms);
                if extent.is_infinite() {
                    continue;
                }
                let item = self.items.get(pos);
                if item.index >= collection_len {
                    // A woven removed tail entry cannot anchor; its index no
                    // longer exists in the collection.
                    continue;
                }
                let start = item.offset;
                let end = start + extent;
                if refline >= start && refline < end {
                    best = Some((item.index, 0.0, start, extent));
                    break;
                }
                let dist = if refline < start {
                    start - refline
                } else {
                    refline - end
                };
                match best {
                    Some((_, d, _, _)) if dist >= d => {}
                    _ => best = Some((item.index, dist, start, extent)),
                }
            }
            if let Some((index, _, start, extent)) = best {
                self.anchor_index = Some(index);
                let offset_in_item = refline - start;
                self.anchor_offset_in_item = if offset_in_item.is_nan() {
                    0.0
                } else {
                    offset_in_item
                };
                let ratio = if extent > 0.0 {
                    (offset_in_item / extent).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                self.anchor_offset_in_item_ratio = if ratio.is_nan() { 0.0 } else { ratio };
            } else {
                // Nothing eligible (unbounded extents or only dying tail
                // entries); fall back to the first valid index so the anchor
                // invariant holds.
                self.anchor_index = Some(self.items.get(0).index.min(collection_len - 1));
                self.anchor_offset_in_item = 0.0;
                self.anchor_offset_in_item_ratio = 0.0;
            }
        }

        self.first_last_from_items();
        self.scrolled |= prev_anchor != (self.anchor_index, self.anchor_offset_in_item_ratio);
        self.can_scroll = !self.items.is_empty() && !everything_visible;
        self.reset_appear_once = false;

        Extents {
            main,
            cross: if cross.is_finite() { cross } else { 0.0 },
        }
    }

    fn for_each_placement(&self, now_ms: u64, mut f: impl FnMut(Placement<'_, R>)) {
        for pos in 0..self.items.len() {
            let extents = self.extents_lerped(pos, now_ms);
            let item = self.items.get(pos);
            if let Some(renderer) = item.previous.renderer.as_ref() {
                let opacity = item.previous.animation.map_or(1.0, |a| a.opacity(now_ms));
                f(Placement {
                    index: item.index,
                    offset: item.offset,
                    extents,
                    opacity,
                    renderer,
                });
            }
            if let Some(renderer) = item.current.renderer.as_ref() {
                let opacity = item.current.animation.map_or(1.0, |a| a.opacity(now_ms));
                f(Placement {
                    index: item.index,
                    offset: item.offset,
                    extents,
                    opacity,
                    renderer,
                });
            }
        }
    }

    fn scroll_by_notches(&mut self, notches: f32) {
        self.pending_notches += notches;
    }

    fn scroll_by_px(&mut self, px: f32) {
        self.pending_px += px;
    }

    fn smooth_scroll_by(&mut self, notches: f32, now_ms: u64) {
        if let Some(clock) = self.scroll_clock {
            let value = clock.sample(now_ms);
            self.pending_notches += self.smooth_amount * (value - self.scroll_consumed);
            self.smooth_amount = notches + self.smooth_amount * (1.0 - value);
        } else {
            self.smooth_amount = notches;
        }
        let (easing, duration_ms) = self.options.policy.scroll();
        self.scroll_clock = Some(EasingClock::new(easing, duration_ms, now_ms));
        self.scroll_consumed = 0.0;
    }

    fn scroll_to(&mut self, index: usize, offset_in_item: f32) {
        rdebug!(index, offset_in_item, "scroll_to");
        self.anchor_index = Some(index);
        self.anchor_offset_in_item = offset_in_item;
        self.anchor_offset_in_item_ratio = 0.0;
        self.anchor_offset_is_px = true;
        self.anchor_pinned_once = true;
        self.clear_scroll_state();
    }

    fn axis(&self) -> Axis {
        self.options.axis
    }

    fn anchor(&self) -> AnchorState {
        AnchorState {
            index: self.anchor_index,
            offset_in_item: self.anchor_offset_in_item,
            offset_in_item_ratio: self.anchor_offset_in_item_ratio,
        }
    }

    fn first_visible(&self) -> Option<usize> {
        self.first_visible
    }

    fn last_visible(&self) -> Option<usize> {
        self.last_visible
    }

    fn visible_len(&self) -> usize {
        self.items.len()
    }

    fn can_scroll(&self) -> bool {
        self.can_scroll
    }

    fn is_animating(&self, now_ms: u64) -> bool {
        if self.scroll_clock.is_some_and(|c| !c.is_done(now_ms)) {
            return true;
        }
        (0..self.items.len()).any(|pos| {
            let item = self.items.get(pos);
            item.current.animation.is_some_and(|a| !a.is_done(now_ms))
                || item.previous.animation.is_some_and(|a| !a.is_done(now_ms))
                || item.size_easing.is_some_and(|se| !se.is_done(now_ms))
        })
    }

    fn take_scrolled(&mut self) -> bool {
        std::mem::take(&mut self.scrolled)
    }

    fn detach(&mut self, ctx: &mut FrameCtx<'_, R>) {
        self.clear_all(ctx);
    }
}
