use std::sync::Arc;

use recycler::{
    Axis, ChangeQueue, ChangeSender, Extents, FrameCtx, LayoutStrategy, PlaceholderPool,
    Placement, RendererHost, Viewport,
};

use crate::{ObservableCollection, Scrollbar, ScrollbarMode, ScrollbarState};

/// Callback fired after a frame in which the anchor moved.
pub type ScrollCallback = Arc<dyn Fn(&ScrollbarState) + Send + Sync>;

/// Configuration for [`RecyclerControl`].
pub struct ControlOptions {
    pub scrollbar_mode: ScrollbarMode,

    /// Wheel notches scrolled per second without user input; `0` disables
    /// auto-scrolling.
    pub auto_scroll_per_sec: f32,

    /// Fired at the end of an interaction pass whenever the anchor moved.
    pub on_scroll: Option<ScrollCallback>,
}

impl ControlOptions {
    pub fn new() -> Self {
        Self {
            scrollbar_mode: ScrollbarMode::Automatic,
            auto_scroll_per_sec: 0.0,
            on_scroll: None,
        }
    }

    pub fn with_scrollbar_mode(mut self, mode: ScrollbarMode) -> Self {
        self.scrollbar_mode = mode;
        self
    }

    pub fn with_auto_scroll_per_sec(mut self, notches_per_sec: f32) -> Self {
        self.auto_scroll_per_sec = notches_per_sec;
        self
    }

    pub fn with_on_scroll(
        mut self,
        on_scroll: Option<impl Fn(&ScrollbarState) + Send + Sync + 'static>,
    ) -> Self {
        self.on_scroll = on_scroll.map(|f| Arc::new(f) as _);
        self
    }
}

impl Default for ControlOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for ControlOptions {
    fn clone(&self) -> Self {
        Self {
            scrollbar_mode: self.scrollbar_mode,
            auto_scroll_per_sec: self.auto_scroll_per_sec,
            on_scroll: self.on_scroll.clone(),
        }
    }
}

impl core::fmt::Debug for ControlOptions {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ControlOptions")
            .field("scrollbar_mode", &self.scrollbar_mode)
            .field("auto_scroll_per_sec", &self.auto_scroll_per_sec)
            .finish_non_exhaustive()
    }
}

/// Owns the collection binding, the renderer host, the placeholder pool, the
/// change queue, and scrollbar state, and drives an attached layout strategy
/// once per frame.
///
/// The per-frame protocol is a single [`interact`](Self::interact) call:
/// integrate auto-scroll, drain queued collection changes, forward this
/// frame's wheel input, run one measurement pass, and sync the scrollbar
/// surface. Draining is all-or-nothing, so any number of queued
/// notifications still costs exactly one re-layout.
pub struct RecyclerControl<C, H, S>
where
    C: ObservableCollection,
    H: RendererHost,
    S: LayoutStrategy<H::Renderer>,
{
    collection: C,
    host: H,
    strategy: Option<S>,
    pool: PlaceholderPool<H::Renderer>,
    queue: ChangeQueue,
    scrollbar: Scrollbar,
    options: ControlOptions,
    last_tick_ms: Option<u64>,
}

impl<C, H, S> RecyclerControl<C, H, S>
where
    C: ObservableCollection,
    H: RendererHost,
    S: LayoutStrategy<H::Renderer>,
{
    /// Creates a control bound to `collection`, subscribing the internal
    /// change queue to it.
    pub fn new(mut collection: C, host: H, options: ControlOptions) -> Self {
        let queue = ChangeQueue::new();
        collection.subscribe(queue.sender());
        let scrollbar = Scrollbar::new(options.scrollbar_mode);
        Self {
            collection,
            host,
            strategy: None,
            pool: PlaceholderPool::new(),
            queue,
            scrollbar,
            options,
            last_tick_ms: None,
        }
    }

    /// Attaches a layout strategy.
    ///
    /// # Panics
    ///
    /// Panics if a strategy is already attached; that is a caller bug, not a
    /// recoverable state.
    pub fn attach(&mut self, strategy: S) {
        assert!(
            self.strategy.is_none(),
            "a layout strategy is already attached to this control"
        );
        self.strategy = Some(strategy);
    }

    /// Detaches the current strategy, returning every live renderer to the
    /// pool.
    ///
    /// # Panics
    ///
    /// Panics if no strategy is attached, or if any item animation is still
    /// running at `now_ms`.
    pub fn detach(&mut self, now_ms: u64) -> S {
        let Some(mut strategy) = self.strategy.take() else {
            panic!("no layout strategy is attached to this control");
        };
        assert!(
            !strategy.is_animating(now_ms),
            "cannot detach a layout strategy while item animations are running"
        );
        let mut ctx = FrameCtx::new(&mut self.host, &mut self.pool, now_ms);
        strategy.detach(&mut ctx);
        strategy
    }

    /// A producer handle for pushing change descriptors from notification
    /// contexts the collection itself does not cover.
    pub fn change_sender(&self) -> ChangeSender {
        self.queue.sender()
    }

    /// Runs one interaction pass and returns the resolved content extents.
    ///
    /// `wheel_notches` is this frame's wheel input in detents (positive
    /// scrolls forward); it is driven through the strategy's smooth-scroll
    /// easing.
    pub fn interact(&mut self, viewport: Viewport, wheel_notches: f32, now_ms: u64) -> Extents {
        let auto = self.options.auto_scroll_per_sec;
        match self.last_tick_ms {
            Some(last) => {
                let dt = now_ms.saturating_sub(last) as f32 / 1000.0;
                // Integrate in >=10ms steps so tiny frame deltas don't vanish
                // in float accumulation.
                if dt >= 0.01 {
                    if auto != 0.0 {
                        if let Some(strategy) = self.strategy.as_mut() {
                            strategy.scroll_by_notches(auto * dt);
                        }
                    }
                    self.last_tick_ms = Some(now_ms);
                }
            }
            None => self.last_tick_ms = Some(now_ms),
        }

        let collection_len = self.collection.len();
        let Some(strategy) = self.strategy.as_mut() else {
            // No strategy to replay them into; stale descriptors would be
            // meaningless once one attaches.
            while self.queue.pop().is_some() {}
            return viewport.extents.or_zero();
        };

        let mut ctx = FrameCtx::new(&mut self.host, &mut self.pool, now_ms);
        strategy.drain(&mut self.queue, &mut ctx, collection_len);
        if wheel_notches != 0.0 {
            strategy.smooth_scroll_by(wheel_notches, now_ms);
        }
        let size = strategy.measure_window(&mut ctx, viewport, collection_len);

        let state = ScrollbarState {
            anchored_index: strategy.anchor().index,
            first_visible: strategy.first_visible(),
            last_visible: strategy.last_visible(),
            can_scroll: strategy.can_scroll(),
        };
        self.scrollbar.sync(state);
        if strategy.take_scrolled() {
            if let Some(on_scroll) = &self.options.on_scroll {
                on_scroll(&state);
            }
        }
        size
    }

    /// Emits the final placements in index order. No-op without a strategy.
    pub fn for_each_placement(&self, now_ms: u64, f: impl FnMut(Placement<'_, H::Renderer>)) {
        if let Some(strategy) = self.strategy.as_ref() {
            strategy.for_each_placement(now_ms, f);
        }
    }

    /// Scrollbar write surface: jump the anchor to `index` with the
    /// reference line `offset_in_item` pixels into it.
    pub fn scroll_to(&mut self, index: usize, offset_in_item: f32) {
        if let Some(strategy) = self.strategy.as_mut() {
            strategy.scroll_to(index, offset_in_item);
        }
    }

    /// Scrollbar write surface: scroll by a main-axis pixel distance.
    pub fn scroll_by_px(&mut self, px: f32) {
        if let Some(strategy) = self.strategy.as_mut() {
            strategy.scroll_by_px(px);
        }
    }

    pub fn scroll_by_notches(&mut self, notches: f32) {
        if let Some(strategy) = self.strategy.as_mut() {
            strategy.scroll_by_notches(notches);
        }
    }

    pub fn smooth_scroll_by(&mut self, notches: f32, now_ms: u64) {
        if let Some(strategy) = self.strategy.as_mut() {
            strategy.smooth_scroll_by(notches, now_ms);
        }
    }

    pub fn axis(&self) -> Option<Axis> {
        self.strategy.as_ref().map(|strategy| strategy.axis())
    }

    pub fn scrollbar(&self) -> &Scrollbar {
        &self.scrollbar
    }

    pub fn options(&self) -> &ControlOptions {
        &self.options
    }

    pub fn collection(&self) -> &C {
        &self.collection
    }

    pub fn collection_mut(&mut self) -> &mut C {
        &mut self.collection
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn pool(&self) -> &PlaceholderPool<H::Renderer> {
        &self.pool
    }

    /// Pre-seed the pool with manufactured renderers (e.g. at startup).
    pub fn pool_mut(&mut self) -> &mut PlaceholderPool<H::Renderer> {
        &mut self.pool
    }

    pub fn strategy(&self) -> Option<&S> {
        self.strategy.as_ref()
    }

    pub fn strategy_mut(&mut self) -> Option<&mut S> {
        self.strategy.as_mut()
    }
}

impl<C, H, S> core::fmt::Debug for RecyclerControl<C, H, S>
where
    C: ObservableCollection,
    H: RendererHost,
    S: LayoutStrategy<H::Renderer>,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RecyclerControl")
            .field("attached", &self.strategy.is_some())
            .field("scrollbar", &self.scrollbar)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
