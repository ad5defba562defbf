use crate::*;

#[derive(Clone, Copy, Debug)]
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u64(&mut self) -> u64 {
        // Deterministic, dependency-free PRNG for tests.
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0
    }

    fn gen_range_usize(&mut self, start: usize, end_exclusive: usize) -> usize {
        debug_assert!(start < end_exclusive);
        start + (self.next_u64() as usize) % (end_exclusive - start)
    }
}

#[derive(Debug)]
struct TestRenderer {
    item: usize,
    extent: Extents,
}

#[derive(Debug)]
struct TestHost {
    sizes: Vec<f32>,
    cross: f32,
    manufacture_limit: usize,
    manufactured: usize,
    populated: usize,
    cleared: usize,
}

impl TestHost {
    fn uniform(count: usize, extent: f32) -> Self {
        Self {
            sizes: vec![extent; count],
            cross: 10.0,
            manufacture_limit: usize::MAX,
            manufactured: 0,
            populated: 0,
            cleared: 0,
        }
    }
}

impl RendererHost for TestHost {
    type Renderer = TestRenderer;

    fn resolve_kind(&mut self, _index: usize) -> RendererKind {
        0
    }

    fn manufacture(&mut self, _kind: RendererKind) -> Option<TestRenderer> {
        if self.manufactured >= self.manufacture_limit {
            return None;
        }
        self.manufactured += 1;
        Some(TestRenderer {
            item: usize::MAX,
            extent: Extents::ZERO,
        })
    }

    fn populate(&mut self, index: usize, _kind: RendererKind, renderer: &mut TestRenderer) {
        self.populated += 1;
        renderer.item = index;
        renderer.extent = Extents::new(self.sizes.get(index).copied().unwrap_or(10.0), self.cross);
    }

    fn measure(&mut self, renderer: &mut TestRenderer, _limits: Extents) -> Extents {
        renderer.extent
    }

    fn clear(&mut self, _kind: RendererKind, renderer: &mut TestRenderer) {
        self.cleared += 1;
        renderer.item = usize::MAX;
    }
}

struct Fixture {
    host: TestHost,
    pool: PlaceholderPool<TestRenderer>,
    layout: LinearLayout<TestRenderer>,
    len: usize,
}

impl Fixture {
    fn new(count: usize, extent: f32, options: LinearLayoutOptions) -> Self {
        Self {
            host: TestHost::uniform(count, extent),
            pool: PlaceholderPool::new(),
            layout: LinearLayout::new(options),
            len: count,
        }
    }

    fn vertical(count: usize, extent: f32) -> Self {
        Self::new(count, extent, LinearLayoutOptions::new(Axis::Vertical))
    }

    fn measure(&mut self, viewport: Viewport, now_ms: u64) -> Extents {
        let mut ctx = FrameCtx::new(&mut self.host, &mut self.pool, now_ms);
        self.layout.measure_window(&mut ctx, viewport, self.len)
    }

    fn change(&mut self, change: CollectionChange, len_after: usize, now_ms: u64) {
        self.len = len_after;
        let mut ctx = FrameCtx::new(&mut self.host, &mut self.pool, now_ms);
        self.layout.handle_change(change, &mut ctx, len_after);
    }

    fn live_offsets(&self) -> Vec<(usize, f32)> {
        let mut out = Vec::new();
        self.layout.for_each_visible(|item| {
            if !item.removed {
                out.push((item.index, item.offset));
            }
        });
        out
    }

    fn live_offset_of(&self, index: usize) -> Option<f32> {
        self.live_offsets()
            .into_iter()
            .find(|&(i, _)| i == index)
            .map(|(_, off)| off)
    }

    fn renderers_held(&self) -> usize {
        let mut held = 0;
        self.layout.for_each_visible(|item| {
            held += usize::from(item.current.renderer.is_some())
                + usize::from(item.previous.renderer.is_some());
        });
        held
    }

    fn placement_count(&self, now_ms: u64) -> usize {
        let mut n = 0;
        self.layout.for_each_placement(now_ms, |_| n += 1);
        n
    }
}

fn viewport(main: f32) -> Viewport {
    Viewport::new(Extents::new(main, 50.0), 1.0)
}

// --- primitives ---------------------------------------------------------

#[test]
fn easing_curves_hit_endpoints() {
    for easing in [
        Easing::Linear,
        Easing::OutCubic,
        Easing::InCubic,
        Easing::InOutCubic,
    ] {
        assert_eq!(easing.sample(0.0), 0.0, "{easing:?} at 0");
        assert!((easing.sample(1.0) - 1.0).abs() < 1e-6, "{easing:?} at 1");
    }
    assert!(Easing::OutCubic.sample(0.5) > 0.5);
    assert!(Easing::InCubic.sample(0.5) < 0.5);
}

#[test]
fn easing_clock_self_terminates() {
    let clock = EasingClock::new(Easing::Linear, 200, 1000);
    assert_eq!(clock.sample(1000), 0.0);
    assert_eq!(clock.sample(1100), 0.5);
    assert_eq!(clock.sample(1200), 1.0);
    assert!(!clock.is_done(1199));
    assert!(clock.is_done(1200));
    assert_eq!(clock.sample(9999), 1.0);
}

#[test]
fn size_easing_retarget_folds_progress() {
    let mut easing = SizeEasing::start(Extents::new(0.0, 0.0), Easing::Linear, 100, 0);
    let to = Extents::new(100.0, 0.0);
    assert_eq!(easing.lerp(to, 50).main, 50.0);
    easing.retarget(to, 50);
    // The fold keeps the in-flight value as the new starting point.
    assert_eq!(easing.lerp(to, 50).main, 50.0);
    assert_eq!(easing.lerp(to, 100).main, 75.0);
}

#[test]
fn default_policy_matches_stock_transitions() {
    let policy = DefaultAnimationPolicy;
    let insert = policy.enter(ChangeKind::Insert).unwrap();
    assert_eq!(insert.opacity_from, 0.5);
    assert_eq!(insert.opacity_to, 1.0);
    assert_eq!(insert.duration_ms, DEFAULT_ANIMATION_MS);
    assert_eq!(insert.easing, Easing::OutCubic);

    let remove = policy.exit(ChangeKind::Remove).unwrap();
    assert_eq!(remove.opacity_from, 1.0);
    assert_eq!(remove.opacity_to, 0.0);
    assert_eq!(remove.easing, Easing::InCubic);

    assert!(policy.enter(ChangeKind::Replace).is_some());
    assert!(policy.exit(ChangeKind::Replace).is_some());
    assert!(policy.enter(ChangeKind::Move).is_none());
    assert_eq!(policy.scroll(), (Easing::OutCubic, DEFAULT_ANIMATION_MS));
}

#[test]
fn pool_recycles_renderers_and_slots() {
    let mut pool = PlaceholderPool::<u32>::new();
    let (a, slot_a) = pool.acquire(7, |_| Some(11)).unwrap();
    let (b, slot_b) = pool.acquire(7, |_| Some(22)).unwrap();
    assert_ne!(slot_a, slot_b);
    assert_eq!(pool.free_len(7), 0);

    pool.release(7, a, slot_a);
    assert_eq!(pool.free_len(7), 1);

    // Pooled instance comes back before the host is asked again.
    let (again, slot_again) = pool.acquire(7, |_| panic!("pool was not empty")).unwrap();
    assert_eq!(again, 11);
    assert_eq!(slot_again, slot_a);

    pool.release(7, b, slot_b);
    pool.release(7, again, slot_again);
    assert_eq!(pool.free_len(7), 2);
}

#[test]
fn pool_decline_is_not_an_error() {
    let mut pool = PlaceholderPool::<u32>::new();
    assert!(pool.acquire(0, |_| None).is_none());
    assert_eq!(pool.free_len(0), 0);
}

#[test]
fn visible_set_orders_removed_before_live() {
    let mut set = VisibleSet::<u32>::new();
    set.insert_live(3);
    set.insert_live(1);
    let pos = set.insert_live(2);
    set.get_mut(pos).removed = true;
    set.resort();
    set.insert_live(2);

    let keys: Vec<(usize, bool)> = (0..set.len())
        .map(|pos| {
            let item = set.get(pos);
            (item.index, item.removed)
        })
        .collect();
    assert_eq!(
        keys,
        vec![(1, false), (2, true), (2, false), (3, false)],
        "removed entries sort before their live replacement"
    );
    assert_eq!(set.find_live(2).map(|pos| set.get(pos).index), Some(2));
    assert!(!set.get(set.find_live(2).unwrap()).removed);
    assert_eq!(set.find_live(4), None);
}

#[test]
fn change_queue_is_fifo_and_cross_thread() {
    let mut queue = ChangeQueue::new();
    let sender = queue.sender();
    let handle = std::thread::spawn(move || {
        for start in 0..4 {
            sender.send(CollectionChange::Insert { start, count: 1 });
        }
    });
    handle.join().unwrap();

    for start in 0..4 {
        assert_eq!(
            queue.pop(),
            Some(CollectionChange::Insert { start, count: 1 })
        );
    }
    assert_eq!(queue.pop(), None);
}

// --- change dispatch ----------------------------------------------------

#[derive(Default)]
struct RecordingStrategy {
    events: Vec<String>,
}

impl LayoutStrategy<TestRenderer> for RecordingStrategy {
    fn on_reset(&mut self, _ctx: &mut FrameCtx<'_, TestRenderer>, collection_len: usize) {
        self.events.push(format!("reset:{collection_len}"));
    }

    fn on_insert(&mut self, _ctx: &mut FrameCtx<'_, TestRenderer>, start: usize, count: usize) {
        self.events.push(format!("insert:{start}+{count}"));
    }

    fn on_remove(&mut self, _ctx: &mut FrameCtx<'_, TestRenderer>, start: usize, count: usize) {
        self.events.push(format!("remove:{start}+{count}"));
    }

    fn on_replace(&mut self, _ctx: &mut FrameCtx<'_, TestRenderer>, start: usize, count: usize) {
        self.events.push(format!("replace:{start}+{count}"));
    }

    fn on_move(
        &mut self,
        _ctx: &mut FrameCtx<'_, TestRenderer>,
        old_start: usize,
        new_start: usize,
        count: usize,
    ) {
        self.events.push(format!("move:{old_start}->{new_start}+{count}"));
    }

    fn measure_window(
        &mut self,
        _ctx: &mut FrameCtx<'_, TestRenderer>,
        _viewport: Viewport,
        _collection_len: usize,
    ) -> Extents {
        Extents::ZERO
    }

    fn for_each_placement(&self, _now_ms: u64, _f: impl FnMut(Placement<'_, TestRenderer>)) {}

    fn scroll_by_notches(&mut self, _notches: f32) {}

    fn scroll_by_px(&mut self, _px: f32) {}

    fn smooth_scroll_by(&mut self, _notches: f32, _now_ms: u64) {}

    fn scroll_to(&mut self, _index: usize, _offset_in_item: f32) {}

    fn axis(&self) -> Axis {
        Axis::Vertical
    }

    fn anchor(&self) -> AnchorState {
        AnchorState::default()
    }

    fn first_visible(&self) -> Option<usize> {
        None
    }

    fn last_visible(&self) -> Option<usize> {
        None
    }

    fn visible_len(&self) -> usize {
        0
    }

    fn can_scroll(&self) -> bool {
        false
    }

    fn is_animating(&self, _now_ms: u64) -> bool {
        false
    }

    fn take_scrolled(&mut self) -> bool {
        false
    }

    fn detach(&mut self, _ctx: &mut FrameCtx<'_, TestRenderer>) {}
}

#[test]
fn replace_with_unequal_counts_is_decomposed() {
    let mut host = TestHost::uniform(0, 10.0);
    let mut pool = PlaceholderPool::new();
    let mut strategy = RecordingStrategy::default();
    let mut ctx = FrameCtx::new(&mut host, &mut pool, 0);

    strategy.handle_change(
        CollectionChange::Replace {
            start: 4,
            old_count: 2,
            new_count: 5,
        },
        &mut ctx,
        20,
    );
    strategy.handle_change(
        CollectionChange::Replace {
            start: 1,
            old_count: 4,
            new_count: 1,
        },
        &mut ctx,
        17,
    );
    strategy.handle_change(
        CollectionChange::Replace {
            start: 9,
            old_count: 3,
            new_count: 3,
        },
        &mut ctx,
        17,
    );

    assert_eq!(
        strategy.events,
        vec![
            "replace:4+2".to_string(),
            "insert:6+3".to_string(),
            "replace:1+1".to_string(),
            "remove:2+3".to_string(),
            "replace:9+3".to_string(),
        ]
    );
}

#[test]
fn drain_reports_whether_anything_was_processed() {
    let mut host = TestHost::uniform(0, 10.0);
    let mut pool = PlaceholderPool::new();
    let mut strategy = RecordingStrategy::default();
    let mut queue = ChangeQueue::new();
    let sender = queue.sender();

    let mut ctx = FrameCtx::new(&mut host, &mut pool, 0);
    assert!(!strategy.drain(&mut queue, &mut ctx, 0));

    sender.send(CollectionChange::Reset);
    sender.send(CollectionChange::Insert { start: 0, count: 2 });
    assert!(strategy.drain(&mut queue, &mut ctx, 2));
    assert_eq!(strategy.events, vec!["reset:2", "insert:0+2"]);
    assert!(!strategy.drain(&mut queue, &mut ctx, 2));
}

// --- layout scenarios ---------------------------------------------------

#[test]
fn empty_collection_yields_nothing_visible() {
    let mut fixture = Fixture::vertical(0, 20.0);
    fixture.change(CollectionChange::Reset, 0, 0);
    let size = fixture.measure(
        Viewport::new(Extents::new(f32::INFINITY, f32::INFINITY), 1.0),
        0,
    );
    assert_eq!(fixture.layout.anchor().index, None);
    assert_eq!(fixture.layout.visible_len(), 0);
    assert_eq!(size, Extents::ZERO);
    assert!(!fixture.layout.can_scroll());
}

#[test]
fn gravity_distributes_slack() {
    let mut fixture = Fixture::new(
        3,
        20.0,
        LinearLayoutOptions::new(Axis::Vertical).with_gravity(0.5),
    );
    fixture.measure(viewport(100.0), 0);

    let mut offsets = fixture.live_offsets();
    offsets.sort_by_key(|&(index, _)| index);
    assert_eq!(
        offsets,
        vec![(0, 20.0), (1, 40.0), (2, 60.0)],
        "half the 40px slack goes before the run"
    );
    assert!(!fixture.layout.can_scroll());
}

#[test]
fn anchor_is_stable_across_insert_before_it() {
    let mut fixture = Fixture::vertical(10, 20.0);
    fixture.layout.scroll_to(3, 10.0);
    fixture.measure(viewport(100.0), 0);
    assert_eq!(fixture.layout.anchor().index, Some(3));
    assert_eq!(fixture.layout.anchor().offset_in_item_ratio, 0.5);
    let before = fixture.live_offset_of(3).unwrap();

    fixture.change(CollectionChange::Insert { start: 0, count: 1 }, 11, 16);
    fixture.measure(viewport(100.0), 16);

    assert_eq!(fixture.layout.anchor().index, Some(4));
    let after = fixture.live_offset_of(4).unwrap();
    assert!(
        (after - before).abs() <= 1.0,
        "previously anchored item moved {before} -> {after}"
    );
}

#[test]
fn removed_item_holds_renderer_until_exit_animation_ends() {
    let mut fixture = Fixture::vertical(10, 20.0);
    fixture.measure(viewport(100.0), 0);
    let first = fixture.layout.first_visible().unwrap();

    fixture.change(
        CollectionChange::Remove {
            start: first,
            count: 1,
        },
        9,
        0,
    );
    fixture.measure(viewport(100.0), 16);

    let mut removed_seen = 0;
    fixture.layout.for_each_visible(|item| {
        if item.removed {
            removed_seen += 1;
            assert!(
                item.previous.renderer.is_some(),
                "outgoing renderer lives in the previous slot"
            );
            assert!(item.current.renderer.is_none());
        }
    });
    assert_eq!(removed_seen, 1);

    let free_mid = fixture.pool.free_len(0);
    let held_mid = fixture.renderers_held();
    fixture.measure(viewport(100.0), 100);
    assert_eq!(
        fixture.pool.free_len(0),
        free_mid,
        "renderer must not be pooled while the exit animation runs"
    );

    fixture.measure(viewport(100.0), 250);
    assert_eq!(fixture.pool.free_len(0), free_mid + 1);
    assert_eq!(fixture.renderers_held(), held_mid - 1);
    let mut any_removed = false;
    fixture.layout.for_each_visible(|item| any_removed |= item.removed);
    assert!(!any_removed);
}

#[test]
fn smooth_scroll_retarget_has_no_jump() {
    let mut fixture = Fixture::new(
        100,
        10.0,
        LinearLayoutOptions::new(Axis::Vertical).with_scroll_metrics(1.0, 1.0),
    );
    // High render scale so per-frame pixel rounding noise stays far below
    // the assertions.
    let fine = Viewport::new(Extents::new(100.0, 50.0), 1000.0);
    fixture.measure(fine, 0);

    let position = |fixture: &Fixture| -> f32 {
        let (index, offset) = fixture.live_offsets().into_iter().next().unwrap();
        index as f32 * 10.0 - offset
    };

    fixture.layout.smooth_scroll_by(60.0, 0);
    let mut last = position(&fixture);
    let mut max_step = 0.0f32;
    for frame in 1..=40u64 {
        let now = frame * 10;
        if now == 100 {
            fixture.layout.smooth_scroll_by(60.0, now);
        }
        fixture.measure(fine, now);
        let pos = position(&fixture);
        let step = pos - last;
        assert!(step >= -0.001, "displacement reversed at t={now}: {step}");
        max_step = max_step.max(step);
        last = pos;
    }
    assert!(
        (last - 120.0).abs() <= 1.5,
        "both deltas fully applied, got {last}"
    );
    // OutCubic's steepest slope is 3/duration; 10ms frames on a blended
    // amount of at most 120px stay well under 20px per frame.
    assert!(max_step <= 20.0, "discontinuity: {max_step}px in one frame");
}

#[test]
fn scroll_to_round_trips_for_every_index() {
    for ratio in [0.0, 0.37, 1.0] {
        let mut fixture = Fixture::new(
            20,
            20.0,
            LinearLayoutOptions::new(Axis::Vertical).with_anchor_offset_ratio(ratio),
        );
        for index in 0..20 {
            fixture.layout.scroll_to(index, 0.0);
            fixture.measure(viewport(100.0), index as u64 * 1000);
            assert_eq!(
                fixture.layout.anchor().index,
                Some(index),
                "ratio {ratio}, scroll_to({index})"
            );
        }
    }
}

#[test]
fn measure_is_idempotent_without_input() {
    let mut fixture = Fixture::vertical(10, 20.0);
    fixture.host.sizes = (0..10).map(|i| 10.0 + (i % 4) as f32 * 15.0).collect();
    fixture.layout.scroll_to(4, 7.0);
    fixture.measure(viewport(100.0), 0);
    fixture.measure(viewport(100.0), 0);
    let first = fixture.live_offsets();
    fixture.measure(viewport(100.0), 0);
    let second = fixture.live_offsets();
    assert_eq!(first, second);
}

#[test]
fn stick_to_terminus_keeps_end_flush_after_tail_remove() {
    let mut fixture = Fixture::new(
        10,
        20.0,
        LinearLayoutOptions::new(Axis::Vertical)
            .with_anchor_offset_ratio(1.0)
            .with_stick_to_terminus(true),
    );
    fixture.layout.scroll_to(9, 20.0);
    fixture.measure(viewport(100.0), 0);
    assert_eq!(fixture.live_offset_of(9), Some(80.0), "flush with the end");

    fixture.change(CollectionChange::Remove { start: 9, count: 1 }, 9, 16);
    fixture.measure(viewport(100.0), 16);

    assert_eq!(
        fixture.live_offset_of(8),
        Some(80.0),
        "new last item pinned to the end edge"
    );
}

#[test]
fn unbounded_main_extent_wraps_content() {
    let mut fixture = Fixture::vertical(4, 25.0);
    let size = fixture.measure(Viewport::new(Extents::new(f32::INFINITY, 50.0), 1.0), 0);
    assert_eq!(size.main, 100.0);
    let mut offsets = fixture.live_offsets();
    offsets.sort_by_key(|&(index, _)| index);
    assert_eq!(
        offsets,
        vec![(0, 0.0), (1, 25.0), (2, 50.0), (3, 75.0)]
    );
    assert!(!fixture.layout.can_scroll());
}

#[test]
fn unbounded_cross_extent_resolves_to_widest_item() {
    let mut fixture = Fixture::vertical(5, 20.0);
    fixture.host.cross = 33.0;
    let size = fixture.measure(
        Viewport::new(Extents::new(100.0, f32::INFINITY), 1.0),
        0,
    );
    assert_eq!(size.cross, 33.0);
}

#[test]
fn declined_renderers_lay_out_empty() {
    let mut fixture = Fixture::vertical(5, 20.0);
    fixture.host.manufacture_limit = 0;
    fixture.measure(viewport(100.0), 0);

    assert_eq!(fixture.layout.visible_len(), 5);
    assert_eq!(fixture.placement_count(0), 0, "nothing to draw");
    assert_eq!(fixture.layout.anchor().index, Some(0));
    assert_eq!(fixture.host.populated, 0);
}

#[test]
fn desynchronized_entries_are_dropped_not_indexed() {
    let mut fixture = Fixture::vertical(10, 20.0);
    fixture.measure(viewport(100.0), 0);

    // Shrink the collection without any notification.
    fixture.len = 3;
    fixture.measure(viewport(100.0), 16);

    assert!(fixture.layout.visible_len() > 0);
    fixture.layout.for_each_visible(|item| {
        assert!(item.index < 3, "stale index {} survived", item.index);
    });
    let anchor = fixture.layout.anchor().index.unwrap();
    assert!(anchor < 3);
}

#[test]
fn move_remaps_block_and_displaced_entries() {
    let mut fixture = Fixture::vertical(10, 10.0);
    fixture.measure(viewport(200.0), 0);

    fixture.change(
        CollectionChange::Move {
            old_start: 0,
            new_start: 5,
            count: 2,
        },
        10,
        16,
    );
    fixture.measure(viewport(200.0), 16);

    let mut indices: Vec<usize> = fixture.live_offsets().iter().map(|&(i, _)| i).collect();
    indices.sort_unstable();
    assert_eq!(indices, (0..10).collect::<Vec<_>>());
    assert_eq!(fixture.layout.anchor().index, Some(0));
}

#[test]
fn replace_cross_fades_old_and_new_renderer() {
    let mut fixture = Fixture::vertical(6, 20.0);
    fixture.measure(viewport(100.0), 0);
    let held = fixture.renderers_held();

    fixture.change(
        CollectionChange::Replace {
            start: 1,
            old_count: 1,
            new_count: 1,
        },
        6,
        0,
    );
    fixture.measure(viewport(100.0), 16);

    // Both generations are bound while the cross-fade runs.
    assert_eq!(fixture.renderers_held(), held + 1);
    let placements = fixture.placement_count(16);
    assert_eq!(placements, held + 1);

    fixture.measure(viewport(100.0), 300);
    assert_eq!(fixture.renderers_held(), held);
}

// --- randomized invariants ----------------------------------------------

#[test]
fn random_change_sequences_preserve_invariants() {
    let mut rng = Lcg::new(0x5eed);
    let mut fixture = Fixture::vertical(32, 10.0);
    fixture.host.sizes = vec![10.0; 4096];
    let mut len = 32usize;
    let mut now = 0u64;

    fixture.measure(viewport(120.0), now);

    for round in 0..400 {
        now += if rng.gen_range_usize(0, 8) == 0 {
            300
        } else {
            16
        };

        match rng.gen_range_usize(0, 12) {
            0 | 1 => {
                let start = rng.gen_range_usize(0, len + 1);
                let count = rng.gen_range_usize(1, 4);
                len += count;
                fixture.change(CollectionChange::Insert { start, count }, len, now);
            }
            2 | 3 => {
                if len > 0 {
                    let start = rng.gen_range_usize(0, len);
                    let count = rng.gen_range_usize(1, (len - start).min(3) + 1);
                    len -= count;
                    fixture.change(CollectionChange::Remove { start, count }, len, now);
                }
            }
            4 => {
                if len > 0 {
                    let start = rng.gen_range_usize(0, len);
                    let old_count = rng.gen_range_usize(1, (len - start).min(3) + 1);
                    let new_count = rng.gen_range_usize(1, 4);
                    len = len - old_count + new_count;
                    fixture.change(
                        CollectionChange::Replace {
                            start,
                            old_count,
                            new_count,
                        },
                        len,
                        now,
                    );
                }
            }
            5 => {
                if len >= 2 {
                    let count = rng.gen_range_usize(1, (len / 2).min(3) + 1);
                    let old_start = rng.gen_range_usize(0, len - count + 1);
                    let new_start = rng.gen_range_usize(0, len - count + 1);
                    fixture.change(
                        CollectionChange::Move {
                            old_start,
                            new_start,
                            count,
                        },
                        len,
                        now,
                    );
                }
            }
            6 => {
                len = rng.gen_range_usize(0, 48);
                fixture.change(CollectionChange::Reset, len, now);
            }
            7 => {
                if len > 0 {
                    let index = rng.gen_range_usize(0, len);
                    fixture.layout.scroll_to(index, 0.0);
                }
            }
            8 => fixture.layout.scroll_by_px(rng.gen_range_usize(0, 200) as f32 - 100.0),
            _ => {}
        }

        fixture.measure(viewport(120.0), now);

        // Entries strictly ordered, one live entry per index, live indices
        // inside the collection.
        let mut keys = Vec::new();
        fixture.layout.for_each_visible(|item| {
            keys.push((item.index, !item.removed));
            if !item.removed {
                assert!(
                    item.index < len,
                    "round {round}: live index {} with len {len}",
                    item.index
                );
            }
        });
        for pair in keys.windows(2) {
            assert!(
                pair[0] <= pair[1],
                "round {round}: order violated: {pair:?}"
            );
            if pair[0].1 && pair[1].1 {
                assert_ne!(pair[0].0, pair[1].0, "round {round}: duplicate live index");
            }
        }

        // Anchor invariant.
        match fixture.layout.anchor().index {
            Some(anchor) => assert!(len > 0 && anchor < len, "round {round}: anchor {anchor}"),
            None => assert_eq!(len, 0, "round {round}: anchor lost with {len} items"),
        }
        let ratio = fixture.layout.anchor().offset_in_item_ratio;
        assert!((0.0..=1.0).contains(&ratio));

        // Renderer conservation: everything manufactured is either bound to
        // exactly one occupant or sitting in the pool.
        assert_eq!(
            fixture.host.manufactured,
            fixture.renderers_held() + fixture.pool.free_len(0),
            "round {round}: renderer leaked"
        );
        assert_eq!(
            fixture.host.populated - fixture.host.cleared,
            fixture.renderers_held(),
            "round {round}: populate/clear pairing broken"
        );
    }
}
