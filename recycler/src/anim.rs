use crate::{ChangeKind, Extents};

/// Default duration for structural-change and scroll animations.
pub const DEFAULT_ANIMATION_MS: u64 = 200;

/// Easing curves used by item and scroll animations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Easing {
    Linear,
    OutCubic,
    InCubic,
    InOutCubic,
}

impl Easing {
    pub fn sample(self, t: f32) -> f32 {
        match self {
            Self::Linear => t,
            Self::OutCubic => {
                let u = 1.0 - t;
                1.0 - u * u * u
            }
            Self::InCubic => t * t * t,
            Self::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let u = -2.0 * t + 2.0;
                    1.0 - (u * u * u) / 2.0
                }
            }
        }
    }
}

/// A wall-clock driven 0→1 progress clock.
///
/// Clocks are sampled once per frame and self-terminate: `is_done` compares
/// elapsed time against the configured duration, nothing ticks in the
/// background.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EasingClock {
    pub easing: Easing,
    pub start_ms: u64,
    pub duration_ms: u64,
}

impl EasingClock {
    pub fn new(easing: Easing, duration_ms: u64, now_ms: u64) -> Self {
        Self {
            easing,
            start_ms: now_ms,
            duration_ms: duration_ms.max(1),
        }
    }

    /// Eased progress in `[0, 1]` at `now_ms`.
    pub fn sample(&self, now_ms: u64) -> f32 {
        let elapsed = now_ms.saturating_sub(self.start_ms);
        let t = (elapsed as f32 / self.duration_ms as f32).clamp(0.0, 1.0);
        self.easing.sample(t)
    }

    pub fn is_done(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.start_ms) >= self.duration_ms
    }

    pub fn restart(&mut self, now_ms: u64) {
        self.start_ms = now_ms;
    }
}

/// Recipe for an opacity animation, as supplied by an [`AnimationPolicy`].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnimationSpec {
    pub opacity_from: f32,
    pub opacity_to: f32,
    pub easing: Easing,
    pub duration_ms: u64,
}

impl AnimationSpec {
    pub fn fade(opacity_from: f32, opacity_to: f32, easing: Easing) -> Self {
        Self {
            opacity_from,
            opacity_to,
            easing,
            duration_ms: DEFAULT_ANIMATION_MS,
        }
    }
}

/// A running opacity animation bound to one occupant of a visible item.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemAnimation {
    spec: AnimationSpec,
    clock: EasingClock,
}

impl ItemAnimation {
    pub fn start(spec: AnimationSpec, now_ms: u64) -> Self {
        let clock = EasingClock::new(spec.easing, spec.duration_ms, now_ms);
        Self { spec, clock }
    }

    pub fn opacity(&self, now_ms: u64) -> f32 {
        let t = self.clock.sample(now_ms);
        self.spec.opacity_from + (self.spec.opacity_to - self.spec.opacity_from) * t
    }

    pub fn is_done(&self, now_ms: u64) -> bool {
        self.clock.is_done(now_ms)
    }
}

/// A running interpolation from an item's previous extents toward its
/// current ones, so a re-measured item grows/shrinks instead of snapping.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SizeEasing {
    pub from: Extents,
    clock: EasingClock,
}

impl SizeEasing {
    pub fn start(from: Extents, easing: Easing, duration_ms: u64, now_ms: u64) -> Self {
        Self {
            from,
            clock: EasingClock::new(easing, duration_ms, now_ms),
        }
    }

    /// Interpolated extents between `from` and `to` at `now_ms`.
    pub fn lerp(&self, to: Extents, now_ms: u64) -> Extents {
        let t = self.clock.sample(now_ms);
        Extents {
            main: self.from.main + (to.main - self.from.main) * t,
            cross: self.from.cross + (to.cross - self.from.cross) * t,
        }
    }

    /// Folds the in-flight interpolation into a new starting point and
    /// restarts the clock; used when the target size changes again before
    /// the previous easing finished.
    pub fn retarget(&mut self, current_to: Extents, now_ms: u64) {
        self.from = self.lerp(current_to, now_ms);
        self.clock.restart(now_ms);
    }

    pub fn is_done(&self, now_ms: u64) -> bool {
        self.clock.is_done(now_ms)
    }
}

/// Supplies animation recipes for structural changes.
///
/// Injected once into a layout strategy and consulted per change kind; a
/// `None` means the corresponding transition plays no animation (content
/// appears or disappears on the next frame).
pub trait AnimationPolicy {
    /// Animation for content appearing because of `change`.
    fn enter(&self, change: ChangeKind) -> Option<AnimationSpec>;

    /// Animation for content leaving because of `change`. The outgoing
    /// renderer is only returned to the pool once this reports done.
    fn exit(&self, change: ChangeKind) -> Option<AnimationSpec>;

    /// Easing for item extent changes, or `None` to snap to the new size.
    fn resize(&self) -> Option<(Easing, u64)>;

    /// Easing that drives smooth scrolling.
    fn scroll(&self) -> (Easing, u64);
}

/// The stock policy: 200 ms cubic fades for structural changes, an ease-out
/// scroll curve, and an in-out resize easing. Moves are unanimated.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultAnimationPolicy;

impl AnimationPolicy for DefaultAnimationPolicy {
    fn enter(&self, change: ChangeKind) -> Option<AnimationSpec> {
        match change {
            ChangeKind::Insert => Some(AnimationSpec::fade(0.5, 1.0, Easing::OutCubic)),
            ChangeKind::Replace | ChangeKind::Reset => {
                Some(AnimationSpec::fade(0.0, 1.0, Easing::OutCubic))
            }
            ChangeKind::Remove | ChangeKind::Move => None,
        }
    }

    fn exit(&self, change: ChangeKind) -> Option<AnimationSpec> {
        match change {
            ChangeKind::Remove => Some(AnimationSpec::fade(1.0, 0.0, Easing::InCubic)),
            ChangeKind::Replace | ChangeKind::Reset => {
                Some(AnimationSpec::fade(1.0, 0.0, Easing::OutCubic))
            }
            ChangeKind::Insert | ChangeKind::Move => None,
        }
    }

    fn resize(&self) -> Option<(Easing, u64)> {
        Some((Easing::InOutCubic, DEFAULT_ANIMATION_MS))
    }

    fn scroll(&self) -> (Easing, u64) {
        (Easing::OutCubic, DEFAULT_ANIMATION_MS)
    }
}
