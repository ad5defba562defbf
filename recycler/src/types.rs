/// The screen axis along which items are stacked.
///
/// Orientation is a configuration value; every strategy works in `(main,
/// cross)` coordinates and maps to `(x, y)` only at the edges.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Axis {
    Vertical,
    Horizontal,
}

impl Axis {
    /// Converts axis-relative `(main, cross)` coordinates to screen `(x, y)`.
    pub fn to_xy(self, main: f32, cross: f32) -> (f32, f32) {
        match self {
            Self::Vertical => (cross, main),
            Self::Horizontal => (main, cross),
        }
    }
}

/// An axis-relative size: `main` along the stacking axis, `cross`
/// perpendicular to it. `f32::INFINITY` encodes an unbounded extent.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Extents {
    pub main: f32,
    pub cross: f32,
}

impl Extents {
    pub const ZERO: Self = Self {
        main: 0.0,
        cross: 0.0,
    };

    pub fn new(main: f32, cross: f32) -> Self {
        Self { main, cross }
    }

    /// An extent that is unbounded on both axes ("wrap content").
    pub fn unbounded() -> Self {
        Self {
            main: f32::INFINITY,
            cross: f32::INFINITY,
        }
    }

    pub fn is_main_unbounded(&self) -> bool {
        self.main.is_infinite()
    }

    pub fn is_cross_unbounded(&self) -> bool {
        self.cross.is_infinite()
    }

    /// Resolves unbounded axes to zero. An empty layout run has nothing to
    /// wrap, so "as large as the content" degrades to nothing.
    pub fn or_zero(self) -> Self {
        Self {
            main: if self.main.is_finite() { self.main } else { 0.0 },
            cross: if self.cross.is_finite() { self.cross } else { 0.0 },
        }
    }
}

/// Viewport geometry for one frame: suggested size per axis plus the render
/// scale used for device-pixel rounding.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Viewport {
    pub extents: Extents,
    pub scale: f32,
}

impl Viewport {
    /// Creates a viewport. A non-positive or non-finite `scale` is sanitized
    /// to `1.0`.
    pub fn new(extents: Extents, scale: f32) -> Self {
        let scale = if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            1.0
        };
        Self { extents, scale }
    }

    /// Rounds a main-axis offset to the nearest device pixel.
    pub fn round_to_pixel(&self, v: f32) -> f32 {
        (v * self.scale).round() / self.scale
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            extents: Extents::ZERO,
            scale: 1.0,
        }
    }
}

/// Classifies which renderer type an item needs (heterogeneous lists bind a
/// pool free list per kind).
pub type RendererKind = u32;

/// Stable identity handed out with each acquired renderer. Hosts that key
/// per-widget state (focus, ids) by something other than the data index can
/// use the slot; it is recycled LIFO together with the renderer.
pub type PoolSlot = u32;

/// A structural change to the observed collection.
///
/// Descriptors are recorded verbatim from collection notifications and
/// replayed in FIFO order by the layout strategy once per frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CollectionChange {
    /// The collection changed wholesale; the visible window is rebuilt.
    Reset,
    Insert {
        start: usize,
        count: usize,
    },
    Remove {
        start: usize,
        count: usize,
    },
    /// `old_count` items starting at `start` were replaced by `new_count`
    /// items. Unequal counts are decomposed into a same-size replace plus an
    /// insert or remove during dispatch.
    Replace {
        start: usize,
        old_count: usize,
        new_count: usize,
    },
    Move {
        old_start: usize,
        new_start: usize,
        count: usize,
    },
}

impl CollectionChange {
    pub fn kind(&self) -> ChangeKind {
        match self {
            Self::Reset => ChangeKind::Reset,
            Self::Insert { .. } => ChangeKind::Insert,
            Self::Remove { .. } => ChangeKind::Remove,
            Self::Replace { .. } => ChangeKind::Replace,
            Self::Move { .. } => ChangeKind::Move,
        }
    }
}

/// The action class of a change, without its operands. Animation policies
/// are consulted per kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChangeKind {
    Reset,
    Insert,
    Remove,
    Replace,
    Move,
}

/// The stable reference point for position math across layout passes.
///
/// `index` is `None` exactly when the collection is empty. `offset_in_item`
/// is how far past the anchor item's leading edge the viewport's reference
/// line falls, and `offset_in_item_ratio` the same as a fraction of the item
/// extent, clamped to `[0, 1]`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnchorState {
    pub index: Option<usize>,
    pub offset_in_item: f32,
    pub offset_in_item_ratio: f32,
}

/// Final placement of one renderer for the draw pass.
///
/// Placements are emitted in ascending index order; for an item mid
/// replace/remove animation the outgoing renderer is emitted before the
/// incoming one, each with its sampled opacity.
#[derive(Debug)]
pub struct Placement<'a, R> {
    pub index: usize,
    /// Main-axis offset of the item's leading edge, device-pixel rounded.
    pub offset: f32,
    pub extents: Extents,
    pub opacity: f32,
    pub renderer: &'a R,
}
