//! A headless recycler-view layout engine.
//!
//! Given an ordered, possibly unbounded collection and a bounded or elastic
//! viewport, this crate materializes renderers only for the items near the
//! viewport, recycles renderers through a per-kind placeholder pool, and
//! keeps a stable anchor item across scrolling and structural mutation
//! (insert/remove/replace/move/reset) of the underlying collection.
//!
//! It is UI-agnostic. A host layer is expected to provide:
//! - viewport geometry and render scale per frame
//! - the frame's scroll input
//! - the renderer lifecycle ([`RendererHost`]): classify, manufacture,
//!   populate, measure, clear
//!
//! Layout runs entirely inside a per-frame pass on the owning UI thread;
//! only the [`ChangeQueue`] producer side may be touched from elsewhere.
//!
//! For host-control glue (collection binding, scrollbars, the frame driver),
//! see the `recycler-control` crate.
#![forbid(unsafe_code)]

#[macro_use]
mod macros;

mod anim;
mod arena;
mod change;
mod host;
mod linear;
mod pool;
mod strategy;
mod types;

#[cfg(test)]
mod tests;

pub use anim::{
    AnimationPolicy, AnimationSpec, DEFAULT_ANIMATION_MS, DefaultAnimationPolicy, Easing,
    EasingClock, ItemAnimation, SizeEasing,
};
pub use arena::{Occupant, VisibleItem, VisibleSet};
pub use change::{ChangeQueue, ChangeSender};
pub use host::{FrameCtx, RendererHost};
pub use linear::{LinearLayout, LinearLayoutOptions};
pub use pool::PlaceholderPool;
pub use strategy::LayoutStrategy;
pub use types::{
    AnchorState, Axis, ChangeKind, CollectionChange, Extents, Placement, PoolSlot, RendererKind,
    Viewport,
};
