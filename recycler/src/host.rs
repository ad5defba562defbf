use crate::{Extents, PlaceholderPool, RendererKind};

/// Host-supplied renderer lifecycle: classification, manufacture, fill,
/// measurement, and reset of pooled renderer instances.
///
/// The engine guarantees `populate` and `clear` are invoked exactly once per
/// acquire/release pair.
pub trait RendererHost {
    type Renderer;

    /// Classifies which renderer type the item at `index` needs.
    fn resolve_kind(&mut self, index: usize) -> RendererKind;

    /// Manufactures a new renderer of `kind` when the pool has run dry.
    /// Returning `None` declines; the item is then laid out renderer-less,
    /// which is an expected state and not an error.
    fn manufacture(&mut self, kind: RendererKind) -> Option<Self::Renderer>;

    /// Fills `renderer` with the data of the item at `index`.
    fn populate(&mut self, index: usize, kind: RendererKind, renderer: &mut Self::Renderer);

    /// Measures `renderer` under `limits` (an unbounded limit is
    /// `f32::INFINITY`) and returns its axis-relative size.
    fn measure(&mut self, renderer: &mut Self::Renderer, limits: Extents) -> Extents;

    /// Resets `renderer` before it returns to the pool.
    fn clear(&mut self, kind: RendererKind, renderer: &mut Self::Renderer);
}

/// Borrowed host-side collaborators handed to a layout strategy for one
/// frame: the renderer lifecycle, the placeholder pool, and the frame's
/// wall-clock time.
pub struct FrameCtx<'a, R> {
    pub host: &'a mut dyn RendererHost<Renderer = R>,
    pub pool: &'a mut PlaceholderPool<R>,
    pub now_ms: u64,
}

impl<'a, R> FrameCtx<'a, R> {
    pub fn new(
        host: &'a mut dyn RendererHost<Renderer = R>,
        pool: &'a mut PlaceholderPool<R>,
        now_ms: u64,
    ) -> Self {
        Self { host, pool, now_ms }
    }
}