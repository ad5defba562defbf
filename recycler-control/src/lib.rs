//! Host-control glue for the `recycler` layout engine.
//!
//! The `recycler` crate is UI-agnostic: it owns the layout math, the
//! visible-item window, and the renderer pool protocol, but nothing drives
//! it. This crate provides the owning side:
//!
//! - [`ObservableCollection`]: the contract a data source fulfils to feed
//!   change notifications into the engine (plus [`VecCollection`], a plain
//!   vector implementation of it)
//! - [`RecyclerControl`]: binds a collection, a renderer host, and a layout
//!   strategy together and runs the once-per-frame interaction pass
//! - scrollbar state wiring and auto-scroll integration
//!
//! No drawing happens here; the control hands out final placements and the
//! host renders them.
#![forbid(unsafe_code)]

mod collection;
mod control;
mod scrollbar;


pub use collection::{ObservableCollection, VecCollection};
pub use control::{ControlOptions, RecyclerControl, ScrollCallback};
pub use scrollbar::{Scrollbar, ScrollbarMode, ScrollbarState};
