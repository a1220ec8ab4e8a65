//! Boundaries to the outside world: geometry primitives, the rendering
//! layer, persisted storage and timers.

pub mod geometry;
pub mod measure;
pub mod storage;
pub mod timer;
