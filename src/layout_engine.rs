pub mod axis;
pub mod defaults;
pub mod engine;
pub mod overlap;
pub mod resolver;
pub mod snap;

use bitflags::bitflags;

pub use axis::{Direction, Orientation};
pub use engine::{PlacedWidget, compute_hud_layout, resolve_layout, widget_size};
pub use overlap::resolve_status_overlaps;
pub use resolver::{NearbyWidget, PositionFn, PositionResolver, ResolvedLayout};
pub use snap::{SnapKind, SnapLine, SnapResult, compute_snap, dedupe_snap_lines};

use crate::sys::geometry::Size;

bitflags! {
    /// Host and user state that position functions may branch on.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ContextFlags: u8 {
        const SIMPLE_MODE = 1 << 0;
        const IN_VEHICLE = 1 << 1;
        const MINIMAP = 1 << 2;
    }
}

/// Captures everything a position function may read besides the resolver, so
/// position functions stay pure.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutContext {
    pub screen: Size,
    pub ready: bool,
    pub flags: ContextFlags,
}
