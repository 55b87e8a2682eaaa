//! Pointer hit-testing

use crate::gfx::Point;
use crate::ui::ComponentId;

/// Result of a hit-test
///
/// `path` is the chain of child indices from the tested node down to the hit
/// node, so the caller can take a mutable borrow afterwards with
/// [`Component::descendant_mut`](crate::ui::Component::descendant_mut).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub id: ComponentId,
    pub path: Vec<usize>,
    /// Pointer position relative to the hit node's top-left corner
    pub local: Point,
}

pub trait Hittable {
    /// Innermost, frontmost node under `point`, or None.
    /// `offset` is the absolute position of this node's parent.
    fn hit_test(&self, point: Point, offset: Point) -> Option<Hit>;
}
