//! Geometric checks over finished placements.
//!
//! Used to verify a packing result: every placed unit must lie inside the
//! container and no two units may share volume. Touching faces are fine.

use thiserror::Error;

use crate::model::{Container, PackedItem};
use crate::types::EPSILON_GENERAL;

/// A placement that breaks the container's geometry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlacementConflict {
    #[error("Item {id} at position {index} exceeds the container bounds")]
    OutOfBounds { id: usize, index: usize },
    #[error("Items at positions {first} and {second} overlap")]
    Overlap { first: usize, second: usize },
}

/// Checks whether two placed units share volume.
///
/// Uses axis-aligned bounding boxes; boxes that only touch do not intersect.
pub fn intersects(a: &PackedItem, b: &PackedItem) -> bool {
    a.bounding_box().intersects(&b.bounding_box())
}

/// Length of the overlap of `[a1, a2)` and `[b1, b2)`, at least 0.0.
///
/// # Examples
/// ```
/// use afit_packer::geometry::overlap_1d;
///
/// assert_eq!(overlap_1d(0.0, 5.0, 3.0, 8.0), 2.0);
/// assert_eq!(overlap_1d(0.0, 5.0, 5.0, 8.0), 0.0);
/// ```
pub fn overlap_1d(a1: f64, a2: f64, b1: f64, b2: f64) -> f64 {
    (a2.min(b2) - a1.max(b1)).max(0.0)
}

/// Volume shared by two placed units.
pub fn overlap_volume(a: &PackedItem, b: &PackedItem) -> f64 {
    overlap_1d(a.pos.0, a.pos.0 + a.dims.0, b.pos.0, b.pos.0 + b.dims.0)
        * overlap_1d(a.pos.1, a.pos.1 + a.dims.1, b.pos.1, b.pos.1 + b.dims.1)
        * overlap_1d(a.pos.2, a.pos.2 + a.dims.2, b.pos.2, b.pos.2 + b.dims.2)
}

/// Whether a placed unit lies inside the container's (length, height, width) extents.
pub fn lies_within(item: &PackedItem, container: &Container) -> bool {
    item.bounding_box()
        .lies_within(&container.reporting_dims(), EPSILON_GENERAL)
}

/// Returns the first conflict among `placements`, if any.
pub fn verify_placements(
    placements: &[PackedItem],
    container: &Container,
) -> Result<(), PlacementConflict> {
    for (index, item) in placements.iter().enumerate() {
        if !lies_within(item, container) {
            return Err(PlacementConflict::OutOfBounds { id: item.id, index });
        }
    }

    for (first, a) in placements.iter().enumerate() {
        for (offset, b) in placements[first + 1..].iter().enumerate() {
            if intersects(a, b) {
                return Err(PlacementConflict::Overlap {
                    first,
                    second: first + 1 + offset,
                });
            }
        }
    }

    Ok(())
}
