//! Container orientation variants.
//!
//! The engine always fills along working axes `(px, py, pz)`: x across a
//! layer, y through the stack of layers, z into the depth. Each variant
//! assigns the container's length, width and height to those axes in a
//! different way; results are mapped back to (length, height, width).

use serde::Serialize;
use utoipa::ToSchema;

use crate::model::Container;
use crate::types::Vec3;

/// One of the six ways to lay the container onto the working axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// px = length, py = height, pz = width
    LengthHeightWidth,
    /// px = width, py = height, pz = length
    WidthHeightLength,
    /// px = width, py = length, pz = height
    WidthLengthHeight,
    /// px = height, py = length, pz = width
    HeightLengthWidth,
    /// px = length, py = width, pz = height
    LengthWidthHeight,
    /// px = height, py = width, pz = length
    HeightWidthLength,
}

impl Orientation {
    /// All variants in search order.
    pub const ALL: [Orientation; 6] = [
        Orientation::LengthHeightWidth,
        Orientation::WidthHeightLength,
        Orientation::WidthLengthHeight,
        Orientation::HeightLengthWidth,
        Orientation::LengthWidthHeight,
        Orientation::HeightWidthLength,
    ];

    /// 1-based variant number, as shown in reports.
    pub fn number(self) -> u8 {
        match self {
            Orientation::LengthHeightWidth => 1,
            Orientation::WidthHeightLength => 2,
            Orientation::WidthLengthHeight => 3,
            Orientation::HeightLengthWidth => 4,
            Orientation::LengthWidthHeight => 5,
            Orientation::HeightWidthLength => 6,
        }
    }

    /// Working extents `(px, py, pz)` for the given container.
    pub fn working_dims(self, container: &Container) -> Vec3 {
        let (l, w, h) = (container.length, container.width, container.height);
        match self {
            Orientation::LengthHeightWidth => Vec3::new(l, h, w),
            Orientation::WidthHeightLength => Vec3::new(w, h, l),
            Orientation::WidthLengthHeight => Vec3::new(w, l, h),
            Orientation::HeightLengthWidth => Vec3::new(h, l, w),
            Orientation::LengthWidthHeight => Vec3::new(l, w, h),
            Orientation::HeightWidthLength => Vec3::new(h, w, l),
        }
    }

    /// Maps a local vector (coordinate or extent) to (length, height, width).
    pub fn to_container_axes(self, local: Vec3) -> Vec3 {
        let Vec3 { x, y, z } = local;
        match self {
            Orientation::LengthHeightWidth => Vec3::new(x, y, z),
            Orientation::WidthHeightLength => Vec3::new(z, y, x),
            Orientation::WidthLengthHeight => Vec3::new(y, z, x),
            Orientation::HeightLengthWidth => Vec3::new(y, x, z),
            Orientation::LengthWidthHeight => Vec3::new(x, z, y),
            Orientation::HeightWidthLength => Vec3::new(z, x, y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn working_dims_map_back_to_reporting_axes() {
        let container = Container::new(0, 1.0, 2.0, 3.0).unwrap();
        for orientation in Orientation::ALL {
            let local = orientation.working_dims(&container);
            assert_eq!(
                orientation.to_container_axes(local),
                container.reporting_dims(),
                "variant {} does not invert",
                orientation.number()
            );
        }
    }

    #[test]
    fn variant_numbers_follow_search_order() {
        let numbers: Vec<u8> = Orientation::ALL.iter().map(|o| o.number()).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn working_dims_match_permutation_table() {
        let container = Container::new(0, 1.0, 2.0, 3.0).unwrap();
        assert_eq!(
            Orientation::WidthLengthHeight.working_dims(&container),
            Vec3::new(2.0, 1.0, 3.0)
        );
        assert_eq!(
            Orientation::HeightWidthLength.working_dims(&container),
            Vec3::new(3.0, 2.0, 1.0)
        );
    }
}
