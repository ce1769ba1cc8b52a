//! Data models for the container packing engine.
//!
//! This module defines the fundamental data structures:
//! - `Container`: the single container filled by one run
//! - `Item`: an input item type with a requested quantity
//! - `UnitItem`: one working record per requested unit, owned by the engine
//! - `PackedItem` / `UnpackedItem`: the two halves of a result

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;

use crate::types::{BoundingBox, Dimensional, Vec3};

/// Invalid input handed to the engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Invalid dimension: {0}")]
    InvalidDimension(String),
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),
    #[error("Too many units: {requested} requested, at most {limit} allowed")]
    TooManyUnits { requested: usize, limit: usize },
}

/// Helper function to validate a single dimension.
fn validate_dimension(value: f64, name: &str) -> Result<(), ValidationError> {
    if value <= 0.0 || value.is_nan() || value.is_infinite() {
        return Err(ValidationError::InvalidDimension(format!(
            "{} must be positive, got: {}",
            name, value
        )));
    }
    Ok(())
}

/// The container to pack. Immutable for the duration of one run.
///
/// The three extents are named after the container, not after the axes the
/// engine happens to use internally; results are reported in
/// (length, height, width) order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Container {
    #[serde(default)]
    pub id: usize,
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

impl Container {
    /// Creates a new container with validation.
    ///
    /// # Examples
    /// ```
    /// use afit_packer::model::Container;
    ///
    /// assert!(Container::new(1, 587.0, 233.0, 220.0).is_ok());
    /// assert!(Container::new(1, 0.0, 233.0, 220.0).is_err());
    /// ```
    pub fn new(id: usize, length: f64, width: f64, height: f64) -> Result<Self, ValidationError> {
        let container = Self {
            id,
            length,
            width,
            height,
        };
        container.validate()?;
        Ok(container)
    }

    /// Re-checks a container that was built without `new`, e.g. by serde.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_dimension(self.length, "Container length")?;
        validate_dimension(self.width, "Container width")?;
        validate_dimension(self.height, "Container height")?;
        Ok(())
    }

    /// Extents in reporting order: (length, height, width).
    #[inline]
    pub fn reporting_dims(&self) -> Vec3 {
        Vec3::new(self.length, self.height, self.width)
    }

    /// Whether all three extents are equal.
    pub fn is_cube(&self) -> bool {
        self.dimensions().is_cube()
    }
}

impl Dimensional for Container {
    fn dimensions(&self) -> Vec3 {
        Vec3::new(self.length, self.width, self.height)
    }
}

/// An item type to pack, repeated `quantity` times.
///
/// The three dimension labels have no fixed axis; the engine rotates items
/// freely.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({ "id": 1, "dim1": 108.0, "dim2": 76.0, "dim3": 30.0, "quantity": 40 }))]
pub struct Item {
    pub id: usize,
    pub dim1: f64,
    pub dim2: f64,
    pub dim3: f64,
    pub quantity: usize,
}

impl Item {
    /// Creates a new item with validation.
    pub fn new(
        id: usize,
        dim1: f64,
        dim2: f64,
        dim3: f64,
        quantity: usize,
    ) -> Result<Self, ValidationError> {
        let item = Self {
            id,
            dim1,
            dim2,
            dim3,
            quantity,
        };
        item.validate()?;
        Ok(item)
    }

    /// Re-checks an item that was built without `new`, e.g. by serde.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_dimension(self.dim1, &format!("Item {} dim1", self.id))?;
        validate_dimension(self.dim2, &format!("Item {} dim2", self.id))?;
        validate_dimension(self.dim3, &format!("Item {} dim3", self.id))?;
        if self.quantity == 0 {
            return Err(ValidationError::InvalidQuantity(format!(
                "Item {} quantity must be positive, got: 0",
                self.id
            )));
        }
        Ok(())
    }
}

impl Dimensional for Item {
    fn dimensions(&self) -> Vec3 {
        Vec3::new(self.dim1, self.dim2, self.dim3)
    }
}

/// One unit of an item, as tracked by the engine during a run.
///
/// Units of the same item are stored contiguously and each carries the
/// item's `quantity`, so the box selector can jump from one item's run of
/// units to the next.
#[derive(Clone, Debug, PartialEq)]
pub struct UnitItem {
    pub id: usize,
    pub dim1: f64,
    pub dim2: f64,
    pub dim3: f64,
    pub quantity: usize,
    pub is_packed: bool,
    /// Placement origin in the engine's local axes. Only meaningful after replay.
    pub coord: Vec3,
    /// `dim1..dim3` permuted into the local axes at placement time.
    pub pack_dims: Vec3,
}

impl UnitItem {
    /// Expands every item into `quantity` unit records, preserving order.
    pub fn expand(items: &[Item]) -> Vec<Self> {
        items
            .iter()
            .flat_map(|item| {
                std::iter::repeat_n(
                    Self {
                        id: item.id,
                        dim1: item.dim1,
                        dim2: item.dim2,
                        dim3: item.dim3,
                        quantity: item.quantity,
                        is_packed: false,
                        coord: Vec3::zero(),
                        pack_dims: Vec3::zero(),
                    },
                    item.quantity,
                )
            })
            .collect()
    }

    /// The three dimensions as given, in input order.
    #[inline]
    pub fn dims(&self) -> [f64; 3] {
        [self.dim1, self.dim2, self.dim3]
    }

    /// Smallest absolute difference between `extent` and any of the dimensions.
    #[inline]
    pub fn closest_dimension_gap(&self, extent: f64) -> f64 {
        (extent - self.dim1)
            .abs()
            .min((extent - self.dim2).abs())
            .min((extent - self.dim3).abs())
    }
}

impl Dimensional for UnitItem {
    fn dimensions(&self) -> Vec3 {
        Vec3::new(self.dim1, self.dim2, self.dim3)
    }
}

/// A unit that was placed, in the container's (length, height, width) axes.
///
/// The box occupies `[pos, pos + dims)` on every axis.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct PackedItem {
    pub id: usize,
    #[schema(value_type = [f64; 3], example = json!([0.0, 0.0, 0.0]))]
    pub pos: (f64, f64, f64),
    #[schema(value_type = [f64; 3], example = json!([108.0, 30.0, 76.0]))]
    pub dims: (f64, f64, f64),
}

impl PackedItem {
    /// Calculates the bounding box of the placed unit.
    #[inline]
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_position_and_dims(Vec3::from_tuple(self.pos), Vec3::from_tuple(self.dims))
    }
}

impl Dimensional for PackedItem {
    fn dimensions(&self) -> Vec3 {
        Vec3::from_tuple(self.dims)
    }
}

/// A unit that found no placement, with its dimensions as given.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct UnpackedItem {
    pub id: usize,
    #[schema(value_type = [f64; 3], example = json!([108.0, 76.0, 30.0]))]
    pub dims: (f64, f64, f64),
}

impl From<&UnitItem> for UnpackedItem {
    fn from(unit: &UnitItem) -> Self {
        Self {
            id: unit.id,
            dims: (unit.dim1, unit.dim2, unit.dim3),
        }
    }
}
