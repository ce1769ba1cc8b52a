//! Layer-building heuristic for packing one container.
//!
//! The search tries every orientation of the container and, within each,
//! every candidate starting layer thickness. An attempt fills the container
//! bottom-up in layers; each layer is filled gap by gap along a skyline,
//! always working on the shallowest gap first. Only the packed volume of an
//! attempt is kept during the search. The winning (orientation, starting
//! layer) pair is then replayed once more to record coordinates.
//!
//! Everything here is synchronous and deterministic: the same container and
//! item list (in the same order) always produce the same result.

use std::cmp::Ordering;
use std::time::Instant;

use serde::Serialize;
use utoipa::ToSchema;

use crate::geometry::{self, PlacementConflict};
use crate::layers::{LayerCandidate, candidate_layers, next_layer_thickness};
use crate::model::{Container, Item, PackedItem, UnitItem, UnpackedItem, ValidationError};
use crate::orientation::Orientation;
use crate::skyline::{Neighbours, Skyline};
use crate::types::{Dimensional, Vec3};

/// Configuration for the packing search.
///
/// Both shortcuts only skip work that cannot produce a strictly better
/// result, so toggling them never changes the output.
#[derive(Copy, Clone, Debug)]
pub struct PackingConfig {
    /// Stop the whole search once an attempt packs everything or fills the container
    pub stop_when_fully_packed: bool,
    /// Only search the first orientation when the container is a cube
    pub collapse_cube_orientations: bool,
    /// Upper bound on the number of expanded units accepted for one run
    pub max_units: usize,
}

impl PackingConfig {
    pub const DEFAULT_STOP_WHEN_FULLY_PACKED: bool = true;
    pub const DEFAULT_COLLAPSE_CUBE_ORIENTATIONS: bool = true;
    pub const DEFAULT_MAX_UNITS: usize = 10_000;

    /// Creates a builder for custom configuration.
    pub fn builder() -> PackingConfigBuilder {
        PackingConfigBuilder::default()
    }
}

impl Default for PackingConfig {
    fn default() -> Self {
        Self {
            stop_when_fully_packed: Self::DEFAULT_STOP_WHEN_FULLY_PACKED,
            collapse_cube_orientations: Self::DEFAULT_COLLAPSE_CUBE_ORIENTATIONS,
            max_units: Self::DEFAULT_MAX_UNITS,
        }
    }
}

/// Builder for `PackingConfig`.
#[derive(Clone, Debug, Default)]
pub struct PackingConfigBuilder {
    config: PackingConfig,
}

impl PackingConfigBuilder {
    pub fn stop_when_fully_packed(mut self, enabled: bool) -> Self {
        self.config.stop_when_fully_packed = enabled;
        self
    }

    pub fn collapse_cube_orientations(mut self, enabled: bool) -> Self {
        self.config.collapse_cube_orientations = enabled;
        self
    }

    pub fn max_units(mut self, limit: usize) -> Self {
        self.config.max_units = limit;
        self
    }

    pub fn build(self) -> PackingConfig {
        self.config
    }
}

/// Aggregate figures for one run.
///
/// Contains no timing information so that identical input serializes to
/// identical output.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct PackingSummary {
    pub total_units: usize,
    pub packed_units: usize,
    pub container_volume: f64,
    pub item_volume: f64,
    pub packed_volume: f64,
    pub container_utilization_percent: f64,
    pub item_volume_packed_percent: f64,
    /// 1-based number of the winning orientation
    pub best_variant: Option<u8>,
    pub best_orientation: Option<Orientation>,
    /// Position of the winning starting layer in the sorted candidate list
    pub best_layer_index: Option<usize>,
    pub best_layer: Option<LayerCandidate>,
    pub is_complete: bool,
}

/// Result of one packing run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PackingResult {
    /// Placed units in placement order
    pub packed: Vec<PackedItem>,
    /// Units without a placement, in input order
    pub unpacked: Vec<UnpackedItem>,
    pub summary: PackingSummary,
}

impl PackingResult {
    /// Whether every unit was packed.
    pub fn is_complete(&self) -> bool {
        self.unpacked.is_empty()
    }

    pub fn packed_count(&self) -> usize {
        self.packed.len()
    }

    pub fn unpacked_count(&self) -> usize {
        self.unpacked.len()
    }

    /// Checks that every placement lies inside the container and that no two
    /// placements overlap.
    pub fn verify(&self, container: &Container) -> Result<(), PlacementConflict> {
        geometry::verify_placements(&self.packed, container)
    }
}

/// Events emitted while packing, for live visualization.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type")]
pub enum PackEvent {
    /// The search begins.
    SearchStarted { units: usize, container: Container },
    /// An attempt packed strictly more volume than any before it.
    BestImproved {
        variant: u8,
        layer_index: usize,
        layer_thickness: f64,
        packed_volume: f64,
    },
    /// A unit was placed during the final replay.
    ItemPlaced {
        id: usize,
        pos: (f64, f64, f64),
        dims: (f64, f64, f64),
    },
    /// A unit found no placement.
    ItemUnpacked { id: usize, dims: (f64, f64, f64) },
    /// Packing finished.
    Finished { packed: usize, unpacked: usize },
}

/// Packs items into the container with the default configuration.
///
/// # Examples
/// ```
/// use afit_packer::model::{Container, Item};
/// use afit_packer::optimizer::pack_items;
///
/// let container = Container::new(1, 10.0, 10.0, 10.0).unwrap();
/// let items = vec![Item::new(1, 5.0, 5.0, 5.0, 8).unwrap()];
/// let result = pack_items(&container, &items).unwrap();
/// assert!(result.is_complete());
/// ```
pub fn pack_items(container: &Container, items: &[Item]) -> Result<PackingResult, ValidationError> {
    pack_items_with_config(container, items, PackingConfig::default())
}

/// Packs items with a custom configuration.
pub fn pack_items_with_config(
    container: &Container,
    items: &[Item],
    config: PackingConfig,
) -> Result<PackingResult, ValidationError> {
    pack_items_with_progress(container, items, config, |_| {})
}

/// Packs items and reports every significant step to `on_event`.
pub fn pack_items_with_progress(
    container: &Container,
    items: &[Item],
    config: PackingConfig,
    mut on_event: impl FnMut(&PackEvent),
) -> Result<PackingResult, ValidationError> {
    let started = Instant::now();
    validate_input(container, items, &config)?;

    let units = UnitItem::expand(items);
    let total_units = units.len();
    on_event(&PackEvent::SearchStarted {
        units: total_units,
        container: container.clone(),
    });

    let mut context = SearchContext::new(units, container, config);
    let best = context.search(container, &mut on_event);
    let packed = match &best {
        Some(best) => context.replay(container, best),
        None => Vec::new(),
    };
    let unpacked: Vec<UnpackedItem> = context
        .units
        .iter()
        .filter(|unit| !unit.is_packed)
        .map(UnpackedItem::from)
        .collect();

    for item in &packed {
        on_event(&PackEvent::ItemPlaced {
            id: item.id,
            pos: item.pos,
            dims: item.dims,
        });
    }
    for item in &unpacked {
        on_event(&PackEvent::ItemUnpacked {
            id: item.id,
            dims: item.dims,
        });
    }
    on_event(&PackEvent::Finished {
        packed: packed.len(),
        unpacked: unpacked.len(),
    });

    let packed_volume: f64 = packed.iter().map(|item| item.volume()).sum();
    let summary = PackingSummary {
        total_units,
        packed_units: packed.len(),
        container_volume: context.container_volume,
        item_volume: context.item_volume,
        packed_volume,
        container_utilization_percent: percent(packed_volume, context.container_volume),
        item_volume_packed_percent: percent(packed_volume, context.item_volume),
        best_variant: best.as_ref().map(|b| b.orientation.number()),
        best_orientation: best.as_ref().map(|b| b.orientation),
        best_layer_index: best.as_ref().map(|b| b.layer_index),
        best_layer: best.as_ref().map(|b| b.layer),
        is_complete: unpacked.is_empty(),
    };

    tracing::info!(
        units = total_units,
        packed = summary.packed_units,
        unpacked = unpacked.len(),
        utilization = summary.container_utilization_percent,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "packing finished"
    );

    Ok(PackingResult {
        packed,
        unpacked,
        summary,
    })
}

fn validate_input(
    container: &Container,
    items: &[Item],
    config: &PackingConfig,
) -> Result<(), ValidationError> {
    container.validate()?;
    let mut requested: usize = 0;
    for item in items {
        item.validate()?;
        requested = requested.saturating_add(item.quantity);
    }
    if requested > config.max_units {
        return Err(ValidationError::TooManyUnits {
            requested,
            limit: config.max_units,
        });
    }
    Ok(())
}

fn percent(part: f64, whole: f64) -> f64 {
    if whole <= 0.0 {
        return 0.0;
    }
    part / whole * 100.0
}

/// The six ways to lay a unit's dimensions onto (x, y, z), in trial order.
const PERMUTATIONS: [[usize; 3]; 6] = [
    [0, 1, 2],
    [0, 2, 1],
    [1, 0, 2],
    [1, 2, 0],
    [2, 0, 1],
    [2, 1, 0],
];

/// The empty space a box is being chosen for.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Footprint {
    /// Width of the gap along x
    max_x: f64,
    /// Current layer thickness
    target_y: f64,
    /// Height still available above the layer base
    max_y: f64,
    /// Depth up to the neighbouring gap
    target_z: f64,
    /// Depth still available in the container
    max_z: f64,
}

/// A unit in one orientation, ranked against a footprint.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Fit {
    index: usize,
    dims: Vec3,
    /// (height gap, width gap, depth gap); compared lexicographically
    rank: (f64, f64, f64),
}

impl Fit {
    fn beats(&self, other: &Fit) -> bool {
        self.rank.partial_cmp(&other.rank) == Some(Ordering::Less)
    }
}

/// Best candidates from one scan over the unpacked units.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Selection {
    /// Fits under the layer thickness
    exact: Option<Fit>,
    /// Sticks out above the layer thickness
    overhang: Option<Fit>,
}

fn keep_better(slot: &mut Option<Fit>, fit: Fit) {
    if slot.is_none_or(|best| fit.beats(&best)) {
        *slot = Some(fit);
    }
}

/// Ranks every orientation of one unit against the footprint.
fn analyze_unit(selection: &mut Selection, index: usize, unit: &UnitItem, footprint: &Footprint) {
    let dims = unit.dims();
    let orientations = if dims[0] == dims[1] && dims[1] == dims[2] {
        1
    } else {
        PERMUTATIONS.len()
    };

    for perm in &PERMUTATIONS[..orientations] {
        let oriented = Vec3::new(dims[perm[0]], dims[perm[1]], dims[perm[2]]);
        if oriented.x > footprint.max_x || oriented.y > footprint.max_y || oriented.z > footprint.max_z
        {
            continue;
        }

        let width_gap = footprint.max_x - oriented.x;
        let depth_gap = (footprint.target_z - oriented.z).abs();
        if oriented.y <= footprint.target_y {
            let fit = Fit {
                index,
                dims: oriented,
                rank: (footprint.target_y - oriented.y, width_gap, depth_gap),
            };
            keep_better(&mut selection.exact, fit);
        } else {
            let fit = Fit {
                index,
                dims: oriented,
                rank: (oriented.y - footprint.target_y, width_gap, depth_gap),
            };
            keep_better(&mut selection.overhang, fit);
        }
    }
}

/// Finds the best fitting unpacked unit for the footprint.
///
/// Units of one item are identical, so only the first unpacked unit of each
/// item's run is looked at.
fn select_box(units: &[UnitItem], footprint: &Footprint) -> Selection {
    let mut selection = Selection::default();
    let mut start = 0;

    while start < units.len() {
        let end = (start + units[start].quantity.max(1)).min(units.len());
        if let Some(index) = (start..end).find(|&idx| !units[idx].is_packed) {
            analyze_unit(&mut selection, index, &units[index], footprint);
        }
        start = end;
    }

    selection
}

/// What to do after a box selection.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Found {
    Place(Fit),
    /// The skyline was evened out; select again.
    Evened,
    /// Nothing fits anywhere in this layer.
    LayerDone,
}

/// Best attempt of the search.
#[derive(Clone, Copy, Debug, PartialEq)]
struct BestAttempt {
    orientation: Orientation,
    layer_index: usize,
    layer: LayerCandidate,
    packed_volume: f64,
}

/// Mutable state of one packing run.
///
/// Local axes: x across the layer, y up through the layers, z into the depth.
struct SearchContext {
    units: Vec<UnitItem>,
    config: PackingConfig,
    /// Working extents (px, py, pz) for the current orientation
    dims: Vec3,
    container_volume: f64,
    item_volume: f64,
    packed_volume: f64,
    /// Base of the layer being filled
    packed_y: f64,
    /// Height available from `packed_y` upwards
    remain_y: f64,
    /// Depth available for the layer being filled
    remain_z: f64,
    layer_thickness: f64,
    /// Extra height gained by overhanging boxes; non-zero while a layer-in-layer is open
    layer_in_layer: f64,
    /// Layer thickness before the first overhanging box
    outer_thickness: f64,
    /// Depth at which the first overhanging box was placed
    layer_in_layer_z: f64,
    fully_packed: bool,
    recording: bool,
    placed_order: Vec<usize>,
}

impl SearchContext {
    fn new(units: Vec<UnitItem>, container: &Container, config: PackingConfig) -> Self {
        let item_volume = units.iter().map(|unit| unit.volume()).sum();
        Self {
            units,
            config,
            dims: Vec3::zero(),
            container_volume: container.reporting_dims().volume(),
            item_volume,
            packed_volume: 0.0,
            packed_y: 0.0,
            remain_y: 0.0,
            remain_z: 0.0,
            layer_thickness: 0.0,
            layer_in_layer: 0.0,
            outer_thickness: 0.0,
            layer_in_layer_z: 0.0,
            fully_packed: false,
            recording: false,
            placed_order: Vec::new(),
        }
    }

    fn should_stop(&self) -> bool {
        self.fully_packed && self.config.stop_when_fully_packed
    }

    /// Tries every orientation and starting layer and returns the best attempt.
    fn search(
        &mut self,
        container: &Container,
        on_event: &mut impl FnMut(&PackEvent),
    ) -> Option<BestAttempt> {
        let mut best: Option<BestAttempt> = None;

        for orientation in Orientation::ALL {
            self.dims = orientation.working_dims(container);
            let layers = candidate_layers(&self.units, self.dims);

            for (layer_index, layer) in layers.iter().enumerate() {
                let packed_volume = self.run_attempt(layer.thickness);
                if packed_volume > best.map_or(0.0, |b| b.packed_volume) {
                    tracing::debug!(
                        variant = orientation.number(),
                        layer_index,
                        thickness = layer.thickness,
                        packed_volume,
                        "better attempt found"
                    );
                    on_event(&PackEvent::BestImproved {
                        variant: orientation.number(),
                        layer_index,
                        layer_thickness: layer.thickness,
                        packed_volume,
                    });
                    best = Some(BestAttempt {
                        orientation,
                        layer_index,
                        layer: *layer,
                        packed_volume,
                    });
                }
                if self.should_stop() {
                    break;
                }
            }

            if self.should_stop() {
                break;
            }
            if container.is_cube() && self.config.collapse_cube_orientations {
                break;
            }
        }

        best
    }

    /// Re-runs the winning attempt and returns its placements in container axes.
    fn replay(&mut self, container: &Container, best: &BestAttempt) -> Vec<PackedItem> {
        self.dims = best.orientation.working_dims(container);
        let layers = candidate_layers(&self.units, self.dims);
        let thickness = layers
            .get(best.layer_index)
            .map_or(best.layer.thickness, |layer| layer.thickness);

        self.recording = true;
        self.run_attempt(thickness);
        self.recording = false;

        self.placed_order
            .iter()
            .map(|&index| {
                let unit = &self.units[index];
                PackedItem {
                    id: unit.id,
                    pos: best.orientation.to_container_axes(unit.coord).into(),
                    dims: best.orientation.to_container_axes(unit.pack_dims).into(),
                }
            })
            .collect()
    }

    /// Fills the container layer by layer, starting with `thickness`.
    /// Returns the packed volume.
    fn run_attempt(&mut self, thickness: f64) -> f64 {
        self.packed_volume = 0.0;
        self.packed_y = 0.0;
        self.remain_y = self.dims.y;
        self.remain_z = self.dims.z;
        self.layer_thickness = thickness;
        self.fully_packed = false;
        self.placed_order.clear();
        for unit in &mut self.units {
            unit.is_packed = false;
        }

        loop {
            self.layer_in_layer = 0.0;
            self.pack_layer();

            self.packed_y += self.layer_thickness;
            self.remain_y = self.dims.y - self.packed_y;

            if self.layer_in_layer != 0.0 && !self.should_stop() {
                self.pack_layer_in_layer();
            }
            if self.should_stop() {
                break;
            }

            match next_layer_thickness(&self.units, self.dims.x, self.dims.z, self.remain_y) {
                Some(next) => self.layer_thickness = next,
                None => break,
            }
        }

        self.packed_volume
    }

    /// Fills the band left above the first part of a layer whose thickness
    /// was raised by overhanging boxes.
    fn pack_layer_in_layer(&mut self) {
        let packed_y = self.packed_y;
        let remain_y = self.remain_y;

        self.remain_y = self.layer_thickness - self.outer_thickness;
        self.packed_y = self.packed_y - self.layer_thickness + self.outer_thickness;
        self.remain_z = self.layer_in_layer_z;
        self.layer_thickness = self.layer_in_layer;

        self.pack_layer();

        self.packed_y = packed_y;
        self.remain_y = remain_y;
        self.remain_z = self.dims.z;
    }

    /// Fills one layer at the current thickness.
    fn pack_layer(&mut self) {
        let mut skyline = Skyline::new(self.dims.x);

        while !self.should_stop() {
            let index = skyline.lowest();
            let gap = skyline.gap(index);
            let target_z = match skyline.neighbours(index) {
                Neighbours::None => self.remain_z - gap.cum_z,
                Neighbours::Right(right) => right.cum_z - gap.cum_z,
                Neighbours::Left(left) | Neighbours::Both { left, .. } => left.cum_z - gap.cum_z,
            };
            let footprint = Footprint {
                max_x: skyline.width_at(index),
                target_y: self.layer_thickness,
                max_y: self.remain_y,
                target_z,
                max_z: self.remain_z - gap.cum_z,
            };

            let selection = select_box(&self.units, &footprint);
            match self.check_found(&mut skyline, index, selection) {
                Found::LayerDone => break,
                Found::Evened => continue,
                Found::Place(fit) => {
                    let x = skyline.fill(index, fit.dims.x, fit.dims.z, self.dims.x);
                    self.commit(fit, Vec3::new(x, self.packed_y, gap.cum_z));
                }
            }
        }
    }

    /// Decides between placing a box, evening out the skyline, or closing the layer.
    ///
    /// A box that fits under the layer thickness always wins. An overhanging
    /// box is only accepted while a layer-in-layer is open or the skyline is
    /// flat; accepting it raises the layer thickness to the box height.
    fn check_found(&mut self, skyline: &mut Skyline, index: usize, selection: Selection) -> Found {
        if let Some(fit) = selection.exact {
            return Found::Place(fit);
        }

        if let Some(fit) = selection.overhang
            && (self.layer_in_layer != 0.0 || skyline.is_flat())
        {
            if self.layer_in_layer == 0.0 {
                self.outer_thickness = self.layer_thickness;
                self.layer_in_layer_z = skyline.gap(index).cum_z;
            }
            self.layer_in_layer += fit.dims.y - self.layer_thickness;
            self.layer_thickness = fit.dims.y;
            return Found::Place(fit);
        }

        if skyline.is_flat() {
            return Found::LayerDone;
        }

        skyline.even_out(index);
        Found::Evened
    }

    /// Marks a unit as placed at `coord` (local axes).
    fn commit(&mut self, fit: Fit, coord: Vec3) {
        let unit = &mut self.units[fit.index];
        unit.is_packed = true;
        unit.coord = coord;
        unit.pack_dims = fit.dims;
        self.packed_volume += unit.volume();

        if self.recording {
            self.placed_order.push(fit.index);
        }
        if self.packed_volume == self.container_volume || self.packed_volume == self.item_volume {
            self.fully_packed = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type ItemSpec = (f64, f64, f64, usize);

    /// Published reference set: (total units, packed units, item types) for a
    /// 587 x 233 x 220 container.
    const REFERENCE_CASES: [(usize, usize, [ItemSpec; 3]); 8] = [
        (
            112,
            104,
            [(108.0, 76.0, 30.0, 40), (110.0, 43.0, 25.0, 33), (92.0, 81.0, 55.0, 39)],
        ),
        (
            138,
            131,
            [(49.0, 25.0, 21.0, 41), (60.0, 51.0, 41.0, 53), (103.0, 76.0, 64.0, 44)],
        ),
        (
            127,
            117,
            [(97.0, 81.0, 27.0, 41), (102.0, 78.0, 39.0, 42), (113.0, 46.0, 36.0, 44)],
        ),
        (
            197,
            186,
            [(113.0, 92.0, 33.0, 67), (52.0, 37.0, 28.0, 60), (57.0, 33.0, 29.0, 70)],
        ),
        (
            136,
            127,
            [(88.0, 54.0, 39.0, 51), (94.0, 54.0, 36.0, 38), (87.0, 77.0, 43.0, 47)],
        ),
        (
            147,
            116,
            [(86.0, 84.0, 45.0, 56), (81.0, 45.0, 34.0, 56), (70.0, 54.0, 37.0, 35)],
        ),
        (
            126,
            84,
            [(118.0, 79.0, 51.0, 37), (86.0, 32.0, 31.0, 44), (64.0, 58.0, 52.0, 45)],
        ),
        (
            180,
            170,
            [(75.0, 58.0, 57.0, 58), (57.0, 37.0, 30.0, 66), (79.0, 74.0, 35.0, 56)],
        ),
    ];

    fn reference_container() -> Container {
        Container::new(0, 587.0, 233.0, 220.0).unwrap()
    }

    fn items(specs: &[ItemSpec]) -> Vec<Item> {
        specs
            .iter()
            .enumerate()
            .map(|(idx, &(a, b, c, q))| Item::new(idx + 1, a, b, c, q).unwrap())
            .collect()
    }

    fn cube_container() -> Container {
        Container::new(0, 10.0, 10.0, 10.0).unwrap()
    }

    #[test]
    fn reference_cases_match_published_counts() {
        let container = reference_container();
        for (case, (total, expected_packed, specs)) in REFERENCE_CASES.iter().enumerate() {
            let result = pack_items(&container, &items(specs)).unwrap();
            assert_eq!(
                result.packed_count() + result.unpacked_count(),
                *total,
                "case {}: incorrect total number of items",
                case + 1
            );
            assert_eq!(
                result.packed_count(),
                *expected_packed,
                "case {}: incorrect number of packed items",
                case + 1
            );
        }
    }

    #[test]
    fn reference_cases_produce_valid_geometry() {
        let container = reference_container();
        for (case, (_, _, specs)) in REFERENCE_CASES.iter().enumerate() {
            let item_list = items(specs);
            let result = pack_items(&container, &item_list).unwrap();
            assert_eq!(
                result.verify(&container),
                Ok(()),
                "case {}: placements conflict",
                case + 1
            );

            let requested: f64 = item_list
                .iter()
                .map(|item| item.volume() * item.quantity as f64)
                .sum();
            assert!(result.summary.packed_volume <= container.volume().min(requested));
        }
    }

    #[test]
    fn identical_input_serializes_identically() {
        let container = reference_container();
        let item_list = items(&REFERENCE_CASES[0].2);
        let first = serde_json::to_string(&pack_items(&container, &item_list).unwrap()).unwrap();
        let second = serde_json::to_string(&pack_items(&container, &item_list).unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn cubes_fill_a_cube_container_layer_by_layer() {
        let result = pack_items(&cube_container(), &items(&[(5.0, 5.0, 5.0, 8)])).unwrap();
        assert!(result.is_complete());

        let positions: Vec<(f64, f64, f64)> = result.packed.iter().map(|p| p.pos).collect();
        assert_eq!(
            positions,
            vec![
                (0.0, 0.0, 0.0),
                (5.0, 0.0, 0.0),
                (0.0, 0.0, 5.0),
                (5.0, 0.0, 5.0),
                (0.0, 5.0, 0.0),
                (5.0, 5.0, 0.0),
                (0.0, 5.0, 5.0),
                (5.0, 5.0, 5.0),
            ]
        );
        assert_eq!(result.summary.best_variant, Some(1));
        assert_eq!(result.summary.container_utilization_percent, 100.0);
        assert_eq!(result.verify(&cube_container()), Ok(()));
    }

    #[test]
    fn slab_is_laid_flat_before_the_cubes() {
        let result = pack_items(
            &cube_container(),
            &items(&[(10.0, 10.0, 5.0, 1), (5.0, 5.0, 5.0, 4)]),
        )
        .unwrap();

        assert!(result.is_complete());
        assert_eq!(result.packed[0].id, 1);
        assert_eq!(result.packed[0].pos, (0.0, 0.0, 0.0));
        assert_eq!(result.packed[0].dims, (10.0, 5.0, 10.0));
    }

    #[test]
    fn item_order_does_not_change_packed_count() {
        let forward = items(&[(10.0, 10.0, 5.0, 1), (5.0, 5.0, 5.0, 4)]);
        let mut backward = forward.clone();
        backward.reverse();

        let a = pack_items(&cube_container(), &forward).unwrap();
        let b = pack_items(&cube_container(), &backward).unwrap();
        assert_eq!(a.packed_count(), b.packed_count());
        assert_eq!(a.packed_count(), 5);
    }

    #[test]
    fn oversized_item_is_reported_unpacked() {
        let result = pack_items(
            &cube_container(),
            &items(&[(11.0, 1.0, 1.0, 1), (2.0, 2.0, 2.0, 2)]),
        )
        .unwrap();

        assert_eq!(result.packed_count(), 2);
        assert_eq!(result.unpacked.len(), 1);
        assert_eq!(result.unpacked[0].id, 1);
        assert_eq!(result.unpacked[0].dims, (11.0, 1.0, 1.0));
        assert!(!result.summary.is_complete);
    }

    #[test]
    fn nothing_fits_means_no_winning_attempt() {
        let result = pack_items(&cube_container(), &items(&[(11.0, 11.0, 11.0, 3)])).unwrap();
        assert!(result.packed.is_empty());
        assert_eq!(result.unpacked.len(), 3);
        assert_eq!(result.summary.best_variant, None);
        assert_eq!(result.summary.best_layer, None);
    }

    #[test]
    fn empty_item_list_packs_nothing() {
        let result = pack_items(&cube_container(), &[]).unwrap();
        assert!(result.packed.is_empty());
        assert!(result.unpacked.is_empty());
        assert_eq!(result.summary.total_units, 0);
        assert!(result.is_complete());
    }

    #[test]
    fn invalid_input_is_rejected() {
        let bad_container = Container {
            id: 0,
            length: 0.0,
            width: 1.0,
            height: 1.0,
        };
        assert!(matches!(
            pack_items(&bad_container, &[]),
            Err(ValidationError::InvalidDimension(_))
        ));

        let zero_quantity = Item {
            id: 7,
            dim1: 1.0,
            dim2: 1.0,
            dim3: 1.0,
            quantity: 0,
        };
        assert!(matches!(
            pack_items(&cube_container(), &[zero_quantity]),
            Err(ValidationError::InvalidQuantity(_))
        ));

        let config = PackingConfig::builder().max_units(3).build();
        assert_eq!(
            pack_items_with_config(&cube_container(), &items(&[(1.0, 1.0, 1.0, 4)]), config),
            Err(ValidationError::TooManyUnits {
                requested: 4,
                limit: 3
            })
        );
    }

    #[test]
    fn shortcuts_do_not_change_the_result() {
        let slow = PackingConfig::builder()
            .stop_when_fully_packed(false)
            .collapse_cube_orientations(false)
            .build();
        let item_list = items(&[(10.0, 10.0, 5.0, 1), (5.0, 5.0, 5.0, 4)]);

        let fast = pack_items(&cube_container(), &item_list).unwrap();
        let full = pack_items_with_config(&cube_container(), &item_list, slow).unwrap();
        assert_eq!(fast, full);
    }

    #[test]
    fn progress_events_follow_the_run() {
        let mut events = Vec::new();
        let result = pack_items_with_progress(
            &cube_container(),
            &items(&[(5.0, 5.0, 5.0, 8), (20.0, 1.0, 1.0, 1)]),
            PackingConfig::default(),
            |event| events.push(event.clone()),
        )
        .unwrap();

        assert!(matches!(events.first(), Some(PackEvent::SearchStarted { units: 9, .. })));
        assert!(events.iter().any(|e| matches!(e, PackEvent::BestImproved { .. })));
        let placed = events
            .iter()
            .filter(|e| matches!(e, PackEvent::ItemPlaced { .. }))
            .count();
        assert_eq!(placed, result.packed_count());
        assert!(events
            .iter()
            .any(|e| matches!(e, PackEvent::ItemUnpacked { id: 2, .. })));
        assert!(matches!(
            events.last(),
            Some(PackEvent::Finished {
                packed: 8,
                unpacked: 1
            })
        ));
    }

    fn footprint() -> Footprint {
        Footprint {
            max_x: 10.0,
            target_y: 3.0,
            max_y: 10.0,
            target_z: 5.0,
            max_z: 10.0,
        }
    }

    #[test]
    fn select_box_ranks_by_height_then_width_then_depth() {
        let units = UnitItem::expand(&items(&[(4.0, 2.0, 3.0, 1)]));
        let selection = select_box(&units, &footprint());

        let exact = selection.exact.unwrap();
        assert_eq!(exact.dims, Vec3::new(4.0, 3.0, 2.0));
        assert_eq!(exact.rank, (0.0, 6.0, 3.0));

        let overhang = selection.overhang.unwrap();
        assert_eq!(overhang.dims, Vec3::new(3.0, 4.0, 2.0));
        assert_eq!(overhang.rank, (1.0, 7.0, 3.0));
    }

    #[test]
    fn select_box_skips_packed_units_of_an_item() {
        let mut units = UnitItem::expand(&items(&[(1.0, 1.0, 1.0, 3), (2.0, 2.0, 2.0, 1)]));
        units[0].is_packed = true;
        units[1].is_packed = true;
        units[3].is_packed = true;

        let selection = select_box(&units, &footprint());
        assert_eq!(selection.exact.map(|fit| fit.index), Some(2));
        assert_eq!(selection.overhang, None);
    }

    #[test]
    fn select_box_respects_the_footprint_limits() {
        let units = UnitItem::expand(&items(&[(11.0, 2.0, 2.0, 1)]));
        assert_eq!(select_box(&units, &footprint()), Selection::default());

        let tall = Footprint {
            max_y: 12.0,
            ..footprint()
        };
        let selection = select_box(&units, &tall);
        // 11 only fits standing up, which overhangs the layer
        assert_eq!(selection.exact, None);
        assert_eq!(selection.overhang.map(|fit| fit.dims.y), Some(11.0));
    }

    fn context(units: Vec<UnitItem>) -> SearchContext {
        let mut context = SearchContext::new(units, &cube_container(), PackingConfig::default());
        context.dims = Vec3::new(10.0, 10.0, 10.0);
        context.layer_thickness = 3.0;
        context.remain_y = 10.0;
        context.remain_z = 10.0;
        context
    }

    fn fit(dims: Vec3) -> Fit {
        Fit {
            index: 0,
            dims,
            rank: (0.0, 0.0, 0.0),
        }
    }

    #[test]
    fn check_found_opens_layer_in_layer_on_flat_skyline() {
        let mut context = context(Vec::new());
        let mut skyline = Skyline::new(10.0);
        skyline.fill(0, 10.0, 2.0, 10.0);

        let overhang = fit(Vec3::new(4.0, 5.0, 2.0));
        let found = context.check_found(
            &mut skyline,
            0,
            Selection {
                exact: None,
                overhang: Some(overhang),
            },
        );

        assert_eq!(found, Found::Place(overhang));
        assert_eq!(context.outer_thickness, 3.0);
        assert_eq!(context.layer_in_layer_z, 2.0);
        assert_eq!(context.layer_in_layer, 2.0);
        assert_eq!(context.layer_thickness, 5.0);
    }

    #[test]
    fn check_found_prefers_exact_fit_over_overhang() {
        let mut context = context(Vec::new());
        let mut skyline = Skyline::new(10.0);
        let exact = fit(Vec3::new(1.0, 1.0, 1.0));

        let found = context.check_found(
            &mut skyline,
            0,
            Selection {
                exact: Some(exact),
                overhang: Some(fit(Vec3::new(1.0, 9.0, 1.0))),
            },
        );
        assert_eq!(found, Found::Place(exact));
        assert_eq!(context.layer_in_layer, 0.0);
        assert_eq!(context.layer_thickness, 3.0);
    }

    #[test]
    fn check_found_evens_uneven_skyline_instead_of_overhanging() {
        let mut context = context(Vec::new());
        let mut skyline = Skyline::new(10.0);
        skyline.fill(0, 4.0, 2.0, 10.0);

        let found = context.check_found(
            &mut skyline,
            1,
            Selection {
                exact: None,
                overhang: Some(fit(Vec3::new(1.0, 9.0, 1.0))),
            },
        );
        assert_eq!(found, Found::Evened);
        assert!(skyline.is_flat());
        assert_eq!(skyline.gap(0).cum_z, 2.0);

        let done = context.check_found(&mut skyline, 0, Selection::default());
        assert_eq!(done, Found::LayerDone);
    }
}
