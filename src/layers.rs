//! Layer thickness candidates.
//!
//! A thickness is scored by how closely every other unit could match it with
//! one of its dimensions: the sum of the smallest absolute differences. A low
//! score means many units would tile cleanly into a layer of that thickness.

use std::cmp::Ordering;

use serde::Serialize;
use utoipa::ToSchema;

use crate::model::UnitItem;
use crate::types::Vec3;

/// A possible starting layer thickness and its score (lower is better).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, ToSchema)]
pub struct LayerCandidate {
    pub thickness: f64,
    pub evaluation: f64,
}

/// The three ways to stand a unit: (vertical extent, cross-section a, cross-section b).
#[inline]
fn standings(unit: &UnitItem) -> [(f64, f64, f64); 3] {
    [
        (unit.dim1, unit.dim2, unit.dim3),
        (unit.dim2, unit.dim1, unit.dim3),
        (unit.dim3, unit.dim1, unit.dim2),
    ]
}

/// Whether a cross-section fits the layer footprint in either rotation.
#[inline]
fn cross_section_fits(a: f64, b: f64, px: f64, pz: f64) -> bool {
    (a <= px && b <= pz) || (b <= px && a <= pz)
}

/// Sum of closest-dimension gaps over the units selected by `include`, skipping `skip`.
fn evaluate<F>(units: &[UnitItem], skip: usize, thickness: f64, include: F) -> f64
where
    F: Fn(&UnitItem) -> bool,
{
    units
        .iter()
        .enumerate()
        .filter(|&(idx, unit)| idx != skip && include(unit))
        .map(|(_, unit)| unit.closest_dimension_gap(thickness))
        .sum()
}

/// Lists all distinct usable layer thicknesses for the working extents `dims`,
/// sorted by ascending evaluation.
///
/// The first occurrence of a thickness wins; the sort is stable, so equal
/// scores keep discovery order.
pub fn candidate_layers(units: &[UnitItem], dims: Vec3) -> Vec<LayerCandidate> {
    let mut layers: Vec<LayerCandidate> = Vec::new();

    for (idx, unit) in units.iter().enumerate() {
        for (extent, a, b) in standings(unit) {
            if extent > dims.y || !cross_section_fits(a, b, dims.x, dims.z) {
                continue;
            }
            if layers.iter().any(|layer| layer.thickness == extent) {
                continue;
            }

            layers.push(LayerCandidate {
                thickness: extent,
                evaluation: evaluate(units, idx, extent, |_| true),
            });
        }
    }

    layers.sort_by(|a, b| {
        a.evaluation
            .partial_cmp(&b.evaluation)
            .unwrap_or(Ordering::Equal)
    });
    layers
}

/// Picks the next layer thickness from the units still unpacked.
///
/// Only thicknesses up to `remaining` whose cross-section fits `px` × `pz`
/// are considered. Returns `None` when no further layer can be started.
pub fn next_layer_thickness(units: &[UnitItem], px: f64, pz: f64, remaining: f64) -> Option<f64> {
    let mut best: Option<(f64, f64)> = None;

    for (idx, unit) in units.iter().enumerate() {
        if unit.is_packed {
            continue;
        }
        for (extent, a, b) in standings(unit) {
            if extent > remaining || !cross_section_fits(a, b, px, pz) {
                continue;
            }
            let evaluation = evaluate(units, idx, extent, |other| !other.is_packed);
            if best.is_none_or(|(_, score)| evaluation < score) {
                best = Some((extent, evaluation));
            }
        }
    }

    best.map(|(thickness, _)| thickness)
        .filter(|&thickness| thickness > 0.0 && thickness <= remaining)
}
