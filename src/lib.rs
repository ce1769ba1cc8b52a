//! Single-container 3D packing with the layer-building heuristic.
//!
//! [`optimizer::pack_items`] is the entry point. The [`api`] module wraps it
//! in an HTTP service.

pub mod api;
pub mod config;
pub mod geometry;
pub mod layers;
pub mod model;
pub mod optimizer;
pub mod orientation;
pub mod skyline;
pub mod types;
