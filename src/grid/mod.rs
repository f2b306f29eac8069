/*
This code is part of the GRTS spatial sampling engine.
License: MIT
*/
mod refine;
mod weights;

pub use refine::{build_grid, GridResult};
pub use weights::{cell_weight, point_weight, polygon_weight, polyline_weight, RecordGeometry};
