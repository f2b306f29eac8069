/*
This code is part of the GRTS spatial sampling engine.
License: MIT
*/

pub mod address;
pub mod algorithms;
pub mod config;
pub mod driver;
pub mod error;
pub mod grid;
pub mod io_utils;
pub mod sampler;
pub mod shapefile;
pub mod structures;

pub use config::GrtsConfig;
pub use error::{GrtsError, GrtsWarning, Result, WarningSink};
pub use shapefile::attributes::{AttributeField, FieldData, ShapefileAttributes};
pub use shapefile::geometry::{ShapeType, ShapefileGeometry};
pub use shapefile::Shapefile;
pub use structures::{BoundingBox, Point2D};
