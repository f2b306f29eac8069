/*
This code is part of the GRTS spatial sampling engine.
License: MIT
*/
mod bounding_box;
mod point2d;

pub use bounding_box::BoundingBox;
pub use point2d::Point2D;
