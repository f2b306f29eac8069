/*
This code is part of the GRTS spatial sampling engine.
License: MIT
*/
mod clip;

pub use clip::{
    clip_polygon_to_box, clip_segment_to_box, clipped_polygon_area, clipped_segment_length,
    point_in_polygon_parts, point_in_ring, signed_area,
};
