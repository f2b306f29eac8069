/*
This code is part of the GRTS spatial sampling engine.
License: MIT
*/
use crate::algorithms::{clipped_polygon_area, clipped_segment_length};
use crate::structures::{BoundingBox, Point2D};

/// A geometry-agnostic view of one record's shape, as the weight kernels
/// need it: either a set of polygon rings (with ring direction), a set of
/// polyline parts, or a single point.
pub enum RecordGeometry<'a> {
    Polygon { rings: Vec<&'a [Point2D]>, directions: Vec<i32> },
    Polyline { parts: Vec<&'a [Point2D]> },
    Point(Point2D),
}

/// Polygon kernel: sum of per-part clipped areas (signed by ring
/// direction so holes subtract), clamped to zero, times `record_weight`.
pub fn polygon_weight(cell: BoundingBox, rings: &[&[Point2D]], directions: &[i32], record_weight: f64) -> f64 {
    clipped_polygon_area(rings, directions, cell) * record_weight
}

/// Polyline kernel: sum of clipped segment lengths over every segment
/// that doesn't straddle a part boundary, times `record_weight`.
pub fn polyline_weight(cell: BoundingBox, parts: &[&[Point2D]], record_weight: f64) -> f64 {
    let mut total = 0.0;
    for part in parts {
        for w in part.windows(2) {
            total += clipped_segment_length(w[0], w[1], cell);
        }
    }
    total * record_weight
}

/// Point kernel: half-open cell containment, `record_weight` or zero.
pub fn point_weight(cell: BoundingBox, p: Point2D, record_weight: f64) -> f64 {
    if cell.contains_point_half_open(p.x, p.y) {
        record_weight
    } else {
        0.0
    }
}

/// Dispatches to the geometry-specific kernel. `record_weight` is the
/// caller-supplied multi-density multiplier for this record; zero if the
/// record is absent from the weight vector (callers should skip those
/// records entirely rather than invoking this).
pub fn cell_weight(cell: BoundingBox, geom: &RecordGeometry, record_weight: f64) -> f64 {
    match geom {
        RecordGeometry::Polygon { rings, directions } => {
            polygon_weight(cell, rings, directions, record_weight)
        }
        RecordGeometry::Polyline { parts } => polyline_weight(cell, parts, record_weight),
        RecordGeometry::Point(p) => point_weight(cell, *p, record_weight),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_polygon_kernel_quarter_overlap() {
        let sq = vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(0.0, 1.0),
            Point2D::new(1.0, 1.0),
            Point2D::new(1.0, 0.0),
            Point2D::new(0.0, 0.0),
        ];
        let cell = BoundingBox::new(0.25, 0.75, 0.25, 0.75);
        let w = polygon_weight(cell, &[&sq], &[1], 1.0);
        assert!((w - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_point_kernel_tie_break() {
        let cell = BoundingBox::new(0.0, 1.0, 0.0, 1.0);
        assert_eq!(point_weight(cell, Point2D::new(0.0, 0.5), 2.0), 0.0);
        assert_eq!(point_weight(cell, Point2D::new(1.0, 0.5), 2.0), 2.0);
    }

    #[test]
    fn test_polyline_kernel() {
        let parts: Vec<Point2D> = vec![Point2D::new(0.0, 0.0), Point2D::new(3.0, 0.0), Point2D::new(3.0, 4.0)];
        let cell = BoundingBox::new(0.0, 2.0, 0.0, 10.0);
        let w = polyline_weight(cell, &[&parts], 1.0);
        assert!((w - 6.0).abs() < 1e-9);
    }
}
