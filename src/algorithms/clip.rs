/*
This code is part of the GRTS spatial sampling engine.
License: MIT
*/
use crate::structures::{BoundingBox, Point2D};

/// Signed area of a closed ring via the shoelace formula, wrap-around
/// included. `pts` need not repeat the first vertex at the end.
pub fn signed_area(pts: &[Point2D]) -> f64 {
    if pts.len() < 3 {
        return 0.0;
    }
    let mut area = 0.0;
    for i in 0..pts.len() {
        let j = (i + 1) % pts.len();
        area += pts[i].x * pts[j].y - pts[j].x * pts[i].y;
    }
    area / 2.0
}

/// Ray-cast point-in-polygon test against a single ring. Casts a
/// horizontal ray toward +x and counts crossings; an edge crosses the
/// ray iff `y` falls in `(min(y1,y2), max(y1,y2)]` and the edge's
/// x-coordinate at height `y` exceeds the query point's x. Odd
/// crossing count means inside.
pub fn point_in_ring(p: Point2D, ring: &[Point2D]) -> bool {
    let n = ring.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = (ring[i].x, ring[i].y);
        let (xj, yj) = (ring[j].x, ring[j].y);
        let y_lo = yi.min(yj);
        let y_hi = yi.max(yj);
        if p.y > y_lo && p.y <= y_hi {
            let x_at_y = xi + (p.y - yi) * (xj - xi) / (yj - yi);
            if x_at_y > p.x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// XOR of per-part ring tests: a point is inside a multi-part polygon
/// iff it's inside an odd number of parts (holes toggle inclusion).
pub fn point_in_polygon_parts(p: Point2D, parts: &[&[Point2D]]) -> bool {
    let mut inside = false;
    for ring in parts {
        if point_in_ring(p, ring) {
            inside = !inside;
        }
    }
    inside
}

enum ClipEdge {
    Left,
    Right,
    Bottom,
    Top,
}

fn inside_edge(p: Point2D, edge: &ClipEdge, bb: BoundingBox) -> bool {
    match edge {
        ClipEdge::Left => p.x >= bb.min_x,
        ClipEdge::Right => p.x <= bb.max_x,
        ClipEdge::Bottom => p.y >= bb.min_y,
        ClipEdge::Top => p.y <= bb.max_y,
    }
}

fn intersect_edge(p1: Point2D, p2: Point2D, edge: &ClipEdge, bb: BoundingBox) -> Point2D {
    match edge {
        ClipEdge::Left | ClipEdge::Right => {
            let x = match edge {
                ClipEdge::Left => bb.min_x,
                _ => bb.max_x,
            };
            if (p2.x - p1.x).abs() < f64::EPSILON {
                Point2D::new(x, p1.y)
            } else {
                let t = (x - p1.x) / (p2.x - p1.x);
                Point2D::new(x, p1.y + t * (p2.y - p1.y))
            }
        }
        ClipEdge::Bottom | ClipEdge::Top => {
            let y = match edge {
                ClipEdge::Bottom => bb.min_y,
                _ => bb.max_y,
            };
            if (p2.y - p1.y).abs() < f64::EPSILON {
                Point2D::new(p1.x, y)
            } else {
                let t = (y - p1.y) / (p2.y - p1.y);
                Point2D::new(p1.x + t * (p2.x - p1.x), y)
            }
        }
    }
}

fn clip_one_edge(poly: &[Point2D], edge: &ClipEdge, bb: BoundingBox) -> Vec<Point2D> {
    if poly.is_empty() {
        return vec![];
    }
    let mut output = Vec::with_capacity(poly.len() + 1);
    let mut prev = poly[poly.len() - 1];
    let mut prev_inside = inside_edge(prev, edge, bb);
    for &curr in poly {
        let curr_inside = inside_edge(curr, edge, bb);
        if curr_inside {
            if !prev_inside {
                output.push(intersect_edge(prev, curr, edge, bb));
            }
            output.push(curr);
        } else if prev_inside {
            output.push(intersect_edge(prev, curr, edge, bb));
        }
        prev = curr;
        prev_inside = curr_inside;
    }
    output
}

/// Sutherland-Hodgman clip of a (closed) polygon ring against an
/// axis-aligned rectangle, by four sequential half-plane passes.
pub fn clip_polygon_to_box(poly: &[Point2D], bb: BoundingBox) -> Vec<Point2D> {
    let mut pts = poly.to_vec();
    for edge in [ClipEdge::Left, ClipEdge::Right, ClipEdge::Bottom, ClipEdge::Top] {
        pts = clip_one_edge(&pts, &edge, bb);
        if pts.is_empty() {
            break;
        }
    }
    pts
}

/// Area of a record part clipped against a cell: sum of the clipped
/// area of every part, signed by ring direction, clamped to zero if the
/// multi-part sum comes out negative.
pub fn clipped_polygon_area(parts: &[&[Point2D]], directions: &[i32], bb: BoundingBox) -> f64 {
    let mut total = 0.0;
    for (ring, &dir) in parts.iter().zip(directions.iter()) {
        let clipped = clip_polygon_to_box(ring, bb);
        if clipped.len() >= 3 {
            total += dir as f64 * signed_area(&clipped).abs();
        }
    }
    total.max(0.0)
}

/// Cohen-Sutherland 4-bit out-code: top=2, bottom=1, right=8, left=4.
fn out_code(p: Point2D, bb: BoundingBox) -> u8 {
    let mut code = 0u8;
    if p.y > bb.max_y {
        code |= 2;
    } else if p.y < bb.min_y {
        code |= 1;
    }
    if p.x > bb.max_x {
        code |= 8;
    } else if p.x < bb.min_x {
        code |= 4;
    }
    code
}

/// Cohen-Sutherland line clip against an axis-aligned rectangle. Returns
/// `None` if the segment lies entirely outside, else the clipped
/// endpoints.
pub fn clip_segment_to_box(mut p1: Point2D, mut p2: Point2D, bb: BoundingBox) -> Option<(Point2D, Point2D)> {
    let mut code1 = out_code(p1, bb);
    let mut code2 = out_code(p2, bb);
    loop {
        if code1 == 0 && code2 == 0 {
            return Some((p1, p2));
        }
        if code1 & code2 != 0 {
            return None;
        }
        let code_out = if code1 != 0 { code1 } else { code2 };
        let p = if code_out & 2 != 0 {
            // above top
            let x = p1.x + (p2.x - p1.x) * (bb.max_y - p1.y) / (p2.y - p1.y);
            Point2D::new(x, bb.max_y)
        } else if code_out & 1 != 0 {
            // below bottom
            let x = p1.x + (p2.x - p1.x) * (bb.min_y - p1.y) / (p2.y - p1.y);
            Point2D::new(x, bb.min_y)
        } else if code_out & 8 != 0 {
            // right of right
            let y = p1.y + (p2.y - p1.y) * (bb.max_x - p1.x) / (p2.x - p1.x);
            Point2D::new(bb.max_x, y)
        } else {
            // left of left
            let y = p1.y + (p2.y - p1.y) * (bb.min_x - p1.x) / (p2.x - p1.x);
            Point2D::new(bb.min_x, y)
        };
        if code_out == code1 {
            p1 = p;
            code1 = out_code(p1, bb);
        } else {
            p2 = p;
            code2 = out_code(p2, bb);
        }
    }
}

/// Euclidean length of a segment clipped against a cell, or zero if the
/// segment doesn't intersect it.
pub fn clipped_segment_length(p1: Point2D, p2: Point2D, bb: BoundingBox) -> f64 {
    match clip_segment_to_box(p1, p2, bb) {
        Some((a, b)) => a.distance(&b),
        None => 0.0,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn unit_square() -> Vec<Point2D> {
        vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(0.0, 1.0),
            Point2D::new(1.0, 1.0),
            Point2D::new(1.0, 0.0),
            Point2D::new(0.0, 0.0),
        ]
    }

    #[test]
    fn test_signed_area_unit_square() {
        assert!((signed_area(&unit_square()).abs() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_point_in_ring() {
        let sq = unit_square();
        assert!(point_in_ring(Point2D::new(0.5, 0.5), &sq));
        assert!(!point_in_ring(Point2D::new(1.5, 0.5), &sq));
    }

    #[test]
    fn test_clip_polygon_quarter_overlap() {
        let sq = unit_square();
        let bb = BoundingBox::new(0.25, 0.75, 0.25, 0.75);
        let clipped = clip_polygon_to_box(&sq, bb);
        assert!((signed_area(&clipped).abs() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_clip_segment_length_s3() {
        // S3 scenario: (0,0)->(3,0)->(3,4), clip against [0,2]x[0,10]
        let bb = BoundingBox::new(0.0, 2.0, 0.0, 10.0);
        let len1 = clipped_segment_length(Point2D::new(0.0, 0.0), Point2D::new(3.0, 0.0), bb);
        let len2 = clipped_segment_length(Point2D::new(3.0, 0.0), Point2D::new(3.0, 4.0), bb);
        assert!((len1 - 2.0).abs() < 1e-9);
        assert!((len2 - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_vertex_on_horizontal_edge_not_double_counted() {
        // A point exactly at the height of a vertex should follow the
        // y > min, y <= max tie-break and not be double counted.
        let poly = vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(0.0, 2.0),
            Point2D::new(2.0, 2.0),
            Point2D::new(2.0, 0.0),
            Point2D::new(0.0, 0.0),
        ];
        assert!(point_in_ring(Point2D::new(1.0, 1.0), &poly));
    }
}
