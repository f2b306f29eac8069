/*
This code is part of the GRTS spatial sampling engine.
License: MIT
*/
use crate::structures::{BoundingBox, Point2D};
use std::f64;
use std::fmt;

/// In-memory form of one shapefile record's geometry.
#[derive(Clone, Debug)]
pub struct ShapefileGeometry {
    pub shape_type: ShapeType,
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub num_parts: i32,
    pub num_points: i32,
    pub parts: Vec<i32>,
    pub points: Vec<Point2D>,
    pub z_min: f64,
    pub z_max: f64,
    pub z_array: Vec<f64>,
    pub m_min: f64,
    pub m_max: f64,
    pub m_array: Vec<f64>,
}

impl ShapefileGeometry {
    pub fn new(shape_type: ShapeType) -> ShapefileGeometry {
        ShapefileGeometry { shape_type, ..Default::default() }
    }

    pub fn add_point(&mut self, p: Point2D) {
        self.points.push(p);
        self.num_points += 1;
        self.update_xy_extent(p);
    }

    pub fn add_pointm(&mut self, p: Point2D, m: f64) {
        self.points.push(p);
        self.m_array.push(m);
        self.num_points += 1;
        self.update_xy_extent(p);
        self.update_m_extent(m);
    }

    pub fn add_pointz(&mut self, p: Point2D, m: f64, z: f64) {
        self.points.push(p);
        self.m_array.push(m);
        self.z_array.push(z);
        self.num_points += 1;
        self.update_xy_extent(p);
        self.update_m_extent(m);
        self.update_z_extent(z);
    }

    pub fn add_part(&mut self, points: &[Point2D]) {
        self.parts.push(self.points.len() as i32);
        self.num_parts += 1;
        for p in points {
            self.points.push(*p);
            self.update_xy_extent(*p);
        }
        self.num_points += points.len() as i32;
    }

    pub fn add_partm(&mut self, points: &[Point2D], measures: &[f64]) {
        assert_eq!(points.len(), measures.len());
        self.parts.push(self.points.len() as i32);
        for i in 0..points.len() {
            self.points.push(points[i]);
            self.update_xy_extent(points[i]);
            self.m_array.push(measures[i]);
            self.update_m_extent(measures[i]);
        }
        self.num_points += points.len() as i32;
        self.num_parts += 1;
    }

    pub fn add_partz(&mut self, points: &[Point2D], measures: &[f64], z_values: &[f64]) {
        assert_eq!(points.len(), measures.len());
        assert_eq!(points.len(), z_values.len());
        self.parts.push(self.points.len() as i32);
        for i in 0..points.len() {
            self.points.push(points[i]);
            self.update_xy_extent(points[i]);
            self.m_array.push(measures[i]);
            self.update_m_extent(measures[i]);
            self.z_array.push(z_values[i]);
            self.update_z_extent(z_values[i]);
        }
        self.num_points += points.len() as i32;
        self.num_parts += 1;
    }

    fn update_xy_extent(&mut self, p: Point2D) {
        if p.x < self.x_min { self.x_min = p.x; }
        if p.x > self.x_max { self.x_max = p.x; }
        if p.y < self.y_min { self.y_min = p.y; }
        if p.y > self.y_max { self.y_max = p.y; }
    }

    fn update_m_extent(&mut self, m: f64) {
        if m < self.m_min { self.m_min = m; }
        if m > self.m_max { self.m_max = m; }
    }

    fn update_z_extent(&mut self, z: f64) {
        if z < self.z_min { self.z_min = z; }
        if z > self.z_max { self.z_max = z; }
    }

    pub fn get_bounding_box(&self) -> BoundingBox {
        BoundingBox::new(self.x_min, self.x_max, self.y_min, self.y_max)
    }

    /// True if every vertex of the record falls within its own stored box.
    pub fn box_contains_vertices(&self) -> bool {
        self.points.iter().all(|p| {
            p.x >= self.x_min && p.x <= self.x_max && p.y >= self.y_min && p.y <= self.y_max
        })
    }

    /// Recomputes the record's bounding box from its vertices. Used to
    /// repair a stored box that doesn't contain its own vertices.
    pub fn recompute_box(&mut self) {
        self.x_min = f64::INFINITY;
        self.x_max = f64::NEG_INFINITY;
        self.y_min = f64::INFINITY;
        self.y_max = f64::NEG_INFINITY;
        for p in &self.points {
            if p.x < self.x_min { self.x_min = p.x; }
            if p.x > self.x_max { self.x_max = p.x; }
            if p.y < self.y_min { self.y_min = p.y; }
            if p.y > self.y_max { self.y_max = p.y; }
        }
    }

    pub fn has_m_data(&self) -> bool {
        !self.m_array.is_empty()
    }

    pub fn has_z_data(&self) -> bool {
        !self.z_array.is_empty()
    }

    /// Byte length of the record's geometry payload, shape-type tag included.
    pub fn get_length(&self) -> i32 {
        let mut ret = 4; // shape type tag
        ret += match self.shape_type {
            ShapeType::Null => 0i32,
            ShapeType::Point => 16i32,
            ShapeType::MultiPoint => 36i32 + self.num_points * 16i32,
            ShapeType::PolyLine | ShapeType::Polygon => {
                40i32 + self.num_parts * 4i32 + self.num_points * 16i32
            }
            ShapeType::PointM => 24i32,
            ShapeType::MultiPointM => 52i32 + self.num_points * 24i32,
            ShapeType::PolyLineM | ShapeType::PolygonM => {
                56i32 + self.num_parts * 4i32 + self.num_points * 24i32
            }
            ShapeType::PointZ => 32i32,
            ShapeType::MultiPointZ => 68i32 + self.num_points * 32i32,
            ShapeType::PolyLineZ | ShapeType::PolygonZ => {
                72i32 + self.num_parts * 4i32 + self.num_points * 32i32
            }
        };
        ret
    }

    /// Start/end (exclusive) vertex index range of part `part_num`.
    pub fn part_range(&self, part_num: usize) -> (usize, usize) {
        let start = self.parts[part_num] as usize;
        let end = if part_num < self.parts.len() - 1 {
            self.parts[part_num + 1] as usize
        } else {
            self.points.len()
        };
        (start, end)
    }

    /// Signed area of a polygon part via the shoelace formula, wrap-around
    /// included. The ring is expected closed (first vertex repeated last).
    pub fn part_signed_area(&self, part_num: usize) -> f64 {
        let (start, end) = self.part_range(part_num);
        let pts = &self.points[start..end];
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

    /// Ring direction per part: `+1` outer, `-1` hole. Single-part polygons
    /// are always outer.
    pub fn ring_direction(&self, part_num: usize) -> i32 {
        if self.num_parts <= 1 {
            return 1;
        }
        if self.part_signed_area(part_num) < 0.0 { 1 } else { -1 }
    }

    /// Part area via the trapezoidal formula, shifted by the part's minimum
    /// y for numerical conditioning. Its sign equals the part's ring
    /// direction.
    pub fn part_trapezoidal_area(&self, part_num: usize) -> f64 {
        let (start, end) = self.part_range(part_num);
        let pts = &self.points[start..end];
        if pts.is_empty() {
            return 0.0;
        }
        let y_min = pts.iter().fold(f64::INFINITY, |a, p| a.min(p.y));
        let mut area = 0.0;
        for i in 0..pts.len() {
            let j = (i + 1) % pts.len();
            let dx = pts[j].x - pts[i].x;
            area += dx * ((pts[i].y + pts[j].y) / 2.0 - y_min);
        }
        area
    }
}

impl Default for ShapefileGeometry {
    fn default() -> ShapefileGeometry {
        ShapefileGeometry {
            shape_type: ShapeType::Null,
            x_min: f64::INFINITY,
            x_max: f64::NEG_INFINITY,
            y_min: f64::INFINITY,
            y_max: f64::NEG_INFINITY,
            num_parts: 0i32,
            num_points: 0i32,
            parts: vec![],
            points: vec![],
            z_min: f64::INFINITY,
            z_max: f64::NEG_INFINITY,
            z_array: vec![],
            m_min: f64::INFINITY,
            m_max: f64::NEG_INFINITY,
            m_array: vec![],
        }
    }
}

impl fmt::Display for ShapefileGeometry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "shape_type: {}, num_parts: {}, num_points: {}",
            self.shape_type, self.num_parts, self.num_points
        )
    }
}

#[repr(i32)]
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ShapeType {
    Null = 0,
    Point = 1,
    PolyLine = 3,
    Polygon = 5,
    MultiPoint = 8,
    PointZ = 11,
    PolyLineZ = 13,
    PolygonZ = 15,
    MultiPointZ = 18,
    PointM = 21,
    PolyLineM = 23,
    PolygonM = 25,
    MultiPointM = 28,
}

impl ShapeType {
    pub fn from_int(value: i32) -> Option<ShapeType> {
        Some(match value {
            0 => ShapeType::Null,
            1 => ShapeType::Point,
            3 => ShapeType::PolyLine,
            5 => ShapeType::Polygon,
            8 => ShapeType::MultiPoint,
            11 => ShapeType::PointZ,
            13 => ShapeType::PolyLineZ,
            15 => ShapeType::PolygonZ,
            18 => ShapeType::MultiPointZ,
            21 => ShapeType::PointM,
            23 => ShapeType::PolyLineM,
            25 => ShapeType::PolygonM,
            28 => ShapeType::MultiPointM,
            _ => return None,
        })
    }

    pub fn to_int(&self) -> i32 {
        *self as i32
    }

    pub fn base_shape_type(&self) -> ShapeType {
        match self {
            ShapeType::Null => ShapeType::Null,
            ShapeType::Point | ShapeType::PointZ | ShapeType::PointM => ShapeType::Point,
            ShapeType::PolyLine | ShapeType::PolyLineZ | ShapeType::PolyLineM => ShapeType::PolyLine,
            ShapeType::Polygon | ShapeType::PolygonZ | ShapeType::PolygonM => ShapeType::Polygon,
            ShapeType::MultiPoint | ShapeType::MultiPointZ | ShapeType::MultiPointM => {
                ShapeType::MultiPoint
            }
        }
    }
}

impl Default for ShapeType {
    fn default() -> ShapeType {
        ShapeType::Null
    }
}

impl fmt::Display for ShapeType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let printable = match *self {
            ShapeType::Null => "Null",
            ShapeType::Point => "Point",
            ShapeType::PolyLine => "PolyLine",
            ShapeType::Polygon => "Polygon",
            ShapeType::MultiPoint => "MultiPoint",
            ShapeType::PointZ => "PointZ",
            ShapeType::PolyLineZ => "PolyLineZ",
            ShapeType::PolygonZ => "PolygonZ",
            ShapeType::MultiPointZ => "MultiPointZ",
            ShapeType::PointM => "PointM",
            ShapeType::PolyLineM => "PolyLineM",
            ShapeType::PolygonM => "PolygonM",
            ShapeType::MultiPointM => "MultiPointM",
        };
        write!(f, "{}", printable)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_unit_square_area_and_direction() {
        let mut g = ShapefileGeometry::new(ShapeType::Polygon);
        g.add_part(&[
            Point2D::new(0.0, 0.0),
            Point2D::new(0.0, 1.0),
            Point2D::new(1.0, 1.0),
            Point2D::new(1.0, 0.0),
            Point2D::new(0.0, 0.0),
        ]);
        assert!((g.part_signed_area(0).abs() - 1.0).abs() < 1e-12);
        assert_eq!(g.ring_direction(0), 1);
    }

    #[test]
    fn test_part_trapezoidal_area_sign_matches_ring_direction() {
        let mut g = ShapefileGeometry::new(ShapeType::Polygon);
        // outer ring (part 0)
        g.add_part(&[
            Point2D::new(0.0, 0.0),
            Point2D::new(0.0, 1.0),
            Point2D::new(1.0, 1.0),
            Point2D::new(1.0, 0.0),
            Point2D::new(0.0, 0.0),
        ]);
        // hole ring (part 1), wound the opposite way
        g.add_part(&[
            Point2D::new(0.0, 0.0),
            Point2D::new(1.0, 0.0),
            Point2D::new(1.0, 1.0),
            Point2D::new(0.0, 1.0),
            Point2D::new(0.0, 0.0),
        ]);

        for part in 0..2 {
            let sign = if g.part_trapezoidal_area(part) < 0.0 { -1 } else { 1 };
            assert_eq!(sign, g.ring_direction(part));
        }
        assert_ne!(g.ring_direction(0), g.ring_direction(1));
    }

    #[test]
    fn test_get_length_point() {
        let mut g = ShapefileGeometry::new(ShapeType::Point);
        g.add_point(Point2D::new(1.0, 1.0));
        assert_eq!(g.get_length(), 20);
    }

    #[test]
    fn test_shape_type_round_trip() {
        for code in [0, 1, 3, 5, 11, 13, 15, 21, 23, 25] {
            let st = ShapeType::from_int(code).unwrap();
            assert_eq!(st.to_int(), code);
        }
        assert!(ShapeType::from_int(99).is_none());
    }
}
