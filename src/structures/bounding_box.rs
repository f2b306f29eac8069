/*
This code is part of the GRTS spatial sampling engine.
License: MIT
*/

/// An axis-aligned bounding box.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, max_x: f64, min_y: f64, max_y: f64) -> BoundingBox {
        let (x1, x2) = if min_x < max_x { (min_x, max_x) } else { (max_x, min_x) };
        let (y1, y2) = if min_y < max_y { (min_y, max_y) } else { (max_y, min_y) };
        BoundingBox { min_x: x1, min_y: y1, max_x: x2, max_y: y2 }
    }

    pub fn get_height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn get_width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn overlaps(&self, other: BoundingBox) -> bool {
        !(self.max_y < other.min_y
            || self.max_x < other.min_x
            || self.min_y > other.max_y
            || self.min_x > other.max_x)
    }

    pub fn contains(&self, other: BoundingBox) -> bool {
        other.max_y <= self.max_y
            && other.max_x <= self.max_x
            && other.min_y >= self.min_y
            && other.min_x >= self.min_x
    }

    pub fn intersect(&self, other: BoundingBox) -> BoundingBox {
        let max_y = if self.max_y <= other.max_y { self.max_y } else { other.max_y };
        let max_x = if self.max_x <= other.max_x { self.max_x } else { other.max_x };
        let min_y = if self.min_y >= other.min_y { self.min_y } else { other.min_y };
        let min_x = if self.min_x >= other.min_x { self.min_x } else { other.min_x };
        BoundingBox { min_x, max_x, min_y, max_y }
    }

    pub fn is_point_in_box(&self, x: f64, y: f64) -> bool {
        !(self.max_y < y || self.max_x < x || self.min_y > y || self.min_x > x)
    }

    /// Half-open containment, `min_x < x <= max_x, min_y < y <= max_y`. A
    /// point sitting exactly on a cell's lower or left edge belongs to the
    /// neighboring cell, per the point-kernel tie-break rule.
    pub fn contains_point_half_open(&self, x: f64, y: f64) -> bool {
        x > self.min_x && x <= self.max_x && y > self.min_y && y <= self.max_y
    }

    pub fn expand_to(&mut self, other: BoundingBox) {
        self.max_y = if self.max_y >= other.max_y { self.max_y } else { other.max_y };
        self.max_x = if self.max_x >= other.max_x { self.max_x } else { other.max_x };
        self.min_y = if self.min_y <= other.min_y { self.min_y } else { other.min_y };
        self.min_x = if self.min_x <= other.min_x { self.min_x } else { other.min_x };
    }

    pub fn expand_by(&mut self, value: f64) {
        self.max_y += value;
        self.max_x += value;
        self.min_y -= value;
        self.min_x -= value;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_half_open_tie_break() {
        let left = BoundingBox::new(0.0, 1.0, 0.0, 1.0);
        let right = BoundingBox::new(1.0, 2.0, 0.0, 1.0);
        assert!(!left.contains_point_half_open(1.0, 0.5));
        assert!(right.contains_point_half_open(1.0, 0.5));
    }

    #[test]
    fn test_intersect() {
        let a = BoundingBox::new(0.0, 10.0, 0.0, 10.0);
        let b = BoundingBox::new(5.0, 15.0, 5.0, 15.0);
        let c = a.intersect(b);
        assert_eq!(c.min_x, 5.0);
        assert_eq!(c.max_x, 10.0);
    }

    #[test]
    fn test_overlaps() {
        let a = BoundingBox::new(0.0, 10.0, 0.0, 10.0);
        let b = BoundingBox::new(20.0, 30.0, 20.0, 30.0);
        assert!(!a.overlaps(b));
    }
}
