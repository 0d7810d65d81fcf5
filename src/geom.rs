use super::traits::Containment;

use cgmath::BaseFloat;
use cgmath::prelude::*;
use num_traits::Float;

/// An axis-aligned bounding box
///
/// `Point` may be any `cgmath` point (`Point1`, `Point2`, `Point3`) with a floating-point scalar.  Axes are
/// addressed through `cgmath::Array` indexing, so every operation here works for each dimensionality.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature="serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds<Point> {
    pub min: Point,
    pub max: Point
}

#[inline]
fn dimensions<Point: Array>() -> usize {
    <Point as Array>::len()
}

impl<Point> Bounds<Point>
where
    Point: EuclideanSpace,
    Point::Scalar: BaseFloat
{
    pub fn new(min: Point, max: Point) -> Self {
        Self{min, max}
    }

    /// The empty box, which is the identity for `union`
    pub fn empty() -> Self {
        Self{
            min: Point::from_value(Point::Scalar::infinity()),
            max: Point::from_value(Point::Scalar::neg_infinity())
        }
    }

    /// A box containing a single point
    pub fn from_point(point: Point) -> Self {
        Self{min: point, max: point}
    }

    /// True if `min < max` along every axis
    pub fn is_valid(&self) -> bool {
        (0..dimensions::<Point>()).all(|axis| self.min[axis] < self.max[axis])
    }

    /// True if `max < min` along any axis
    pub fn is_empty(&self) -> bool {
        (0..dimensions::<Point>()).any(|axis| self.max[axis] < self.min[axis])
    }

    pub fn extent(&self, axis: usize) -> Point::Scalar {
        self.max[axis] - self.min[axis]
    }

    pub fn center(&self) -> Point {
        let two = Point::Scalar::one() + Point::Scalar::one();
        let mut center = self.min;
        for axis in 0..dimensions::<Point>() {
            center[axis] = (self.min[axis] + self.max[axis]) / two;
        }
        center
    }

    /// The smallest box containing both `self` and `other`
    pub fn union(self, other: Self) -> Self {
        let mut result = self;
        for axis in 0..dimensions::<Point>() {
            result.min[axis] = Float::min(self.min[axis], other.min[axis]);
            result.max[axis] = Float::max(self.max[axis], other.max[axis]);
        }
        result
    }

    /// Grow this box to contain `point`
    pub fn extend(&mut self, point: Point) {
        for axis in 0..dimensions::<Point>() {
            self.min[axis] = Float::min(self.min[axis], point[axis]);
            self.max[axis] = Float::max(self.max[axis], point[axis]);
        }
    }

    /// The axis of greatest extent; the lowest axis wins ties
    pub fn longest_axis(&self) -> usize {
        let mut best = 0;
        for axis in 1..dimensions::<Point>() {
            if self.extent(axis) > self.extent(best) {
                best = axis;
            }
        }
        best
    }

    /// Total area of the box's boundary, generalized to any dimension
    ///
    /// This is the perimeter in 2D and the usual surface area in 3D.  Empty boxes have zero area.
    pub fn surface_area(&self) -> Point::Scalar {
        if self.is_empty() {
            return Point::Scalar::zero();
        }

        let n = dimensions::<Point>();
        let mut area = Point::Scalar::zero();
        for skip in 0..n {
            let mut face = Point::Scalar::one();
            for axis in (0..n).filter(|&axis| axis != skip) {
                face = face * self.extent(axis);
            }
            area = area + face;
        }
        area + area
    }

    /// Map a coordinate along `axis` into `[0, 1]` relative to this box
    pub fn normalize_axis(&self, point: Point, axis: usize) -> Point::Scalar {
        (point[axis] - self.min[axis]) / self.extent(axis)
    }
}

impl<Point> Containment for Bounds<Point>
where
    Point: EuclideanSpace,
    Point::Scalar: BaseFloat
{
    fn contains(self, other: Bounds<Point>) -> bool {
        (0..dimensions::<Point>()).all(|axis|
            self.min[axis] <= other.min[axis] &&
            self.max[axis] >= other.max[axis])
    }
}

impl<Point> Containment<Point> for Bounds<Point>
where
    Point: EuclideanSpace,
    Point::Scalar: BaseFloat
{
    fn contains(self, point: Point) -> bool {
        (0..dimensions::<Point>()).all(|axis|
            self.min[axis] <= point[axis] &&
            self.max[axis] >= point[axis])
    }
}
