use super::geom::Bounds;

use cgmath::BaseFloat;
use cgmath::prelude::*;

/// The bounds of a single input value, as seen by the tree
///
/// Proxies are reordered in place while the tree is built; `source_index` is the position of the value in the
/// original input, which lets leaf ranges be mapped back to input values.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature="serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Proxy<Point> {
    pub bounds: Bounds<Point>,
    pub center: Point,
    pub source_index: usize
}

impl<Point> Proxy<Point>
where
    Point: EuclideanSpace,
    Point::Scalar: BaseFloat
{
    /// Create a proxy for the value at `source_index`
    ///
    /// Panics if `bounds` is not strictly positive along every axis; such a box would corrupt the bounds of
    /// every ancestor node.
    pub fn new(bounds: Bounds<Point>, source_index: usize) -> Self {
        assert!(bounds.is_valid(), "invalid bounds for value {}", source_index);
        Self{
            bounds,
            center: bounds.center(),
            source_index
        }
    }
}

/// The union of proxy bounds and the bounds of proxy centers, in that order
pub(crate) fn surround<Point>(proxies: &[Proxy<Point>]) -> (Bounds<Point>, Bounds<Point>)
where
    Point: EuclideanSpace,
    Point::Scalar: BaseFloat
{
    proxies.iter().fold(
        (Bounds::empty(), Bounds::empty()),
        |(bounds, mut center_bounds), proxy| {
            center_bounds.extend(proxy.center);
            (bounds.union(proxy.bounds), center_bounds)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Point2;

    #[test]
    fn new() {
        let bounds = Bounds::new(Point2::new(0f32, 2f32), Point2::new(2f32, 4f32));
        let proxy = Proxy::new(bounds, 7);
        assert_eq!(proxy.center, Point2::new(1f32, 3f32));
        assert_eq!(proxy.source_index, 7);
    }

    #[test]
    #[should_panic]
    fn new_degenerate() {
        let bounds = Bounds::new(Point2::new(0f32, 2f32), Point2::new(2f32, 2f32));
        Proxy::new(bounds, 0);
    }

    #[test]
    fn surround_proxies() {
        let proxies = [
            Proxy::new(Bounds::new(Point2::new(0f32, 0f32), Point2::new(2f32, 2f32)), 0),
            Proxy::new(Bounds::new(Point2::new(4f32, -2f32), Point2::new(6f32, 0f32)), 1)];
        let (bounds, center_bounds) = surround(&proxies);
        assert_eq!(bounds, Bounds::new(Point2::new(0f32, -2f32), Point2::new(6f32, 2f32)));
        assert_eq!(center_bounds, Bounds::new(Point2::new(1f32, -1f32), Point2::new(5f32, 1f32)));
    }
}
