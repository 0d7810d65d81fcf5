use super::geom::Bounds;
use super::proxy::Proxy;

use cgmath::BaseFloat;
use cgmath::prelude::*;
use num_traits::{Float, ToPrimitive};

use std::cmp::Ordering;

/// The number of bins used by `SplitMode::SurfaceArea`
pub const DEFAULT_BINS: usize = 8;

/// A strategy for partitioning the proxies of a branch node
///
/// Implementations reorder `proxies` in place and return a partition point `split` such that
/// `0 < split < proxies.len()`; proxies before it form the left subtree and the rest form the right.
/// `proxies` always holds at least two elements.  An implementation whose own criterion cannot separate the
/// proxies must fall back to [`EqualCounts`], which always succeeds.
///
/// [`EqualCounts`]: struct.EqualCounts.html
pub trait Split {
    fn split<Point>(
        &self,
        bounds: &Bounds<Point>,
        center_bounds: &Bounds<Point>,
        axis: usize,
        proxies: &mut [Proxy<Point>]) -> usize
    where
        Point: EuclideanSpace,
        Point::Scalar: BaseFloat;
}

/// Reorder `items` so that every item matching `pred` precedes every item which doesn't
///
/// Returns the number of matching items.  The relative order within either side is not preserved, but the
/// result depends only on the input order.
fn partition<T, F>(items: &mut [T], mut pred: F) -> usize
where
    F: FnMut(&T) -> bool
{
    let mut split = 0;
    for i in 0..items.len() {
        if pred(&items[i]) {
            items.swap(split, i);
            split += 1;
        }
    }
    split
}

/// Split at the median center along the split axis
#[derive(Copy, Clone, Debug, Default)]
pub struct EqualCounts;

impl Split for EqualCounts {
    fn split<Point>(
        &self,
        _bounds: &Bounds<Point>,
        _center_bounds: &Bounds<Point>,
        axis: usize,
        proxies: &mut [Proxy<Point>]) -> usize
    where
        Point: EuclideanSpace,
        Point::Scalar: BaseFloat
    {
        let split = proxies.len() / 2;
        proxies.select_nth_unstable_by(split, |lhs, rhs| {
            lhs.center[axis]
                .partial_cmp(&rhs.center[axis])
                .unwrap_or(Ordering::Equal)
        });
        split
    }
}

/// Split at the spatial midpoint of the proxy centers along the split axis
#[derive(Copy, Clone, Debug, Default)]
pub struct EqualDimensions;

impl Split for EqualDimensions {
    fn split<Point>(
        &self,
        bounds: &Bounds<Point>,
        center_bounds: &Bounds<Point>,
        axis: usize,
        proxies: &mut [Proxy<Point>]) -> usize
    where
        Point: EuclideanSpace,
        Point::Scalar: BaseFloat
    {
        let two = Point::Scalar::one() + Point::Scalar::one();
        let midpoint = (center_bounds.min[axis] + center_bounds.max[axis]) / two;

        let split = partition(proxies, |proxy| proxy.center[axis] < midpoint);
        if split > 0 && split < proxies.len() {
            split
        } else {
            trace!("midpoint split failed to separate {} proxies; splitting by count", proxies.len());
            EqualCounts.split(bounds, center_bounds, axis, proxies)
        }
    }
}

/// Split by the binned surface area heuristic
///
/// Proxy centers are sorted into `BINS` equal-width bins along the split axis.  Every boundary between
/// adjacent bins is a candidate split, with cost `area(left) * left_count + area(right) * right_count`; the
/// cheapest candidate wins, and the lowest candidate wins ties.
///
/// In one dimension every box has the same surface area, so all candidates tie and the split always falls
/// after the first bin.  The partition is still valid, but `EqualCounts` or `EqualDimensions` produce better
/// balanced trees for 1D inputs.
#[derive(Copy, Clone, Debug, Default)]
pub struct SurfaceArea<const BINS: usize>;

#[derive(Copy, Clone)]
struct Bin<Point> {
    bounds: Bounds<Point>,
    count: usize
}

impl<Point> Bin<Point>
where
    Point: EuclideanSpace,
    Point::Scalar: BaseFloat
{
    fn empty() -> Self {
        Self{bounds: Bounds::empty(), count: 0}
    }

    fn merge(self, other: Self) -> Self {
        Self{
            bounds: self.bounds.union(other.bounds),
            count: self.count + other.count
        }
    }

    fn cost(&self) -> Point::Scalar {
        let count: Point::Scalar = num_traits::cast(self.count)
            .unwrap_or_else(Float::infinity);
        self.bounds.surface_area() * count
    }
}

impl<const BINS: usize> SurfaceArea<BINS> {
    fn bin<Point>(center_bounds: &Bounds<Point>, axis: usize, center: Point) -> usize
    where
        Point: EuclideanSpace,
        Point::Scalar: BaseFloat
    {
        let scale: Point::Scalar = num_traits::cast(BINS)
            .expect("bin count must be representable as a float");
        (center_bounds.normalize_axis(center, axis) * scale)
            .to_usize()
            .map_or(0, |bin| bin.min(BINS - 1))
    }
}

impl<const BINS: usize> Split for SurfaceArea<BINS> {
    fn split<Point>(
        &self,
        bounds: &Bounds<Point>,
        center_bounds: &Bounds<Point>,
        axis: usize,
        proxies: &mut [Proxy<Point>]) -> usize
    where
        Point: EuclideanSpace,
        Point::Scalar: BaseFloat
    {
        assert!(BINS > 1, "surface area split requires at least two bins");

        if center_bounds.min[axis] == center_bounds.max[axis] {
            trace!("degenerate split axis for {} proxies; splitting by count", proxies.len());
            return EqualCounts.split(bounds, center_bounds, axis, proxies);
        }

        let mut bins = [Bin::empty(); BINS];
        for proxy in proxies.iter() {
            let bin = &mut bins[Self::bin(center_bounds, axis, proxy.center)];
            bin.bounds = bin.bounds.union(proxy.bounds);
            bin.count += 1;
        }

        // left[k] covers bins[..=k], right[k] covers bins[k + 1..]
        let mut left = [Bin::empty(); BINS];
        let mut right = [Bin::empty(); BINS];
        left[0] = bins[0];
        for k in 1..(BINS - 1) {
            left[k] = left[k - 1].merge(bins[k]);
        }
        right[BINS - 2] = bins[BINS - 1];
        for k in (0..(BINS - 2)).rev() {
            right[k] = right[k + 1].merge(bins[k + 1]);
        }

        let mut best = 0;
        let mut best_cost = left[0].cost() + right[0].cost();
        for k in 1..(BINS - 1) {
            let cost = left[k].cost() + right[k].cost();
            if cost < best_cost {
                best = k;
                best_cost = cost;
            }
        }

        let split = partition(proxies, |proxy| Self::bin(center_bounds, axis, proxy.center) <= best);
        if split > 0 && split < proxies.len() {
            split
        } else {
            trace!("surface area split failed to separate {} proxies; splitting by count", proxies.len());
            EqualCounts.split(bounds, center_bounds, axis, proxies)
        }
    }
}

/// A split strategy chosen at runtime
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SplitMode {
    EqualCounts,
    EqualDimensions,
    SurfaceArea
}

impl Default for SplitMode {
    fn default() -> Self {
        SplitMode::SurfaceArea
    }
}

impl Split for SplitMode {
    fn split<Point>(
        &self,
        bounds: &Bounds<Point>,
        center_bounds: &Bounds<Point>,
        axis: usize,
        proxies: &mut [Proxy<Point>]) -> usize
    where
        Point: EuclideanSpace,
        Point::Scalar: BaseFloat
    {
        match self {
            SplitMode::EqualCounts =>
                EqualCounts.split(bounds, center_bounds, axis, proxies),
            SplitMode::EqualDimensions =>
                EqualDimensions.split(bounds, center_bounds, axis, proxies),
            SplitMode::SurfaceArea =>
                SurfaceArea::<DEFAULT_BINS>.split(bounds, center_bounds, axis, proxies),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::surround;
    use cgmath::{Point1, Point2};
    use rand::prelude::*;

    fn unit_box(x: f32, y: f32, source_index: usize) -> Proxy<Point2<f32>> {
        Proxy::new(
            Bounds::new(Point2::new(x - 0.5f32, y - 0.5f32), Point2::new(x + 0.5f32, y + 0.5f32)),
            source_index)
    }

    fn random_proxies(seed: u64, count: usize) -> Vec<Proxy<Point2<f32>>> {
        let mut prng = rand_chacha::ChaChaRng::seed_from_u64(seed);
        (0..count)
            .map(|i| unit_box(prng.gen_range(0f32, 100f32), prng.gen_range(0f32, 10f32), i))
            .collect()
    }

    fn split_with<S: Split>(strategy: S, proxies: &mut [Proxy<Point2<f32>>]) -> (usize, usize) {
        let (bounds, center_bounds) = surround(proxies);
        let axis = center_bounds.longest_axis();
        let split = strategy.split(&bounds, &center_bounds, axis, proxies);
        assert!(split > 0 && split < proxies.len(), "degenerate split at {}", split);
        (split, axis)
    }

    fn assert_separated(proxies: &[Proxy<Point2<f32>>], split: usize, axis: usize) {
        let (left, right) = proxies.split_at(split);
        let left_max = left.iter().map(|p| p.center[axis]).fold(f32::NEG_INFINITY, f32::max);
        let right_min = right.iter().map(|p| p.center[axis]).fold(f32::INFINITY, f32::min);
        assert!(left_max <= right_min, "left max {} exceeds right min {}", left_max, right_min);
    }

    fn assert_permutation(proxies: &[Proxy<Point2<f32>>]) {
        let mut indices: Vec<usize> = proxies.iter().map(|p| p.source_index).collect();
        indices.sort_unstable();
        assert!(indices.into_iter().eq(0..proxies.len()));
    }

    #[test]
    fn partition_matching_first() {
        let mut items = [5, 2, 8, 1, 9, 4];
        let split = partition(&mut items, |&x| x < 5);
        assert_eq!(split, 3);
        assert!(items[..split].iter().all(|&x| x < 5));
        assert!(items[split..].iter().all(|&x| x >= 5));
    }

    #[test]
    fn partition_reorders_rejected() {
        let mut items = [9, 8, 1];
        assert_eq!(partition(&mut items, |&x| x < 5), 1);
        assert_eq!(items, [1, 8, 9]);
    }

    #[test]
    fn equal_counts_median() {
        for &count in &[2usize, 3, 10, 101] {
            let mut proxies = random_proxies(count as u64, count);
            let (split, axis) = split_with(EqualCounts, &mut proxies);
            assert_eq!(split, count / 2);
            assert_separated(&proxies, split, axis);
            assert_permutation(&proxies);
        }
    }

    #[test]
    fn equal_dimensions_midpoint() {
        let mut proxies = vec![
            unit_box(0f32, 0f32, 0),
            unit_box(9f32, 0f32, 1),
            unit_box(1f32, 0f32, 2),
            unit_box(10f32, 0f32, 3),
            unit_box(2f32, 0f32, 4)];
        let (split, axis) = split_with(EqualDimensions, &mut proxies);
        assert_eq!((split, axis), (3, 0));
        assert_separated(&proxies, split, 0);
        assert!(proxies[..split].iter().all(|p| p.center.x < 5f32));
    }

    #[test]
    fn equal_dimensions_fallback() {
        // all centers coincide, so nothing lies below the midpoint
        let mut proxies: Vec<_> = (0..6).map(|i| unit_box(3f32, 0f32, i)).collect();
        let (bounds, center_bounds) = surround(&proxies);
        let split = EqualDimensions.split(&bounds, &center_bounds, 0, &mut proxies);
        assert_eq!(split, 3);
    }

    #[test]
    fn surface_area_clusters() {
        let mut proxies = Vec::new();
        for i in 0..10 {
            proxies.push(unit_box(i as f32 * 0.1f32, 0f32, proxies.len()));
        }
        for i in 0..3 {
            proxies.push(unit_box(100f32 + i as f32 * 0.1f32, 0f32, proxies.len()));
        }
        let (split, axis) = split_with(SurfaceArea::<DEFAULT_BINS>, &mut proxies);
        assert_eq!((split, axis), (10, 0));
        assert_separated(&proxies, split, 0);
        assert_permutation(&proxies);
    }

    #[test]
    fn surface_area_degenerate_axis() {
        let mut proxies: Vec<_> = (0..9).map(|i| unit_box(1f32, i as f32, i)).collect();
        let (bounds, center_bounds) = surround(&proxies);
        let split = SurfaceArea::<DEFAULT_BINS>.split(&bounds, &center_bounds, 0, &mut proxies);
        assert_eq!(split, 4);
        assert_permutation(&proxies);
    }

    #[test]
    fn surface_area_overflowing_extent() {
        // the center extent overflows, so every center normalizes into the first bin
        let mut proxies: Vec<_> = [-3e38f32, 1e38f32, -1e38f32, 3e38f32]
            .iter()
            .enumerate()
            .map(|(i, &x)| Proxy{
                bounds: Bounds::new(Point2::new(x - 1e33f32, -1f32), Point2::new(x + 1e33f32, 1f32)),
                center: Point2::new(x, 0f32),
                source_index: i
            })
            .collect();
        let (bounds, center_bounds) = surround(&proxies);
        assert!(center_bounds.extent(0).is_infinite());

        let split = SurfaceArea::<DEFAULT_BINS>.split(&bounds, &center_bounds, 0, &mut proxies);
        assert_eq!(split, proxies.len() / 2);
        assert_separated(&proxies, split, 0);
        assert_permutation(&proxies);
    }

    #[test]
    fn surface_area_one_dimensional() {
        let mut proxies: Vec<_> = (0..16)
            .map(|i| Proxy::new(Bounds::new(Point1::new(i as f32 - 0.5f32), Point1::new(i as f32 + 0.5f32)), i))
            .collect();
        let (bounds, center_bounds) = surround(&proxies);
        let split = SurfaceArea::<DEFAULT_BINS>.split(&bounds, &center_bounds, 0, &mut proxies);
        assert_eq!(split, 2);
        assert!(proxies[..split].iter().all(|p| p.center.x < 2f32));
    }

    #[test]
    fn surface_area_two_bins() {
        let mut proxies = random_proxies(7, 50);
        let (split, axis) = split_with(SurfaceArea::<2>, &mut proxies);
        assert_separated(&proxies, split, axis);
    }

    #[test]
    fn split_mode_random() {
        let modes = [SplitMode::EqualCounts, SplitMode::EqualDimensions, SplitMode::SurfaceArea];
        for &mode in &modes {
            let mut proxies = random_proxies(42, 257);
            let (split, axis) = split_with(mode, &mut proxies);
            assert_separated(&proxies, split, axis);
            assert_permutation(&proxies);
        }
        assert_eq!(SplitMode::default(), SplitMode::SurfaceArea);
    }

    #[test]
    fn split_is_deterministic() {
        let mut lhs = random_proxies(3, 500);
        let mut rhs = lhs.clone();
        let (lhs_split, _) = split_with(SplitMode::SurfaceArea, &mut lhs);
        let (rhs_split, _) = split_with(SplitMode::SurfaceArea, &mut rhs);
        assert_eq!(lhs_split, rhs_split);
        assert_eq!(lhs, rhs);
    }
}
