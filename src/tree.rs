use super::arena::{NodeArena, NodeIndex};
use super::flat::FlatTree;
use super::geom::Bounds;
use super::proxy::{Proxy, surround};
use super::split::{Split, SplitMode};
use super::traits::{LeafRange, ThreadSafe};

use cgmath::{BaseFloat, Point2, Point3};
use cgmath::prelude::*;

use std::ops::Range;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const DEFAULT_LEAF_CUTOFF: usize = 8;

/// Subtrees over more proxies than this are built concurrently by default
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 16384;

/// Leaf counts are stored in 8 bits once flattened
pub const MAX_LEAF_CUTOFF: usize = 255;

/// The payload of a tree node
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature="serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeKind {
    Branch {
        left: NodeIndex,
        right: NodeIndex,
        split_dim: usize
    },
    /// `proxies[first_index..first_index + count]`
    Leaf {
        first_index: usize,
        count: usize
    }
}

/// A node of a `Tree`; `bounds` is the union of all proxy bounds beneath it
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature="serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct Node<Point> {
    pub bounds: Bounds<Point>,
    pub kind: NodeKind
}

impl<Point> Node<Point> {
    /// The left and right children of a branch
    pub fn children(&self) -> Option<(NodeIndex, NodeIndex)> {
        match self.kind {
            NodeKind::Branch{left, right, ..} => Some((left, right)),
            NodeKind::Leaf{..} => None
        }
    }

    pub fn split_dim(&self) -> Option<usize> {
        match self.kind {
            NodeKind::Branch{split_dim, ..} => Some(split_dim),
            NodeKind::Leaf{..} => None
        }
    }

    /// The number of proxies in a leaf, or zero for a branch
    pub fn count(&self) -> usize {
        match self.kind {
            NodeKind::Branch{..} => 0,
            NodeKind::Leaf{count, ..} => count
        }
    }
}

impl<Point> LeafRange for Node<Point> {
    fn leaf_range(&self) -> Option<Range<usize>> {
        match self.kind {
            NodeKind::Branch{..} => None,
            NodeKind::Leaf{first_index, count} => Some(first_index..(first_index + count))
        }
    }
}

/// A bounding volume hierarchy over a static set of boxes
///
/// The tree is built in a single call to [`init`], which converts each input value into a [`Proxy`] and
/// recursively partitions the proxies using the split strategy `S`.  Each leaf refers to a contiguous range
/// of [`proxies`]; `Proxy::source_index` maps a proxy back to its input value.
///
/// Use [`flatten`] to obtain a compact, pointer-free copy for traversal.
///
/// [`init`]: struct.Tree.html#method.init
/// [`proxies`]: struct.Tree.html#method.proxies
/// [`flatten`]: struct.Tree.html#method.flatten
/// [`Proxy`]: struct.Proxy.html
#[derive(Clone, Debug)]
pub struct Tree<Point, S = SplitMode> {
    leaf_cutoff: usize,
    parallel_threshold: usize,
    split: S,
    root: Option<NodeIndex>,
    nodes: Vec<Node<Point>>,
    proxies: Vec<Proxy<Point>>,
    total_branches: usize,
    total_leaves: usize
}

pub type Tree2<Scalar, S = SplitMode> = Tree<Point2<Scalar>, S>;
pub type Tree3<Scalar, S = SplitMode> = Tree<Point3<Scalar>, S>;

impl<Point, S> Default for Tree<Point, S>
where
    S: Default
{
    fn default() -> Self {
        TreeBuilder::new().build()
    }
}

impl<Point, S> Tree<Point, S>
where
    S: Default
{
    /// An empty tree with the given leaf cutoff and default settings otherwise
    pub fn new(leaf_cutoff: usize) -> Self {
        TreeBuilder::new()
            .with_leaf_cutoff(leaf_cutoff)
            .build()
    }
}

impl<Point, S> Tree<Point, S> {
    /// Remove all proxies and nodes
    pub fn clear(&mut self) {
        self.root = None;
        self.nodes.clear();
        self.proxies.clear();
        self.total_branches = 0;
        self.total_leaves = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn root(&self) -> Option<&Node<Point>> {
        self.root.map(|index| self.node(index))
    }

    pub fn root_index(&self) -> Option<NodeIndex> {
        self.root
    }

    pub fn node(&self, index: NodeIndex) -> &Node<Point> {
        &self.nodes[index.get()]
    }

    /// All nodes, in allocation order
    ///
    /// Allocation order depends on how the build was scheduled; walk from [`root`] to visit nodes in a
    /// reproducible order.
    ///
    /// [`root`]: struct.Tree.html#method.root
    pub fn nodes(&self) -> &[Node<Point>] {
        self.nodes.as_slice()
    }

    /// Proxies in leaf order
    pub fn proxies(&self) -> &[Proxy<Point>] {
        self.proxies.as_slice()
    }

    /// The proxies referenced by a leaf, or `None` for a branch
    pub fn leaf_proxies(&self, node: &Node<Point>) -> Option<&[Proxy<Point>]> {
        node.leaf_range().map(|range| &self.proxies[range])
    }

    pub fn total_branches(&self) -> usize {
        self.total_branches
    }

    pub fn total_leaves(&self) -> usize {
        self.total_leaves
    }

    pub fn leaf_cutoff(&self) -> usize {
        self.leaf_cutoff
    }

    pub fn parallel_threshold(&self) -> usize {
        self.parallel_threshold
    }

    pub fn split(&self) -> &S {
        &self.split
    }

    /// Produce the flattened, pointer-free form of this tree
    pub fn flatten(&self) -> FlatTree<Point>
    where
        Point: Copy
    {
        FlatTree::from_tree(self)
    }
}

impl<Point, S> Tree<Point, S>
where
    Point: EuclideanSpace + ThreadSafe,
    Point::Scalar: BaseFloat,
    S: Split + ThreadSafe
{
    /// Build the tree from `values`, discarding any previous contents
    ///
    /// `func` maps each value to its bounds.  Panics if any bounds are not strictly positive along every
    /// axis.
    pub fn init<Iter, F>(&mut self, values: Iter, mut func: F)
    where
        Iter: IntoIterator,
        F: FnMut(Iter::Item) -> Bounds<Point>
    {
        self.clear();

        self.proxies.extend(values
            .into_iter()
            .enumerate()
            .map(|(source_index, value)| Proxy::new(func(value), source_index)));

        let count = self.proxies.len();
        if count == 0 {
            return;
        }

        let build = Build{
            leaf_cutoff: self.leaf_cutoff,
            parallel_threshold: self.parallel_threshold,
            split: &self.split,
            arena: NodeArena::with_capacity(2 * count - 1),
            total_branches: AtomicUsize::new(0),
            total_leaves: AtomicUsize::new(0)
        };

        let root = build.recurse(self.proxies.as_mut_slice(), 0);

        self.total_branches = build.total_branches.into_inner();
        self.total_leaves = build.total_leaves.into_inner();
        self.nodes = build.arena.into_nodes();
        self.root = Some(root);

        debug!("built tree over {} proxies: {} branches, {} leaves",
            count,
            self.total_branches,
            self.total_leaves);
    }
}

/// State shared by every task of a single build
struct Build<'a, Point, S> {
    leaf_cutoff: usize,
    #[cfg_attr(not(feature="parallel"), allow(dead_code))]
    parallel_threshold: usize,
    split: &'a S,
    arena: NodeArena<Node<Point>>,
    total_branches: AtomicUsize,
    total_leaves: AtomicUsize
}

impl<'a, Point, S> Build<'a, Point, S>
where
    Point: EuclideanSpace + ThreadSafe,
    Point::Scalar: BaseFloat,
    S: Split + ThreadSafe
{
    /// Build the subtree over `proxies`, whose first proxy will sit at `first_index` in the final order
    fn recurse(&self, proxies: &mut [Proxy<Point>], first_index: usize) -> NodeIndex {
        let (bounds, center_bounds) = surround(proxies);

        let count = proxies.len();
        if count <= self.leaf_cutoff {
            self.total_leaves.fetch_add(1, Ordering::Relaxed);
            return self.arena.allocate(Node{
                bounds,
                kind: NodeKind::Leaf{first_index, count}
            });
        }

        let split_dim = center_bounds.longest_axis();
        let split = self.split.split(&bounds, &center_bounds, split_dim, proxies);
        assert!(split > 0 && split < count,
            "split strategy produced a degenerate partition ({} of {})", split, count);

        let (left, right) = self.recurse_children(proxies, split, first_index);

        self.total_branches.fetch_add(1, Ordering::Relaxed);
        self.arena.allocate(Node{
            bounds,
            kind: NodeKind::Branch{left, right, split_dim}
        })
    }

    #[cfg(feature="parallel")]
    fn recurse_children(&self, proxies: &mut [Proxy<Point>], split: usize, first_index: usize)
        -> (NodeIndex, NodeIndex)
    {
        let count = proxies.len();
        let (lhs, rhs) = proxies.split_at_mut(split);
        if count > self.parallel_threshold {
            // the right subtree is built on this thread while the left may be stolen
            let (right, left) = rayon::join(
                || self.recurse(rhs, first_index + split),
                || self.recurse(lhs, first_index));
            (left, right)
        } else {
            (self.recurse(lhs, first_index), self.recurse(rhs, first_index + split))
        }
    }

    #[cfg(not(feature="parallel"))]
    fn recurse_children(&self, proxies: &mut [Proxy<Point>], split: usize, first_index: usize)
        -> (NodeIndex, NodeIndex)
    {
        let (lhs, rhs) = proxies.split_at_mut(split);
        (self.recurse(lhs, first_index), self.recurse(rhs, first_index + split))
    }
}

/// A builder for `Tree`s
#[derive(Copy, Clone, Debug)]
pub struct TreeBuilder {
    leaf_cutoff: usize,
    parallel_threshold: usize
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self{
            leaf_cutoff: DEFAULT_LEAF_CUTOFF,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD
        }
    }
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The maximum number of proxies in a leaf; must be in `1..=MAX_LEAF_CUTOFF`
    pub fn with_leaf_cutoff(&mut self, leaf_cutoff: usize) -> &mut Self {
        if leaf_cutoff == 0 || leaf_cutoff > MAX_LEAF_CUTOFF {
            panic!("leaf cutoff must be between 1 and {} (got {})", MAX_LEAF_CUTOFF, leaf_cutoff);
        }
        self.leaf_cutoff = leaf_cutoff;
        self
    }

    /// Subtrees over more than `threshold` proxies are built in parallel (with the `parallel` feature)
    pub fn with_parallel_threshold(&mut self, threshold: usize) -> &mut Self {
        if threshold == 0 {
            panic!("parallel threshold must be non-zero");
        }
        self.parallel_threshold = threshold;
        self
    }

    pub fn build<Point, S>(&self) -> Tree<Point, S>
    where
        S: Default
    {
        self.build_with_split(S::default())
    }

    pub fn build_with_split<Point, S>(&self, split: S) -> Tree<Point, S> {
        if self.parallel_threshold < self.leaf_cutoff {
            warn!("parallel threshold ({}) is below leaf cutoff ({}); every branch will fork",
                self.parallel_threshold,
                self.leaf_cutoff);
        }

        Tree{
            leaf_cutoff: self.leaf_cutoff,
            parallel_threshold: self.parallel_threshold,
            split,
            root: None,
            nodes: Vec::new(),
            proxies: Vec::new(),
            total_branches: 0,
            total_leaves: 0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::split::{EqualCounts, SurfaceArea};
    use cgmath::Point2;

    fn unit_box(center: Point2<f32>) -> Bounds<Point2<f32>> {
        Bounds::new(
            Point2::new(center.x - 0.5f32, center.y - 0.5f32),
            Point2::new(center.x + 0.5f32, center.y + 0.5f32))
    }

    fn leaf_ranges<Point, S>(tree: &Tree<Point, S>) -> Vec<Range<usize>> {
        let mut ranges: Vec<_> = tree.nodes().iter().filter_map(|node| node.leaf_range()).collect();
        ranges.sort_by_key(|range| range.start);
        ranges
    }

    #[test]
    fn four_unit_boxes() {
        let centers = [
            Point2::new(0f32, 0f32),
            Point2::new(0f32, 1f32),
            Point2::new(1f32, 0f32),
            Point2::new(1f32, 1f32)];

        let mut tree: Tree2<f32> = Tree::new(1);
        tree.init(centers.iter(), |&center| unit_box(center));

        assert_eq!(tree.total_branches(), 3);
        assert_eq!(tree.total_leaves(), 4);
        assert_eq!(tree.nodes().len(), 7);

        let root = tree.root().unwrap();
        assert_eq!(root.bounds, Bounds::new(Point2::new(-0.5f32, -0.5f32), Point2::new(1.5f32, 1.5f32)));
        assert_eq!(root.split_dim(), Some(0));

        assert_eq!(leaf_ranges(&tree), vec![0..1, 1..2, 2..3, 3..4]);

        let mut sources: Vec<_> = tree.proxies().iter().map(|proxy| proxy.source_index).collect();
        sources.sort_unstable();
        assert_eq!(sources, vec![0, 1, 2, 3]);
    }

    #[test]
    fn single_box() {
        let bounds = Bounds::new(Point2::new(1f32, 2f32), Point2::new(3f32, 5f32));

        let mut tree: Tree2<f32> = Tree::new(8);
        tree.init(Some(bounds), |bounds| bounds);

        assert_eq!(tree.total_branches(), 0);
        assert_eq!(tree.total_leaves(), 1);

        let root = tree.root().unwrap();
        assert_eq!(root.bounds, bounds);
        assert_eq!(root.kind, NodeKind::Leaf{first_index: 0, count: 1});
        assert_eq!(tree.leaf_proxies(root).map(|proxies| proxies.len()), Some(1));
    }

    #[test]
    fn empty() {
        let mut tree: Tree2<f32> = Tree::default();
        tree.init(Vec::<Bounds<Point2<f32>>>::new(), |bounds| bounds);
        assert!(tree.is_empty());
        assert!(tree.root().is_none());
        assert!(tree.proxies().is_empty());
        assert_eq!(tree.total_branches() + tree.total_leaves(), 0);
    }

    #[test]
    fn reinit_and_clear() {
        let mut tree: Tree2<f32, EqualCounts> = Tree::new(2);
        tree.init((0..10).map(|i| Point2::new(i as f32, 0f32)), unit_box);
        assert_eq!(tree.proxies().len(), 10);

        tree.init((0..3).map(|i| Point2::new(0f32, i as f32)), unit_box);
        assert_eq!(tree.proxies().len(), 3);
        assert_eq!(tree.total_branches(), 1);
        assert_eq!(tree.total_leaves(), 2);
        assert_eq!(tree.nodes().len(), 3);

        tree.clear();
        assert!(tree.is_empty());
        assert!(tree.nodes().is_empty());
        assert_eq!(tree.total_leaves(), 0);
    }

    #[test]
    fn coincident_boxes() {
        let mut tree: Tree2<f32, SurfaceArea<4>> = Tree::new(1);
        tree.init(0..5, |_| unit_box(Point2::new(2f32, 2f32)));
        assert_eq!(tree.total_leaves(), 5);
        assert_eq!(leaf_ranges(&tree), vec![0..1, 1..2, 2..3, 3..4, 4..5]);
    }

    #[test]
    fn builder_settings() {
        let tree: Tree2<f64> = TreeBuilder::new()
            .with_leaf_cutoff(MAX_LEAF_CUTOFF)
            .with_parallel_threshold(1024)
            .build_with_split(SplitMode::EqualDimensions);
        assert_eq!(tree.leaf_cutoff(), MAX_LEAF_CUTOFF);
        assert_eq!(tree.parallel_threshold(), 1024);
        assert_eq!(*tree.split(), SplitMode::EqualDimensions);

        let tree: Tree2<f64> = Tree::default();
        assert_eq!(tree.leaf_cutoff(), DEFAULT_LEAF_CUTOFF);
        assert_eq!(tree.parallel_threshold(), DEFAULT_PARALLEL_THRESHOLD);
        assert_eq!(*tree.split(), SplitMode::SurfaceArea);
    }

    #[test]
    #[should_panic]
    fn leaf_cutoff_too_large() {
        TreeBuilder::new().with_leaf_cutoff(256);
    }

    #[test]
    #[should_panic]
    fn leaf_cutoff_zero() {
        TreeBuilder::new().with_leaf_cutoff(0);
    }

    #[test]
    #[should_panic]
    fn parallel_threshold_zero() {
        TreeBuilder::new().with_parallel_threshold(0);
    }

    #[test]
    #[should_panic]
    fn invalid_bounds() {
        let mut tree: Tree2<f32> = Tree::new(4);
        tree.init(0..3, |i| Bounds::new(Point2::new(0f32, 0f32), Point2::new(i as f32, 1f32)));
    }
}
