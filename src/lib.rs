//! A static bounding volume hierarchy over N-dimensional axis-aligned boxes
//!
//! Boxes are described by [`Bounds`] over any `cgmath` point type with a floating-point scalar.  A [`Tree`]
//! is built once from a set of input values and a function mapping each value to its bounds; branches are
//! split by one of the [`Split`] strategies ([`EqualCounts`], [`EqualDimensions`] or the binned
//! [`SurfaceArea`] heuristic).  With the default `parallel` feature, large subtrees are built concurrently
//! using `rayon`.
//!
//! Once built, a tree may be converted into a [`FlatTree`]: a single array of compact nodes in depth-first
//! order, where a branch's left child immediately follows it and its right child is found at a fixed offset.
//! Leaves of either form refer to contiguous ranges of [`Tree::proxies`], and each [`Proxy`] records the
//! position of its value in the original input.
//!
//! ```
//! use aabb_tree::{Bounds, FlatTree2, Tree2};
//! use cgmath::Point2;
//!
//! let centers = vec![(0f32, 0f32), (0f32, 1f32), (1f32, 0f32), (1f32, 1f32)];
//!
//! let mut tree: Tree2<f32> = Tree2::new(1);
//! tree.init(&centers, |&(x, y)| Bounds::new(
//!     Point2::new(x - 0.5, y - 0.5),
//!     Point2::new(x + 0.5, y + 0.5)));
//!
//! let flat: FlatTree2<f32> = tree.flatten();
//! assert_eq!(flat.len(), 7);
//! assert_eq!(flat.right_child(0), Some(4));
//! ```
//!
//! [`Bounds`]: struct.Bounds.html
//! [`Tree`]: struct.Tree.html
//! [`Tree::proxies`]: struct.Tree.html#method.proxies
//! [`Split`]: trait.Split.html
//! [`EqualCounts`]: struct.EqualCounts.html
//! [`EqualDimensions`]: struct.EqualDimensions.html
//! [`SurfaceArea`]: struct.SurfaceArea.html
//! [`FlatTree`]: struct.FlatTree.html
//! [`Proxy`]: struct.Proxy.html

extern crate cgmath;
extern crate num_traits;

#[macro_use]
extern crate log;

#[cfg(feature="parallel")]
extern crate rayon;

mod arena;
mod flat;
mod geom;
mod proxy;
mod split;
mod traits;
mod tree;

pub use arena::NodeIndex;
pub use flat::{FlatKind, FlatNode, FlatTree, FlatTree2, FlatTree3};
pub use geom::Bounds;
pub use proxy::Proxy;
pub use split::{DEFAULT_BINS, EqualCounts, EqualDimensions, Split, SplitMode, SurfaceArea};
pub use traits::{Containment, LeafRange, ThreadSafe};
pub use tree::{
    DEFAULT_LEAF_CUTOFF,
    DEFAULT_PARALLEL_THRESHOLD,
    MAX_LEAF_CUTOFF,
    Node,
    NodeKind,
    Tree,
    Tree2,
    Tree3,
    TreeBuilder};
