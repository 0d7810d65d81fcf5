use super::arena::NodeIndex;
use super::geom::Bounds;
use super::traits::LeafRange;
use super::tree::{MAX_LEAF_CUTOFF, NodeKind, Tree};

use cgmath::{Point2, Point3};
use smallvec::SmallVec;

use std::ops::{Index, Range};

/// The payload of a flattened node
///
/// The left child of a branch always immediately follows it; the right child is `right_offset` nodes later.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature="serialize", derive(serde::Serialize, serde::Deserialize))]
pub enum FlatKind {
    Branch {
        right_offset: u32,
        split_dim: u8
    },
    Leaf {
        first_index: u32,
        count: u8
    }
}

/// A node of a `FlatTree`
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature="serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct FlatNode<Point> {
    pub bounds: Bounds<Point>,
    pub kind: FlatKind
}

impl<Point> FlatNode<Point> {
    #[inline]
    pub fn is_branch(&self) -> bool {
        match self.kind {
            FlatKind::Branch{..} => true,
            FlatKind::Leaf{..} => false
        }
    }

    /// The number of proxies in a leaf; zero identifies a branch
    #[inline]
    pub fn count(&self) -> u8 {
        match self.kind {
            FlatKind::Branch{..} => 0,
            FlatKind::Leaf{count, ..} => count
        }
    }

    #[inline]
    pub fn right_offset(&self) -> Option<u32> {
        match self.kind {
            FlatKind::Branch{right_offset, ..} => Some(right_offset),
            FlatKind::Leaf{..} => None
        }
    }

    #[inline]
    pub fn split_dim(&self) -> Option<u8> {
        match self.kind {
            FlatKind::Branch{split_dim, ..} => Some(split_dim),
            FlatKind::Leaf{..} => None
        }
    }
}

impl<Point> LeafRange for FlatNode<Point> {
    fn leaf_range(&self) -> Option<Range<usize>> {
        match self.kind {
            FlatKind::Branch{..} => None,
            FlatKind::Leaf{first_index, count} => {
                let first_index = first_index as usize;
                Some(first_index..(first_index + count as usize))
            }
        }
    }
}

/// A `Tree` flattened into a single array in depth-first order
///
/// Node `0` is the root.  A branch at position `i` has its left subtree at `i + 1 .. i + right_offset` and its
/// right subtree starting at `i + right_offset`.  Leaf ranges index the proxies of the source tree, which
/// must be kept (or copied) alongside this array; the nodes themselves hold no references to the tree.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature="serialize", derive(serde::Serialize, serde::Deserialize))]
pub struct FlatTree<Point> {
    nodes: Vec<FlatNode<Point>>
}

pub type FlatTree2<Scalar> = FlatTree<Point2<Scalar>>;
pub type FlatTree3<Scalar> = FlatTree<Point3<Scalar>>;

impl<Point> Default for FlatTree<Point> {
    fn default() -> Self {
        Self{nodes: Vec::new()}
    }
}

impl<Point> FlatTree<Point>
where
    Point: Copy
{
    pub fn from_tree<S>(tree: &Tree<Point, S>) -> Self {
        let total = tree.total_branches() + tree.total_leaves();

        let mut flat = Self{nodes: Vec::with_capacity(total)};
        if let Some(root) = tree.root_index() {
            flat.push_recursive(tree, root);
        }
        assert_eq!(flat.nodes.len(), total, "flattened node count differs from built node count");

        debug!("flattened {} nodes", flat.nodes.len());
        flat
    }

    fn push_recursive<S>(&mut self, tree: &Tree<Point, S>, index: NodeIndex) {
        let node = tree.node(index);
        let node_index = self.nodes.len();
        match node.kind {
            NodeKind::Leaf{first_index, count} => {
                assert!(count <= MAX_LEAF_CUTOFF, "leaf count {} does not fit in 8 bits", count);
                debug_assert!(first_index <= u32::MAX as usize);
                self.nodes.push(FlatNode{
                    bounds: node.bounds,
                    kind: FlatKind::Leaf{
                        first_index: first_index as u32,
                        count: count as u8
                    }
                });
            }
            NodeKind::Branch{left, right, split_dim} => {
                self.nodes.push(FlatNode{
                    bounds: node.bounds,
                    kind: FlatKind::Branch{right_offset: 0, split_dim: split_dim as u8}
                });

                self.push_recursive(tree, left);

                let right_offset = self.nodes.len() - node_index;
                debug_assert!(right_offset <= u32::MAX as usize);
                self.nodes[node_index].kind = FlatKind::Branch{
                    right_offset: right_offset as u32,
                    split_dim: split_dim as u8
                };

                self.push_recursive(tree, right);
            }
        }
    }
}

impl<Point> FlatTree<Point> {
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FlatNode<Point>> {
        self.nodes.iter()
    }

    pub fn as_slice(&self) -> &[FlatNode<Point>] {
        self.nodes.as_slice()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&FlatNode<Point>> {
        self.nodes.get(index)
    }

    pub fn root(&self) -> Option<&FlatNode<Point>> {
        self.nodes.first()
    }

    /// Position of the left child of the branch at `index`
    #[inline]
    pub fn left_child(&self, index: usize) -> Option<usize> {
        if self.nodes[index].is_branch() {
            Some(index + 1)
        } else {
            None
        }
    }

    /// Position of the right child of the branch at `index`
    #[inline]
    pub fn right_child(&self, index: usize) -> Option<usize> {
        self.nodes[index]
            .right_offset()
            .map(|offset| index + offset as usize)
    }

    /// The number of nodes on the longest root-to-leaf path
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut stack: SmallVec<[(usize, usize); 64]> = SmallVec::new();
        if !self.nodes.is_empty() {
            stack.push((0, 1));
        }
        while let Some((index, level)) = stack.pop() {
            depth = std::cmp::max(depth, level);
            if let Some(right) = self.right_child(index) {
                stack.push((right, level + 1));
                stack.push((index + 1, level + 1));
            }
        }
        depth
    }
}

impl<Point> Index<usize> for FlatTree<Point> {
    type Output = FlatNode<Point>;

    fn index(&self, index: usize) -> &FlatNode<Point> {
        &self.nodes[index]
    }
}

impl<'a, Point> IntoIterator for &'a FlatTree<Point> {
    type Item = &'a FlatNode<Point>;
    type IntoIter = std::slice::Iter<'a, FlatNode<Point>>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

impl<'a, Point, S> From<&'a Tree<Point, S>> for FlatTree<Point>
where
    Point: Copy
{
    fn from(tree: &'a Tree<Point, S>) -> Self {
        Self::from_tree(tree)
    }
}
