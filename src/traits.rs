use std::ops::Range;

/// Types which may be shared between build tasks
///
/// With the `parallel` feature this requires `Send + Sync`; without it, any type qualifies.

#[cfg(not(feature="parallel"))]
pub trait ThreadSafe {}

#[cfg(not(feature="parallel"))]
impl<T> ThreadSafe for T {}

#[cfg(feature="parallel")]
pub trait ThreadSafe: Send + Sync {}

#[cfg(feature="parallel")]
impl<T: Send + Sync> ThreadSafe for T {}

/// Check whether a value lies entirely within another
pub trait Containment<RHS = Self> {
    fn contains(self, other: RHS) -> bool;
}

/// A node which may reference a contiguous range of proxies
pub trait LeafRange {
    /// The proxy range referenced by this node, or `None` for branches
    fn leaf_range(&self) -> Option<Range<usize>>;

    fn is_leaf(&self) -> bool {
        self.leaf_range().is_some()
    }
}
