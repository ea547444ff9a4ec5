//! Position arithmetic for the flat, level-order tree layout.
//!
//! Positions are indexed level-order (BFS): root=0, left child=2i+1, right
//! child=2i+2. A tree over `n` leaves has `2n - 1` positions; leaves occupy
//! the last `n`.

use crate::{Error, Result};

/// Left child position: `2i + 1`, saturating at `usize::MAX`.
pub fn left_child(i: usize) -> usize {
    i.saturating_mul(2).saturating_add(1)
}

/// Right child position: `2i + 2`, saturating at `usize::MAX`.
pub fn right_child(i: usize) -> usize {
    i.saturating_mul(2).saturating_add(2)
}

/// Parent position: `(i - 1) / 2`.
pub fn parent(i: usize) -> Result<usize> {
    if i == 0 {
        return Err(Error::RootHasNoParent);
    }
    Ok((i - 1) / 2)
}

/// Sibling position: `i - 1` for even (right) positions, `i + 1` for odd
/// (left) positions.
pub fn sibling(i: usize) -> Result<usize> {
    if i == 0 {
        return Err(Error::RootHasNoSibling);
    }
    Ok(if i % 2 == 0 { i - 1 } else { i + 1 })
}

/// Whether `i` is a position in a tree of `len` nodes.
pub fn is_tree_node(len: usize, i: usize) -> bool {
    i < len
}

/// Whether `i` has at least one child in a tree of `len` nodes.
pub fn is_internal_node(len: usize, i: usize) -> bool {
    // A saturated child position is never inside a real tree.
    let left = left_child(i);
    left != usize::MAX && is_tree_node(len, left)
}

/// Whether `i` is a position in the tree with no children.
pub fn is_leaf_node(len: usize, i: usize) -> bool {
    is_tree_node(len, i) && !is_internal_node(len, i)
}

/// Fail with [`Error::NotALeaf`] unless `i` is a leaf position.
pub fn check_leaf_node(len: usize, i: usize) -> Result<()> {
    if !is_leaf_node(len, i) {
        return Err(Error::NotALeaf(i));
    }
    Ok(())
}
