//! Tree construction from leaf digests.

use tracing::debug;

use crate::{
    bytes,
    hash::NodeHasher,
    index::{is_leaf_node, left_child, right_child},
    Digest, Error, Result,
};

/// A committed value and the tree position of its leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueRecord<T> {
    value: T,
    tree_index: usize,
}

impl<T> ValueRecord<T> {
    pub(crate) fn new(value: T, tree_index: usize) -> Self {
        Self { value, tree_index }
    }

    /// The committed value, as supplied at construction.
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Position of this value's leaf in the flat tree.
    pub fn tree_index(&self) -> usize {
        self.tree_index
    }
}

/// Build the flat tree over `leaves`.
///
/// The result has `2n - 1` digests: leaves in order at the tail, internal
/// nodes filled from `n - 2` down to the root at 0.
pub fn make_merkle_tree<H: NodeHasher + ?Sized>(
    leaves: &[Digest],
    hasher: &H,
) -> Result<Vec<Digest>> {
    if leaves.is_empty() {
        return Err(Error::EmptyInput);
    }
    let n = leaves.len();
    let mut tree = vec![[0u8; 32]; 2 * n - 1];
    tree[n - 1..].copy_from_slice(leaves);

    for i in (0..n - 1).rev() {
        tree[i] = hasher.hash_node(&tree[left_child(i)], &tree[right_child(i)]);
    }

    Ok(tree)
}

/// Hash `values`, optionally sort the leaves, build the tree and record
/// where each value landed.
///
/// Records are returned in input order regardless of `sort_leaves`.
pub fn prepare_merkle_tree<T, F, H>(
    values: Vec<T>,
    sort_leaves: bool,
    leaf_hash: F,
    hasher: &H,
) -> Result<(Vec<Digest>, Vec<ValueRecord<T>>)>
where
    F: Fn(&T) -> Result<Digest>,
    H: NodeHasher + ?Sized,
{
    if values.is_empty() {
        return Err(Error::EmptyInput);
    }

    let mut hashed: Vec<(usize, Digest)> = values
        .iter()
        .enumerate()
        .map(|(value_index, value)| Ok((value_index, leaf_hash(value)?)))
        .collect::<Result<_>>()?;

    if sort_leaves {
        // Stable, so equal digests keep input order.
        hashed.sort_by(|(_, a), (_, b)| bytes::compare(a, b));
    }

    let leaves: Vec<Digest> = hashed.iter().map(|(_, digest)| *digest).collect();
    let tree = make_merkle_tree(&leaves, hasher)?;

    let first_leaf = tree.len() - leaves.len();
    let mut tree_indices = vec![0usize; values.len()];
    for (leaf_position, (value_index, _)) in hashed.iter().enumerate() {
        let tree_index = first_leaf + leaf_position;
        if !is_leaf_node(tree.len(), tree_index) {
            return Err(Error::TreeIndexOutOfRange {
                index: tree_index,
                len: tree.len(),
            });
        }
        tree_indices[*value_index] = tree_index;
    }

    debug!(
        leaves = leaves.len(),
        sort_leaves,
        root = %bytes::to_hex(&tree[0]),
        "built merkle tree"
    );

    let records = values
        .into_iter()
        .zip(tree_indices)
        .map(|(value, tree_index)| ValueRecord::new(value, tree_index))
        .collect();

    Ok((tree, records))
}
