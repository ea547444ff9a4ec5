//! Single-leaf inclusion proofs and whole-tree structural checks.
//!
//! A proof is the list of sibling digests on the path from a leaf up to,
//! but excluding, the root. Verification folds the leaf with each sibling
//! in order; since node hashing sorts its inputs, the fold never needs to
//! know whether a sibling sat on the left or the right.

use tracing::trace;

use crate::{
    bytes::digest_from_slice,
    error::Violation,
    hash::NodeHasher,
    index::{check_leaf_node, left_child, parent, right_child, sibling},
    Digest, Error, Result,
};

/// Sibling digests from a leaf to the root, leaf side first.
pub type Proof = Vec<Digest>;

/// Maximum proof length accepted by [`decode_proof`]. A tree deeper than
/// this cannot be held in memory anyway.
const MAX_DECODED_PROOF_LEN: usize = 1 << 16;

/// Build the inclusion proof for the leaf at tree position `leaf_index`.
pub fn get_proof(tree: &[Digest], leaf_index: usize) -> Result<Proof> {
    check_leaf_node(tree.len(), leaf_index)?;

    let mut proof = Vec::new();
    let mut index = leaf_index;
    while index > 0 {
        proof.push(node_at(tree, sibling(index)?)?);
        index = parent(index)?;
    }

    trace!(leaf_index, len = proof.len(), "generated proof");
    Ok(proof)
}

/// The digest at `index`, or [`Error::TreeIndexOutOfRange`] for a slice too
/// short to hold it.
pub(crate) fn node_at(tree: &[Digest], index: usize) -> Result<Digest> {
    tree.get(index)
        .copied()
        .ok_or(Error::TreeIndexOutOfRange {
            index,
            len: tree.len(),
        })
}

/// Fold `leaf` with every proof element, returning the implied root.
pub fn process_proof<H: NodeHasher + ?Sized>(
    leaf: &Digest,
    proof: &[Digest],
    hasher: &H,
) -> Digest {
    proof
        .iter()
        .fold(*leaf, |acc, sibling| hasher.hash_node(&acc, sibling))
}

/// Like [`process_proof`], for untrusted byte input.
///
/// Every element, leaf included, must be exactly 32 bytes.
pub fn process_proof_bytes<B, H>(leaf: &[u8], proof: &[B], hasher: &H) -> Result<Digest>
where
    B: AsRef<[u8]>,
    H: NodeHasher + ?Sized,
{
    let leaf = check_valid_merkle_node(leaf)?;
    let proof = proof
        .iter()
        .map(|node| check_valid_merkle_node(node.as_ref()))
        .collect::<Result<Vec<_>>>()?;
    Ok(process_proof(&leaf, &proof, hasher))
}

/// Accept `node` only if it is a 32-byte digest.
pub fn check_valid_merkle_node(node: &[u8]) -> Result<Digest> {
    digest_from_slice(node)
}

/// Every internal node whose children hash differently from its stored
/// digest.
pub fn tree_violations<H: NodeHasher + ?Sized>(tree: &[Digest], hasher: &H) -> Vec<Violation> {
    if tree.is_empty() {
        return vec![Violation::EmptyTree];
    }
    (0..tree.len())
        .take_while(|&i| right_child(i) < tree.len())
        .filter(|&i| hasher.hash_node(&tree[left_child(i)], &tree[right_child(i)]) != tree[i])
        .map(|index| Violation::NodeHashMismatch { index })
        .collect()
}

/// Whether every internal node of `tree` is the hash of its children.
pub fn is_valid_merkle_tree<H: NodeHasher + ?Sized>(tree: &[Digest], hasher: &H) -> bool {
    tree_violations(tree, hasher).is_empty()
}

/// Encode a proof with bincode.
pub fn encode_proof(proof: &[Digest]) -> Result<Vec<u8>> {
    let config = bincode::config::standard().with_big_endian();
    bincode::encode_to_vec(proof, config)
        .map_err(|e| Error::Serialization(format!("encode error: {}", e)))
}

/// Decode a proof produced by [`encode_proof`].
pub fn decode_proof(bytes: &[u8]) -> Result<Proof> {
    let config = bincode::config::standard()
        .with_big_endian()
        .with_limit::<{ 32 * MAX_DECODED_PROOF_LEN + 16 }>();
    let (proof, read): (Proof, usize) = bincode::decode_from_slice(bytes, config)
        .map_err(|e| Error::Serialization(format!("decode error: {}", e)))?;
    if read != bytes.len() {
        return Err(Error::Serialization(format!(
            "{} trailing bytes after proof",
            bytes.len() - read
        )));
    }
    Ok(proof)
}
