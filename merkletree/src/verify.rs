//! Proof verification against a bare root, no tree needed.

use tracing::warn;

use crate::{
    bytes::{to_hex, LeafValue},
    hash::{LeafHashing, NodeHasher, StandardNodeHasher},
    multiproof::{process_multi_proof, MultiProof},
    proof::process_proof,
    tree::hash_value,
    Digest,
};

/// Check `proof` for `leaf` against `root` with the standard hashers.
pub fn verify<T: LeafValue>(root: &Digest, leaf: &T, proof: &[Digest]) -> bool {
    verify_with(root, leaf, proof, &StandardNodeHasher, LeafHashing::Single)
}

/// Check `proof` for `leaf` against `root`, hashing the leaf with
/// `leaf_hashing` and internal nodes with `hasher`.
///
/// Returns `false` if the leaf cannot be encoded.
pub fn verify_with<T, H>(
    root: &Digest,
    leaf: &T,
    proof: &[Digest],
    hasher: &H,
    leaf_hashing: LeafHashing,
) -> bool
where
    T: LeafValue,
    H: NodeHasher + ?Sized,
{
    let leaf = match hash_value(leaf, leaf_hashing) {
        Ok(digest) => digest,
        Err(e) => {
            warn!(error = %e, "cannot hash leaf for verification");
            return false;
        }
    };
    let computed = process_proof(&leaf, proof, hasher);
    if &computed != root {
        warn!(
            computed = %to_hex(&computed),
            expected = %to_hex(root),
            "proof does not match the root"
        );
        return false;
    }
    true
}

/// Check `multiproof` against `root` with the standard node hasher.
///
/// A multiproof with no leaves proves nothing and never verifies, even
/// though it can reduce to the root.
pub fn verify_multi_proof(root: &Digest, multiproof: &MultiProof) -> bool {
    verify_multi_proof_with(root, multiproof, &StandardNodeHasher)
}

/// Check `multiproof` against `root`, combining nodes with `hasher`.
///
/// The leaves in a multiproof are already digests, so no leaf hashing mode
/// is involved. A multiproof with no leaves never verifies.
pub fn verify_multi_proof_with<H: NodeHasher + ?Sized>(
    root: &Digest,
    multiproof: &MultiProof,
    hasher: &H,
) -> bool {
    if multiproof.leaves.is_empty() {
        warn!("multiproof proves no leaves");
        return false;
    }
    match process_multi_proof(multiproof, hasher) {
        Ok(computed) if &computed == root => true,
        Ok(computed) => {
            warn!(
                computed = %to_hex(&computed),
                expected = %to_hex(root),
                "multiproof does not match the root"
            );
            false
        }
        Err(e) => {
            warn!(error = %e, "multiproof rejected");
            false
        }
    }
}
