//! Immutable binary Merkle tree over Keccak-256.
//!
//! The tree is a complete binary tree held in one flat array in heap order:
//! node `i` has children `2i + 1` and `2i + 2`, the root sits at 0 and the
//! `n` leaves occupy the last `n` positions. A tree over `n` values always
//! has `2n - 1` nodes.
//!
//! Leaves are `keccak256(canonical bytes)` and internal nodes are
//! `keccak256(min(a, b) || max(a, b))` with children ordered as big-endian
//! integers, so proofs carry sibling digests only.
//!
//! Besides the [`MerkleTree`] facade the crate exposes the underlying
//! building blocks (tree construction, proof generation and processing,
//! index arithmetic) for callers that manage their own storage.

#![warn(missing_docs)]

mod error;

pub mod builder;
pub mod bytes;
pub mod dump;
pub mod hash;
pub mod index;
pub mod multiproof;
pub mod options;
pub mod proof;
mod tree;
mod verify;

#[cfg(test)]
mod tests;

/// A 32-byte Keccak-256 (or custom hasher) digest.
pub type Digest = [u8; 32];

pub use builder::{make_merkle_tree, prepare_merkle_tree, ValueRecord};
pub use bytes::{BytesLike, LeafValue};
pub use dump::{DumpFormat, DumpedValue, TreeDump};
pub use error::{Error, ErrorKind, Result, Violation};
pub use hash::{
    keccak256, leaf_hash, standard_node_hash, Blake3NodeHasher, DoubleKeccakNodeHasher,
    LeafHashing, NodeHasher, StandardNodeHasher,
};
pub use multiproof::{get_multi_proof, process_multi_proof, MultiProof};
pub use options::TreeOptions;
pub use proof::{get_proof, is_valid_merkle_tree, process_proof, Proof};
pub use tree::{LeafRef, MerkleTree};
pub use verify::{verify, verify_multi_proof, verify_multi_proof_with, verify_with};
