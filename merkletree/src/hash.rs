//! Leaf and node hashing.
//!
//! Leaves: `keccak256(bytes)`, or `keccak256(keccak256(bytes))` when
//! [`LeafHashing::Double`] is selected.
//!
//! Nodes: `keccak256(min(a, b) || max(a, b))`, where the two children are
//! ordered as big-endian unsigned integers. Because of this ordering a
//! proof only has to carry siblings, never their left/right orientation.

use serde::{Deserialize, Serialize};
use sha3::{Digest as _, Keccak256};

use crate::{bytes, Digest};

/// Legacy Keccak-256 (the Ethereum variant, not NIST SHA3-256).
pub fn keccak256(data: &[u8]) -> Digest {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    let mut digest = [0u8; 32];
    digest.copy_from_slice(&hasher.finalize());
    digest
}

/// How committed values are turned into leaf digests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LeafHashing {
    /// `keccak256(bytes)`.
    #[default]
    Single,
    /// `keccak256(keccak256(bytes))`. A leaf preimage is then never 64
    /// bytes of node material, so a leaf cannot be confused with an
    /// internal node.
    Double,
}

/// Hash canonical value bytes into a leaf digest.
pub fn leaf_hash(data: &[u8], mode: LeafHashing) -> Digest {
    match mode {
        LeafHashing::Single => keccak256(data),
        LeafHashing::Double => keccak256(&keccak256(data)),
    }
}

/// Order two digests low-to-high by their big-integer value.
pub fn sort_pair<'a>(a: &'a Digest, b: &'a Digest) -> (&'a Digest, &'a Digest) {
    // Equal-length digests: big-integer order is lexicographic order.
    if bytes::compare(a, b).is_le() {
        (a, b)
    } else {
        (b, a)
    }
}

fn sorted_concat(a: &Digest, b: &Digest) -> [u8; 64] {
    let (low, high) = sort_pair(a, b);
    let mut input = [0u8; 64];
    input[..32].copy_from_slice(low);
    input[32..].copy_from_slice(high);
    input
}

/// `keccak256(min(a, b) || max(a, b))`.
pub fn standard_node_hash(a: &Digest, b: &Digest) -> Digest {
    keccak256(&sorted_concat(a, b))
}

/// Combines two child digests into their parent.
///
/// Implementations must be pure, deterministic and order-normalized:
/// `hash_node(a, b) == hash_node(b, a)`. Tree construction, proof
/// processing and tree validation are all generic over this trait.
pub trait NodeHasher {
    /// Hash two child digests.
    fn hash_node(&self, a: &Digest, b: &Digest) -> Digest;

    /// Name of the scheme, used in log events.
    fn kind(&self) -> &str {
        "custom"
    }
}

/// The default Keccak-256 sorted-pair hasher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StandardNodeHasher;

impl NodeHasher for StandardNodeHasher {
    fn hash_node(&self, a: &Digest, b: &Digest) -> Digest {
        standard_node_hash(a, b)
    }

    fn kind(&self) -> &str {
        "keccak256"
    }
}

/// `keccak256(keccak256(min(a, b) || max(a, b)))`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DoubleKeccakNodeHasher;

impl NodeHasher for DoubleKeccakNodeHasher {
    fn hash_node(&self, a: &Digest, b: &Digest) -> Digest {
        keccak256(&standard_node_hash(a, b))
    }

    fn kind(&self) -> &str {
        "double-keccak256"
    }
}

/// `blake3(min(a, b) || max(a, b))`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Blake3NodeHasher;

impl NodeHasher for Blake3NodeHasher {
    fn hash_node(&self, a: &Digest, b: &Digest) -> Digest {
        *blake3::hash(&sorted_concat(a, b)).as_bytes()
    }

    fn kind(&self) -> &str {
        "blake3"
    }
}

impl<F> NodeHasher for F
where
    F: Fn(&Digest, &Digest) -> Digest,
{
    fn hash_node(&self, a: &Digest, b: &Digest) -> Digest {
        self(a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keccak256_known_vectors() {
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
        assert_eq!(
            hex::encode(keccak256(b"abc")),
            "4e03657aea45a94fc7d47ba826c8d667c0d1e6e33a64a036ec44f58fa12d6c45"
        );
    }

    #[test]
    fn test_double_leaf_hash() {
        let single = leaf_hash(b"ciao", LeafHashing::Single);
        let double = leaf_hash(b"ciao", LeafHashing::Double);
        assert_eq!(single, keccak256(b"ciao"));
        assert_eq!(double, keccak256(&single));
        assert_ne!(single, double);
    }

    #[test]
    fn test_node_hash_is_order_independent() {
        let a = keccak256(b"a");
        let b = keccak256(b"b");
        for hasher in [
            &StandardNodeHasher as &dyn NodeHasher,
            &DoubleKeccakNodeHasher,
            &Blake3NodeHasher,
        ] {
            assert_eq!(hasher.hash_node(&a, &b), hasher.hash_node(&b, &a));
        }
    }

    #[test]
    fn test_node_hash_concatenates_low_then_high() {
        let low = [1u8; 32];
        let high = [2u8; 32];
        let mut input = Vec::new();
        input.extend_from_slice(&low);
        input.extend_from_slice(&high);
        assert_eq!(standard_node_hash(&high, &low), keccak256(&input));
    }

    #[test]
    fn test_equal_inputs_combine_deterministically() {
        let a = [9u8; 32];
        assert_eq!(standard_node_hash(&a, &a), keccak256(&[9u8; 64]));
    }

    #[test]
    fn test_hashers_differ() {
        let a = [1u8; 32];
        let b = [2u8; 32];
        assert_ne!(
            StandardNodeHasher.hash_node(&a, &b),
            DoubleKeccakNodeHasher.hash_node(&a, &b)
        );
        assert_ne!(
            StandardNodeHasher.hash_node(&a, &b),
            Blake3NodeHasher.hash_node(&a, &b)
        );
    }

    #[test]
    fn test_closure_is_a_custom_hasher() {
        let hasher = |a: &Digest, b: &Digest| standard_node_hash(a, b);
        assert_eq!(hasher.kind(), "custom");
        assert_eq!(
            NodeHasher::hash_node(&hasher, &[1u8; 32], &[2u8; 32]),
            standard_node_hash(&[1u8; 32], &[2u8; 32])
        );
    }
}
