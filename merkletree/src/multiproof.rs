//! Batched inclusion proofs for several leaves sharing one auth path.
//!
//! Generation walks a queue of pending positions from the deepest requested
//! leaf towards the root. Each step pops a position and pairs it with its
//! sibling: if the sibling is the next pending position both are consumed
//! and a `true` flag is emitted, otherwise the sibling digest is taken from
//! the tree into `proof` and a `false` flag is emitted. The parent then
//! joins the tail of the queue.
//!
//! Verification replays the flags over a queue seeded with the leaf
//! digests.

use std::collections::VecDeque;

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::{
    bytes::{hex_digests, to_hex},
    hash::NodeHasher,
    index::{check_leaf_node, parent, sibling},
    proof::node_at,
    Digest, Error, Result,
};

/// Largest encoded multiproof accepted by
/// [`decode_from_slice`](MultiProof::decode_from_slice).
const MAX_DECODED_SIZE: usize = 100 * 1024 * 1024;

/// A proof that several leaves belong to one tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
#[serde(rename_all = "camelCase")]
pub struct MultiProof {
    /// Digests of the proved leaves, in the order the reduction consumes
    /// them (deepest tree position first).
    #[serde(with = "hex_digests")]
    pub leaves: Vec<Digest>,
    /// Sibling digests that are not derivable from `leaves`.
    #[serde(with = "hex_digests")]
    pub proof: Vec<Digest>,
    /// One flag per hashing step: `true` combines two queued values,
    /// `false` combines a queued value with the next `proof` element.
    pub proof_flags: Vec<bool>,
}

impl MultiProof {
    /// Whether the element counts allow a reduction to exactly one root:
    /// `leaves + proof == flags + 1`.
    pub fn is_balanced(&self) -> bool {
        self.leaves.len() + self.proof.len() == self.proof_flags.len() + 1
    }

    /// Encode to bytes using bincode.
    pub fn encode_to_vec(&self) -> Result<Vec<u8>> {
        let config = bincode::config::standard()
            .with_big_endian()
            .with_no_limit();
        bincode::encode_to_vec(self, config)
            .map_err(|e| Error::Serialization(format!("encode error: {}", e)))
    }

    /// Decode from bytes using bincode.
    ///
    /// Only the encoding is checked here; use
    /// [`process_multi_proof`] to check the shape.
    pub fn decode_from_slice(bytes: &[u8]) -> Result<Self> {
        let config = bincode::config::standard()
            .with_big_endian()
            .with_limit::<MAX_DECODED_SIZE>();
        let (proof, read): (Self, usize) = bincode::decode_from_slice(bytes, config)
            .map_err(|e| Error::Serialization(format!("decode error: {}", e)))?;
        if read != bytes.len() {
            return Err(Error::Serialization(format!(
                "{} trailing bytes after multiproof",
                bytes.len() - read
            )));
        }
        Ok(proof)
    }
}

/// Build a multiproof for the leaves at tree positions `indices`.
///
/// Positions may be given in any order; they are visited deepest first.
pub fn get_multi_proof(tree: &[Digest], indices: &[usize]) -> Result<MultiProof> {
    if indices.is_empty() {
        return Err(Error::EmptyTargetSet);
    }
    for &index in indices {
        check_leaf_node(tree.len(), index)?;
    }

    let mut sorted = indices.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    if let Some(pair) = sorted.windows(2).find(|pair| pair[0] == pair[1]) {
        return Err(Error::DuplicateIndex(pair[0]));
    }

    let mut queue: VecDeque<usize> = sorted.iter().copied().collect();
    let mut proof = Vec::new();
    let mut proof_flags = Vec::new();

    while let Some(&head) = queue.front() {
        if head == 0 {
            break;
        }
        queue.pop_front();
        let s = sibling(head)?;
        let p = parent(head)?;

        if queue.front() == Some(&s) {
            proof_flags.push(true);
            queue.pop_front();
        } else {
            proof_flags.push(false);
            proof.push(node_at(tree, s)?);
        }
        queue.push_back(p);
    }

    let multiproof = MultiProof {
        leaves: sorted.iter().map(|&i| tree[i]).collect(),
        proof,
        proof_flags,
    };
    trace!(
        leaves = multiproof.leaves.len(),
        proof = multiproof.proof.len(),
        flags = multiproof.proof_flags.len(),
        "generated multiproof"
    );
    Ok(multiproof)
}

/// Replay a multiproof and return the root it implies.
pub fn process_multi_proof<H: NodeHasher + ?Sized>(
    multiproof: &MultiProof,
    hasher: &H,
) -> Result<Digest> {
    if !multiproof.is_balanced() {
        return Err(Error::MalformedMultiProof(format!(
            "{} leaves and {} proof elements cannot be reduced with {} flags",
            multiproof.leaves.len(),
            multiproof.proof.len(),
            multiproof.proof_flags.len()
        )));
    }

    let mut queue: VecDeque<Digest> = multiproof.leaves.iter().copied().collect();
    let mut proof = multiproof.proof.iter();

    for (step, &flag) in multiproof.proof_flags.iter().enumerate() {
        let a = queue.pop_front().ok_or_else(|| {
            Error::MalformedMultiProof(format!("queue exhausted at step {}", step))
        })?;
        let b = if flag {
            queue.pop_front().ok_or_else(|| {
                Error::MalformedMultiProof(format!("no second queued value at step {}", step))
            })?
        } else {
            *proof.next().ok_or_else(|| {
                Error::MalformedMultiProof(format!("proof exhausted at step {}", step))
            })?
        };
        queue.push_back(hasher.hash_node(&a, &b));
    }

    match (queue.len(), proof.as_slice()) {
        (1, []) => Ok(queue[0]),
        (0, [root]) => Ok(*root),
        (queued, rest) => Err(Error::MalformedMultiProof(format!(
            "{} values remain after reduction ({} queued, {} proof)",
            queued + rest.len(),
            queued,
            rest.len()
        ))),
    }
}

impl std::fmt::Display for MultiProof {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "leaves:")?;
        for leaf in &self.leaves {
            writeln!(f, "  {}", to_hex(leaf))?;
        }
        writeln!(f, "proof:")?;
        for node in &self.proof {
            writeln!(f, "  {}", to_hex(node))?;
        }
        write!(f, "flags: {:?}", self.proof_flags)
    }
}
