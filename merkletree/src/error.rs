use std::fmt;

use thiserror::Error;

/// Alias for `core::result::Result<T, Error>`.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors from Merkle tree construction, proof generation and loading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// A tree needs at least one value.
    #[error("cannot build a merkle tree with no values")]
    EmptyInput,
    /// A `0x` string that is not valid hex.
    #[error("invalid hex string: {0}")]
    InvalidHex(String),
    /// A dump `format` other than `standard-v1` or `simple-v1`.
    #[error("unknown dump format: '{0}'")]
    UnknownFormat(String),
    /// A dump that is not consistent with its own format.
    #[error("invalid dump: {0}")]
    InvalidDump(String),
    /// JSON or binary encoding failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Asked for the parent of position 0.
    #[error("the root has no parent")]
    RootHasNoParent,
    /// Asked for the sibling of position 0.
    #[error("the root has no sibling")]
    RootHasNoSibling,
    /// A position that is not among the last `n` of the tree.
    #[error("index {0} is not a leaf")]
    NotALeaf(usize),
    /// A position past the end of the node array.
    #[error("tree index {index} is out of range (tree length {len})")]
    TreeIndexOutOfRange {
        /// Requested position.
        index: usize,
        /// Number of nodes in the tree.
        len: usize,
    },
    /// A value index past the end of the value list.
    #[error("value index {index} is out of range ({len} values)")]
    IndexOutOfRange {
        /// Requested value index.
        index: usize,
        /// Number of values in the tree.
        len: usize,
    },
    /// The same leaf requested twice in one multiproof.
    #[error("cannot prove duplicated index {0}")]
    DuplicateIndex(usize),

    /// A digest that is not exactly 32 bytes.
    #[error("merkle tree nodes must be 32 bytes, got {len}")]
    InvalidMerkleNode {
        /// Length actually found.
        len: usize,
    },
    /// A loaded value that does not hash to its leaf.
    #[error("stored value {value_index} hashes to {expected}, tree holds {actual}")]
    HashMismatch {
        /// Position of the value in input order.
        value_index: usize,
        /// Hex digest the value hashes to.
        expected: String,
        /// Hex digest stored at its leaf.
        actual: String,
    },
    /// Two values that hash to the same leaf.
    #[error("values {first} and {second} produce the same leaf hash")]
    DuplicateLeaf {
        /// Earlier value index.
        first: usize,
        /// Later value index.
        second: usize,
    },
    /// A tree audit found one or more inconsistencies.
    #[error("merkle tree failed validation: {}", join_violations(.0))]
    ValidationFailed(Vec<Violation>),

    /// A multiproof over no leaves.
    #[error("cannot generate a multiproof for an empty set of leaves")]
    EmptyTargetSet,
    /// A multiproof whose flags, leaves and proof do not line up.
    #[error("malformed multiproof: {0}")]
    MalformedMultiProof(String),

    /// The value is not committed to the tree.
    #[error("value not found in the merkle tree")]
    ValueNotFound,
}

/// Coarse classification of [`Error`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad caller input: empty value set, malformed encodings, bad dumps.
    Input,
    /// Out-of-range or misplaced tree positions.
    Index,
    /// A digest or tree that does not hold together.
    Integrity,
    /// A multiproof whose shape does not reduce to a single root.
    Proof,
    /// A value absent from the tree.
    NotFound,
}

impl Error {
    /// Which family this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        use Error::*;
        match self {
            EmptyInput | InvalidHex(_) | UnknownFormat(_) | InvalidDump(_) | Serialization(_) => {
                ErrorKind::Input
            }
            RootHasNoParent
            | RootHasNoSibling
            | NotALeaf(_)
            | TreeIndexOutOfRange { .. }
            | IndexOutOfRange { .. }
            | DuplicateIndex(_) => ErrorKind::Index,
            InvalidMerkleNode { .. }
            | HashMismatch { .. }
            | DuplicateLeaf { .. }
            | ValidationFailed(_) => ErrorKind::Integrity,
            EmptyTargetSet | MalformedMultiProof(_) => ErrorKind::Proof,
            ValueNotFound => ErrorKind::NotFound,
        }
    }
}

/// A single inconsistency found while auditing a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// The stored value at `value_index` no longer hashes to the digest at
    /// `tree_index`.
    ValueHashMismatch {
        /// Position of the value in input order.
        value_index: usize,
        /// Leaf the value points at.
        tree_index: usize,
    },
    /// A value record points outside the tree or at an internal node.
    ValueIndexInvalid {
        /// Position of the value in input order.
        value_index: usize,
        /// Position the value points at.
        tree_index: usize,
    },
    /// The stored value could not be encoded.
    ValueUnencodable {
        /// Position of the value in input order.
        value_index: usize,
        /// Why encoding failed.
        reason: String,
    },
    /// Internal node `index` differs from the hash of its children.
    NodeHashMismatch {
        /// Position of the internal node.
        index: usize,
    },
    /// The tree holds no nodes at all.
    EmptyTree,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::ValueHashMismatch {
                value_index,
                tree_index,
            } => write!(
                f,
                "value {} does not match leaf at tree index {}",
                value_index, tree_index
            ),
            Violation::ValueIndexInvalid {
                value_index,
                tree_index,
            } => write!(
                f,
                "value {} points at tree index {} which is not a leaf",
                value_index, tree_index
            ),
            Violation::ValueUnencodable {
                value_index,
                reason,
            } => write!(f, "value {} cannot be encoded: {}", value_index, reason),
            Violation::NodeHashMismatch { index } => {
                write!(f, "node {} does not match the hash of its children", index)
            }
            Violation::EmptyTree => write!(f, "tree is empty"),
        }
    }
}

fn join_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
