//! Serializable snapshot of a [`MerkleTree`].
//!
//! ```json
//! {
//!   "format": "standard-v1",
//!   "tree": ["0x..", "0x..", "0x.."],
//!   "values": [{ "value": "ciao", "treeIndex": 2 }]
//! }
//! ```
//!
//! Trees with a pluggable node hasher dump as `simple-v1` and also carry
//! `"hash": "custom"`. Loading recomputes nothing from scratch: it checks
//! that every value still hashes to its leaf and that the stored tree is
//! internally consistent, then adopts the stored nodes as they are.

use std::{fmt, str::FromStr};

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::{
    builder::ValueRecord,
    bytes::{digest_from_hex, to_hex, LeafValue},
    hash::{NodeHasher, StandardNodeHasher},
    index::is_leaf_node,
    options::TreeOptions,
    proof::tree_violations,
    tree::{hash_value, MerkleTree},
    Digest, Error, Result,
};

/// Value of the `hash` field in `simple-v1` dumps.
const CUSTOM_HASH: &str = "custom";

/// Dump format tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DumpFormat {
    /// Tree built with a caller-supplied node hasher.
    Simple,
    /// Tree built with the standard Keccak-256 node hasher.
    Standard,
}

impl DumpFormat {
    /// Name written to the dump's `format` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            DumpFormat::Simple => "simple-v1",
            DumpFormat::Standard => "standard-v1",
        }
    }
}

impl fmt::Display for DumpFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DumpFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "simple-v1" => Ok(DumpFormat::Simple),
            "standard-v1" => Ok(DumpFormat::Standard),
            other => Err(Error::UnknownFormat(other.to_owned())),
        }
    }
}

/// One committed value and its leaf position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DumpedValue<T> {
    /// The original value.
    pub value: T,
    /// Leaf position holding its digest.
    pub tree_index: usize,
}

/// Serializable form of a [`MerkleTree`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeDump<T> {
    /// `simple-v1` or `standard-v1`.
    pub format: String,
    /// Node digests as `0x` hex, root first.
    pub tree: Vec<String>,
    /// Values in input order.
    pub values: Vec<DumpedValue<T>>,
    /// Node hash tag, `simple-v1` only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
}

impl<T: LeafValue, H: NodeHasher> MerkleTree<T, H> {
    /// Snapshot this tree.
    pub fn dump(&self) -> TreeDump<T> {
        let format = self.format();
        TreeDump {
            format: format.as_str().to_owned(),
            tree: self.tree().iter().map(|node| to_hex(node)).collect(),
            values: self
                .values()
                .iter()
                .map(|record| DumpedValue {
                    value: record.value().clone(),
                    tree_index: record.tree_index(),
                })
                .collect(),
            hash: match format {
                DumpFormat::Simple => Some(CUSTOM_HASH.to_owned()),
                DumpFormat::Standard => None,
            },
        }
    }

    /// Load a `simple-v1` dump, combining nodes with `hasher`.
    ///
    /// `hasher` must be the one the tree was built with; a different hasher
    /// makes the stored tree fail the consistency check.
    pub fn load_with_hasher(dump: TreeDump<T>, options: TreeOptions, hasher: H) -> Result<Self> {
        load_dump(dump, options, hasher, DumpFormat::Simple)
    }
}

impl<T: LeafValue> MerkleTree<T> {
    /// Load a `standard-v1` dump.
    pub fn load(dump: TreeDump<T>, options: TreeOptions) -> Result<Self> {
        load_dump(dump, options, StandardNodeHasher, DumpFormat::Standard)
    }
}

impl<T: LeafValue + DeserializeOwned> MerkleTree<T> {
    /// Parse and load a `standard-v1` JSON dump.
    pub fn from_json(json: &str, options: TreeOptions) -> Result<Self> {
        let dump: TreeDump<T> =
            serde_json::from_str(json).map_err(|e| Error::Serialization(e.to_string()))?;
        Self::load(dump, options)
    }
}

impl<T: LeafValue + DeserializeOwned, H: NodeHasher> MerkleTree<T, H> {
    /// Parse and load a `simple-v1` JSON dump.
    pub fn from_json_with_hasher(json: &str, options: TreeOptions, hasher: H) -> Result<Self> {
        let dump: TreeDump<T> =
            serde_json::from_str(json).map_err(|e| Error::Serialization(e.to_string()))?;
        Self::load_with_hasher(dump, options, hasher)
    }
}

impl<T: LeafValue + Serialize, H: NodeHasher> MerkleTree<T, H> {
    /// Pretty-printed JSON dump.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.dump()).map_err(|e| Error::Serialization(e.to_string()))
    }
}

fn load_dump<T, H>(
    dump: TreeDump<T>,
    options: TreeOptions,
    hasher: H,
    expected: DumpFormat,
) -> Result<MerkleTree<T, H>>
where
    T: LeafValue,
    H: NodeHasher,
{
    let format: DumpFormat = dump.format.parse()?;
    if format != expected {
        return Err(Error::InvalidDump(format!(
            "expected format {}, found {}",
            expected, format
        )));
    }
    if format == DumpFormat::Simple && dump.hash.as_deref() != Some(CUSTOM_HASH) {
        return Err(Error::InvalidDump(format!(
            "{} dumps must declare hash '{}', found {:?}",
            format, CUSTOM_HASH, dump.hash
        )));
    }
    if dump.values.is_empty() {
        return Err(Error::EmptyInput);
    }

    let tree = dump
        .tree
        .iter()
        .map(|node| digest_from_hex(node))
        .collect::<Result<Vec<Digest>>>()?;
    if dump.values.len() * 2 - 1 != tree.len() {
        return Err(Error::InvalidDump(format!(
            "{} values need {} nodes, found {}",
            dump.values.len(),
            dump.values.len() * 2 - 1,
            tree.len()
        )));
    }

    let mut values = Vec::with_capacity(dump.values.len());
    for (value_index, DumpedValue { value, tree_index }) in dump.values.into_iter().enumerate() {
        if !is_leaf_node(tree.len(), tree_index) {
            return Err(Error::InvalidDump(format!(
                "value {} points at tree index {} which is not a leaf",
                value_index, tree_index
            )));
        }
        let leaf = hash_value(&value, options.leaf_hashing)?;
        if leaf != tree[tree_index] {
            return Err(Error::HashMismatch {
                value_index,
                expected: to_hex(&leaf),
                actual: to_hex(&tree[tree_index]),
            });
        }
        values.push(ValueRecord::new(value, tree_index));
    }

    let violations = tree_violations(&tree, &hasher);
    if !violations.is_empty() {
        return Err(Error::ValidationFailed(violations));
    }

    debug!(
        format = %format,
        values = values.len(),
        root = %to_hex(&tree[0]),
        "loaded merkle tree"
    );
    MerkleTree::from_parts(tree, values, options, hasher, format)
}
