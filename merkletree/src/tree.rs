use std::collections::HashMap;

use tracing::{debug, warn};

use crate::{
    builder::{prepare_merkle_tree, ValueRecord},
    bytes::{to_hex, LeafValue},
    dump::DumpFormat,
    error::Violation,
    hash::{leaf_hash, LeafHashing, NodeHasher, StandardNodeHasher},
    index::is_leaf_node,
    multiproof::{get_multi_proof, MultiProof},
    options::TreeOptions,
    proof::{get_proof, process_proof, tree_violations, Proof},
    verify::verify_multi_proof_with,
    Digest, Error, Result,
};

/// Names a committed leaf, either by its position in the input values or
/// by the value itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeafRef<T> {
    /// Index into the values as they were supplied at construction.
    Index(usize),
    /// A value, located by its leaf hash.
    Value(T),
}

/// An immutable Merkle tree over values of type `T`.
///
/// Built once from a set of values and never modified. All read operations
/// take `&self`, so a tree may be shared between threads behind an `Arc`.
///
/// Trees built with [`MerkleTree::new`] use [`StandardNodeHasher`] and
/// dump as `standard-v1`; trees built with [`MerkleTree::with_hasher`]
/// dump as `simple-v1`.
#[derive(Debug, Clone)]
pub struct MerkleTree<T, H = StandardNodeHasher> {
    tree: Vec<Digest>,
    values: Vec<ValueRecord<T>>,
    hash_lookup: HashMap<Digest, usize>,
    options: TreeOptions,
    hasher: H,
    format: DumpFormat,
}

impl<T: LeafValue> MerkleTree<T> {
    /// Build a tree over `values` with the standard Keccak-256 node hash.
    pub fn new(values: Vec<T>, options: TreeOptions) -> Result<Self> {
        Self::build(values, options, StandardNodeHasher, DumpFormat::Standard)
    }
}

impl<T: LeafValue, H: NodeHasher> MerkleTree<T, H> {
    /// Build a tree over `values` combining nodes with `hasher`.
    pub fn with_hasher(values: Vec<T>, options: TreeOptions, hasher: H) -> Result<Self> {
        Self::build(values, options, hasher, DumpFormat::Simple)
    }

    fn build(values: Vec<T>, options: TreeOptions, hasher: H, format: DumpFormat) -> Result<Self> {
        let leaf_hashing = options.leaf_hashing;
        let (tree, values) = prepare_merkle_tree(
            values,
            options.sort_leaves,
            |value| hash_value(value, leaf_hashing),
            &hasher,
        )?;
        debug!(hasher = hasher.kind(), format = %format, "merkle tree ready");
        Self::from_parts(tree, values, options, hasher, format)
    }

    /// Assemble a tree from already computed parts, indexing leaf hashes.
    ///
    /// Fails if a record points outside the tree or two records share a
    /// leaf digest.
    pub(crate) fn from_parts(
        tree: Vec<Digest>,
        values: Vec<ValueRecord<T>>,
        options: TreeOptions,
        hasher: H,
        format: DumpFormat,
    ) -> Result<Self> {
        let mut hash_lookup = HashMap::with_capacity(values.len());
        for (value_index, record) in values.iter().enumerate() {
            let digest = tree
                .get(record.tree_index())
                .ok_or(Error::TreeIndexOutOfRange {
                    index: record.tree_index(),
                    len: tree.len(),
                })?;
            if let Some(first) = hash_lookup.insert(*digest, value_index) {
                return Err(Error::DuplicateLeaf {
                    first,
                    second: value_index,
                });
            }
        }

        Ok(Self {
            tree,
            values,
            hash_lookup,
            options,
            hasher,
            format,
        })
    }

    /// The root digest.
    pub fn root(&self) -> Digest {
        self.tree[0]
    }

    /// The root digest as `0x` hex.
    pub fn root_hex(&self) -> String {
        to_hex(&self.root())
    }

    /// Number of committed values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always `false`: a tree holds at least one value.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Committed values in input order, with their leaf positions.
    pub fn values(&self) -> &[ValueRecord<T>] {
        &self.values
    }

    /// The flat node array, root first.
    pub fn tree(&self) -> &[Digest] {
        &self.tree
    }

    /// Options the tree was built with.
    pub fn options(&self) -> &TreeOptions {
        &self.options
    }

    /// Node hasher the tree combines children with.
    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    pub(crate) fn format(&self) -> DumpFormat {
        self.format
    }

    /// Leaf digest of `value` under this tree's leaf hashing mode.
    pub fn leaf_hash(&self, value: &T) -> Result<Digest> {
        hash_value(value, self.options.leaf_hashing)
    }

    /// Inclusion proof for one committed value.
    pub fn get_proof(&self, leaf: LeafRef<T>) -> Result<Proof> {
        let value_index = self.resolve(&leaf)?;
        let tree_index = self.validate_value_at(value_index)?;
        get_proof(&self.tree, tree_index)
    }

    /// One multiproof covering every referenced value.
    pub fn get_multi_proof(&self, leaves: &[LeafRef<T>]) -> Result<MultiProof> {
        let tree_indices = leaves
            .iter()
            .map(|leaf| {
                let value_index = self.resolve(leaf)?;
                self.validate_value_at(value_index)
            })
            .collect::<Result<Vec<_>>>()?;
        get_multi_proof(&self.tree, &tree_indices)
    }

    /// Whether `proof` links `leaf` to this tree's root.
    ///
    /// A leaf given by value need not be in the tree; it simply fails to
    /// verify if it is not.
    pub fn verify(&self, leaf: LeafRef<T>, proof: &[Digest]) -> bool {
        let digest = match &leaf {
            LeafRef::Index(index) => match self.values.get(*index) {
                Some(record) => self.leaf_hash(record.value()),
                None => Err(Error::IndexOutOfRange {
                    index: *index,
                    len: self.values.len(),
                }),
            },
            LeafRef::Value(value) => self.leaf_hash(value),
        };

        match digest {
            Ok(digest) => {
                let computed = process_proof(&digest, proof, &self.hasher);
                let verified = computed == self.root();
                if !verified {
                    warn!(
                        computed = %to_hex(&computed),
                        root = %self.root_hex(),
                        "proof does not match the root"
                    );
                }
                verified
            }
            Err(e) => {
                warn!(error = %e, "cannot hash leaf for verification");
                false
            }
        }
    }

    /// Whether `multiproof` reduces to this tree's root.
    ///
    /// A multiproof with no leaves never verifies.
    pub fn verify_multi_proof(&self, multiproof: &MultiProof) -> bool {
        verify_multi_proof_with(&self.root(), multiproof, &self.hasher)
    }

    /// Re-check every stored value against its leaf and every internal node
    /// against its children.
    ///
    /// All problems found are reported together in
    /// [`Error::ValidationFailed`].
    pub fn validate(&self) -> Result<()> {
        let mut violations = Vec::new();
        for (value_index, record) in self.values.iter().enumerate() {
            let tree_index = record.tree_index();
            if !is_leaf_node(self.tree.len(), tree_index) {
                violations.push(Violation::ValueIndexInvalid {
                    value_index,
                    tree_index,
                });
                continue;
            }
            match self.leaf_hash(record.value()) {
                Ok(digest) if digest == self.tree[tree_index] => {}
                Ok(_) => violations.push(Violation::ValueHashMismatch {
                    value_index,
                    tree_index,
                }),
                Err(e) => violations.push(Violation::ValueUnencodable {
                    value_index,
                    reason: e.to_string(),
                }),
            }
        }
        violations.extend(tree_violations(&self.tree, &self.hasher));

        if violations.is_empty() {
            Ok(())
        } else {
            warn!(count = violations.len(), "merkle tree failed validation");
            Err(Error::ValidationFailed(violations))
        }
    }

    fn resolve(&self, leaf: &LeafRef<T>) -> Result<usize> {
        match leaf {
            LeafRef::Index(index) if *index < self.values.len() => Ok(*index),
            LeafRef::Index(index) => Err(Error::IndexOutOfRange {
                index: *index,
                len: self.values.len(),
            }),
            LeafRef::Value(value) => {
                let digest = self.leaf_hash(value)?;
                self.hash_lookup
                    .get(&digest)
                    .copied()
                    .ok_or(Error::ValueNotFound)
            }
        }
    }

    /// Check the value at `value_index` still hashes to its leaf and return
    /// the leaf's tree position.
    fn validate_value_at(&self, value_index: usize) -> Result<usize> {
        let record = &self.values[value_index];
        let tree_index = record.tree_index();
        let expected = self.leaf_hash(record.value())?;
        let actual = self
            .tree
            .get(tree_index)
            .ok_or(Error::TreeIndexOutOfRange {
                index: tree_index,
                len: self.tree.len(),
            })?;
        if expected != *actual {
            return Err(Error::HashMismatch {
                value_index,
                expected: to_hex(&expected),
                actual: to_hex(actual),
            });
        }
        Ok(tree_index)
    }
}

pub(crate) fn hash_value<T: LeafValue>(value: &T, leaf_hashing: LeafHashing) -> Result<Digest> {
    Ok(leaf_hash(&value.to_leaf_bytes()?, leaf_hashing))
}
