//! Tree construction options.

use serde::{Deserialize, Serialize};

use crate::hash::LeafHashing;

/// Construction options for a [`MerkleTree`](crate::MerkleTree).
///
/// Defaults: leaves are sorted, leaves are hashed once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TreeOptions {
    /// Sort leaves by digest before building. Makes the root independent of
    /// input order, which multiproofs rely on.
    pub sort_leaves: bool,

    /// Leaf hashing scheme.
    pub leaf_hashing: LeafHashing,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            sort_leaves: true,
            leaf_hashing: LeafHashing::Single,
        }
    }
}

impl TreeOptions {
    /// Set whether leaves are sorted before building.
    pub fn with_sort_leaves(mut self, sort_leaves: bool) -> Self {
        self.sort_leaves = sort_leaves;
        self
    }

    /// Set the leaf hashing scheme.
    pub fn with_leaf_hashing(mut self, leaf_hashing: LeafHashing) -> Self {
        self.leaf_hashing = leaf_hashing;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = TreeOptions::default();
        assert!(options.sort_leaves);
        assert_eq!(options.leaf_hashing, LeafHashing::Single);
    }

    #[test]
    fn test_options_from_json() {
        let options: TreeOptions =
            serde_json::from_str(r#"{"sortLeaves": false, "leafHashing": "double"}"#).unwrap();
        assert!(!options.sort_leaves);
        assert_eq!(options.leaf_hashing, LeafHashing::Double);

        // missing fields fall back to defaults
        let options: TreeOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, TreeOptions::default());
    }

    #[test]
    fn test_builder_methods() {
        let options = TreeOptions::default()
            .with_sort_leaves(false)
            .with_leaf_hashing(LeafHashing::Double);
        assert!(!options.sort_leaves);
        assert_eq!(options.leaf_hashing, LeafHashing::Double);
    }
}
