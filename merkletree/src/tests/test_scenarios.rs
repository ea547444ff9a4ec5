use std::{sync::Arc, thread};

use assert_matches::assert_matches;

use crate::{
    bytes::{to_hex, BytesLike},
    hash::{keccak256, leaf_hash, standard_node_hash},
    index::is_leaf_node,
    is_valid_merkle_tree, verify, verify_multi_proof, Error, LeafHashing, LeafRef, MerkleTree,
    StandardNodeHasher, TreeOptions,
};

fn sample_values() -> Vec<BytesLike> {
    ["ciao", "0x2222", "0x3333", "0x4444"]
        .into_iter()
        .map(BytesLike::from)
        .collect()
}

fn sample() -> MerkleTree<BytesLike> {
    MerkleTree::new(sample_values(), TreeOptions::default()).unwrap()
}

#[test]
fn test_sample_tree_shape() {
    let tree = sample();
    assert_eq!(tree.tree().len(), 7);
    assert_eq!(tree.len(), 4);
    assert!(!tree.is_empty());
    assert_eq!(tree.root(), sample().root());
    assert!(tree.root_hex().starts_with("0x"));
    assert_eq!(tree.root_hex().len(), 66);

    for record in tree.values() {
        assert!(is_leaf_node(tree.tree().len(), record.tree_index()));
    }
    // leaves are sorted, so the first value need not sit in the first leaf
    let leaves = &tree.tree()[3..];
    assert!(leaves.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn test_sample_leaves_use_canonical_bytes() {
    let tree = sample();
    let expected = [
        keccak256(b"ciao"),
        keccak256(&[0x22, 0x22]),
        keccak256(&[0x33, 0x33]),
        keccak256(&[0x44, 0x44]),
    ];
    for (record, expected) in tree.values().iter().zip(expected) {
        assert_eq!(tree.tree()[record.tree_index()], expected);
    }
}

#[test]
fn test_sample_proof_and_verify() {
    let tree = sample();
    let proof = tree.get_proof(LeafRef::Value("0x3333".into())).unwrap();
    assert_eq!(proof.len(), 2);
    assert!(tree.verify(LeafRef::Value("0x3333".into()), &proof));
    assert!(verify(&tree.root(), &BytesLike::from("0x3333"), &proof));

    assert!(!tree.verify(LeafRef::Value("0x9999".into()), &proof));
    assert!(!verify(&tree.root(), &BytesLike::from("0x9999"), &proof));
}

#[test]
fn test_root_is_hand_computable() {
    let tree = sample();
    let mut leaves: Vec<_> = sample_values()
        .iter()
        .map(|v| leaf_hash(&v.to_bytes().unwrap(), LeafHashing::Single))
        .collect();
    leaves.sort();
    let left = standard_node_hash(&leaves[0], &leaves[1]);
    let right = standard_node_hash(&leaves[2], &leaves[3]);
    assert_eq!(tree.root(), standard_node_hash(&left, &right));
}

#[test]
fn test_single_value_tree() {
    let tree = MerkleTree::new(vec!["only"], TreeOptions::default()).unwrap();
    assert_eq!(tree.tree(), &[keccak256(b"only")]);
    assert_eq!(tree.root(), keccak256(b"only"));

    let proof = tree.get_proof(LeafRef::Index(0)).unwrap();
    assert!(proof.is_empty());
    assert!(tree.verify(LeafRef::Value("only"), &proof));
    assert!(!tree.verify(LeafRef::Value("other"), &proof));

    let multiproof = tree.get_multi_proof(&[LeafRef::Index(0)]).unwrap();
    assert!(multiproof.proof.is_empty());
    assert!(multiproof.proof_flags.is_empty());
    assert!(tree.verify_multi_proof(&multiproof));
}

#[test]
fn test_empty_input() {
    assert_matches!(
        MerkleTree::<BytesLike>::new(vec![], TreeOptions::default()),
        Err(Error::EmptyInput)
    );
}

#[test]
fn test_invalid_hex_value() {
    assert_matches!(
        MerkleTree::new(vec!["0x12", "0xgg"], TreeOptions::default()),
        Err(Error::InvalidHex(_))
    );
}

#[test]
fn test_sorting_makes_root_order_independent() {
    let mut shuffled = sample_values();
    shuffled.swap(1, 2);
    let a = MerkleTree::new(sample_values(), TreeOptions::default()).unwrap();
    let b = MerkleTree::new(shuffled.clone(), TreeOptions::default()).unwrap();
    assert_eq!(a.root(), b.root());

    // moving a value into the other subtree changes an unsorted root
    let unsorted = TreeOptions::default().with_sort_leaves(false);
    let c = MerkleTree::new(sample_values(), unsorted).unwrap();
    let d = MerkleTree::new(shuffled, unsorted).unwrap();
    assert_ne!(c.root(), d.root());
    // without sorting leaves follow input order
    let indices: Vec<usize> = c.values().iter().map(|r| r.tree_index()).collect();
    assert_eq!(indices, vec![3, 4, 5, 6]);
}

#[test]
fn test_multi_proof_over_all_leaves_has_no_proof() {
    let tree = MerkleTree::new(
        (0u8..11).map(|i| vec![i]).collect::<Vec<_>>(),
        TreeOptions::default(),
    )
    .unwrap();
    let refs: Vec<LeafRef<Vec<u8>>> = (0..11).map(LeafRef::Index).collect();
    let multiproof = tree.get_multi_proof(&refs).unwrap();
    assert!(multiproof.proof.is_empty());
    assert_eq!(multiproof.proof_flags.len(), 10);
    assert!(multiproof.proof_flags.iter().all(|flag| *flag));
    assert!(verify_multi_proof(&tree.root(), &multiproof));
}

#[test]
fn test_unsorted_multi_proof_at_uneven_depths() {
    let unsorted = TreeOptions::default().with_sort_leaves(false);
    for n in [5u8, 7] {
        let tree = MerkleTree::new((0..n).map(|i| vec![i]).collect::<Vec<_>>(), unsorted).unwrap();
        for a in 0..n as usize {
            for b in a + 1..n as usize {
                let multiproof = tree
                    .get_multi_proof(&[LeafRef::Index(a), LeafRef::Index(b)])
                    .unwrap();
                assert!(multiproof.is_balanced());
                assert!(
                    verify_multi_proof(&tree.root(), &multiproof),
                    "n={} pair=({}, {})",
                    n,
                    a,
                    b
                );
            }
        }
    }
}

#[test]
fn test_multi_proof_json_and_binary() {
    let tree = sample();
    let multiproof = tree
        .get_multi_proof(&[LeafRef::Value("ciao".into()), LeafRef::Value("0x2222".into())])
        .unwrap();

    let json = serde_json::to_string(&multiproof).unwrap();
    assert!(json.contains("\"proofFlags\""));
    assert!(json.contains(&to_hex(&multiproof.leaves[0])));
    let from_json: crate::MultiProof = serde_json::from_str(&json).unwrap();
    assert_eq!(multiproof, from_json);

    let bytes = multiproof.encode_to_vec().unwrap();
    let decoded = crate::MultiProof::decode_from_slice(&bytes).unwrap();
    assert!(tree.verify_multi_proof(&decoded));
}

#[test]
fn test_corrupted_tree_is_invalid() {
    let tree = sample();
    assert!(is_valid_merkle_tree(tree.tree(), &StandardNodeHasher));
    assert!(tree.validate().is_ok());

    let mut nodes = tree.tree().to_vec();
    nodes[1][31] ^= 1;
    assert!(!is_valid_merkle_tree(&nodes, &StandardNodeHasher));
}

#[test]
fn test_tree_is_shared_across_threads() {
    let tree = Arc::new(sample());
    let handles: Vec<_> = ["ciao", "0x2222", "0x3333", "0x4444"]
        .into_iter()
        .map(|value| {
            let tree = Arc::clone(&tree);
            thread::spawn(move || {
                let proof = tree.get_proof(LeafRef::Value(value.into())).unwrap();
                tree.verify(LeafRef::Value(value.into()), &proof)
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap());
    }
}
