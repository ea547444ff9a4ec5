use std::{env, fs, path::PathBuf};

use merkletree::{bytes::to_hex, verify, BytesLike, LeafRef, MerkleTree, TreeOptions};
use tracing::info;

const DEFAULT_OUTPUT: &str = "tmp/merkle_tree.json";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let output = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

    // Values can be plain text or 0x-prefixed hex
    let values: Vec<BytesLike> = ["ciao", "0x2222", "0x3333", "0x4444"]
        .into_iter()
        .map(BytesLike::from)
        .collect();

    let tree = MerkleTree::new(values, TreeOptions::default()).expect("build merkle tree");
    println!("Root: {}", tree.root_hex());

    // Prove a single value
    let leaf = BytesLike::from("0x3333");
    let proof = tree
        .get_proof(LeafRef::Value(leaf.clone()))
        .expect("proof for 0x3333");
    println!("Proof for 0x3333:");
    for node in &proof {
        println!("  {}", to_hex(node));
    }

    // Anyone holding only the root can check it
    let verified = verify(&tree.root(), &leaf, &proof);
    println!("Verified: {}", verified);
    let forged = verify(&tree.root(), &BytesLike::from("0x9999"), &proof);
    println!("Verified 0x9999 with the same proof: {}", forged);

    // Prove two values at once
    let multiproof = tree
        .get_multi_proof(&[LeafRef::Index(0), LeafRef::Index(3)])
        .expect("multiproof");
    println!(
        "Multiproof: {}",
        serde_json::to_string_pretty(&multiproof).expect("multiproof json")
    );
    println!("Multiproof verified: {}", tree.verify_multi_proof(&multiproof));

    // Dump to disk and load it back
    if let Some(dir) = output.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir).expect("create output directory");
    }
    fs::write(&output, tree.to_json().expect("dump tree")).expect("write dump");
    info!(path = %output.display(), "wrote merkle tree dump");

    let json = fs::read_to_string(&output).expect("read dump");
    let loaded =
        MerkleTree::<BytesLike>::from_json(&json, TreeOptions::default()).expect("load dump");
    assert_eq!(loaded.root(), tree.root());
    println!("Reloaded root: {}", loaded.root_hex());
}
