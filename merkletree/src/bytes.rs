//! Canonical byte encoding of leaf values.
//!
//! Every value committed to a tree goes through [`LeafValue::to_leaf_bytes`]
//! exactly once before hashing. Strings prefixed with `0x` are decoded as
//! hex; any other string contributes its UTF-8 bytes.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::{Digest, Error, Result};

/// A value that can be committed as a Merkle leaf.
///
/// Implementors must encode deterministically and losslessly: two values that
/// compare equal must produce the same bytes.
pub trait LeafValue: Clone + PartialEq {
    /// Encode this value to its canonical byte sequence.
    fn to_leaf_bytes(&self) -> Result<Vec<u8>>;
}

/// Loosely typed leaf input: raw bytes or a (hex or plain) string.
///
/// Serializes untagged, so JSON dumps hold either an array of small integers
/// or a string, exactly as the caller supplied the value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BytesLike {
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// `0x`-prefixed hex, or arbitrary text.
    Text(String),
}

impl BytesLike {
    /// Canonical bytes for this value.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        match self {
            BytesLike::Bytes(bytes) => Ok(bytes.clone()),
            BytesLike::Text(text) => str_to_bytes(text),
        }
    }
}

impl From<&str> for BytesLike {
    fn from(value: &str) -> Self {
        BytesLike::Text(value.to_owned())
    }
}

impl From<String> for BytesLike {
    fn from(value: String) -> Self {
        BytesLike::Text(value)
    }
}

impl From<Vec<u8>> for BytesLike {
    fn from(value: Vec<u8>) -> Self {
        BytesLike::Bytes(value)
    }
}

impl From<&[u8]> for BytesLike {
    fn from(value: &[u8]) -> Self {
        BytesLike::Bytes(value.to_vec())
    }
}

impl LeafValue for BytesLike {
    fn to_leaf_bytes(&self) -> Result<Vec<u8>> {
        self.to_bytes()
    }
}

impl LeafValue for Vec<u8> {
    fn to_leaf_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.clone())
    }
}

impl<const N: usize> LeafValue for [u8; N] {
    fn to_leaf_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.to_vec())
    }
}

impl LeafValue for String {
    fn to_leaf_bytes(&self) -> Result<Vec<u8>> {
        str_to_bytes(self)
    }
}

impl LeafValue for &str {
    fn to_leaf_bytes(&self) -> Result<Vec<u8>> {
        str_to_bytes(self)
    }
}

fn str_to_bytes(text: &str) -> Result<Vec<u8>> {
    match text.strip_prefix("0x") {
        Some(hex_data) => decode_hex(hex_data),
        None => Ok(text.as_bytes().to_vec()),
    }
}

fn decode_hex(hex_data: &str) -> Result<Vec<u8>> {
    hex::decode(hex_data).map_err(|e| Error::InvalidHex(format!("'{}': {}", hex_data, e)))
}

/// Encode bytes as a `0x`-prefixed lowercase hex string.
pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decode a hex string, with or without the `0x` prefix.
pub fn from_hex(text: &str) -> Result<Vec<u8>> {
    decode_hex(text.strip_prefix("0x").unwrap_or(text))
}

/// Interpret a byte slice as a digest, rejecting any other length.
pub fn digest_from_slice(bytes: &[u8]) -> Result<Digest> {
    bytes
        .try_into()
        .map_err(|_| Error::InvalidMerkleNode { len: bytes.len() })
}

/// Decode a hex string into a digest.
pub fn digest_from_hex(text: &str) -> Result<Digest> {
    digest_from_slice(&from_hex(text)?)
}

/// Concatenate byte sequences.
pub fn concat<I, B>(parts: I) -> Vec<u8>
where
    I: IntoIterator<Item = B>,
    B: AsRef<[u8]>,
{
    let mut out = Vec::new();
    for part in parts {
        out.extend_from_slice(part.as_ref());
    }
    out
}

/// Compare two byte sequences as big-endian unsigned integers.
///
/// Leading zero bytes do not count, so `[0, 1]` equals `[1]`.
pub fn compare(a: &[u8], b: &[u8]) -> Ordering {
    let a = strip_leading_zeros(a);
    let b = strip_leading_zeros(b);
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    &bytes[first..]
}

/// Serde adapter encoding a list of digests as `0x` hex strings.
pub mod hex_digests {
    use serde::{de::Error as _, ser::SerializeSeq, Deserialize, Deserializer, Serializer};

    use crate::Digest;

    /// Serialize each digest as a `0x` hex string.
    pub fn serialize<S: Serializer>(
        digests: &[Digest],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(digests.len()))?;
        for digest in digests {
            seq.serialize_element(&super::to_hex(digest))?;
        }
        seq.end()
    }

    /// Deserialize `0x` hex strings, rejecting any that are not 32 bytes.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Digest>, D::Error> {
        Vec::<String>::deserialize(deserializer)?
            .iter()
            .map(|text| super::digest_from_hex(text).map_err(D::Error::custom))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn test_hex_string_is_decoded() {
        let value = BytesLike::from("0x2222");
        assert_eq!(value.to_bytes().unwrap(), vec![0x22, 0x22]);
    }

    #[test]
    fn test_plain_string_is_utf8() {
        let value = BytesLike::from("ciao");
        assert_eq!(value.to_bytes().unwrap(), b"ciao".to_vec());
    }

    #[test]
    fn test_bad_hex_is_rejected() {
        assert_matches!(
            BytesLike::from("0xzz").to_bytes(),
            Err(Error::InvalidHex(_))
        );
        // odd length
        assert_matches!("0x123".to_leaf_bytes(), Err(Error::InvalidHex(_)));
    }

    #[test]
    fn test_to_hex_from_hex() {
        assert_eq!(to_hex(&[0xab, 0x01]), "0xab01");
        assert_eq!(from_hex("0xab01").unwrap(), vec![0xab, 0x01]);
        assert_eq!(from_hex("ab01").unwrap(), vec![0xab, 0x01]);
        assert_eq!(to_hex(&[]), "0x");
    }

    #[test]
    fn test_digest_length_is_enforced() {
        assert_matches!(
            digest_from_slice(&[0u8; 31]),
            Err(Error::InvalidMerkleNode { len: 31 })
        );
        assert_eq!(digest_from_slice(&[7u8; 32]).unwrap(), [7u8; 32]);
        assert_matches!(
            digest_from_hex("0x1234"),
            Err(Error::InvalidMerkleNode { len: 2 })
        );
    }

    #[test]
    fn test_compare_as_big_integers() {
        assert_eq!(compare(&[1], &[2]), Ordering::Less);
        assert_eq!(compare(&[0, 0, 1], &[1]), Ordering::Equal);
        assert_eq!(compare(&[1, 0], &[0xff]), Ordering::Greater);
        assert_eq!(compare(&[0xff; 32], &[0xfe; 32]), Ordering::Greater);
        assert_eq!(compare(&[], &[0]), Ordering::Equal);
    }

    #[test]
    fn test_concat() {
        assert_eq!(concat([&[1u8, 2][..], &[3u8][..]]), vec![1, 2, 3]);
    }

    #[test]
    fn test_bytes_like_json_shape() {
        let values = vec![BytesLike::from("0x2222"), BytesLike::from(vec![1u8, 2])];
        let json = serde_json::to_string(&values).unwrap();
        assert_eq!(json, r#"["0x2222",[1,2]]"#);
        let back: Vec<BytesLike> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, values);
    }
}
