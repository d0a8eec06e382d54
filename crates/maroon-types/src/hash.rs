use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// Digest width in bytes (160 bits).
pub const HASH_LEN: usize = 20;

/// Length of the canonical hex form.
pub const HASH_HEX_LEN: usize = HASH_LEN * 2;

/// Content-addressed identifier for a stored file version.
///
/// A `ContentHash` is the SHA-1 digest of a version's exact bytes. Identical
/// content always produces the same hash, so the hash doubles as the object
/// file name and as the node id in a file's timeline.
///
/// The canonical text form is 40 lowercase hex characters; that is also the
/// serde representation, since hashes appear as JSON object keys in the
/// persisted index.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash([u8; HASH_LEN]);

impl ContentHash {
    /// Wrap a pre-computed digest.
    pub const fn from_digest(digest: [u8; HASH_LEN]) -> Self {
        Self(digest)
    }

    /// The raw 20-byte digest.
    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    /// Lowercase hex representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters).
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Split the hex form into a 2-character shard prefix and the remainder.
    ///
    /// Repository directories are laid out as `<prefix>/<rest>` to keep the
    /// fan-out of the repos root bounded.
    pub fn shard(&self) -> (String, String) {
        let mut hex = self.to_hex();
        let rest = hex.split_off(2);
        (hex, rest)
    }

    /// Parse the canonical hex form.
    ///
    /// Only lowercase hex is accepted: the hex text is used verbatim as a
    /// file name and JSON key, so two spellings of one hash must not exist.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        if s.len() != HASH_HEX_LEN {
            return Err(TypeError::InvalidLength {
                expected: HASH_HEX_LEN,
                actual: s.len(),
            });
        }
        if !s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(TypeError::InvalidHex(s.to_string()));
        }
        let mut arr = [0u8; HASH_LEN];
        hex::decode_to_slice(s, &mut arr).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.short_hex())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for ContentHash {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[u8; HASH_LEN]> for ContentHash {
    fn from(bytes: [u8; HASH_LEN]) -> Self {
        Self(bytes)
    }
}

impl From<ContentHash> for [u8; HASH_LEN] {
    fn from(hash: ContentHash) -> Self {
        hash.0
    }
}

impl Serialize for ContentHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = Cow::<'de, str>::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample() -> ContentHash {
        ContentHash::from_digest([0xab; HASH_LEN])
    }

    #[test]
    fn hex_roundtrip() {
        let hash = sample();
        let parsed = ContentHash::from_hex(&hash.to_hex()).unwrap();
        assert_eq!(hash, parsed);
    }

    #[test]
    fn hex_is_40_lowercase_chars() {
        let hex = ContentHash::from_digest([0xAB; HASH_LEN]).to_hex();
        assert_eq!(hex.len(), HASH_HEX_LEN);
        assert_eq!(hex, "ab".repeat(HASH_LEN));
    }

    #[test]
    fn short_hex_is_8_chars() {
        assert_eq!(sample().short_hex(), "abababab");
    }

    #[test]
    fn shard_splits_after_two_chars() {
        let hash = ContentHash::from_hex("0123456789abcdef0123456789abcdef01234567").unwrap();
        let (prefix, rest) = hash.shard();
        assert_eq!(prefix, "01");
        assert_eq!(rest, "23456789abcdef0123456789abcdef01234567");
    }

    #[test]
    fn wrong_length_is_rejected() {
        let err = ContentHash::from_hex("abcd").unwrap_err();
        assert_eq!(
            err,
            TypeError::InvalidLength {
                expected: HASH_HEX_LEN,
                actual: 4
            }
        );
    }

    #[test]
    fn uppercase_is_rejected() {
        let upper = "AB".repeat(HASH_LEN);
        assert!(matches!(
            ContentHash::from_hex(&upper),
            Err(TypeError::InvalidHex(_))
        ));
    }

    #[test]
    fn non_hex_is_rejected() {
        let bad = "zz".repeat(HASH_LEN);
        assert!(matches!(
            ContentHash::from_hex(&bad),
            Err(TypeError::InvalidHex(_))
        ));
    }

    #[test]
    fn serde_uses_hex_string() {
        let hash = sample();
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{}\"", hash.to_hex()));
        let parsed: ContentHash = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, hash);
    }

    #[test]
    fn serde_rejects_bad_string() {
        let result: Result<ContentHash, _> = serde_json::from_str("\"not-a-hash\"");
        assert!(result.is_err());
    }

    #[test]
    fn ordering_is_consistent() {
        let a = ContentHash::from_digest([0; HASH_LEN]);
        let b = ContentHash::from_digest([1; HASH_LEN]);
        assert!(a < b);
    }

    proptest! {
        #[test]
        fn parse_display_roundtrip(bytes in proptest::array::uniform20(any::<u8>())) {
            let hash = ContentHash::from_digest(bytes);
            let parsed: ContentHash = hash.to_string().parse().unwrap();
            prop_assert_eq!(parsed, hash);
        }
    }
}
