use std::io::{self, Read};

use maroon_types::{ContentHash, HASH_LEN};
use sha1::{Digest, Sha1};

/// Incremental SHA-1 hasher producing a [`ContentHash`].
///
/// Feeding the same bytes in any chunking yields the same hash as a
/// one-shot [`hash`] call.
#[derive(Clone, Default)]
pub struct ContentHasher {
    inner: Sha1,
}

impl ContentHasher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed more bytes.
    pub fn update(&mut self, data: &[u8]) {
        self.inner.update(data);
    }

    /// Consume the hasher and return the digest.
    pub fn finalize(self) -> ContentHash {
        let digest = self.inner.finalize();
        let mut out = [0u8; HASH_LEN];
        out.copy_from_slice(&digest);
        ContentHash::from_digest(out)
    }
}

/// Hash raw bytes.
pub fn hash(data: &[u8]) -> ContentHash {
    let mut hasher = ContentHasher::new();
    hasher.update(data);
    hasher.finalize()
}

/// Hash a string's UTF-8 bytes. Used for identity strings (tracked paths).
pub fn hash_str(s: &str) -> ContentHash {
    hash(s.as_bytes())
}

/// Verify that data produces the expected hash.
pub fn verify(data: &[u8], expected: &ContentHash) -> bool {
    hash(data) == *expected
}

/// Hash everything a reader yields, without buffering it whole.
pub fn hash_reader<R: Read>(mut reader: R) -> io::Result<ContentHash> {
    let mut hasher = ContentHasher::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn hash_is_deterministic() {
        let data = b"hello world";
        assert_eq!(hash(data), hash(data));
    }

    #[test]
    fn known_sha1_vectors() {
        assert_eq!(
            hash(b"").to_hex(),
            "da39a3ee5e6b4b0d3255bfef95601890afd80709"
        );
        assert_eq!(
            hash_str("hello").to_hex(),
            "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d"
        );
    }

    #[test]
    fn different_inputs_differ() {
        assert_ne!(hash_str("hello"), hash_str("world"));
    }

    #[test]
    fn verify_correct_and_tampered() {
        let id = hash(b"original");
        assert!(verify(b"original", &id));
        assert!(!verify(b"tampered", &id));
    }

    #[test]
    fn reader_matches_one_shot() {
        let data = vec![7u8; 20_000];
        let streamed = hash_reader(data.as_slice()).unwrap();
        assert_eq!(streamed, hash(&data));
    }

    #[test]
    fn non_ascii_text_hashes_its_utf8_bytes() {
        let text = "größe — 大きさ";
        assert_eq!(hash_str(text), hash(text.as_bytes()));
    }

    proptest! {
        #[test]
        fn chunking_does_not_change_hash(data in proptest::collection::vec(any::<u8>(), 0..512), split in 0usize..512) {
            let split = split.min(data.len());
            let mut hasher = ContentHasher::new();
            hasher.update(&data[..split]);
            hasher.update(&data[split..]);
            prop_assert_eq!(hasher.finalize(), hash(&data));
        }

        #[test]
        fn distinct_inputs_give_distinct_hashes(a in ".*", b in ".*") {
            prop_assume!(a != b);
            prop_assert_ne!(hash_str(&a), hash_str(&b));
        }
    }
}
