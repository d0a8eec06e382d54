//! Persisted JSON form of an [`Index`].
//!
//! The index is stored as one flat JSON object: the fixed fields `root`,
//! `head` and `adopts`, plus one key per node mapping to its child list.
//! Older writers used `curr` for the head; it is accepted on read and never
//! written. Any other key that is not a node hash is rejected.

use std::collections::BTreeMap;
use std::fmt;

use maroon_types::ContentHash;
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{DagError, DagResult};
use crate::index::Index;

const ROOT: &str = "root";
const HEAD: &str = "head";
const LEGACY_HEAD: &str = "curr";
const ADOPTS: &str = "adopts";

impl Serialize for Index {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3 + self.children.len()))?;
        map.serialize_entry(ROOT, &self.root)?;
        map.serialize_entry(HEAD, &self.head)?;
        map.serialize_entry(ADOPTS, &self.adopts)?;
        for (hash, kids) in &self.children {
            map.serialize_entry(hash, kids)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Index {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(IndexVisitor)
    }
}

struct IndexVisitor;

fn set_once<T, E: de::Error>(slot: &mut Option<T>, value: T, field: &'static str) -> Result<(), E> {
    if slot.replace(value).is_some() {
        return Err(E::duplicate_field(field));
    }
    Ok(())
}

impl<'de> Visitor<'de> for IndexVisitor {
    type Value = Index;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an index object with root, head, adopts and hash keys")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Index, A::Error> {
        let mut root = None;
        let mut head = None;
        let mut legacy_head = None;
        let mut adopts = None;
        let mut children: BTreeMap<ContentHash, Vec<ContentHash>> = BTreeMap::new();

        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                ROOT => set_once(&mut root, map.next_value()?, ROOT)?,
                HEAD => set_once(&mut head, map.next_value()?, HEAD)?,
                LEGACY_HEAD => set_once(&mut legacy_head, map.next_value()?, LEGACY_HEAD)?,
                ADOPTS => set_once(&mut adopts, map.next_value()?, ADOPTS)?,
                other => {
                    let hash = ContentHash::from_hex(other).map_err(|e| {
                        de::Error::custom(format_args!("unexpected key {other:?}: {e}"))
                    })?;
                    let kids: Vec<ContentHash> = map.next_value()?;
                    if children.insert(hash, kids).is_some() {
                        return Err(de::Error::custom(format_args!("duplicate node {other}")));
                    }
                }
            }
        }

        let root = root.ok_or_else(|| de::Error::missing_field(ROOT))?;
        let head = head
            .or(legacy_head)
            .ok_or_else(|| de::Error::missing_field(HEAD))?;
        let adopts = adopts.ok_or_else(|| de::Error::missing_field(ADOPTS))?;

        let index = Index {
            root,
            head,
            adopts,
            children,
        };
        index.validate().map_err(de::Error::custom)?;
        Ok(index)
    }
}

impl Index {
    /// Encode as JSON bytes.
    pub fn to_bytes(&self) -> DagResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| DagError::Serialization(e.to_string()))
    }

    /// Decode JSON bytes. Any shape or invariant problem is `Corrupt`.
    pub fn from_bytes(data: &[u8]) -> DagResult<Self> {
        serde_json::from_slice(data).map_err(|e| DagError::Corrupt(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use maroon_crypto::hash_str as h;
    use serde_json::json;

    use crate::error::DagError;
    use crate::index::Index;

    fn parse(value: serde_json::Value) -> Result<Index, DagError> {
        Index::from_bytes(&serde_json::to_vec(&value).unwrap())
    }

    #[test]
    fn encodes_flat_object() {
        let mut index = Index::build(b"hello");
        index.append(h("hello"), h("xyz"), true).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&index.to_bytes().unwrap()).unwrap();

        let hello = h("hello").to_hex();
        let xyz = h("xyz").to_hex();
        assert_eq!(
            value,
            json!({
                "root": hello,
                "head": xyz,
                "adopts": [[hello, xyz]],
                hello.clone(): [xyz],
                xyz.clone(): [],
            })
        );
    }

    #[test]
    fn decodes_what_it_encodes() {
        let mut index = Index::build(b"a");
        index.append(h("a"), h("b"), false).unwrap();
        index.append(h("b"), h("c"), true).unwrap();
        index.set_head(h("b")).unwrap();
        let decoded = Index::from_bytes(&index.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, index);
    }

    #[test]
    fn accepts_legacy_curr() {
        let a = h("a").to_hex();
        let index = parse(json!({"root": a, "curr": a, "adopts": [], a.clone(): []})).unwrap();
        assert_eq!(index.head(), h("a"));
    }

    #[test]
    fn head_wins_over_curr() {
        let a = h("a").to_hex();
        let b = h("b").to_hex();
        let index = parse(json!({
            "root": a, "head": b, "curr": a, "adopts": [], a.clone(): [b], b.clone(): []
        }))
        .unwrap();
        assert_eq!(index.head(), h("b"));
    }

    #[test]
    fn missing_fields_are_corrupt() {
        let a = h("a").to_hex();
        for value in [
            json!({"head": a, "adopts": [], a.clone(): []}),
            json!({"root": a, "adopts": [], a.clone(): []}),
            json!({"root": a, "head": a, a.clone(): []}),
        ] {
            assert!(matches!(parse(value), Err(DagError::Corrupt(_))));
        }
    }

    #[test]
    fn unknown_key_is_corrupt() {
        let a = h("a").to_hex();
        let err = parse(json!({"root": a, "head": a, "adopts": [], "current": a, a.clone(): []}))
            .unwrap_err();
        assert!(err.to_string().contains("current"));
    }

    #[test]
    fn set_valued_children_are_corrupt() {
        let a = h("a").to_hex();
        assert!(parse(json!({"root": a, "head": a, "adopts": [], a.clone(): {}})).is_err());
    }

    #[test]
    fn broken_invariant_is_corrupt() {
        let a = h("a").to_hex();
        let ghost = h("ghost").to_hex();
        assert!(matches!(
            parse(json!({"root": a, "head": ghost, "adopts": [], a.clone(): []})),
            Err(DagError::Corrupt(_))
        ));
    }

    #[test]
    fn not_json_is_corrupt() {
        assert!(matches!(Index::from_bytes(b"\x00\x01"), Err(DagError::Corrupt(_))));
    }
}
