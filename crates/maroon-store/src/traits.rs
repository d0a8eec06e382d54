use maroon_types::ContentHash;

use crate::error::{StoreError, StoreResult};

/// Content-addressed object store.
///
/// All implementations must satisfy these invariants:
/// - Objects are immutable once written. The same content always produces
///   the same hash, so rewriting it is a no-op.
/// - `get(put(c)) == c` byte for byte, including empty and non-UTF-8 input.
/// - All I/O errors are propagated, never silently ignored.
pub trait ObjectStore: Send + Sync {
    /// Store `content` and return its hash.
    ///
    /// If the object already exists, this is a no-op (idempotent).
    fn put(&self, content: &[u8]) -> StoreResult<ContentHash>;

    /// Read an object's exact original bytes.
    ///
    /// Returns [`StoreError::NotFound`] if the object does not exist.
    fn get(&self, hash: &ContentHash) -> StoreResult<Vec<u8>>;

    /// Check whether an object exists in the store.
    fn exists(&self, hash: &ContentHash) -> StoreResult<bool>;

    /// All object hashes in the store, sorted.
    fn list(&self) -> StoreResult<Vec<ContentHash>>;

    /// Read an object as UTF-8 text.
    fn get_text(&self, hash: &ContentHash) -> StoreResult<String> {
        let bytes = self.get(hash)?;
        String::from_utf8(bytes).map_err(|e| StoreError::CorruptObject {
            hash: *hash,
            reason: format!("not valid UTF-8: {e}"),
        })
    }
}
