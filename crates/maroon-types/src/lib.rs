//! Foundation types for maroon.
//!
//! Every other maroon crate depends on `maroon-types`. The one type that
//! matters is [`ContentHash`]: the fingerprint that names a stored file
//! version, a DAG node, and (hashed from a path string) a repository
//! directory.

pub mod error;
pub mod hash;

pub use error::TypeError;
pub use hash::{ContentHash, HASH_HEX_LEN, HASH_LEN};
