//! Content fingerprinting for maroon.
//!
//! One digest serves two jobs: naming a file version by its bytes, and
//! naming a repository directory by the tracked file's path string. The
//! digest is SHA-1 because that is what the on-disk layout was written
//! with; it is a fingerprint, not a security boundary.

pub mod hasher;

pub use hasher::{hash, hash_reader, hash_str, verify, ContentHasher};
