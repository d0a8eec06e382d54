//! Version DAG for maroon.
//!
//! Each tracked file has one [`Index`]: the first recorded version (`root`),
//! the version currently considered current (`head`), a forward-edge map
//! from every version to the versions saved on top of it, and the list of
//! *adopted* edges -- forward edges created because the file was changed
//! outside the editor and the foreign content was grafted under the old
//! head.
//!
//! The index is mutated only through [`Index::append`] and
//! [`Index::set_head`], both of which validate before touching state, so a
//! failed call leaves the index unchanged. Read-side helpers in [`walk`]
//! give rendering code a deterministic order without recursion.

pub mod edge;
pub mod error;
pub mod index;
pub mod walk;
mod wire;

pub use edge::{Edge, EdgeKind};
pub use error::{DagError, DagResult};
pub use index::Index;
