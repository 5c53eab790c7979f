//! A concurrent, in-memory hierarchical folder tree.
//!
//! [`Tree`](tree::Tree) holds folders addressed by `/`-delimited absolute
//! paths (see [`path`]) and supports four operations — list, create, remove,
//! and rename — each synchronized by hand-over-hand locking through
//! per-folder [`sync::NodeSync`] instances rather than any single lock over
//! the whole tree. Two operations on unrelated subtrees never contend with
//! each other; only operations that actually share an ancestor folder do.

pub mod config;
pub mod error;
pub mod logging;
pub mod namemap;
pub mod path;
pub mod sync;
pub mod tree;

pub use error::{TreeError, TreeResult};
pub use tree::Tree;
