//! Error taxonomy returned by tree operations.
//!
//! Every variant here is a normal, recoverable outcome of an operation — none
//! of them are fatal. The only fatal conditions this crate can hit (mutex or
//! allocator failure) abort the process through their own paths and never
//! reach a caller as a [`TreeError`].

use thiserror::Error;

/// The error half of every tree operation's result.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeError {
    /// The supplied path failed validation (see [`crate::path::is_valid`]).
    #[error("path is not a valid absolute folder path")]
    InvalidPath,
    /// A component along the resolved path does not exist.
    #[error("no such folder")]
    NotFound,
    /// Creating or moving onto a name that already exists, or creating the root.
    #[error("folder already exists")]
    Exists,
    /// Removing a folder that still has children.
    #[error("folder is not empty")]
    NotEmpty,
    /// Removing or moving-from the root.
    #[error("operation not permitted on the root folder")]
    Busy,
    /// Moving a folder into a strict descendant of itself.
    #[error("cannot move a folder into its own subtree")]
    IntoOwnSubtree,
}

/// Shorthand for the `Result` type every tree operation returns.
pub type TreeResult<T> = Result<T, TreeError>;
