//! Abstract storage trait for fragment content.
//!
//! Fragment content is read fresh for every assembly or simulation
//! invocation; the core never mutates it. A missing file is a normal
//! outcome (`Ok(None)`), not an error: the caller decides whether a missing
//! fragment is fatal.

use thiserror::Error;

/// Errors that can occur while reading fragment content.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An underlying I/O operation failed.
    #[error("I/O error at '{path}': {message}")]
    Io {
        /// The path involved.
        path: String,
        /// The underlying error message.
        message: String,
    },

    /// Fragment content was not valid UTF-8.
    #[error("Fragment at '{path}' is not valid UTF-8")]
    InvalidEncoding {
        /// The path involved.
        path: String,
    },
}

/// Read-only access to a project's fragment files.
///
/// Paths are relative to the project root, with `/` as the separator.
/// Implementations must be safe to share across concurrently running
/// sessions; the trait is read-only by design.
pub trait FragmentStore: Send + Sync {
    /// Reads the content of a fragment. Returns `Ok(None)` if it is absent.
    fn read(&self, path: &str) -> Result<Option<String>, StoreError>;

    /// Lists the file names directly under a directory.
    ///
    /// Returns an empty list when the directory does not exist. The
    /// enumeration order must be deterministic for a given store state, since
    /// the fragment sorter uses it as the stable tiebreak.
    fn list(&self, dir: &str) -> Result<Vec<String>, StoreError>;
}
