//! Fragment storage backends.
//!
//! The core never owns the project layout on disk; it reads fragment content
//! through the [`FragmentStore`] trait. The disk backend serves real
//! projects, the in-memory backend serves tests and embedded callers.

mod disk;
mod memory;
mod traits;

pub use disk::DiskFragmentStore;
pub use memory::InMemoryFragmentStore;
pub use traits::{FragmentStore, StoreError};
