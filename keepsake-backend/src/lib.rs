//! Storage for keepsake cache entries.
//!
//! Every backend stores one opaque payload per [`ResourceAddress`] and
//! reports when it was last written. The low-level [`Backend`] trait is what
//! a storage implementation provides; [`EntryStore`] layers the silent,
//! typed read path used by the fetch orchestrator on top of it.
//!
//! Two backends ship with the crate:
//!
//! - [`FsBackend`] persists entries as files and survives restarts
//! - [`MemoryBackend`] keeps entries in process memory
//!
//! [`ResourceAddress`]: keepsake_core::ResourceAddress
mod backend;
mod error;
pub mod format;
mod fs;
mod memory;

pub use backend::{Backend, BackendResult, EntryStore};
pub use error::BackendError;
pub use fs::{FsBackend, FsBackendBuilder};
pub use memory::MemoryBackend;

/// What a delete found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteStatus {
    /// This many entries were removed.
    Deleted(u32),
    /// There was no entry to remove.
    Missing,
}
