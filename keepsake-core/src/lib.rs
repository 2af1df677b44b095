#![warn(missing_docs)]
//! # keepsake-core
//!
//! Core traits and types for the keepsake fetch cache.
//!
//! This crate holds the protocol-agnostic vocabulary shared by the storage
//! backends (`keepsake-backend`), the orchestration layer (`keepsake`) and
//! transport adapters such as `keepsake-reqwest`:
//!
//! - **Address** a resource ([`ResourceAddress`])
//! - **Describe** what was stored and when ([`CacheEntry`])
//! - **Configure** how fresh and cached data compete ([`CachePolicy`], [`ErrorAction`])
//! - **Report** degraded responses ([`DegradeNotice`])
//! - **Call** the network ([`Transport`])

pub mod address;
pub mod entry;
pub mod label;
pub mod notice;
pub mod policy;
pub mod transport;

pub use address::{AddressBuilder, AddressError, ResourceAddress};
pub use entry::CacheEntry;
pub use label::BackendLabel;
pub use notice::{DegradeNotice, NoticeContent};
pub use policy::{CachePolicy, ErrorAction};
#[doc(hidden)]
pub use smol_str::SmolStr;
pub use transport::Transport;

/// Raw byte data type used for serialized payloads.
/// Using `Bytes` provides efficient zero-copy cloning via reference counting.
pub type Raw = bytes::Bytes;
