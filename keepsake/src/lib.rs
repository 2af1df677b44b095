#![warn(missing_docs)]
//! # keepsake
//!
//! Offline-tolerant GET fetching. Every successful response is stored as the
//! last good copy of its resource; when the network fails, a [`CachePolicy`]
//! decides whether that copy answers instead.
//!
//! The moving parts:
//!
//! - [`Client`] orchestrates one fetch: lock, check the cache, call the
//!   [`Transport`], resolve a failure
//! - [`LockRegistry`] serializes calls per [`ResourceAddress`]
//! - [`FetchExecutor`] makes the transport call and persists the result
//! - [`engine`] holds the pure fresh-vs-cache-vs-fail decisions
//! - [`Notifier`] broadcasts a [`DegradeNotice`] when data is degraded
//!
//! ## Quick start
//!
//! ```no_run
//! use keepsake::prelude::*;
//! # use async_trait::async_trait;
//! # struct Http;
//! # #[async_trait]
//! # impl Transport for Http {
//! #     type Error = std::io::Error;
//! #     async fn get(&self, _: &ResourceAddress) -> Result<Raw, Self::Error> { unimplemented!() }
//! # }
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::builder()
//!     .backend(FsBackend::builder().path("/var/cache/app").build()?)
//!     .transport(Http)
//!     .config(ClientConfig::default().error_action(ErrorAction::IgnoreAndNotify))
//!     .build();
//!
//! let address = ResourceAddress::builder("/articles").param("page", 2).build();
//! let articles: Vec<String> = client
//!     .fetch(&address, CachePolicy::FreshOrCacheOrFail, None)
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature flags
//!
//! - `metrics`: fetch outcome counters and transport latency histograms via
//!   the `metrics` crate

pub mod client;
pub mod config;
pub mod engine;
mod error;
pub mod executor;
pub mod lock;
pub mod metrics;
pub mod notify;

pub use client::{Client, ClientBuilder, NotSet};
pub use config::{ClientConfig, LockConfig, NoticeCapacity};
pub use error::FetchError;
pub use executor::{FetchExecutor, FetchOutcome};
pub use lock::{LockRegistry, ScopedLock};
pub use notify::{BoxError, Notifier, Observer};

pub use keepsake_backend::format::{Format, FormatError, JsonFormat};
pub use keepsake_backend::{
    Backend, BackendError, BackendResult, DeleteStatus, EntryStore, FsBackend, MemoryBackend,
};
pub use keepsake_core::{
    AddressBuilder, AddressError, CacheEntry, CachePolicy, DegradeNotice, ErrorAction,
    NoticeContent, Raw, ResourceAddress, Transport,
};

/// The prelude.
pub mod prelude {
    pub use crate::{
        CachePolicy, Client, ClientConfig, DegradeNotice, ErrorAction, FetchError, FsBackend,
        MemoryBackend, Raw, ResourceAddress, Transport,
    };
}
