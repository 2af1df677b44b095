//! Degrade notices.
//!
//! A [`DegradeNotice`] is broadcast when a fetch fails and the caller is
//! configured to be told about it: either the cached copy is being served
//! in place of fresh data, or there was nothing to fall back on.

use crate::{CacheEntry, Raw, ResourceAddress};

/// What a degrade notice carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoticeContent {
    /// The cached copy is served instead of fresh data.
    Cached {
        /// The raw cached entry that was served.
        entry: CacheEntry<Raw>,
        /// Human readable warning to surface to the user.
        message: String,
    },
    /// No usable cached copy exists; the fetch error is raised after this notice.
    Failed {
        /// Display text of the fetch error.
        message: String,
    },
}

/// Signal that a fetch for `address` did not produce fresh data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DegradeNotice {
    /// The address whose fetch failed.
    pub address: ResourceAddress,
    /// Cached entry or error message.
    pub content: NoticeContent,
}

impl DegradeNotice {
    /// Notice for serving `entry` in place of fresh data.
    pub fn cached(
        address: ResourceAddress,
        entry: CacheEntry<Raw>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            address,
            content: NoticeContent::Cached {
                entry,
                message: message.into(),
            },
        }
    }

    /// Notice for a failure with no fallback.
    pub fn failed(address: ResourceAddress, message: impl Into<String>) -> Self {
        Self {
            address,
            content: NoticeContent::Failed {
                message: message.into(),
            },
        }
    }

    /// The message carried by either variant.
    pub fn message(&self) -> &str {
        match &self.content {
            NoticeContent::Cached { message, .. } | NoticeContent::Failed { message } => message,
        }
    }

    /// The cached entry, if one was served.
    pub fn entry(&self) -> Option<&CacheEntry<Raw>> {
        match &self.content {
            NoticeContent::Cached { entry, .. } => Some(entry),
            NoticeContent::Failed { .. } => None,
        }
    }
}
