//! Resource addresses and their normalization.
//!
//! A [`ResourceAddress`] identifies one cacheable resource. The same address
//! keys both the persisted cache entry and the per-resource lock, so two
//! logically equal requests must produce byte-identical addresses.
//!
//! ## Format
//!
//! `{base}?{key1}={value1}&{key2}={value2}`
//!
//! - Values are form-url-encoded
//! - Parameters are sorted by key; repeated keys keep their insertion order
//! - A base that already carries a query string is extended with `&`
//! - No parameters means the base is used as-is
//!
//! ```
//! use keepsake_core::ResourceAddress;
//!
//! let a = ResourceAddress::builder("https://api.example.com/users")
//!     .param("page", 2)
//!     .param("filter", "active users")
//!     .build();
//! assert_eq!(a.as_str(), "https://api.example.com/users?filter=active+users&page=2");
//!
//! let b = ResourceAddress::builder("/search?lang=en")
//!     .param("q", "rust")
//!     .build();
//! assert_eq!(b.as_str(), "/search?lang=en&q=rust");
//! ```

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use smol_str::SmolStr;
use thiserror::Error;

/// Error returned when query parameters can not be turned into an address.
#[derive(Debug, Error)]
pub enum AddressError {
    /// The parameter value does not serialize into a flat key/value form.
    #[error("query parameters can not be encoded: {0}")]
    Encode(#[from] serde_urlencoded::ser::Error),
    /// The encoded parameters could not be split back into pairs.
    #[error("query parameters can not be decoded: {0}")]
    Decode(#[from] serde_urlencoded::de::Error),
}

/// Normalized identifier of a fetchable, cacheable resource.
///
/// Cloning only bumps a reference count.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceAddress {
    inner: Arc<str>,
}

impl ResourceAddress {
    /// Wraps an already resolved address verbatim.
    pub fn new(address: impl AsRef<str>) -> Self {
        Self {
            inner: Arc::from(address.as_ref()),
        }
    }

    /// Starts building an address from a base endpoint.
    pub fn builder(base: impl Into<String>) -> AddressBuilder {
        AddressBuilder::new(base)
    }

    /// Returns the address as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.inner
    }
}

impl fmt::Display for ResourceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner)
    }
}

impl AsRef<str> for ResourceAddress {
    fn as_ref(&self) -> &str {
        &self.inner
    }
}

impl From<&str> for ResourceAddress {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ResourceAddress {
    fn from(value: String) -> Self {
        Self {
            inner: Arc::from(value),
        }
    }
}

/// Builder for [`ResourceAddress`].
#[derive(Debug, Clone)]
pub struct AddressBuilder {
    base: String,
    params: Vec<(SmolStr, String)>,
}

impl AddressBuilder {
    /// Creates a builder for the given base endpoint.
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            params: Vec::new(),
        }
    }

    /// Adds a single query parameter.
    pub fn param(mut self, key: impl Into<SmolStr>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    /// Adds every field of a serializable value as a query parameter.
    ///
    /// `None` fields are skipped, which keeps optional filters out of the
    /// address instead of producing `key=`.
    ///
    /// ```
    /// use keepsake_core::ResourceAddress;
    ///
    /// #[derive(serde::Serialize)]
    /// struct Filter { status: &'static str, limit: Option<u32> }
    ///
    /// let address = ResourceAddress::builder("/orders")
    ///     .params(&Filter { status: "open", limit: None })?
    ///     .build();
    /// assert_eq!(address.as_str(), "/orders?status=open");
    /// # Ok::<(), keepsake_core::AddressError>(())
    /// ```
    pub fn params<T: Serialize + ?Sized>(mut self, params: &T) -> Result<Self, AddressError> {
        let encoded = serde_urlencoded::to_string(params)?;
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(&encoded)?;
        self.params
            .extend(pairs.into_iter().map(|(k, v)| (SmolStr::from(k), v)));
        Ok(self)
    }

    /// Produces the normalized address.
    pub fn build(self) -> ResourceAddress {
        let Self { base, mut params } = self;
        if params.is_empty() {
            return ResourceAddress::from(base);
        }

        // Stable: duplicate keys stay in the order they were added.
        params.sort_by(|a, b| a.0.cmp(&b.0));

        let mut address = base;
        if address.contains('?') {
            if !address.ends_with('?') && !address.ends_with('&') {
                address.push('&');
            }
        } else {
            address.push('?');
        }
        address.push_str(&form_urlencoded(&params));
        while address.contains("&&") {
            address = address.replace("&&", "&");
        }
        ResourceAddress::from(address)
    }
}

fn form_urlencoded(params: &[(SmolStr, String)]) -> String {
    let pairs: Vec<(&str, &str)> = params
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect();
    // Encoding a slice of string pairs can not fail.
    serde_urlencoded::to_string(pairs).unwrap_or_default()
}
