//! The lookup capability consumed by the scan pipeline.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use scancart_core::DomainError;

use crate::product::Product;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog could not be reached (connectivity, timeout). Retryable.
    #[error("catalog unavailable: {0}")]
    Unavailable(String),

    /// A catalog edit was rejected.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// A seed file could not be parsed.
    #[error("invalid catalog seed: {0}")]
    Seed(#[from] serde_json::Error),
}

impl CatalogError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Whether retrying the same request later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, CatalogError::Unavailable(_))
    }
}

/// Asynchronous product lookup.
///
/// Implementations must follow the exact-then-prefix policy of `lookup`
/// faithfully: the cart merges the *first* product returned.
#[async_trait]
pub trait CatalogLookup: Send + Sync + 'static {
    /// Resolve a scan or typed query.
    ///
    /// - Exact matches (query equals name or barcode): all of them, most
    ///   recent first.
    /// - Otherwise at most one product whose name or barcode starts with the
    ///   query.
    /// - Otherwise empty.
    ///
    /// Unreachable catalogs fail with [`CatalogError::Unavailable`]; that is
    /// never reported as an empty result.
    async fn lookup(&self, query: &str) -> Result<Vec<Product>, CatalogError>;

    /// Products whose name or barcode starts with `filter`, most recent
    /// first. A blank filter lists the whole catalog.
    async fn list_products(&self, filter: &str) -> Result<Vec<Product>, CatalogError>;
}

#[async_trait]
impl<C> CatalogLookup for Arc<C>
where
    C: CatalogLookup + ?Sized,
{
    async fn lookup(&self, query: &str) -> Result<Vec<Product>, CatalogError> {
        (**self).lookup(query).await
    }

    async fn list_products(&self, filter: &str) -> Result<Vec<Product>, CatalogError> {
        (**self).list_products(filter).await
    }
}
