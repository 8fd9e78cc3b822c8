//! Messages a session publishes to its observers.

use serde::Serialize;

use scancart_cart::{CartSnapshot, LineSnapshot};
use scancart_catalog::{CatalogError, Product};
use scancart_core::Money;

/// Why a settled, non-stale lookup produced no cart change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolutionFailure {
    /// Neither an exact nor a prefix match.
    NotFound,
    /// The catalog could not be reached; the next settled input retries.
    Transient { message: String },
}

impl From<&CatalogError> for ResolutionFailure {
    fn from(err: &CatalogError) -> Self {
        ResolutionFailure::Transient {
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CartNotification {
    /// Published after every successful cart mutation.
    CartChanged { lines: Vec<LineSnapshot>, total: Money },
    ResolutionFailed { query: String, reason: ResolutionFailure },
    /// The input field should be emptied (after a successful scan or a clear).
    InputReset,
}

impl From<CartSnapshot> for CartNotification {
    fn from(snapshot: CartSnapshot) -> Self {
        CartNotification::CartChanged {
            lines: snapshot.lines,
            total: snapshot.total,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BrowseNotification {
    Listed { filter: String, products: Vec<Product> },
    Failed { filter: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notifications_serialize_with_type_tags() {
        let failed = CartNotification::ResolutionFailed {
            query: "999999".to_string(),
            reason: ResolutionFailure::NotFound,
        };
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "resolution_failed",
                "query": "999999",
                "reason": { "kind": "not_found" }
            })
        );

        let changed = CartNotification::CartChanged {
            lines: Vec::new(),
            total: Money::ZERO,
        };
        let json = serde_json::to_value(&changed).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "cart_changed", "lines": [], "total": 0 }));
    }

    #[test]
    fn catalog_errors_become_transient_failures() {
        let err = CatalogError::unavailable("connection refused");
        match ResolutionFailure::from(&err) {
            ResolutionFailure::Transient { message } => {
                assert!(message.contains("connection refused"))
            }
            other => panic!("Expected Transient failure, got {other:?}"),
        }
    }
}
