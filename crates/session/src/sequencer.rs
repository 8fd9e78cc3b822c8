//! Staleness guard for asynchronous lookups.

use std::future::Future;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;

use scancart_catalog::CatalogError;

/// Sequence number of a dispatched lookup.
///
/// Tokens only grow; a token is never handed out twice.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct QueryToken(u64);

impl QueryToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for QueryToken {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "q{}", self.0)
    }
}

/// Result of a dispatched lookup, tagged with the token it was issued under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion<T> {
    pub token: QueryToken,
    pub query: String,
    pub payload: T,
}

/// A completion that lost the race against a newer dispatch.
///
/// Never shown to the operator; callers log it and move on.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
#[error("stale result for {token} (latest is {latest})")]
pub struct StaleResult {
    pub token: QueryToken,
    pub latest: QueryToken,
}

/// Tracks the latest issued token and admits only completions carrying it.
#[derive(Debug, Default)]
pub struct ResolutionSequencer {
    latest: u64,
}

impl ResolutionSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the token for a lookup about to be dispatched.
    pub fn issue(&mut self) -> QueryToken {
        self.latest += 1;
        QueryToken(self.latest)
    }

    /// Make every outstanding token stale without dispatching anything.
    pub fn invalidate(&mut self) {
        self.latest += 1;
    }

    pub fn is_current(&self, token: QueryToken) -> bool {
        token.0 == self.latest
    }

    /// Pass a completion through if it carries the latest token.
    pub fn admit<T>(&self, completion: Completion<T>) -> Result<Completion<T>, StaleResult> {
        if self.is_current(completion.token) {
            Ok(completion)
        } else {
            Err(StaleResult {
                token: completion.token,
                latest: QueryToken(self.latest),
            })
        }
    }
}

/// Run `lookup` on its own task and post the outcome tagged with `token`.
///
/// A lookup that panics or is cancelled still posts a completion, carrying
/// [`CatalogError::Unavailable`], so the owner's in-flight count always
/// drains.
pub(crate) fn spawn_lookup<T, F>(
    token: QueryToken,
    query: String,
    tx: mpsc::UnboundedSender<Completion<Result<T, CatalogError>>>,
    lookup: F,
) where
    T: Send + 'static,
    F: Future<Output = Result<T, CatalogError>> + Send + 'static,
{
    tokio::spawn(async move {
        let payload = match tokio::spawn(lookup).await {
            Ok(result) => result,
            Err(err) => {
                tracing::error!(%token, query = %query, error = %err, "lookup task died");
                Err(CatalogError::unavailable(format!("lookup task failed: {err}")))
            }
        };
        let _ = tx.send(Completion {
            token,
            query,
            payload,
        });
    });
}
