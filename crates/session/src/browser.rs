//! Debounced catalog filtering for product management screens.

use std::sync::Arc;

use tokio::sync::mpsc;

use scancart_catalog::{CatalogError, CatalogLookup, Product};
use scancart_events::EventBus;

use crate::SharedBus;
use crate::config::ScanConfig;
use crate::notification::BrowseNotification;
use crate::scheduler::{BlankInput, QueryScheduler, SettledInput};
use crate::sequencer::{Completion, QueryToken, ResolutionSequencer, spawn_lookup};

type ListingCompletion = Completion<Result<Vec<Product>, CatalogError>>;

/// What a single [`CatalogBrowser::step`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseProgress {
    Dispatched { token: QueryToken, filter: String },
    Listed { token: QueryToken, count: usize },
    Failed { token: QueryToken },
    Discarded { token: QueryToken },
    Dropped,
}

/// Filtered product listing.
///
/// Same pipeline shape as the scan session, with a shorter window and one
/// difference: a blank filter is dispatched and lists the whole catalog.
pub struct CatalogBrowser<C, B = SharedBus<BrowseNotification>>
where
    C: CatalogLookup,
    B: EventBus<BrowseNotification>,
{
    catalog: Arc<C>,
    bus: B,
    scheduler: QueryScheduler,
    settled_rx: mpsc::UnboundedReceiver<SettledInput>,
    sequencer: ResolutionSequencer,
    completions_tx: mpsc::UnboundedSender<ListingCompletion>,
    completions_rx: mpsc::UnboundedReceiver<ListingCompletion>,
    in_flight: usize,
    filter: String,
    products: Vec<Product>,
}

impl<C, B> CatalogBrowser<C, B>
where
    C: CatalogLookup,
    B: EventBus<BrowseNotification>,
{
    pub fn new(catalog: Arc<C>, bus: B, config: &ScanConfig) -> Self {
        let (scheduler, settled_rx) =
            QueryScheduler::new("filter", config.filter_quiescence, BlankInput::Dispatch);
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();

        Self {
            catalog,
            bus,
            scheduler,
            settled_rx,
            sequencer: ResolutionSequencer::new(),
            completions_tx,
            completions_rx,
            in_flight: 0,
            filter: String::new(),
            products: Vec::new(),
        }
    }

    /// Products of the latest successful listing.
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Filter the current listing was produced for.
    pub fn current_filter(&self) -> &str {
        &self.filter
    }

    pub fn is_idle(&self) -> bool {
        !self.scheduler.is_pending() && self.in_flight == 0
    }

    /// The filter field changed.
    pub fn filter(&mut self, raw: impl Into<String>) {
        self.scheduler.schedule(raw);
    }

    /// List again right away with the current filter, e.g. after a product
    /// was added or deleted.
    pub fn refresh(&mut self) -> QueryToken {
        self.scheduler.cancel();
        let filter = self.scheduler.buffer().trim().to_string();
        self.dispatch(filter)
    }

    pub async fn step(&mut self) -> Option<BrowseProgress> {
        if self.is_idle() {
            return None;
        }

        tokio::select! {
            biased;
            Some(settled) = self.settled_rx.recv() => Some(match self.scheduler.settle(settled) {
                Some(filter) => {
                    let token = self.dispatch(filter.clone());
                    BrowseProgress::Dispatched { token, filter }
                }
                None => BrowseProgress::Dropped,
            }),
            Some(completion) = self.completions_rx.recv() => Some(self.on_completion(completion)),
            else => None,
        }
    }

    fn dispatch(&mut self, filter: String) -> QueryToken {
        let token = self.sequencer.issue();
        self.in_flight += 1;
        tracing::debug!(%token, filter = %filter, "listing products");

        let catalog = Arc::clone(&self.catalog);
        let listing_filter = filter.clone();
        spawn_lookup(token, filter, self.completions_tx.clone(), async move {
            catalog.list_products(&listing_filter).await
        });

        token
    }

    fn on_completion(&mut self, completion: ListingCompletion) -> BrowseProgress {
        self.in_flight = self.in_flight.saturating_sub(1);

        let Completion { token, query, payload } = match self.sequencer.admit(completion) {
            Ok(completion) => completion,
            Err(stale) => {
                tracing::debug!(
                    token = %stale.token,
                    latest = %stale.latest,
                    "discarding stale listing"
                );
                return BrowseProgress::Discarded { token: stale.token };
            }
        };

        let notification = match payload {
            Ok(products) => {
                self.filter = query.clone();
                self.products = products.clone();
                BrowseNotification::Listed { filter: query, products }
            }
            Err(err) => {
                tracing::warn!(%token, filter = %query, error = %err, "listing failed");
                BrowseNotification::Failed {
                    filter: query,
                    message: err.to_string(),
                }
            }
        };

        let progress = match &notification {
            BrowseNotification::Listed { products, .. } => BrowseProgress::Listed {
                token,
                count: products.len(),
            },
            BrowseNotification::Failed { .. } => BrowseProgress::Failed { token },
        };

        if let Err(err) = self.bus.publish(notification) {
            tracing::error!(error = ?err, "failed to publish browse notification");
        }
        progress
    }
}
