//! The scan session: owns the cart and drives the resolution pipeline.

use std::str::FromStr;
use std::sync::Arc;

use tokio::sync::mpsc;

use scancart_cart::{Cart, CartEvent, CartSnapshot};
use scancart_catalog::{CatalogError, CatalogLookup, Product};
use scancart_core::{CartId, DomainError, DomainResult, ProductId};
use scancart_events::EventBus;

use crate::SharedBus;
use crate::config::ScanConfig;
use crate::notification::{CartNotification, ResolutionFailure};
use crate::scheduler::{BlankInput, QueryScheduler, SettledInput};
use crate::sequencer::{Completion, QueryToken, ResolutionSequencer, spawn_lookup};

type LookupCompletion = Completion<Result<Vec<Product>, CatalogError>>;

/// What a single [`ScanSession::step`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Progress {
    /// A settled query was sent to the catalog.
    Dispatched { token: QueryToken, query: String },
    /// The latest lookup resolved and was merged into the cart.
    Applied { token: QueryToken, events: Vec<CartEvent> },
    /// The latest lookup produced nothing usable; the cart is unchanged.
    Failed { token: QueryToken, reason: ResolutionFailure },
    /// A superseded lookup completed and was ignored.
    Discarded { token: QueryToken },
    /// Settled input was blank, or came from a cancelled window.
    Dropped,
}

/// Operator actions, as fed to [`ScanSession::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// The input field changed.
    Input(String),
    SetQuantity { line_id: ProductId, requested: i64 },
    RemoveLine { line_id: ProductId },
    Clear,
}

/// Parses the line protocol of the `scancart` binary.
///
/// `:clear`, `:qty <line-id> <n>` and `:rm <line-id>` are commands; any
/// other line is scanner input.
impl FromStr for SessionCommand {
    type Err = DomainError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let Some(command) = line.trim().strip_prefix(':') else {
            return Ok(SessionCommand::Input(line.to_string()));
        };

        let mut parts = command.split_whitespace();
        match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some("clear"), None, None, None) => Ok(SessionCommand::Clear),
            (Some("rm"), Some(id), None, None) => Ok(SessionCommand::RemoveLine {
                line_id: id.parse()?,
            }),
            (Some("qty"), Some(id), Some(requested), None) => {
                let requested = requested.parse::<i64>().map_err(|_| {
                    DomainError::validation(format!("invalid quantity: {requested}"))
                })?;
                Ok(SessionCommand::SetQuantity {
                    line_id: id.parse()?,
                    requested,
                })
            }
            _ => Err(DomainError::validation(format!("unknown command: :{command}"))),
        }
    }
}

/// Scan-to-cart pipeline for a single operator.
///
/// All state lives here and is touched only from the task driving the
/// session. Lookups run as spawned tasks that post a token-tagged
/// completion back; only the completion carrying the latest token may
/// mutate the cart, so mutations follow the order of settled inputs rather
/// than the order in which the catalog answers.
pub struct ScanSession<C, B = SharedBus<CartNotification>>
where
    C: CatalogLookup,
    B: EventBus<CartNotification>,
{
    cart: Cart,
    catalog: Arc<C>,
    bus: B,
    scheduler: QueryScheduler,
    settled_rx: mpsc::UnboundedReceiver<SettledInput>,
    sequencer: ResolutionSequencer,
    completions_tx: mpsc::UnboundedSender<LookupCompletion>,
    completions_rx: mpsc::UnboundedReceiver<LookupCompletion>,
    in_flight: usize,
}

impl<C, B> ScanSession<C, B>
where
    C: CatalogLookup,
    B: EventBus<CartNotification>,
{
    pub fn new(catalog: Arc<C>, bus: B, config: &ScanConfig) -> Self {
        let (scheduler, settled_rx) =
            QueryScheduler::new("scan", config.scan_quiescence, BlankInput::Drop);
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();

        Self {
            cart: Cart::new(CartId::new()),
            catalog,
            bus,
            scheduler,
            settled_rx,
            sequencer: ResolutionSequencer::new(),
            completions_tx,
            completions_rx,
            in_flight: 0,
        }
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn snapshot(&self) -> CartSnapshot {
        self.cart.snapshot()
    }

    /// Current contents of the input buffer.
    pub fn pending_input(&self) -> &str {
        self.scheduler.buffer()
    }

    /// Lookups dispatched but not yet completed, stale ones included.
    pub fn is_resolving(&self) -> bool {
        self.in_flight > 0
    }

    /// Nothing is waiting on a timer or on the catalog.
    pub fn is_idle(&self) -> bool {
        !self.scheduler.is_pending() && self.in_flight == 0
    }

    /// The input field changed. Restarts the scan quiescence window.
    pub fn input(&mut self, raw: impl Into<String>) {
        self.scheduler.schedule(raw);
    }

    pub fn set_quantity(
        &mut self,
        line_id: ProductId,
        requested: i64,
    ) -> DomainResult<Vec<CartEvent>> {
        let events = self.cart.set_quantity(line_id, requested)?;
        if !events.is_empty() {
            self.publish_cart();
        }
        Ok(events)
    }

    pub fn remove_line_item(&mut self, line_id: ProductId) -> DomainResult<Vec<CartEvent>> {
        let events = self.cart.remove_line_item(line_id)?;
        if !events.is_empty() {
            self.publish_cart();
        }
        Ok(events)
    }

    /// Empty the cart and the input buffer.
    ///
    /// Lookups still in flight become stale and will not touch the cart.
    pub fn clear_cart(&mut self) -> DomainResult<Vec<CartEvent>> {
        let events = self.cart.clear()?;
        self.scheduler.reset();
        self.sequencer.invalidate();

        self.publish_cart();
        self.publish(CartNotification::InputReset);
        Ok(events)
    }

    pub fn apply_command(&mut self, command: SessionCommand) -> DomainResult<()> {
        match command {
            SessionCommand::Input(raw) => self.input(raw),
            SessionCommand::SetQuantity { line_id, requested } => {
                self.set_quantity(line_id, requested)?;
            }
            SessionCommand::RemoveLine { line_id } => {
                self.remove_line_item(line_id)?;
            }
            SessionCommand::Clear => {
                self.clear_cart()?;
            }
        }
        Ok(())
    }

    /// Wait for and handle the next pipeline event.
    ///
    /// Returns `None` when the session is idle. Settled input is handled
    /// before lookup completions that are ready at the same time.
    pub async fn step(&mut self) -> Option<Progress> {
        if self.is_idle() {
            return None;
        }

        tokio::select! {
            biased;
            Some(settled) = self.settled_rx.recv() => Some(self.on_settled(settled)),
            Some(completion) = self.completions_rx.recv() => Some(self.on_completion(completion)),
            else => None,
        }
    }

    /// Drive the session from a command channel.
    ///
    /// Once the channel closes, outstanding work is finished and the final
    /// cart is returned.
    pub async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<SessionCommand>,
    ) -> CartSnapshot {
        let mut closed = false;

        loop {
            if closed && self.is_idle() {
                break;
            }

            tokio::select! {
                biased;
                command = commands.recv(), if !closed => match command {
                    Some(command) => {
                        if let Err(err) = self.apply_command(command) {
                            tracing::warn!(error = %err, "command rejected");
                        }
                    }
                    None => closed = true,
                },
                _ = self.step(), if !self.is_idle() => {}
                else => break,
            }
        }

        self.snapshot()
    }

    fn on_settled(&mut self, settled: SettledInput) -> Progress {
        match self.scheduler.settle(settled) {
            Some(query) => self.dispatch(query),
            None => Progress::Dropped,
        }
    }

    fn dispatch(&mut self, query: String) -> Progress {
        let token = self.sequencer.issue();
        self.in_flight += 1;
        tracing::info!(%token, query = %query, "dispatching lookup");

        let catalog = Arc::clone(&self.catalog);
        let lookup_query = query.clone();
        spawn_lookup(token, query.clone(), self.completions_tx.clone(), async move {
            catalog.lookup(&lookup_query).await
        });

        Progress::Dispatched { token, query }
    }

    fn on_completion(&mut self, completion: LookupCompletion) -> Progress {
        self.in_flight = self.in_flight.saturating_sub(1);

        let Completion { token, query, payload } = match self.sequencer.admit(completion) {
            Ok(completion) => completion,
            Err(stale) => {
                tracing::debug!(
                    token = %stale.token,
                    latest = %stale.latest,
                    "discarding stale lookup result"
                );
                return Progress::Discarded { token: stale.token };
            }
        };

        let products = match payload {
            Ok(products) => products,
            Err(err) => return self.fail(token, query, ResolutionFailure::from(&err)),
        };

        match self.cart.apply_resolution(&products) {
            Ok(events) => {
                tracing::info!(
                    %token,
                    query = %query,
                    total = %self.cart.total(),
                    "lookup applied"
                );
                self.publish_cart();
                // Only wipe the field if the operator has not started typing again.
                if !self.scheduler.is_pending() {
                    self.scheduler.reset();
                    self.publish(CartNotification::InputReset);
                }
                Progress::Applied { token, events }
            }
            Err(DomainError::NotFound) => self.fail(token, query, ResolutionFailure::NotFound),
            Err(err) => {
                tracing::error!(%token, error = %err, "cart rejected resolution");
                self.fail(
                    token,
                    query,
                    ResolutionFailure::Transient {
                        message: err.to_string(),
                    },
                )
            }
        }
    }

    fn fail(&self, token: QueryToken, query: String, reason: ResolutionFailure) -> Progress {
        tracing::warn!(%token, query = %query, reason = ?reason, "lookup failed");
        self.publish(CartNotification::ResolutionFailed {
            query,
            reason: reason.clone(),
        });
        Progress::Failed { token, reason }
    }

    fn publish_cart(&self) {
        self.publish(CartNotification::from(self.cart.snapshot()));
    }

    fn publish(&self, notification: CartNotification) {
        if let Err(err) = self.bus.publish(notification) {
            tracing::error!(error = ?err, "failed to publish cart notification");
        }
    }
}
