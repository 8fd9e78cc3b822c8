//! `scancart-session`
//!
//! **Responsibility:** turn a stream of raw scanner/keyboard input into a
//! consistent cart.
//!
//! ```text
//! input → QueryScheduler (quiescence) → CatalogLookup (async)
//!       → ResolutionSequencer (staleness) → Cart (merge) → notifications
//! ```
//!
//! A session is driven from a single task. Lookups run concurrently, but
//! their only effect is to post a token-tagged completion back to that task,
//! where stale completions are discarded before anything touches the cart.

pub mod browser;
pub mod config;
pub mod notification;
pub mod scheduler;
pub mod sequencer;
pub mod session;

use std::sync::Arc;

use scancart_events::InMemoryEventBus;

pub use browser::{BrowseProgress, CatalogBrowser};
pub use config::{ConfigError, ScanConfig};
pub use notification::{BrowseNotification, CartNotification, ResolutionFailure};
pub use scheduler::{BlankInput, QueryScheduler, SettledInput};
pub use sequencer::{Completion, QueryToken, ResolutionSequencer, StaleResult};
pub use session::{Progress, ScanSession, SessionCommand};

/// Shared in-memory bus, the default notification transport.
pub type SharedBus<M> = Arc<InMemoryEventBus<M>>;
