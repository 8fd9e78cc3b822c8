//! Debounced query scheduling.
//!
//! Each [`QueryScheduler`] owns at most one pending timer. Every `schedule`
//! call cancels it and starts a new quiescence window; when a window elapses
//! untouched, the buffered input is posted to the scheduler's channel as a
//! [`SettledInput`]. The owner hands it back through [`QueryScheduler::settle`],
//! which rejects anything from a window that was cancelled in the meantime.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// What to do with input that is blank once its window settles.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum BlankInput {
    /// Never dispatch a blank query (scan input).
    #[default]
    Drop,
    /// Dispatch it anyway (catalog filtering: blank lists everything).
    Dispatch,
}

/// Input whose quiescence window elapsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettledInput {
    generation: u64,
    input: String,
}

impl SettledInput {
    pub fn input(&self) -> &str {
        &self.input
    }
}

/// Cancellable single-timer debouncer.
///
/// `schedule` must be called from within a Tokio runtime.
#[derive(Debug)]
pub struct QueryScheduler {
    name: &'static str,
    window: Duration,
    blank: BlankInput,
    generation: u64,
    buffer: String,
    pending: Option<JoinHandle<()>>,
    settled_tx: mpsc::UnboundedSender<SettledInput>,
}

impl QueryScheduler {
    pub fn new(
        name: &'static str,
        window: Duration,
        blank: BlankInput,
    ) -> (Self, mpsc::UnboundedReceiver<SettledInput>) {
        let (settled_tx, settled_rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            name,
            window,
            blank,
            generation: 0,
            buffer: String::new(),
            pending: None,
            settled_tx,
        };
        (scheduler, settled_rx)
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// The most recent raw input.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// A window is running, or has elapsed but not been settled yet.
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Replace the buffered input and restart the quiescence window.
    pub fn schedule(&mut self, raw: impl Into<String>) {
        self.cancel();
        self.buffer = raw.into();

        let settled = SettledInput {
            generation: self.generation,
            input: self.buffer.clone(),
        };
        let tx = self.settled_tx.clone();
        // Deadline is fixed now, not when the timer task first gets polled.
        let deadline = Instant::now() + self.window;

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let _ = tx.send(settled);
        }));
    }

    /// Cancel the pending window, if any. The buffer is kept.
    pub fn cancel(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    /// Cancel the pending window and forget the buffered input.
    pub fn reset(&mut self) {
        self.cancel();
        self.buffer.clear();
    }

    /// Turn a settled input into the query to dispatch.
    ///
    /// Returns `None` for input from a cancelled window, and for blank input
    /// under [`BlankInput::Drop`]. The returned query is trimmed.
    pub fn settle(&mut self, settled: SettledInput) -> Option<String> {
        if settled.generation != self.generation {
            tracing::trace!(scheduler = self.name, "ignoring input from a cancelled window");
            return None;
        }
        self.pending = None;

        let query = settled.input.trim();
        if query.is_empty() && self.blank == BlankInput::Drop {
            tracing::debug!(scheduler = self.name, "dropping blank input");
            return None;
        }
        Some(query.to_string())
    }
}

impl Drop for QueryScheduler {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_millis(1000);

    async fn next_query(
        scheduler: &mut QueryScheduler,
        rx: &mut mpsc::UnboundedReceiver<SettledInput>,
    ) -> Option<String> {
        let settled = rx.recv().await?;
        scheduler.settle(settled)
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_quiescence() {
        let (mut scheduler, mut rx) = QueryScheduler::new("test", WINDOW, BlankInput::Drop);
        let started = Instant::now();

        scheduler.schedule("123456");
        assert!(scheduler.is_pending());

        let query = next_query(&mut scheduler, &mut rx).await;
        assert_eq!(query.as_deref(), Some("123456"));
        assert!(started.elapsed() >= WINDOW);
        assert!(!scheduler.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_input_coalesces_to_last_value() {
        let (mut scheduler, mut rx) = QueryScheduler::new("test", WINDOW, BlankInput::Drop);

        for input in ["1", "12", "123", "1234", "12345", "123456"] {
            scheduler.schedule(input);
            tokio::time::advance(Duration::from_millis(200)).await;
        }

        let query = next_query(&mut scheduler, &mut rx).await;
        assert_eq!(query.as_deref(), Some("123456"));

        let more = tokio::time::timeout(Duration::from_secs(10), rx.recv()).await;
        assert!(more.is_err(), "superseded windows must never fire");
    }

    #[tokio::test(start_paused = true)]
    async fn blank_input_is_dropped() {
        let (mut scheduler, mut rx) = QueryScheduler::new("test", WINDOW, BlankInput::Drop);

        scheduler.schedule("   ");

        assert_eq!(next_query(&mut scheduler, &mut rx).await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn blank_input_dispatches_when_configured() {
        let (mut scheduler, mut rx) = QueryScheduler::new("test", WINDOW, BlankInput::Dispatch);

        scheduler.schedule("");

        assert_eq!(next_query(&mut scheduler, &mut rx).await.as_deref(), Some(""));
    }

    #[tokio::test(start_paused = true)]
    async fn clear_then_retype_never_fires_on_blank() {
        let (mut scheduler, mut rx) = QueryScheduler::new("test", WINDOW, BlankInput::Drop);

        scheduler.schedule("123");
        tokio::time::advance(Duration::from_millis(400)).await;
        scheduler.schedule("");
        tokio::time::advance(Duration::from_millis(400)).await;
        scheduler.schedule("999");

        assert_eq!(next_query(&mut scheduler, &mut rx).await.as_deref(), Some("999"));
        let more = tokio::time::timeout(Duration::from_secs(10), rx.recv()).await;
        assert!(more.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn input_after_fire_starts_fresh_window() {
        let (mut scheduler, mut rx) = QueryScheduler::new("test", WINDOW, BlankInput::Drop);

        scheduler.schedule("first");
        assert_eq!(next_query(&mut scheduler, &mut rx).await.as_deref(), Some("first"));

        let restarted = Instant::now();
        scheduler.schedule("second");
        assert_eq!(next_query(&mut scheduler, &mut rx).await.as_deref(), Some("second"));
        assert!(restarted.elapsed() >= WINDOW);
    }

    #[tokio::test(start_paused = true)]
    async fn settled_input_from_cancelled_window_is_rejected() {
        let (mut scheduler, mut rx) = QueryScheduler::new("test", WINDOW, BlankInput::Drop);

        scheduler.schedule("123456");
        let settled = rx.recv().await.unwrap();
        // Input arrives after the timer posted but before the owner consumed it.
        scheduler.schedule("654321");

        assert_eq!(scheduler.settle(settled), None);
        assert_eq!(next_query(&mut scheduler, &mut rx).await.as_deref(), Some("654321"));
    }

    #[tokio::test(start_paused = true)]
    async fn reset_cancels_and_clears_buffer() {
        let (mut scheduler, mut rx) = QueryScheduler::new("test", WINDOW, BlankInput::Drop);

        scheduler.schedule("123456");
        scheduler.reset();

        assert_eq!(scheduler.buffer(), "");
        assert!(!scheduler.is_pending());
        let fired = tokio::time::timeout(Duration::from_secs(10), rx.recv()).await;
        assert!(fired.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn settled_query_is_trimmed() {
        let (mut scheduler, mut rx) = QueryScheduler::new("test", WINDOW, BlankInput::Drop);

        scheduler.schedule(" 123456\n");

        assert_eq!(next_query(&mut scheduler, &mut rx).await.as_deref(), Some("123456"));
        assert_eq!(scheduler.buffer(), " 123456\n");
    }
}
