use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, anyhow};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use scancart_catalog::InMemoryCatalog;
use scancart_events::{EventBus, InMemoryEventBus};
use scancart_session::{CartNotification, ScanConfig, ScanSession, SessionCommand, SharedBus};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    scancart_observability::init();

    let config = ScanConfig::from_env().context("invalid configuration")?;

    let catalog = match &config.catalog_path {
        Some(path) => {
            let json = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("failed to read catalog seed {}", path.display()))?;
            InMemoryCatalog::from_seed_json(&json).context("failed to load catalog seed")?
        }
        None => {
            tracing::warn!("SCANCART_CATALOG not set; starting with an empty catalog");
            InMemoryCatalog::new()
        }
    };
    tracing::info!(products = catalog.len(), "catalog ready");

    let bus: SharedBus<CartNotification> = Arc::new(InMemoryEventBus::new());
    let subscription = bus.subscribe();

    // Ends once the bus, and with it every sender, is dropped.
    let printer = std::thread::spawn(move || {
        let stdout = std::io::stdout();
        while let Ok(notification) = subscription.recv() {
            match serde_json::to_string(&notification) {
                Ok(line) => {
                    let mut out = stdout.lock();
                    let _ = writeln!(out, "{line}");
                    let _ = out.flush();
                }
                Err(err) => tracing::error!(error = %err, "failed to encode notification"),
            }
        }
    });

    let session = ScanSession::new(Arc::new(catalog), Arc::clone(&bus), &config);
    let (commands_tx, commands_rx) = mpsc::unbounded_channel();
    let running = tokio::spawn(session.run(commands_rx));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        match line.parse::<SessionCommand>() {
            Ok(command) => {
                if commands_tx.send(command).is_err() {
                    break;
                }
            }
            Err(err) => tracing::warn!(error = %err, "ignoring input line"),
        }
    }
    drop(commands_tx);

    let snapshot = running.await.context("session task failed")?;
    tracing::info!(lines = snapshot.lines.len(), total = %snapshot.total, "session finished");

    drop(bus);
    printer.join().map_err(|_| anyhow!("notification printer panicked"))?;
    Ok(())
}
