//! Background task that removes idle conversations

use crate::history::store::ConversationHistoryStore;
use std::sync::{Arc, Weak};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Handle to the periodic history sweep
///
/// The task only holds a weak reference to the store, so it ends by itself
/// once the store is dropped. Dropping the handle aborts the task.
#[derive(Debug)]
pub struct HistorySweeper {
    shutdown: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl HistorySweeper {
    /// Start sweeping `store` every `sweep_interval` of its configuration
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(store: &Arc<ConversationHistoryStore>) -> Self {
        let period = store.config().sweep_interval;
        let store: Weak<ConversationHistoryStore> = Arc::downgrade(store);
        let (shutdown, mut shutdown_rx) = watch::channel(false);

        info!("Starting conversation sweep task (interval: {:?})", period);

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                        continue;
                    }
                }

                let Some(store) = store.upgrade() else {
                    debug!("History store dropped, stopping sweep task");
                    break;
                };
                let removed = store.sweep();
                debug!(removed, "Conversation sweep finished");
            }
        });

        Self {
            shutdown,
            handle: Some(handle),
        }
    }

    /// Stop the task and wait for it to finish
    pub async fn shutdown(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
        info!("Conversation sweep task stopped");
    }

    /// Whether the background task has ended
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for HistorySweeper {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
