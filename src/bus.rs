//! Process-wide signal bus.
//!
//! Every signal enters one ordered queue that the dispatcher drains one signal at a time, so
//! handlers always run to completion before the next signal is looked at. Observers (console
//! output, status lines) receive each signal after the lifecycle controller has handled it.

use crate::model::Signal;
use tokio::sync::{broadcast, mpsc};

/// Observers that fall this far behind start losing signals.
const OBSERVER_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct EventBus {
    queue_tx: mpsc::UnboundedSender<Signal>,
    observers: broadcast::Sender<Signal>,
}

impl EventBus {
    /// Create the bus and the receiving end of its dispatch queue.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Signal>) {
        let (queue_tx, queue_rx) = mpsc::unbounded_channel();
        let (observers, _) = broadcast::channel(OBSERVER_CAPACITY);
        (
            Self {
                queue_tx,
                observers,
            },
            queue_rx,
        )
    }

    /// Queue a signal for dispatch.
    pub fn send(&self, signal: Signal) {
        tracing::trace!(signal = signal.name(), "queued");
        if self.queue_tx.send(signal).is_err() {
            tracing::debug!("dispatcher stopped; signal dropped");
        }
    }

    /// Persistent subscription to every dispatched signal.
    pub fn subscribe(&self) -> broadcast::Receiver<Signal> {
        self.observers.subscribe()
    }

    /// Deliver an already-dispatched signal to observers.
    pub(crate) fn publish(&self, signal: Signal) {
        // No observers is fine.
        let _ = self.observers.send(signal);
    }

    /// One-shot subscription: resolves with the next dispatched signal called `name`.
    #[cfg(test)]
    pub fn once(&self, name: &'static str) -> impl std::future::Future<Output = Option<Signal>> {
        let mut rx = self.observers.subscribe();
        async move {
            loop {
                match rx.recv().await {
                    Ok(signal) if signal.name() == name => return Some(signal),
                    Ok(_) => continue,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => return None,
                }
            }
        }
    }
}
