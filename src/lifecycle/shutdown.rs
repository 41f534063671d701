//! Shutdown coordination for the server, console and watcher.

use tokio::sync::broadcast;

/// Coordinator for graceful shutdown.
///
/// Cloning shares the channel. Any holder may trigger; every subscriber
/// is woken once.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// A future that resolves on the next trigger, for `with_graceful_shutdown`.
    pub fn signal(&self) -> impl std::future::Future<Output = ()> + Send + 'static {
        let mut rx = self.subscribe();
        async move {
            let _ = rx.recv().await;
        }
    }

    /// Trigger on Ctrl+C.
    pub fn trigger_on_ctrl_c(&self) {
        let shutdown = self.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("Shutdown signal received");
                    shutdown.trigger();
                }
                Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl+C"),
            }
        });
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_signal_resolves_on_trigger() {
        let shutdown = Shutdown::new();
        let signal = shutdown.signal();
        assert_eq!(shutdown.receiver_count(), 1);

        shutdown.clone().trigger();
        tokio::time::timeout(std::time::Duration::from_secs(1), signal)
            .await
            .unwrap();
    }
}
