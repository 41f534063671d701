//! Routes directory watcher for hot reload.

use std::path::PathBuf;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::modules::loader::RouteLoader;

/// Watches the routes directory and reloads only the files that changed.
pub struct RouteWatcher {
    loader: RouteLoader,
    reload_tx: Option<mpsc::UnboundedSender<PathBuf>>,
}

impl RouteWatcher {
    pub fn new(loader: RouteLoader) -> Self {
        Self {
            loader,
            reload_tx: None,
        }
    }

    /// Also report every successfully reloaded file on a channel.
    pub fn with_notifications(mut self) -> (Self, mpsc::UnboundedReceiver<PathBuf>) {
        let (tx, rx) = mpsc::unbounded_channel();
        self.reload_tx = Some(tx);
        (self, rx)
    }

    /// Start watching. The returned watcher must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let dir = self.loader.routes_dir().to_path_buf();
        let loader = self.loader;
        let tx = self.reload_tx;

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if !(event.kind.is_modify() || event.kind.is_create() || event.kind.is_remove()) {
                        return;
                    }
                    for path in event.paths {
                        // Files created together with their directory can
                        // predate the directory's watch, so rescan it.
                        if path.is_dir() {
                            loader.load_tree(&path);
                            if let Some(tx) = &tx {
                                let _ = tx.send(path);
                            }
                            continue;
                        }
                        match loader.reload(&path) {
                            Ok(Some(_)) => {
                                tracing::info!(file = ?path, "Route file change applied");
                                if let Some(tx) = &tx {
                                    let _ = tx.send(path);
                                }
                            }
                            Ok(None) => {}
                            Err(e) => {
                                tracing::error!(error = %e, "Failed to reload route file. Keeping current handler.");
                            }
                        }
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        std::fs::create_dir_all(&dir).map_err(notify::Error::io)?;
        watcher.watch(&dir, RecursiveMode::Recursive)?;

        tracing::info!(path = ?dir, "Route watcher started");
        Ok(watcher)
    }
}
