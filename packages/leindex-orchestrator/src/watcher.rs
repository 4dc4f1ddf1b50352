//! Debounced filesystem watch feeding re-indexing: raw `notify` events are
//! coalesced over a fixed window before triggering a re-index, so a
//! save-storm in an editor produces one incremental pass instead of one per
//! write.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::pipeline::index_project;
use crate::project::ProjectRegistry;

/// Watches `root` for changes and re-indexes the project after each quiet
/// period of `debounce_ms`. Runs until the channel the internal `notify`
/// watcher feeds is dropped (i.e. until `stop` fires) or a fatal watch
/// error occurs.
pub async fn watch_project(
    registry: Arc<ProjectRegistry>,
    root: PathBuf,
    debounce_ms: u64,
    mut stop: tokio::sync::watch::Receiver<bool>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut watcher = match RecommendedWatcher::new(
        move |res: notify::Result<notify::Event>| {
            if let Ok(event) = res {
                let _ = tx.send(event);
            }
        },
        notify::Config::default(),
    ) {
        Ok(w) => w,
        Err(err) => {
            error!(path = %root.display(), error = %err, "failed to create file watcher");
            return;
        }
    };

    if let Err(err) = watcher.watch(&root, RecursiveMode::Recursive) {
        error!(path = %root.display(), error = %err, "failed to watch project root");
        return;
    }
    info!(path = %root.display(), "watching project for changes");

    let debounce = Duration::from_millis(debounce_ms.max(1));
    loop {
        tokio::select! {
            _ = stop.changed() => {
                if *stop.borrow() {
                    info!(path = %root.display(), "stopping file watcher");
                    return;
                }
            }
            event = rx.recv() => {
                if event.is_none() {
                    return;
                }
                // Drain whatever else arrives within the debounce window so
                // a burst of writes collapses into a single re-index.
                tokio::time::sleep(debounce).await;
                while rx.try_recv().is_ok() {}

                match index_project(&registry, &root, false).await {
                    Ok(report) => info!(
                        path = %root.display(),
                        generation = report.generation,
                        files_processed = report.files_processed,
                        "incremental re-index triggered by file watcher"
                    ),
                    Err(err) => warn!(path = %root.display(), error = %err, "incremental re-index failed"),
                }
            }
        }
    }
}
