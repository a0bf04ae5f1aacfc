//! C7: the watch loop. Debounces filesystem events on the declared
//! Markdown file, re-projects and diffs on trigger, and drives the
//! incremental apply path for whatever pages changed.
//!
//! Scheduling mirrors the teacher's `core-input::async_service`
//! blocking-source-bridged-into-an-async-channel shape: a dedicated OS
//! thread owns the `notify` watcher (its callback API is synchronous) and
//! forwards filtered [`FileEvent`]s into a bounded `tokio::mpsc` channel;
//! the async loop itself only ever touches that channel, a 1s
//! `tokio::time::interval` debounce tick, and an `Arc<tokio::sync::Notify>`
//! shutdown signal.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Event as NotifyEvent, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use thiserror::Error;
use tokio::sync::{mpsc, Notify};
use tokio::time::interval;

use deck_apply::{apply_incremental, ApplyError, ProgressSink};
use deck_diff::changed_pages;
use deck_events::{FileEvent, EVENT_CHANNEL_CAP};
use deck_markdown::ProjectionError;
use deck_remote::RemoteAdapter;

const DEBOUNCE_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("projecting markdown: {0}")]
    Projection(#[from] ProjectionError),
    #[error("applying changed pages: {0}")]
    Apply(#[from] ApplyError),
}

/// Cooperative cancellation shared between whoever starts the watch loop
/// and the loop itself. Cloning shares the same underlying signal.
#[derive(Clone)]
pub struct WatchShutdown(Arc<Notify>);

impl Default for WatchShutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl WatchShutdown {
    pub fn new() -> Self {
        Self(Arc::new(Notify::new()))
    }

    pub fn signal(&self) {
        self.0.notify_waiters();
    }

    fn listener(&self) -> ShutdownListener {
        ShutdownListener(self.0.clone())
    }
}

struct ShutdownListener(Arc<Notify>);

impl ShutdownListener {
    async fn cancelled(&self) {
        self.0.notified().await;
    }
}

/// Whether a raw `notify` event should trigger a re-project: its kind must
/// be a write or create, and at least one of its paths must be the watched
/// file itself — events for sibling files in the same directory are
/// ignored.
fn is_relevant(event: &NotifyEvent, watched: &Path) -> bool {
    matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_))
        && event.paths.iter().any(|p| p == watched)
}

/// Spawns the `notify` watcher on `path`'s parent directory (so renames and
/// editor atomic-save patterns are still observed) and forwards every
/// relevant event into `tx`. The returned watcher must be kept alive for as
/// long as the loop runs; dropping it stops delivery.
fn spawn_watcher(
    path: PathBuf,
    tx: mpsc::Sender<FileEvent>,
) -> notify::Result<RecommendedWatcher> {
    let watched = path.clone();
    let mut watcher = notify::recommended_watcher(move |result: notify::Result<NotifyEvent>| {
        match result {
            Ok(event) if is_relevant(&event, &watched) => {
                let _ = tx.blocking_send(FileEvent::Changed);
            }
            Ok(_) => {}
            Err(err) => {
                let _ = tx.blocking_send(FileEvent::WatchError(err.to_string()));
            }
        }
    })?;
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    watcher.watch(parent, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}

/// Re-projects both the last-known-good and the current file contents,
/// diffs them, and incrementally applies whatever pages changed. Returns
/// `Ok(())` without touching the remote at all when nothing changed.
async fn reconcile_once(
    path: &Path,
    old_contents: &str,
    new_contents: &str,
    adapter: &mut dyn RemoteAdapter,
    sink: &dyn ProgressSink,
) -> Result<usize, WatchError> {
    let old_md = deck_markdown::project(old_contents)?;
    let new_md = deck_markdown::project(new_contents)?;
    let pages = changed_pages(&old_md.slides, &new_md.slides);
    if pages.is_empty() {
        tracing::info!(target: "deck_watch", path = %path.display(), "no changes");
        return Ok(0);
    }
    let applied = apply_incremental(adapter, &pages, &new_md.slides, sink).await?;
    Ok(applied)
}

/// Runs the watch loop until `shutdown` fires. Holds `old_contents` as its
/// own exclusive state: a successful apply replaces it with the contents
/// just applied; a failed one leaves it untouched so the same pages are
/// retried on the next successful apply.
pub async fn run(
    path: PathBuf,
    adapter: &mut dyn RemoteAdapter,
    sink: &dyn ProgressSink,
    shutdown: WatchShutdown,
) -> Result<(), WatchError> {
    let mut old_contents = std::fs::read_to_string(&path).map_err(|source| WatchError::Io {
        path: path.clone(),
        source,
    })?;

    let (tx, mut rx) = mpsc::channel(EVENT_CHANNEL_CAP);
    let _watcher = spawn_watcher(path.clone(), tx)
        .map_err(|err| WatchError::Io { path: path.clone(), source: std::io::Error::other(err) })?;
    let listener = shutdown.listener();
    let mut ticker = interval(DEBOUNCE_INTERVAL);
    let mut dirty = false;

    loop {
        tokio::select! {
            _ = listener.cancelled() => {
                tracing::info!(target: "deck_watch", "shutdown requested, exiting watch loop");
                return Ok(());
            }
            event = rx.recv() => {
                match event {
                    Some(FileEvent::Changed) => dirty = true,
                    Some(FileEvent::WatchError(err)) => {
                        tracing::warn!(target: "deck_watch", error = %err, "filesystem watcher error, continuing");
                    }
                    None => return Ok(()),
                }
            }
            _ = ticker.tick() => {
                if !dirty {
                    continue;
                }
                dirty = false;
                let new_contents = match std::fs::read_to_string(&path) {
                    Ok(text) => text,
                    Err(err) => {
                        tracing::warn!(target: "deck_watch", error = %err, "failed to read file after change event");
                        continue;
                    }
                };
                match reconcile_once(&path, &old_contents, &new_contents, adapter, sink).await {
                    Ok(_) => old_contents = new_contents,
                    Err(err) => {
                        tracing::warn!(target: "deck_watch", error = %err, "apply failed, will retry on next change");
                    }
                }
            }
        }
    }
}
