//! Cross-cutting event vocabulary shared by the apply driver, the watch loop
//! and the CLI, so none of them need to depend on each other just to agree on
//! a progress or filesystem event type.

use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;

/// Bound used for every `ProgressEvent`/`FileEvent` channel in the workspace.
/// A single producer/single consumer pair never needs deep buffering; this
/// just keeps a slow consumer from stalling the producing thread for long.
pub const EVENT_CHANNEL_CAP: usize = 1024;

/// One step of an apply run, emitted action-by-action by the apply driver so
/// a CLI renderer (or a test) can observe progress without depending on the
/// driver's internals.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// A plan of `total` actions has been computed and apply is starting.
    Started { total: usize },
    /// The action at `index` (0-based, within the plan) completed.
    ActionApplied { index: usize, total: usize, summary: String },
    /// The whole plan applied without error.
    Finished { applied: usize },
    /// The action at `index` failed; apply stops after emitting this event.
    Failed { index: usize, summary: String, error: String },
}

/// Filesystem change vocabulary produced by the watch loop's `notify` source.
#[derive(Debug, Clone)]
pub enum FileEvent {
    /// The watched Markdown file (or one of its includes) changed on disk.
    Changed,
    /// The underlying watcher reported an error; the watch loop logs it and
    /// keeps running rather than tearing down the session.
    WatchError(String),
}

/// Trait implemented by any async event producer: a type that owns its own
/// background task and pushes events into a shared channel until the
/// receiver is dropped.
///
/// Implementors must stop promptly once `tx.send(..).await` starts failing
/// (channel closed) rather than looping or retrying.
pub trait AsyncEventSource<E: Send + 'static>: Send + 'static {
    /// Stable identifier used only for logging.
    fn name(&self) -> &'static str;
    /// Consume self and spawn the background task, returning its handle.
    fn spawn(self: Box<Self>, tx: Sender<E>) -> JoinHandle<()>;
}
