use deck_events::ProgressEvent;
use tokio::sync::mpsc::Sender;

/// Where the apply driver's per-action progress events go. Decoupled from
/// the driver itself so tests can capture events into a `Vec` instead of
/// wiring up a real channel and a terminal renderer.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

/// Forwards events into a channel shared with a terminal dot-renderer (or
/// any other consumer). Never blocks the apply loop: a full or closed
/// channel just drops the event rather than stalling the driver.
pub struct ChannelSink {
    tx: Sender<ProgressEvent>,
}

impl ChannelSink {
    pub fn new(tx: Sender<ProgressEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelSink {
    fn emit(&self, event: ProgressEvent) {
        if let Err(error) = self.tx.try_send(event) {
            tracing::debug!(target: "deck_apply", %error, "progress event dropped");
        }
    }
}
