//! Subscription Handles
//!
//! A `Subscription` is the scoped resource backing one realtime channel: it
//! owns the receiving end of the event pipe and the background task feeding
//! it. Dropping the handle aborts the task, so releasing a conversation's
//! channel - including on the abnormal-exit path - cannot leak a live
//! subscription into another conversation's event flow.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::event::ChangeEvent;

/// An open realtime subscription
pub struct Subscription {
    name: String,
    rx: mpsc::UnboundedReceiver<ChangeEvent>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub(crate) fn new(
        name: impl Into<String>,
        rx: mpsc::UnboundedReceiver<ChangeEvent>,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            name: name.into(),
            rx,
            task: Some(task),
        }
    }

    /// The channel name this subscription was opened under
    pub fn channel(&self) -> &str {
        &self.name
    }

    /// Wait for the next event; `None` once the transport has closed
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        self.rx.recv().await
    }

    /// Take an already-delivered event without waiting
    pub fn try_next(&mut self) -> Option<ChangeEvent> {
        self.rx.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::debug!("[realtime] subscription '{}' released", self.name);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("channel", &self.name)
            .finish()
    }
}
