use std::cell::{Cell, RefCell};

use anyhow::{anyhow, Result};
use tokio::sync::mpsc;

use crate::snapshot::TimeSnapshot;

/// The page being augmented. Reads are point-in-time and never mutate it.
pub trait HostDocument {
    /// Capture the current text fragments. An error means the page is not
    /// readable yet and the attempt should be retried later.
    fn snapshot_text(&self, selector_hint: &str) -> Result<TimeSnapshot>;

    /// Start receiving one message per observed change under `scope`.
    fn subscribe_to_changes(&self, scope: &str) -> ChangeSubscription;
}

/// Handle for a change-notification subscription. Cancelling closes the
/// channel so the host stops delivering; dropping the handle does the same.
#[derive(Debug)]
pub struct ChangeSubscription {
    receiver: Option<mpsc::UnboundedReceiver<()>>,
}

impl ChangeSubscription {
    pub fn new(receiver: mpsc::UnboundedReceiver<()>) -> Self {
        Self {
            receiver: Some(receiver),
        }
    }

    /// A subscription that never delivers.
    pub fn closed() -> Self {
        Self { receiver: None }
    }

    /// Pair of host-side sender and subscription handle.
    pub fn channel() -> (mpsc::UnboundedSender<()>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self::new(rx))
    }

    pub fn is_active(&self) -> bool {
        self.receiver.is_some()
    }

    /// Next change notification; `None` once cancelled or the host hung up.
    pub async fn next(&mut self) -> Option<()> {
        match self.receiver.as_mut() {
            Some(rx) => rx.recv().await,
            None => None,
        }
    }

    pub fn cancel(&mut self) {
        if let Some(mut rx) = self.receiver.take() {
            rx.close();
        }
    }
}

/// In-memory host backed by a replaceable snapshot. Used by the CLI and by
/// tests to stand in for a live page.
#[derive(Debug, Default)]
pub struct FixtureDocument {
    snapshot: RefCell<Option<TimeSnapshot>>,
    subscribers: RefCell<Vec<mpsc::UnboundedSender<()>>>,
    reads: Cell<usize>,
}

impl FixtureDocument {
    /// A page that has not rendered yet.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rendered(snapshot: TimeSnapshot) -> Self {
        let document = Self::default();
        document.snapshot.replace(Some(snapshot));
        document
    }

    /// Swap in new content without telling subscribers.
    pub fn replace(&self, snapshot: TimeSnapshot) {
        self.snapshot.replace(Some(snapshot));
    }

    /// Swap in new content and notify every live subscriber.
    pub fn publish(&self, snapshot: TimeSnapshot) -> usize {
        self.replace(snapshot);
        self.notify()
    }

    /// Deliver one change notification; returns how many subscribers got it.
    pub fn notify(&self) -> usize {
        let mut subscribers = self.subscribers.borrow_mut();
        subscribers.retain(|tx| tx.send(()).is_ok());
        subscribers.len()
    }

    /// Number of `snapshot_text` calls so far.
    pub fn read_count(&self) -> usize {
        self.reads.get()
    }

    pub fn active_subscriptions(&self) -> usize {
        self.subscribers
            .borrow()
            .iter()
            .filter(|tx| !tx.is_closed())
            .count()
    }
}

impl HostDocument for FixtureDocument {
    fn snapshot_text(&self, _selector_hint: &str) -> Result<TimeSnapshot> {
        self.reads.set(self.reads.get() + 1);
        self.snapshot
            .borrow()
            .clone()
            .ok_or_else(|| anyhow!("document has not rendered yet"))
    }

    fn subscribe_to_changes(&self, _scope: &str) -> ChangeSubscription {
        let (tx, subscription) = ChangeSubscription::channel();
        self.subscribers.borrow_mut().push(tx);
        subscription
    }
}
