use crate::views::IndexSnapshot;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

type Projection<T> = fn(&Arc<IndexSnapshot>) -> Arc<T>;

/// Subscription to one view of the index.
///
/// The first [`next`](Self::next) yields the latest published value right away;
/// later calls wait for the next publish. A slow subscriber only ever sees the
/// newest value, never an older one. Returns `None` once the engine is
/// deactivated.
pub struct ViewStream<T> {
    rx: watch::Receiver<Arc<IndexSnapshot>>,
    project: Projection<T>,
    primed: bool,
}

impl<T> ViewStream<T> {
    pub(crate) fn new(rx: watch::Receiver<Arc<IndexSnapshot>>, project: Projection<T>) -> Self {
        Self {
            rx,
            project,
            primed: false,
        }
    }

    /// Latest value without consuming a change.
    #[must_use]
    pub fn latest(&self) -> Arc<T> {
        (self.project)(&self.rx.borrow())
    }

    /// Generation of the snapshot the latest value belongs to.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.rx.borrow().generation
    }

    pub async fn next(&mut self) -> Option<Arc<T>> {
        if self.primed {
            self.rx.changed().await.ok()?;
        }
        self.primed = true;
        // a closed channel ends the stream even if an unseen value is pending
        self.rx.has_changed().ok()?;
        Some((self.project)(&self.rx.borrow_and_update()))
    }
}

/// Owner side of the snapshot channel. Closing is synchronous and permanent.
pub(crate) struct Publisher {
    tx: Mutex<Option<watch::Sender<Arc<IndexSnapshot>>>>,
}

impl Publisher {
    pub(crate) fn new() -> (Self, watch::Receiver<Arc<IndexSnapshot>>) {
        let (tx, rx) = watch::channel(Arc::new(IndexSnapshot::empty()));
        (
            Self {
                tx: Mutex::new(Some(tx)),
            },
            rx,
        )
    }

    /// Returns false when the channel is already closed and the snapshot was discarded.
    pub(crate) fn publish(&self, snapshot: Arc<IndexSnapshot>) -> bool {
        let guard = self.tx.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        match guard.as_ref() {
            Some(tx) => {
                tx.send_replace(snapshot);
                true
            }
            None => false,
        }
    }

    pub(crate) fn close(&self) {
        let taken = self
            .tx
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take();
        drop(taken);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generation(snapshot: &Arc<IndexSnapshot>) -> Arc<u64> {
        Arc::new(snapshot.generation)
    }

    fn snapshot(generation: u64) -> Arc<IndexSnapshot> {
        Arc::new(IndexSnapshot {
            generation,
            ..IndexSnapshot::empty()
        })
    }

    #[tokio::test]
    async fn replays_latest_then_follows_changes() {
        let (publisher, rx) = Publisher::new();
        publisher.publish(snapshot(1));
        publisher.publish(snapshot(2));

        let mut stream = ViewStream::new(rx, generation);
        assert_eq!(*stream.next().await.unwrap(), 2);

        publisher.publish(snapshot(3));
        assert_eq!(*stream.next().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn close_ends_every_stream() {
        let (publisher, rx) = Publisher::new();
        let mut early = ViewStream::new(rx.clone(), generation);
        assert_eq!(*early.next().await.unwrap(), 0);

        publisher.close();
        assert!(early.next().await.is_none());
        assert!(!publisher.publish(snapshot(1)));

        let mut late = ViewStream::new(rx, generation);
        assert!(late.next().await.is_none());
        assert_eq!(*late.latest(), 0);
    }
}
