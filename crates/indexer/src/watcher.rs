use crate::config::WatcherConfig;
use crate::error::{IndexerError, Result};
use crate::filter::DocumentFilter;
use crate::indexer::MarkerIndex;
use crate::model::DocumentId;
use log::{debug, warn};
use notify::{Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time;

/// Feeds filesystem changes under a corpus root into a [`MarkerIndex`].
///
/// Stops when dropped.
pub struct SaveWatcher {
    _watcher: RecommendedWatcher,
    task: JoinHandle<()>,
}

impl SaveWatcher {
    pub fn start(index: MarkerIndex, root: impl AsRef<Path>, config: &WatcherConfig) -> Result<Self> {
        let root = root.as_ref();
        let root = std::fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
        let (event_tx, event_rx) = mpsc::channel(1024);
        let watcher = create_fs_watcher(&root, event_tx, config.poll_interval())?;
        let filter = index.filter().clone();
        let task = tokio::spawn(forward_changes(
            index,
            root,
            filter,
            event_rx,
            config.dedup_window(),
        ));
        Ok(Self {
            _watcher: watcher,
            task,
        })
    }
}

impl Drop for SaveWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn create_fs_watcher(
    root: &Path,
    sender: mpsc::Sender<notify::Result<Event>>,
    poll_interval: Duration,
) -> Result<RecommendedWatcher> {
    let mut watcher = RecommendedWatcher::new(
        move |res| {
            let _ = sender.blocking_send(res);
        },
        NotifyConfig::default().with_poll_interval(poll_interval),
    )
    .map_err(|e| IndexerError::Watch(format!("watcher init failed: {e}")))?;
    watcher
        .watch(root, RecursiveMode::Recursive)
        .map_err(|e| IndexerError::Watch(format!("failed to watch {}: {e}", root.display())))?;
    Ok(watcher)
}

async fn forward_changes(
    index: MarkerIndex,
    root: PathBuf,
    filter: DocumentFilter,
    mut event_rx: mpsc::Receiver<notify::Result<Event>>,
    window: Duration,
) {
    let mut pending = PendingChanges::new(window);

    loop {
        let next_deadline = pending.next_deadline();

        tokio::select! {
            event = event_rx.recv() => {
                let Some(event) = event else { break };
                for (document, change) in classify(&root, &filter, event) {
                    pending.record(document, change, Instant::now());
                }
            }
            () = async {
                if let Some(deadline) = next_deadline {
                    time::sleep_until(time::Instant::from_std(deadline)).await;
                }
            }, if next_deadline.is_some() => {
                for (document, change) in pending.take_due(Instant::now()) {
                    let sent = match change {
                        Change::Saved => index.notify_saved(document),
                        Change::Removed => index.notify_removed(document),
                        Change::RemovedDirectory => index.notify_removed_directory(document),
                    };
                    if sent.is_err() {
                        debug!("Marker index deactivated; stopping save watcher");
                        return;
                    }
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Change {
    Saved,
    Removed,
    RemovedDirectory,
}

fn classify(
    root: &Path,
    filter: &DocumentFilter,
    event: notify::Result<Event>,
) -> Vec<(DocumentId, Change)> {
    let event = match event {
        Ok(event) => event,
        Err(err) => {
            warn!("Watcher error: {err}");
            return Vec::new();
        }
    };
    if !matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) | EventKind::Any
    ) {
        return Vec::new();
    }

    event
        .paths
        .iter()
        .filter_map(|path| {
            if let Some(document) = filter.document_for_path(root, path) {
                // rename events are ambiguous across backends; the disk decides
                let change = if path.is_file() {
                    Change::Saved
                } else {
                    Change::Removed
                };
                return Some((document, change));
            }
            // a directory removed or renamed as a whole reports only its own path
            if path.exists() {
                return None;
            }
            let relative = path.strip_prefix(root).ok()?;
            Some((
                DocumentId::new(relative.to_string_lossy()),
                Change::RemovedDirectory,
            ))
        })
        .collect()
}

/// Trailing debounce per document: a change is forwarded once its path has
/// been quiet for `window`. Forwarding keeps first-arrival order.
struct PendingChanges {
    window: Duration,
    entries: Vec<(DocumentId, Change, Instant)>,
}

impl PendingChanges {
    const fn new(window: Duration) -> Self {
        Self {
            window,
            entries: Vec::new(),
        }
    }

    fn record(&mut self, document: DocumentId, change: Change, at: Instant) {
        match self.entries.iter_mut().find(|(d, _, _)| *d == document) {
            Some(entry) => {
                entry.1 = change;
                entry.2 = at;
            }
            None => self.entries.push((document, change, at)),
        }
    }

    fn next_deadline(&self) -> Option<Instant> {
        self.entries
            .iter()
            .map(|(_, _, last)| *last + self.window)
            .min()
    }

    fn take_due(&mut self, now: Instant) -> Vec<(DocumentId, Change)> {
        let window = self.window;
        let (due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|(_, _, last)| *last + window <= now);
        self.entries = waiting;
        due.into_iter().map(|(d, c, _)| (d, c)).collect()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.len()
    }
}
