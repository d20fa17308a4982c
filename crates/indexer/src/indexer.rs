use crate::error::{IndexerError, Result};
use crate::extractor::Extractor;
use crate::filter::DocumentFilter;
use crate::gate::{Notification, ReadinessGate};
use crate::index_state::{EngineState, EngineStatus, LoopReport};
use crate::model::{Document, DocumentId, Occurrence};
use crate::source::DocumentSource;
use crate::stats::ScanStats;
use crate::stream::{Publisher, ViewStream};
use crate::views::{ByFileView, ByIdView, IndexSnapshot};
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinSet;

type ScanOutcome = Result<(Vec<(DocumentId, Vec<Occurrence>)>, ScanStats)>;

enum Command {
    Notify(Notification),
    ScanFinished {
        outcome: ScanOutcome,
        done: oneshot::Sender<ScanStats>,
    },
    Flush(oneshot::Sender<u64>),
}

/// Completion signal returned by [`MarkerIndex::initialize`].
#[must_use = "dropping the signal does not cancel the scan"]
pub struct ReadySignal {
    rx: Option<oneshot::Receiver<ScanStats>>,
}

impl ReadySignal {
    const fn noop() -> Self {
        Self { rx: None }
    }

    /// True when the call that produced this signal did not start a scan.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        self.rx.is_none()
    }

    /// Resolves once the scan this call started has published its snapshot and
    /// replayed every held notification. `None` for a no-op call, a failed scan
    /// or a scan discarded by deactivation.
    pub async fn wait(self) -> Option<ScanStats> {
        self.rx?.await.ok()
    }
}

/// Live index of translation markers over one corpus.
///
/// Cheap to clone; every clone drives the same engine. Dropping the last clone
/// deactivates it.
#[derive(Clone)]
pub struct MarkerIndex {
    inner: Arc<Inner>,
}

struct Inner {
    source: Arc<dyn DocumentSource>,
    extractor: Arc<dyn Extractor>,
    filter: DocumentFilter,
    command_tx: mpsc::UnboundedSender<Command>,
    state: Arc<watch::Sender<EngineState>>,
    publisher: Arc<Publisher>,
    snapshot_rx: watch::Receiver<Arc<IndexSnapshot>>,
    report_rx: watch::Receiver<LoopReport>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.state.send_replace(EngineState::Terminated);
        self.publisher.close();
    }
}

impl MarkerIndex {
    /// Creates an uninitialized engine and spawns its update loop.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        source: Arc<dyn DocumentSource>,
        extractor: Arc<dyn Extractor>,
        filter: DocumentFilter,
    ) -> Self {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (state_tx, _) = watch::channel(EngineState::Uninitialized);
        let state = Arc::new(state_tx);
        let (publisher, snapshot_rx) = Publisher::new();
        let publisher = Arc::new(publisher);
        let (report_tx, report_rx) = watch::channel(LoopReport::default());

        let update_loop = UpdateLoop {
            source: source.clone(),
            extractor: extractor.clone(),
            state: state.clone(),
            publisher: publisher.clone(),
            report_tx,
            report: LoopReport::default(),
            current: Arc::new(IndexSnapshot::empty()),
            gate: ReadinessGate::default(),
        };
        tokio::spawn(update_loop.run(command_rx));

        Self {
            inner: Arc::new(Inner {
                source,
                extractor,
                filter,
                command_tx,
                state,
                publisher,
                snapshot_rx,
                report_rx,
            }),
        }
    }

    /// Starts the initial scan unless one is running or has completed.
    pub fn initialize(&self) -> ReadySignal {
        let started = self.inner.state.send_if_modified(|state| {
            if *state == EngineState::Uninitialized {
                *state = EngineState::Initializing;
                true
            } else {
                false
            }
        });
        if !started {
            debug!("initialize() ignored; engine is {:?}", self.state());
            return ReadySignal::noop();
        }

        let (done_tx, done_rx) = oneshot::channel();
        let source = self.inner.source.clone();
        let extractor = self.inner.extractor.clone();
        let filter = self.inner.filter.clone();
        let command_tx = self.inner.command_tx.clone();
        tokio::spawn(async move {
            let outcome = scan_corpus(source, extractor, &filter).await;
            if command_tx
                .send(Command::ScanFinished {
                    outcome,
                    done: done_tx,
                })
                .is_err()
            {
                debug!("Scan finished after the update loop stopped; result discarded");
            }
        });

        ReadySignal {
            rx: Some(done_rx),
        }
    }

    /// Reports that `document` was saved. Ineligible documents are ignored.
    pub fn notify_saved(&self, document: impl Into<DocumentId>) -> Result<()> {
        self.notify(Notification::Saved(document.into()))
    }

    /// Reports that `document` left the corpus; its occurrences are dropped.
    pub fn notify_removed(&self, document: impl Into<DocumentId>) -> Result<()> {
        self.notify(Notification::Removed(document.into()))
    }

    /// Reports that a directory (relative to the corpus root) was removed or
    /// renamed away; every indexed document below it is dropped in one update.
    pub fn notify_removed_directory(&self, directory: impl Into<DocumentId>) -> Result<()> {
        self.notify(Notification::RemovedDirectory(directory.into()))
    }

    fn notify(&self, notification: Notification) -> Result<()> {
        if self.state().is_terminated() {
            return Err(IndexerError::Terminated);
        }
        let eligible = match &notification {
            Notification::RemovedDirectory(_) => true,
            Notification::Saved(document) | Notification::Removed(document) => {
                self.inner.filter.is_eligible(document)
            }
        };
        if !eligible {
            debug!("Ignoring notification for ineligible document {}", notification.document());
            return Ok(());
        }
        self.inner
            .command_tx
            .send(Command::Notify(notification))
            .map_err(|_| IndexerError::Terminated)
    }

    /// Waits until every notification sent before this call has been handled
    /// (or held by the readiness gate) and returns the generation published at
    /// that point. `None` after deactivation.
    pub async fn flush(&self) -> Option<u64> {
        let (tx, rx) = oneshot::channel();
        self.inner.command_tx.send(Command::Flush(tx)).ok()?;
        rx.await.ok()
    }

    /// Permanently stops the engine and closes every subscription. Idempotent.
    pub fn deactivate(&self) {
        let changed = self.inner.state.send_if_modified(|state| {
            if state.is_terminated() {
                false
            } else {
                *state = EngineState::Terminated;
                true
            }
        });
        self.inner.publisher.close();
        if changed {
            info!("Marker index deactivated");
        }
    }

    #[must_use]
    pub fn state(&self) -> EngineState {
        *self.inner.state.borrow()
    }

    #[must_use]
    pub fn state_stream(&self) -> watch::Receiver<EngineState> {
        self.inner.state.subscribe()
    }

    /// Resolves `true` once initialized, `false` if the engine terminates first.
    pub async fn ready(&self) -> bool {
        let mut rx = self.inner.state.subscribe();
        loop {
            let state = *rx.borrow_and_update();
            match state {
                EngineState::Initialized => return true,
                EngineState::Terminated => return false,
                EngineState::Uninitialized | EngineState::Initializing => {}
            }
            if rx.changed().await.is_err() {
                return false;
            }
        }
    }

    /// Latest published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<IndexSnapshot> {
        self.inner.snapshot_rx.borrow().clone()
    }

    #[must_use]
    pub fn subscribe_snapshot(&self) -> ViewStream<IndexSnapshot> {
        ViewStream::new(self.inner.snapshot_rx.clone(), Arc::clone)
    }

    #[must_use]
    pub fn subscribe_by_file(&self) -> ViewStream<ByFileView> {
        ViewStream::new(self.inner.snapshot_rx.clone(), |s: &Arc<IndexSnapshot>| s.by_file.clone())
    }

    #[must_use]
    pub fn subscribe_by_id(&self) -> ViewStream<ByIdView> {
        ViewStream::new(self.inner.snapshot_rx.clone(), |s: &Arc<IndexSnapshot>| s.by_id.clone())
    }

    #[must_use]
    pub fn subscribe_validated(&self) -> ViewStream<ByIdView> {
        ViewStream::new(self.inner.snapshot_rx.clone(), |s: &Arc<IndexSnapshot>| s.validated.clone())
    }

    #[must_use]
    pub fn status(&self) -> EngineStatus {
        let snapshot = self.snapshot();
        let report = self.inner.report_rx.borrow().clone();
        EngineStatus {
            state: self.state(),
            generation: snapshot.generation,
            documents: snapshot.by_file.len(),
            identifiers: snapshot.by_id.len(),
            pending_notifications: report.pending_notifications,
            applied_notifications: report.applied_notifications,
            last_scan: report.last_scan,
            last_error: report.last_error,
        }
    }

    #[must_use]
    pub fn filter(&self) -> &DocumentFilter {
        &self.inner.filter
    }
}

/// Reads and extracts every eligible document concurrently.
///
/// Fails as a whole on the first document that cannot be read; remaining
/// tasks are aborted when the join set is dropped.
async fn scan_corpus(
    source: Arc<dyn DocumentSource>,
    extractor: Arc<dyn Extractor>,
    filter: &DocumentFilter,
) -> ScanOutcome {
    let started = Instant::now();
    let documents: Vec<DocumentId> = source
        .list()
        .await?
        .into_iter()
        .filter(|document| filter.is_eligible(document))
        .collect();
    info!("Scanning {} documents", documents.len());

    let mut tasks = JoinSet::new();
    for document in documents {
        let source = source.clone();
        let extractor = extractor.clone();
        tasks.spawn(async move {
            let text = source
                .read(&document)
                .await
                .map_err(|err| IndexerError::document(document.as_str(), err))?;
            let occurrences = extractor.extract(&Document::new(document.clone(), text));
            Ok::<_, IndexerError>((document, occurrences))
        });
    }

    let mut extracted = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        extracted.push(joined??);
    }

    let mut stats = ScanStats::new();
    stats.documents = extracted.len();
    stats.documents_with_occurrences = extracted.iter().filter(|(_, o)| !o.is_empty()).count();
    stats.occurrences = extracted.iter().map(|(_, o)| o.len()).sum();
    stats.duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    Ok((extracted, stats))
}

/// The single serialized path through which every snapshot is published.
struct UpdateLoop {
    source: Arc<dyn DocumentSource>,
    extractor: Arc<dyn Extractor>,
    state: Arc<watch::Sender<EngineState>>,
    publisher: Arc<Publisher>,
    report_tx: watch::Sender<LoopReport>,
    report: LoopReport,
    current: Arc<IndexSnapshot>,
    gate: ReadinessGate,
}

impl UpdateLoop {
    async fn run(mut self, mut command_rx: mpsc::UnboundedReceiver<Command>) {
        let mut state_rx = self.state.subscribe();
        loop {
            let command = tokio::select! {
                biased;
                () = until_terminated(&mut state_rx) => break,
                command = command_rx.recv() => match command {
                    Some(command) => command,
                    None => break,
                },
            };

            match command {
                Command::Notify(notification) => self.on_notification(notification).await,
                Command::ScanFinished { outcome, done } => {
                    self.on_scan_finished(outcome, done).await;
                }
                Command::Flush(reply) => {
                    let _ = reply.send(self.current.generation);
                }
            }
        }

        self.publisher.close();
        debug!("Update loop stopped at generation {}", self.current.generation);
    }

    fn current_state(&self) -> EngineState {
        *self.state.borrow()
    }

    async fn on_notification(&mut self, notification: Notification) {
        if self.current_state().gates_notifications() {
            debug!("Holding {notification:?} until the initial scan completes");
            self.gate.hold(notification);
            self.report.pending_notifications = self.gate.len();
            self.send_report();
            return;
        }
        self.apply(notification).await;
        self.send_report();
    }

    async fn on_scan_finished(&mut self, outcome: ScanOutcome, done: oneshot::Sender<ScanStats>) {
        let state = self.current_state();
        if state != EngineState::Initializing {
            debug!("Discarding scan result; engine is {state:?}");
            return;
        }

        let (documents, mut stats) = match outcome {
            Ok(scanned) => scanned,
            Err(err) => {
                error!("Initial scan failed; index stays uninitialized: {err}");
                self.state.send_if_modified(|state| {
                    if *state == EngineState::Initializing {
                        *state = EngineState::Uninitialized;
                        true
                    } else {
                        false
                    }
                });
                self.report.last_error = Some(err.to_string());
                self.send_report();
                return;
            }
        };

        let snapshot = Arc::new(IndexSnapshot::build(self.current.generation + 1, documents));
        stats.identifiers = snapshot.by_id.len();
        self.publish(snapshot);
        self.state.send_if_modified(|state| {
            if *state == EngineState::Initializing {
                *state = EngineState::Initialized;
                true
            } else {
                false
            }
        });
        info!(
            "Initial scan: {} documents, {} with markers, {} occurrences, {} identifiers in {}ms",
            stats.documents,
            stats.documents_with_occurrences,
            stats.occurrences,
            stats.identifiers,
            stats.duration_ms
        );
        self.report.last_scan = Some(stats.clone());
        self.report.last_error = None;

        let held: Vec<Notification> = self.gate.release().collect();
        if !held.is_empty() {
            info!("Replaying {} notifications held during the scan", held.len());
        }
        for notification in held {
            self.apply(notification).await;
        }
        self.report.pending_notifications = 0;
        self.send_report();

        let _ = done.send(stats);
    }

    /// Whole-document replacement of one document's occurrences.
    /// Whole-document replacement of one document's occurrences, or removal
    /// of every document below a directory.
    async fn apply(&mut self, notification: Notification) {
        let next = match &notification {
            Notification::Saved(document) => {
                let Some(occurrences) = self.reextract(document).await else {
                    return;
                };
                self.current.replace_document(document, occurrences)
            }
            Notification::Removed(document) => {
                if !self.current.by_file.contains_key(document) {
                    debug!("Ignoring removal of unindexed document {document}");
                    return;
                }
                self.current.replace_document(document, Vec::new())
            }
            Notification::RemovedDirectory(directory) => {
                let removed = self.current.documents_under(directory).count();
                if removed == 0 {
                    debug!("Ignoring removal of directory {directory}; nothing indexed below it");
                    return;
                }
                debug!("Directory {directory} removed; dropping {removed} documents");
                self.current.remove_directory(directory)
            }
        };

        if self.current_state().is_terminated() {
            debug!("Discarding update for {}; engine terminated", notification.document());
            return;
        }

        self.publish(Arc::new(next));
        self.report.applied_notifications += 1;
    }

    /// Fresh occurrences of a saved document; `None` when the save is stale.
    /// A document the source no longer admits yields no occurrences, which
    /// drops it from the views.
    async fn reextract(&mut self, document: &DocumentId) -> Option<Vec<Occurrence>> {
        if !self.source.admits(document).await {
            if self.current.by_file.contains_key(document) {
                debug!("{document} is excluded by the source; dropping it");
                return Some(Vec::new());
            }
            debug!("Ignoring save for excluded document {document}");
            return None;
        }
        match self.source.read(document).await {
            Ok(text) => Some(self.extractor.extract(&Document::new(document.clone(), text))),
            Err(err) if err.is_not_found() => {
                debug!("Ignoring save for vanished document {document}");
                None
            }
            Err(err) => {
                warn!("Failed to read saved document {document}: {err}");
                self.report.last_error = Some(format!("{document}: {err}"));
                None
            }
        }
    }

    fn publish(&mut self, snapshot: Arc<IndexSnapshot>) {
        debug_assert!(snapshot.is_consistent());
        if self.publisher.publish(snapshot.clone()) {
            debug!(
                "Published generation {} ({} documents, {} identifiers)",
                snapshot.generation,
                snapshot.by_file.len(),
                snapshot.by_id.len()
            );
        }
        self.current = snapshot;
    }

    fn send_report(&self) {
        self.report_tx.send_replace(self.report.clone());
    }
}

async fn until_terminated(state_rx: &mut watch::Receiver<EngineState>) {
    loop {
        let terminated = state_rx.borrow_and_update().is_terminated();
        if terminated || state_rx.changed().await.is_err() {
            return;
        }
    }
}
