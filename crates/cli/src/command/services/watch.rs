use super::initialize;
use crate::command::context::CorpusContext;
use crate::command::domain::CheckReport;
use anyhow::{Context as _, Result};
use log::{info, warn};
use marker_indexer::SaveWatcher;

#[derive(Default)]
pub struct WatchService;

impl WatchService {
    pub async fn run(&self, ctx: &CorpusContext) -> Result<i32> {
        let index = ctx.build_index()?;
        // watching starts before the scan: saves made while it runs are held
        // by the index and replayed once it is ready
        let watcher = SaveWatcher::start(index.clone(), &ctx.root, &ctx.config.watcher)
            .context("Failed to start file watcher")?;
        initialize(ctx, &index).await?;
        info!("Watching {} (Ctrl-C to stop)", ctx.root.display());

        let mut snapshots = index.subscribe_snapshot();
        loop {
            tokio::select! {
                signal = tokio::signal::ctrl_c() => {
                    if let Err(err) = signal {
                        warn!("Failed to listen for Ctrl-C: {err}");
                    }
                    break;
                }
                snapshot = snapshots.next() => {
                    let Some(snapshot) = snapshot else { break };
                    let report = CheckReport::from_snapshot(&snapshot);
                    info!(
                        "Generation {}: {} documents, {} identifiers, {} warnings, {} errors",
                        report.generation,
                        snapshot.by_file.len(),
                        snapshot.by_id.len(),
                        report.summary.warning,
                        report.summary.error
                    );
                    for diagnostic in &report.diagnostics {
                        println!("{}", diagnostic.render());
                    }
                }
            }
        }

        drop(watcher);
        index.deactivate();
        Ok(0)
    }
}
