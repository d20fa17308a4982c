mod check;
mod scan;
mod watch;

pub use check::CheckService;
pub use scan::ScanService;
pub use watch::WatchService;

use super::context::CorpusContext;
use anyhow::{anyhow, Result};
use marker_indexer::MarkerIndex;

/// Builds the index for `ctx` and waits for its first generation.
async fn initialized_index(ctx: &CorpusContext) -> Result<MarkerIndex> {
    let index = ctx.build_index()?;
    initialize(ctx, &index).await?;
    Ok(index)
}

/// Runs the initial scan of `index`; deactivates it when the scan fails.
async fn initialize(ctx: &CorpusContext, index: &MarkerIndex) -> Result<()> {
    match index.initialize().wait().await {
        Some(stats) => {
            log::debug!(
                "Indexed {} documents ({} with markers): {} occurrences of {} identifiers in {}ms",
                stats.documents,
                stats.documents_with_occurrences,
                stats.occurrences,
                stats.identifiers,
                stats.duration_ms
            );
            Ok(())
        }
        None => {
            let reason = index
                .status()
                .last_error
                .unwrap_or_else(|| "scan did not complete".to_string());
            index.deactivate();
            Err(anyhow!("Initial scan of {} failed: {reason}", ctx.root.display()))
        }
    }
}
