mod context;
pub mod domain;
mod services;

use anyhow::Result;
use domain::ViewKind;
use services::{CheckService, ScanService, WatchService};
use std::path::Path;

/// Routes each subcommand to its service. Returns the process exit code.
#[derive(Default)]
pub struct CommandHandler {
    scan: ScanService,
    check: CheckService,
    watch: WatchService,
}

impl CommandHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn scan(&self, root: &Path, config: Option<&Path>, view: ViewKind) -> Result<i32> {
        let ctx = context::CorpusContext::resolve(root, config).await?;
        self.scan.run(&ctx, view).await
    }

    pub async fn check(&self, root: &Path, config: Option<&Path>, json: bool) -> Result<i32> {
        let ctx = context::CorpusContext::resolve(root, config).await?;
        self.check.run(&ctx, json).await
    }

    pub async fn watch(&self, root: &Path, config: Option<&Path>) -> Result<i32> {
        let ctx = context::CorpusContext::resolve(root, config).await?;
        self.watch.run(&ctx).await
    }
}
