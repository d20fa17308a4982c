use super::initialized_index;
use crate::command::context::CorpusContext;
use crate::command::domain::ViewKind;
use anyhow::Result;

#[derive(Default)]
pub struct ScanService;

impl ScanService {
    pub async fn run(&self, ctx: &CorpusContext, view: ViewKind) -> Result<i32> {
        let index = initialized_index(ctx).await?;
        let snapshot = index.snapshot();
        let json = match view {
            ViewKind::ByFile => serde_json::to_string_pretty(&*snapshot.by_file)?,
            ViewKind::ById => serde_json::to_string_pretty(&*snapshot.by_id)?,
            ViewKind::Validated => serde_json::to_string_pretty(&*snapshot.validated)?,
        };
        println!("{json}");
        index.deactivate();
        Ok(0)
    }
}
