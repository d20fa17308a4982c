use super::initialized_index;
use crate::command::context::CorpusContext;
use crate::command::domain::CheckReport;
use anyhow::Result;

#[derive(Default)]
pub struct CheckService;

impl CheckService {
    pub async fn run(&self, ctx: &CorpusContext, json: bool) -> Result<i32> {
        let index = initialized_index(ctx).await?;
        let report = CheckReport::from_snapshot(&index.snapshot());
        index.deactivate();

        if json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            for diagnostic in &report.diagnostics {
                println!("{}", diagnostic.render());
            }
            println!(
                "{} translations: {} ok, {} warnings, {} errors",
                report.summary.total(),
                report.summary.success,
                report.summary.warning,
                report.summary.error
            );
        }

        Ok(i32::from(report.summary.has_errors()))
    }
}
