use anyhow::Result;

use crate::ui;

pub async fn run(concurrency: Option<usize>, json: bool) -> Result<()> {
    let core = super::load_core().await?;

    let mut job = core.rebuild_job();
    if let Some(concurrency) = concurrency {
        job = job.with_concurrency(concurrency);
    }

    let spinner = (!json).then(|| ui::spinner("Rebuilding distance graph..."));
    let result = job.run().await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let summary = result?;

    if json {
        return ui::print_json(&summary);
    }

    ui::success(&format!("Rebuilt {} spots", summary.spots));
    ui::field("failed", summary.spots_failed);
    ui::field("partial", summary.spots_partial);
    ui::field("requests", format!("{} ({} failed)", summary.groups, summary.groups_failed));
    ui::field(
        "edges written",
        format!("{} ({} failed)", summary.edges_written, summary.edge_writes_failed),
    );
    Ok(())
}
