use anyhow::Result;

use crate::ui;

pub async fn run() -> Result<()> {
    let core = super::load_core().await?;

    let spinner = ui::spinner("Publishing spots to Mapbox...");
    let result = core.catalog_sync().run().await;
    spinner.finish_and_clear();
    let summary = result?;

    if summary.failed > 0 {
        ui::warn(&format!(
            "Published {} spots, {} failed (see logs)",
            summary.synced, summary.failed
        ));
    } else {
        ui::success(&format!("Published {} spots", summary.synced));
    }
    Ok(())
}
