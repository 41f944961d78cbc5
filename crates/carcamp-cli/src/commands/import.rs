use std::path::Path;

use anyhow::Result;
use carcamp_core::jobs::read_spots;
use carcamp_core::SpotImporter;

use crate::ui;

pub async fn run(file: &Path, no_publish: bool) -> Result<()> {
    let spots = read_spots(file)?;
    let core = super::load_core().await?;

    let importer = if no_publish {
        SpotImporter::new(core.spot_store(), core.builder.clone())
    } else {
        core.importer()
    };

    let spinner = ui::spinner(&format!("Importing {} spots...", spots.len()));
    let result = importer.import(spots).await;
    spinner.finish_and_clear();
    let summary = result?;

    ui::success(&format!(
        "Imported {} of {} spots",
        summary.inserted, summary.received
    ));
    ui::field("duplicates", summary.duplicates);
    ui::field("insert failures", summary.insert_failed);
    if !no_publish {
        ui::field(
            "published",
            format!("{} ({} failed)", summary.published, summary.publish_failed),
        );
    }
    ui::field("edges written", summary.edges_written);
    if summary.builds_failed > 0 {
        ui::warn(&format!("{} builds failed (see logs)", summary.builds_failed));
    }
    Ok(())
}
