use anyhow::Result;

use crate::ui;

pub async fn run(spot_id: &str, json: bool) -> Result<()> {
    let core = super::load_core().await?;

    let spinner = (!json).then(|| ui::spinner(&format!("Building distances for {}...", spot_id)));
    let result = core.builder.build_spot(spot_id).await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let report = result?;

    if json {
        return ui::print_json(&report);
    }

    if report.is_partial() {
        ui::warn(&format!("Built {} with failures", report.spot_id));
    } else {
        ui::success(&format!("Built {}", report.spot_id));
    }
    ui::field("cells", format!("{} ({} failed)", report.cells_queried, report.cells_failed));
    ui::field("in range", report.in_range);
    ui::field("missing", report.missing);
    ui::field("requests", format!("{} ({} failed)", report.groups, report.groups_failed));
    ui::field(
        "edges written",
        format!("{} ({} failed)", report.edges_written, report.edge_writes_failed),
    );
    if report.skipped_pairs > 0 {
        ui::field("unroutable pairs", report.skipped_pairs);
    }
    if report.out_of_range_pairs > 0 {
        ui::field("pairs out of range", report.out_of_range_pairs);
    }
    Ok(())
}
