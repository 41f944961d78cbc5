use anyhow::Result;
use serde::Serialize;

use crate::ui;

#[derive(Serialize)]
struct NearbySpot {
    id: String,
    name: Option<String>,
    spot_type: Option<&'static str>,
    distance_meters: f64,
    duration_seconds: f64,
}

pub async fn run(spot_id: &str, json: bool) -> Result<()> {
    let core = super::load_core().await?;
    let edges = core.nearby(spot_id).await?;

    let nearby: Vec<NearbySpot> = edges
        .into_iter()
        .map(|edge| NearbySpot {
            id: edge.destination_id,
            name: edge.destination_name,
            spot_type: edge.destination_spot_type.map(|t| t.as_str()),
            distance_meters: edge.distance_meters,
            duration_seconds: edge.duration_seconds,
        })
        .collect();

    if json {
        return ui::print_json(&nearby);
    }

    if nearby.is_empty() {
        ui::info(&format!("No stored distances from {}", spot_id));
        return Ok(());
    }

    for spot in &nearby {
        println!(
            "  {:>6.1} km  {:>4.0} min  {}  {}",
            spot.distance_meters / 1000.0,
            spot.duration_seconds / 60.0,
            spot.name.as_deref().unwrap_or(&spot.id),
            console::style(spot.spot_type.unwrap_or("")).dim()
        );
    }
    Ok(())
}
