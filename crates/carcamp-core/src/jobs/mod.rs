//! Bulk operations built on the graph builder.
//!
//! - `RebuildJob`: build edges for every stored spot, with bounded concurrency
//! - `CatalogSync`: publish every stored spot to the feature catalog
//! - `SpotImporter`: insert new spots, publish them, then build their edges

mod catalog;
mod import;
mod rebuild;

pub use catalog::{CatalogSync, CatalogSummary};
pub use import::{read_spots, ImportSummary, SpotImporter};
pub use rebuild::{RebuildJob, RebuildSummary};
