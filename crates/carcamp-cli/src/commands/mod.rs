pub mod build;
pub mod catalog;
pub mod import;
pub mod nearby;
pub mod rebuild;

use anyhow::Result;
use carcamp_core::{CarcampPaths, Core};

async fn load_core() -> Result<Core> {
    Core::init(&CarcampPaths::from_env()).await
}
