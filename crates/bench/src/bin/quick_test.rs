//! Quick HTTP comparison of the two running servers

use texdit_bench::{init_tracing, load_config, QuickComparison};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("texdit_quick_test");
    info!("TexDit Architecture Quick Performance Test");

    let config = load_config()?;
    let comparison = QuickComparison::new(config.bench()?)?;

    if comparison.run().await?.is_some() {
        info!("Target: < 3 seconds per query for good UX");
    }
    Ok(())
}
