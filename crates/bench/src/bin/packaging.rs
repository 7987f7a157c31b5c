//! Packaging size versus performance analysis

use texdit_bench::{init_tracing, load_config, PackagingAnalysis};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("texdit_packaging");
    info!("TexDit Packaging Size vs Performance Analysis");

    let config = load_config()?;
    let report = PackagingAnalysis::new(config.bench()?)?.run().await?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
