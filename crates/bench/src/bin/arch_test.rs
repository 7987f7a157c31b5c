//! In-process load, memory and latency benchmark of both architectures

use texdit_bench::{init_tracing, load_config, ArchitectureTest};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("texdit_arch_test");
    info!("TexDit Architecture Performance Test");

    let config = load_config()?;
    let bench = config.bench()?.clone();

    let report = ArchitectureTest::new(bench, config.limits.clone()).run().await?;
    info!(
        "Measured specialized architecture and {} single LLM options",
        report.single_llm_architecture.len()
    );
    Ok(())
}
