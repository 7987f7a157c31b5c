//! Start both servers, run the quick comparison, stop on Ctrl-C

use texdit_bench::{init_tracing, load_config, QuickComparison, ServerManager};
use tokio::signal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("texdit_manager");
    info!("TexDit Architecture Testing Server Manager");

    let config = load_config()?;
    let bench = config.bench()?;
    let mut manager = ServerManager::new(bench)?;

    info!("Phase 1: starting specialized architecture server");
    let specialized_started = manager.start_specialized().await;

    info!("Phase 2: starting single LLM architecture server");
    let single_started = manager.start_single_llm().await;

    if !specialized_started && !single_started {
        error!("No servers could be started");
        manager.stop_all().await;
        return Ok(());
    }

    info!("Phase 3: running performance comparison");
    if let Err(e) = QuickComparison::new(bench)?.run().await {
        error!("Comparison test failed: {}", e);
    }

    match (specialized_started, single_started) {
        (true, true) => info!("Both architectures tested successfully"),
        (true, false) => warn!("Only the specialized architecture was tested (single LLM failed)"),
        _ => warn!("Only the single LLM architecture was tested (specialized failed)"),
    }

    info!("Press Ctrl-C to stop servers and exit");
    if signal::ctrl_c().await.is_err() {
        warn!("Could not listen for Ctrl-C; stopping now");
    }

    manager.stop_all().await;
    Ok(())
}
